/*!
# Zopgz Core: Options.

Every tunable the encoder needs is carried by this one record, passed
through the call tree by reference. There is no process-wide mutable
state (no statics, no `lazy_static`) anywhere in this crate; see
`DESIGN.md` for the rationale.
*/

use std::num::NonZeroU32;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Block Splitting Strategy.
pub enum BlockSplit {
	/// # No Splitting.
	///
	/// Emit the whole token stream as a single block.
	Off,

	/// # Entropy-Only Splitting.
	///
	/// Split using the cheap single-pass heuristic (no LZ77 re-evaluation of
	/// candidate split points).
	Entropy,

	/// # Greedy Splitting.
	///
	/// Split using the full greedy recursive bisection described in §4.5,
	/// including the LZ77-recalculated comparison. This is the default and
	/// matches gzip/zopfli's own behavior.
	Greedy,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Output Container.
pub enum Container {
	/// # Gzip (RFC 1952).
	Gzip,

	/// # Zlib (RFC 1950).
	Zlib,

	/// # Raw DEFLATE (RFC 1951), No Framing.
	Raw,
}

#[derive(Debug, Clone)]
/// # Compression Options.
///
/// Constructed once by the caller (library user or CLI front-end) and
/// threaded through every call; see §4.9 of `SPEC_FULL.md`.
pub struct Options {
	/// # Compression Level.
	///
	/// In range `2..=9`; chiefly affects the default iteration count when
	/// `iterations` is unset.
	level: u8,

	/// # Iteration Count Override.
	///
	/// When set, this overrides the level-derived default iteration count
	/// for the §4.6 optimizer. This is the clean replacement for the
	/// original source's `10000 + n` modular-arithmetic alias; see
	/// `DESIGN.md`'s Open Question resolution.
	iterations: Option<NonZeroU32>,

	/// # Block Splitting Strategy.
	block_split: BlockSplit,

	/// # Try Static (Fixed) Blocks.
	///
	/// When true, every emitted block is compared against the fixed-tree
	/// encoding and the smaller of the two is kept.
	try_static: bool,

	/// # Stored Filename.
	///
	/// Used only for the gzip FNAME field.
	name: Option<String>,

	/// # Modification Time.
	///
	/// Seconds since the Unix epoch, used only for the gzip MTIME field.
	/// Zero means "unknown", per RFC 1952.
	mtime: u32,

	/// # Output Container.
	container: Container,
}

impl Default for Options {
	fn default() -> Self { Self::new() }
}

impl Options {
	#[must_use]
	/// # New (Default) Options.
	///
	/// Level 9, iteration count derived from input size, greedy block
	/// splitting, static-block comparison enabled, no stored name, mtime
	/// zero, gzip container.
	pub const fn new() -> Self {
		Self {
			level: 9,
			iterations: None,
			block_split: BlockSplit::Greedy,
			try_static: true,
			name: None,
			mtime: 0,
			container: Container::Gzip,
		}
	}

	#[must_use]
	/// # With Level.
	///
	/// Clamped to `2..=9`. This intentionally collapses `-1`/`--fast`
	/// (CLI level 1) into level 2 rather than giving it distinct behavior;
	/// see `DESIGN.md`'s Open Question resolution for why.
	pub const fn with_level(mut self, level: u8) -> Self {
		self.level = if level < 2 { 2 } else if level > 9 { 9 } else { level };
		self
	}

	#[must_use]
	/// # With Iterations.
	///
	/// Overrides the level-derived default iteration count.
	pub const fn with_iterations(mut self, iterations: NonZeroU32) -> Self {
		self.iterations = Some(iterations);
		self
	}

	#[must_use]
	/// # With Block Split Strategy.
	pub const fn with_block_split(mut self, strategy: BlockSplit) -> Self {
		self.block_split = strategy;
		self
	}

	#[must_use]
	/// # With Try-Static.
	pub const fn with_try_static(mut self, try_static: bool) -> Self {
		self.try_static = try_static;
		self
	}

	#[must_use]
	/// # With Stored Name.
	pub fn with_name(mut self, name: Option<String>) -> Self {
		self.name = name;
		self
	}

	#[must_use]
	/// # With Modification Time.
	pub const fn with_mtime(mut self, mtime: u32) -> Self {
		self.mtime = mtime;
		self
	}

	#[must_use]
	/// # With Container.
	pub const fn with_container(mut self, container: Container) -> Self {
		self.container = container;
		self
	}
}

impl Options {
	#[must_use]
	/// # Level.
	pub const fn level(&self) -> u8 { self.level }

	#[must_use]
	/// # Stored Name.
	pub fn name(&self) -> Option<&str> { self.name.as_deref() }

	#[must_use]
	/// # Modification Time.
	pub const fn mtime(&self) -> u32 { self.mtime }

	#[must_use]
	/// # Container.
	pub const fn container(&self) -> Container { self.container }

	#[must_use]
	/// # Block Split Strategy.
	pub const fn block_split(&self) -> BlockSplit { self.block_split }

	#[must_use]
	/// # Try Static?
	pub const fn try_static(&self) -> bool { self.try_static }

	#[must_use]
	/// # Effective Iteration Count.
	///
	/// Returns the explicit override if present, otherwise derives a count
	/// from the level and input size the same way the teacher's image
	/// pipeline picks a default: more iterations for small inputs (where
	/// the per-iteration cost is cheap), fewer for large ones, scaled by
	/// how many "notches" above the minimum level (2) was requested.
	pub fn effective_iterations(&self, input_len: usize) -> u32 {
		if let Some(n) = self.iterations { return n.get(); }

		let base: u32 = if input_len < 200_000 { 60 } else { 20 };
		let notches = u32::from(self.level.saturating_sub(2));
		// Level 2 uses a quarter of the base; level 9 uses the full base.
		(base * (notches + 1)).div_ceil(8).max(1)
	}
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_level_clamp() {
		assert_eq!(Options::new().with_level(0).level(), 2);
		assert_eq!(Options::new().with_level(1).level(), 2);
		assert_eq!(Options::new().with_level(9).level(), 9);
		assert_eq!(Options::new().with_level(20).level(), 9);
	}

	#[test]
	fn t_default_iterations() {
		let small = Options::new().effective_iterations(100);
		let big = Options::new().effective_iterations(1_000_000);
		assert!(small >= big);
		assert!(small > 0 && big > 0);
	}

	#[test]
	fn t_iterations_override() {
		let opts = Options::new().with_iterations(NonZeroU32::new(500).unwrap());
		assert_eq!(opts.effective_iterations(100), 500);
		assert_eq!(opts.effective_iterations(10_000_000), 500);
	}
}
