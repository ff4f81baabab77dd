/*!
# Zopgz Core: Cost Model (Component F).

Per §9's design note, a cost model is "a small tagged record, not an
interface": rather than a trait object or closure, it's a plain struct
carrying a literal/length code-length table and a distance code-length
table, tagged by where those tables came from. Every caller that needs a
bit-cost estimate for a literal or match goes through the same two
methods regardless of which variant it holds.

Grounded on the teacher's `SymbolStats`/fixed-tree cost helpers in
`zopflipng/stats.rs` and `zopflipng/blocks.rs` (`calculate_block_size_*`),
simplified to drop the squeeze-specific `uni_*` lookups those callers also
carried.
*/

use super::{
	katajainen::length_limited_code_lengths,
	symbols::{
		distance_extra_bits,
		distance_symbol,
		length_extra_bits,
		length_symbol,
		FIXED_TREE_D,
		FIXED_TREE_LL,
		ZOPFLI_NUM_D,
		ZOPFLI_NUM_LL,
	},
};



#[derive(Debug, Clone)]
/// # Cost Model.
///
/// Either the fixed RFC 1951 §3.2.6 tree, or a tree derived from observed
/// literal/length/distance symbol frequencies (a "learned" model, per
/// §4.6's iterative optimizer).
pub(crate) enum CostModel {
	/// # Fixed Huffman Tree.
	Fixed,

	/// # Learned From Symbol Counts.
	Learned {
		/// # Literal/Length Code Lengths.
		ll_lengths: Box<[u8; ZOPFLI_NUM_LL]>,

		/// # Distance Code Lengths.
		d_lengths: Box<[u8; ZOPFLI_NUM_D]>,
	},
}

impl CostModel {
	/// # Fixed Model.
	pub(crate) const fn fixed() -> Self { Self::Fixed }

	/// # Learned Model From Symbol Counts.
	///
	/// Derives per-symbol code lengths the same way a real dynamic block
	/// header would, via the length-limited code construction in
	/// `katajainen.rs` (component C), capped at 15 bits per RFC 1951.
	pub(crate) fn learned(ll_counts: &[u32; ZOPFLI_NUM_LL], d_counts: &[u32; ZOPFLI_NUM_D]) -> Self {
		// Every block emits exactly one end-of-block symbol, which never
		// shows up in an `LZ77Store` histogram (it isn't a stored token);
		// account for it here so it always gets a valid code.
		let mut ll_counts = *ll_counts;
		ll_counts[super::symbols::END_OF_BLOCK] += 1;

		// Distance trees need at least one (and, per a long-standing DEFLATE
		// decoder quirk, ideally two) non-zero entries even with no matches
		// at all, or some decoders choke on the degenerate zero-symbol tree.
		let mut d_counts = *d_counts;
		if d_counts.iter().all(|&c| c == 0) { d_counts[0] = 1; d_counts[1] = 1; }

		let ll_lengths = to_array_ll(&length_limited_code_lengths(&ll_counts, 15));
		let d_lengths = to_array_d(&length_limited_code_lengths(&d_counts, 15));

		Self::Learned { ll_lengths: Box::new(ll_lengths), d_lengths: Box::new(d_lengths) }
	}

	/// # Literal/Length Code Lengths.
	pub(crate) fn ll_lengths(&self) -> &[u8; ZOPFLI_NUM_LL] {
		match self {
			Self::Fixed => &FIXED_TREE_LL,
			Self::Learned { ll_lengths, .. } => ll_lengths,
		}
	}

	/// # Distance Code Lengths.
	pub(crate) fn d_lengths(&self) -> &[u8; ZOPFLI_NUM_D] {
		match self {
			Self::Fixed => &FIXED_TREE_D,
			Self::Learned { d_lengths, .. } => d_lengths,
		}
	}

	/// # Literal Cost (Bits).
	pub(crate) fn literal_cost(&self, byte: u8) -> u32 {
		let len = self.ll_lengths()[usize::from(byte)];
		// A zero length means the symbol never appeared in the sample; treat
		// it as maximally expensive so the encoder prefers anything else.
		if len == 0 { 15 } else { u32::from(len) }
	}

	/// # Match Cost (Bits).
	///
	/// `length` is `3..=258`, `distance` is `1..=32768`.
	pub(crate) fn match_cost(&self, length: u16, distance: u16) -> u32 {
		let (lsym, lextra, _) = length_symbol(length);
		let (dsym, dextra, _) = distance_symbol(distance);
		let lsym_len = self.ll_lengths()[usize::from(lsym)];
		let dsym_len = self.d_lengths()[usize::from(dsym)];
		let lsym_len = if lsym_len == 0 { 15 } else { u32::from(lsym_len) };
		let dsym_len = if dsym_len == 0 { 15 } else { u32::from(dsym_len) };
		lsym_len + u32::from(lextra) + dsym_len + u32::from(dextra)
	}
}

/// # Copy a Length Vec Into a Fixed `ZOPFLI_NUM_LL` Array.
fn to_array_ll(v: &[u8]) -> [u8; ZOPFLI_NUM_LL] {
	let mut out = [0_u8; ZOPFLI_NUM_LL];
	out.copy_from_slice(v);
	out
}

/// # Copy a Length Vec Into a Fixed `ZOPFLI_NUM_D` Array.
fn to_array_d(v: &[u8]) -> [u8; ZOPFLI_NUM_D] {
	let mut out = [0_u8; ZOPFLI_NUM_D];
	out.copy_from_slice(v);
	out
}

/// # Length Symbol's Extra Bits, Re-Exported for `blocks`/`splitter`.
pub(crate) fn match_extra_bits(length: u16, distance: u16) -> u8 {
	let (lsym, _, _) = length_symbol(length);
	let (dsym, _, _) = distance_symbol(distance);
	length_extra_bits(lsym) + distance_extra_bits(dsym)
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_fixed_literal_costs() {
		let model = CostModel::fixed();
		assert_eq!(model.literal_cost(0), 8);
		assert_eq!(model.literal_cost(200), 9);
	}

	#[test]
	fn t_learned_cheaper_for_frequent_symbol() {
		let mut ll = [1_u32; ZOPFLI_NUM_LL];
		ll[b'a' as usize] = 10_000;
		let d = [1_u32; ZOPFLI_NUM_D];
		let model = CostModel::learned(&ll, &d);
		assert!(model.literal_cost(b'a') < model.literal_cost(b'z'));
	}
}
