/*!
# Zopgz Core: LZ77 Store (Component E, Storage).

The token stream produced by the match finder/optimal parser: one entry per
literal or back-reference, plus windowed symbol histograms so the cost
model and block splitter can query counts over arbitrary ranges without
re-scanning the whole stream every time.

Grounded on the teacher's `lz77.rs`; the teacher also keeps a static
`POOL`/`Swimmer` object pool recycling `LZ77Store` allocations across the
thousands of calls its image pipeline makes per process lifetime. That
doesn't carry over here -- per §5, this crate has no process-wide mutable
state, and a single compression call allocates a handful of stores, not
thousands -- so this version is a plain owned `Vec`-backed struct. The
teacher also builds each entry's symbol via a build.rs-generated transmute
table; this version calls `symbols::length_symbol`/`distance_symbol`
instead (see `DESIGN.md`).
*/

use super::{
	symbols::{distance_symbol, length_symbol},
	zopfli_error,
	ZOPFLI_NUM_D,
	ZOPFLI_NUM_LL,
	ZopfliError,
};



#[derive(Debug, Clone, Default)]
/// # LZ77 Data Store.
pub(crate) struct LZ77Store {
	pub(crate) entries: Vec<LZ77StoreEntry>,
	pub(crate) ll_counts: Vec<[u32; ZOPFLI_NUM_LL]>,
	pub(crate) d_counts: Vec<[u32; ZOPFLI_NUM_D]>,
}

impl LZ77Store {
	/// # New.
	pub(crate) fn new() -> Self { Self::default() }

	/// # Append Entries.
	///
	/// Appends the entries from `other` to `self` en masse, recomputing
	/// windowed histogram chunks along the way.
	pub(crate) fn append(&mut self, other: &Self) {
		self.entries.reserve_exact(other.entries.len());
		for &entry in &other.entries { self.push_entry(entry); }
	}

	/// # Clear.
	pub(crate) fn clear(&mut self) {
		self.entries.truncate(0);
		self.ll_counts.truncate(0);
		self.d_counts.truncate(0);
	}

	/// # Push Values.
	pub(crate) fn push(&mut self, litlen: u16, dist: u16, pos: usize) -> Result<(), ZopfliError> {
		let e = LZ77StoreEntry::new(litlen, dist, pos)?;
		self.push_entry(e);
		Ok(())
	}

	/// # Last Counts.
	///
	/// Returns the last (current) length and distance count chunks, resizing
	/// as needed so each chunk's start aligns with a multiple of the
	/// alphabet size -- this is what makes windowed histogram queries below
	/// cheap.
	fn last_counts(&mut self) -> (&mut [u32; ZOPFLI_NUM_LL], &mut [u32; ZOPFLI_NUM_D]) {
		fn wrap_chunk<const SIZE: usize>(set: &mut Vec<[u32; SIZE]>, pos: usize) -> usize {
			let len = set.len();
			if len == 0 {
				set.push([0; SIZE]);
				1
			}
			else if pos % SIZE == 0 {
				set.push(set[len - 1]);
				len + 1
			}
			else { len }
		}

		let pos = self.entries.len();
		let d_len = wrap_chunk(&mut self.d_counts, pos);
		let ll_len = wrap_chunk(&mut self.ll_counts, pos);

		(&mut self.ll_counts[ll_len - 1], &mut self.d_counts[d_len - 1])
	}

	/// # Push Entry.
	fn push_entry(&mut self, entry: LZ77StoreEntry) {
		let (ll_counts, d_counts) = self.last_counts();
		entry.add_counts(ll_counts, d_counts);
		self.entries.push(entry);
	}

	/// # Replace Store.
	///
	/// Replaces the current content with some other store's content.
	pub(crate) fn replace(&mut self, other: &Self) {
		self.entries.truncate(0);
		self.entries.extend_from_slice(&other.entries);

		self.ll_counts.truncate(0);
		self.ll_counts.extend_from_slice(&other.ll_counts);

		self.d_counts.truncate(0);
		self.d_counts.extend_from_slice(&other.d_counts);
	}
}

impl LZ77Store {
	/// # Length.
	pub(crate) fn len(&self) -> usize { self.entries.len() }

	/// # Is Empty.
	pub(crate) fn is_empty(&self) -> bool { self.entries.is_empty() }

	/// # Histogram.
	///
	/// Returns the litlen/distance symbol counts for entries in
	/// `lstart..lend`.
	pub(crate) fn histogram(&self, lstart: usize, lend: usize)
	-> Result<([u32; ZOPFLI_NUM_LL], [u32; ZOPFLI_NUM_D]), ZopfliError> {
		// For small ranges it's cheaper to just count directly.
		if lstart + ZOPFLI_NUM_LL * 3 > lend {
			let mut ll_counts = [0_u32; ZOPFLI_NUM_LL];
			let mut d_counts = [0_u32; ZOPFLI_NUM_D];

			let entries = self.entries.get(lstart..lend).ok_or_else(|| zopfli_error!())?;
			for e in entries { e.add_counts(&mut ll_counts, &mut d_counts); }

			Ok((ll_counts, d_counts))
		}
		// Otherwise derive it from the cumulative chunk histograms.
		else {
			let (mut ll_counts, mut d_counts) = self.histogram_at(lend - 1)?;
			if 0 < lstart {
				self.histogram_sub(lstart - 1, &mut ll_counts, &mut d_counts)?;
			}

			Ok((ll_counts, d_counts))
		}
	}

	/// # Cumulative Histogram at Position.
	fn histogram_at(&self, pos: usize)
	-> Result<([u32; ZOPFLI_NUM_LL], [u32; ZOPFLI_NUM_D]), ZopfliError> {
		let ll_idx = pos.wrapping_div(ZOPFLI_NUM_LL);
		let d_idx = pos.wrapping_div(ZOPFLI_NUM_D);
		let ll_end = (ll_idx + 1) * ZOPFLI_NUM_LL;
		let d_end = (d_idx + 1) * ZOPFLI_NUM_D;

		if self.ll_counts.len() <= ll_idx || self.d_counts.len() <= d_idx {
			return Err(zopfli_error!());
		}
		let mut ll_counts: [u32; ZOPFLI_NUM_LL] = self.ll_counts[ll_idx];
		let mut d_counts: [u32; ZOPFLI_NUM_D] = self.d_counts[d_idx];

		for (i, e) in self.entries.iter().enumerate().take(ll_end).skip(pos + 1) {
			ll_counts[e.ll_symbol as usize] -= 1;
			if i < d_end && 0 < e.dist { d_counts[e.d_symbol as usize] -= 1; }
		}

		Ok((ll_counts, d_counts))
	}

	/// # Subtract Histogram.
	fn histogram_sub(
		&self,
		pos: usize,
		ll_counts: &mut [u32; ZOPFLI_NUM_LL],
		d_counts: &mut [u32; ZOPFLI_NUM_D],
	) -> Result<(), ZopfliError> {
		let ll_idx = pos.wrapping_div(ZOPFLI_NUM_LL);
		let d_idx = pos.wrapping_div(ZOPFLI_NUM_D);

		let (ll_old, d_old) = self.ll_counts.get(ll_idx)
			.zip(self.d_counts.get(d_idx))
			.ok_or_else(|| zopfli_error!())?;

		let ll_end = (ll_idx + 1) * ZOPFLI_NUM_LL;
		let d_end = (d_idx + 1) * ZOPFLI_NUM_D;
		for (i, e) in self.entries.iter().enumerate().take(ll_end).skip(pos + 1) {
			ll_counts[e.ll_symbol as usize] += 1;
			if i < d_end && 0 < e.dist { d_counts[e.d_symbol as usize] += 1; }
		}

		for (a, b) in ll_counts.iter_mut().zip(ll_old) { *a -= b; }
		for (a, b) in d_counts.iter_mut().zip(d_old) { *a -= b; }

		Ok(())
	}
}



#[derive(Debug, Clone, Copy)]
/// # Store Entry.
///
/// Either a literal (`dist == 0`, `litlen` is the literal byte value) or a
/// back-reference (`dist > 0`, `litlen` is the match length `3..=258`).
pub(crate) struct LZ77StoreEntry {
	pub(crate) pos: usize,
	pub(crate) litlen: u16,
	pub(crate) dist: u16,
	pub(crate) ll_symbol: u16,
	pub(crate) d_symbol: u16,
}

impl LZ77StoreEntry {
	/// # New.
	fn new(litlen: u16, dist: u16, pos: usize) -> Result<Self, ZopfliError> {
		if litlen < 259 && dist < 32_768 {
			let (ll_symbol, d_symbol) =
				if dist == 0 { (litlen, 0) }
				else { (length_symbol(litlen).0, distance_symbol(dist).0) };

			Ok(Self { pos, litlen, dist, ll_symbol, d_symbol })
		}
		else { Err(zopfli_error!()) }
	}

	/// # Length.
	///
	/// `1` for a literal, otherwise the match length.
	pub(crate) const fn length(&self) -> u16 {
		if self.dist == 0 { 1 } else { self.litlen }
	}

	/// # Add Symbol Counts.
	fn add_counts(&self, ll_counts: &mut [u32; ZOPFLI_NUM_LL], d_counts: &mut [u32; ZOPFLI_NUM_D]) {
		ll_counts[self.ll_symbol as usize] += 1;
		if 0 < self.dist { d_counts[self.d_symbol as usize] += 1; }
	}
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn t_histogram_sub_take() {
		// _histogram_sub assumes d_end <= ll_end; confirm that holds for every
		// chunk boundary a 16-bit position can land on.
		for i in 0..=usize::from(u16::MAX) {
			let ll_start = ZOPFLI_NUM_LL * i.wrapping_div(ZOPFLI_NUM_LL);
			let d_start = ZOPFLI_NUM_D * i.wrapping_div(ZOPFLI_NUM_D);
			let ll_end = ll_start + ZOPFLI_NUM_LL;
			let d_end = d_start + ZOPFLI_NUM_D;

			assert!(d_end <= ll_end, "failed with {i}");
		}
	}

	#[test]
	fn t_literal_and_match_roundtrip() {
		let mut store = LZ77Store::new();
		store.push(b'a' as u16, 0, 0).unwrap();
		store.push(9, 3, 1).unwrap();
		assert_eq!(store.len(), 2);
		assert_eq!(store.entries[0].length(), 1);
		assert_eq!(store.entries[1].length(), 9);

		let (ll, d) = store.histogram(0, 2).unwrap();
		assert_eq!(ll[b'a' as usize], 1);
		assert_eq!(d.iter().sum::<u32>(), 1);
	}
}
