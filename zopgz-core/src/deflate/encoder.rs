/*!
# Zopgz Core: LZ77 Encoder (Component E).

Turns a byte slice into an `LZ77Store` token stream using the binary-tree
match finder (`hash.rs`) and a cost model (`cost.rs`): a one-step-lookahead
("lazy") match encoder. At each position the finder reports the best match
available; rather than taking it immediately, the encoder also checks the
match available one byte later. If emitting a single literal now and
taking *that* match is cheaper (in bits, per the cost model) than taking
the current match, the current match is deferred in favor of the literal.
Lookahead never extends past one byte.

Grounded on the teacher's `ZopfliHash::greedy`, which implements the same
lazy-matching shape (a pending match carried across iterations, a
length-based "is the next match clearly better" heuristic) over the
teacher's hash-chain finder. The heuristic here compares actual modeled
bit costs rather than raw lengths, per §4.4; the teacher's own
`get_length_score` is a proxy for the same idea when an explicit cost
model isn't in scope.
*/

use super::{
	cost::CostModel,
	hash::{MatchFinder, DEFAULT_MAX_CHAIN},
	lz77::LZ77Store,
	symbols::ZOPFLI_MIN_MATCH,
	ZopfliError,
};

/// # Best Match From a Candidate List.
///
/// `insert_and_find` returns candidates in increasing-length order, so the
/// last (if any) is the longest; on a length tie the smallest distance is
/// marginally cheaper to encode (no effect on the length symbol, smaller
/// or equal distance symbol), which is also what the finder's BST walk
/// naturally tends to prefer due to insertion order, but we don't rely on
/// that and just take the last entry either way.
fn best_match(candidates: &[(u16, u16)]) -> Option<(u16, u16)> { candidates.last().copied() }

/// # LZ77-Encode a Slice.
///
/// `start` marks where token emission begins; bytes before `start` (if
/// any -- carried over from a previous master block so cross-block
/// matches remain reachable) are inserted into the match finder but never
/// themselves turned into tokens. Only the trailing `ZOPFLI_WINDOW_SIZE`
/// bytes of that prefix are actually warmed into the finder -- matches
/// beyond the sliding window can never be valid (`hash.rs`'s own
/// `delta > ZOPFLI_WINDOW_SIZE` check would reject them anyway), and this
/// call runs once per optimizer iteration per master-block chunk, so
/// re-walking the *whole* prefix from zero would cost `O(start)` wasted
/// tree-inserts every time. Mirrors the teacher's `ZopfliHash::reset`,
/// which only re-warms from `instart.saturating_sub(ZOPFLI_WINDOW_SIZE)`.
pub(crate) fn lz77_encode(
	arr: &[u8],
	start: usize,
	cost: &CostModel,
	max_chain: u32,
) -> Result<LZ77Store, ZopfliError> {
	use super::symbols::ZOPFLI_WINDOW_SIZE;

	let mut store = LZ77Store::new();
	let mut finder = MatchFinder::new();

	for pos in start.saturating_sub(ZOPFLI_WINDOW_SIZE)..start { finder.skip(arr, pos, max_chain); }

	if start >= arr.len() { return Ok(store); }

	let mut prev_len: u16 = 0;
	let mut prev_dist: u16 = 0;
	let mut pending = false;

	let mut i = start;
	while i < arr.len() {
		let candidates = finder.insert_and_find(arr, i, max_chain, true);
		let cur = best_match(&candidates).filter(|&(len, _)| usize::from(len) >= ZOPFLI_MIN_MATCH);

		if pending {
			pending = false;
			let prev_cost = cost.match_cost(prev_len, prev_dist);
			let defer_cost = cur.map_or(u32::MAX, |(len, dist)| cost.match_cost(len, dist))
				.saturating_add(cost.literal_cost(arr[i - 1]));

			if defer_cost < prev_cost {
				store.push(u16::from(arr[i - 1]), 0, i - 1)?;
				if let Some((len, dist)) = cur {
					prev_len = len;
					prev_dist = dist;
					pending = true;
					i += 1;
					continue;
				}
				i += 1;
			}
			else {
				let match_end = i - 1 + usize::from(prev_len);
				store.push(prev_len, prev_dist, i - 1)?;
				let mut j = i + 1;
				while j < match_end && j < arr.len() {
					finder.skip(arr, j, max_chain);
					j += 1;
				}
				i = match_end;
				continue;
			}
		}
		else if let Some((len, dist)) = cur {
			prev_len = len;
			prev_dist = dist;
			pending = true;
			i += 1;
			continue;
		}
		else {
			store.push(u16::from(arr[i]), 0, i)?;
			i += 1;
		}
	}

	// A match may still be pending if the loop ended right after deciding
	// to hold it (can't happen at the very last byte, since there'd be no
	// byte left to re-check against, but guard it generically anyway).
	if pending { store.push(prev_len, prev_dist, arr.len() - 1)?; }

	Ok(store)
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_literals_for_unique_bytes() {
		let cost = CostModel::fixed();
		let data = b"abcdefg";
		let store = lz77_encode(data, 0, &cost, DEFAULT_MAX_CHAIN).unwrap();
		assert_eq!(store.len(), data.len());
		for e in &store.entries { assert_eq!(e.dist, 0); }
	}

	#[test]
	fn t_repetition_produces_a_match() {
		let cost = CostModel::fixed();
		let data = b"abcabcabcabcabcabc";
		let store = lz77_encode(data, 0, &cost, DEFAULT_MAX_CHAIN).unwrap();
		assert!(store.len() < data.len());
		assert!(store.entries.iter().any(|e| e.dist > 0));
	}

	#[test]
	fn t_prelude_bytes_are_not_emitted() {
		let cost = CostModel::fixed();
		let data = b"abcabcabcXYZ";
		let store = lz77_encode(data, 3, &cost, DEFAULT_MAX_CHAIN).unwrap();
		// Emitted entries account for exactly `data.len() - 3` consumed
		// bytes (sum of each entry's symbol length).
		let consumed: usize = store.entries.iter().map(|e| usize::from(e.length())).sum();
		assert_eq!(consumed, data.len() - 3);
	}
}
