/*!
# Zopgz Core: Iterative Optimizer (Component H).

Drives the whole re-encode/re-estimate convergence loop described in
§4.6: start from the fixed Huffman tree, LZ77-encode, derive a learned
cost model from the result's own symbol frequencies, re-encode against
that model, and repeat for a configured iteration budget, keeping
whichever pass produced the smallest estimated output. If progress
stagnates (no improvement in several rounds), the learned model is reset
to the best one found so far and perturbed with small random increments
to escape the local optimum before continuing.

Grounded on the teacher's `lz77_optimal` in `zopflipng/blocks.rs`, which
runs the same shape of loop over its own squeeze-based optimal parser
(`ZopfliHash::optimal_run`) instead of the lazy-matching encoder in
`encoder.rs`; the convergence bookkeeping (best-so-far tracking,
stagnation detection after iteration 5, reset-then-randomize) is carried
over essentially as-is.
*/

use super::{
	blocks::best_bit_cost,
	cost::CostModel,
	encoder::lz77_encode,
	hash::DEFAULT_MAX_CHAIN,
	lz77::LZ77Store,
	stats::{perturb_counts, smooth_counts, RanState},
	ZopfliError,
};
use crate::options::Options;

/// # Iteration After Which Stagnation Triggers a Perturbation.
///
/// Mirrors the teacher's constant of the same purpose -- early iterations
/// often repeat the same cost as the fixed-tree pass simply because
/// there's been no chance yet to diverge; only treat a repeat as
/// "stagnant" once the loop has had a few rounds to find its footing.
const STAGNATION_AFTER: u32 = 5;

/// # Run the Optimizer Over One Master-Block Chunk.
///
/// `arr` is the chunk's full byte slice (including any cross-block
/// prelude); `start` is where token emission should begin. Returns the
/// best `LZ77Store` found across all iterations.
pub(crate) fn optimize(arr: &[u8], start: usize, options: &Options) -> Result<LZ77Store, ZopfliError> {
	if start >= arr.len() { return Ok(LZ77Store::new()); }

	let iterations = options.effective_iterations(arr.len() - start);
	let max_chain = DEFAULT_MAX_CHAIN;

	let mut cost = CostModel::fixed();
	let mut ran = RanState::new();

	let mut best_store: Option<LZ77Store> = None;
	let mut best_cost = u32::MAX;
	let mut last_cost = u32::MAX;

	let mut current_ll = super::stats::zeroed_ll_counts();
	let mut current_d = super::stats::zeroed_d_counts();

	for iteration in 0..iterations {
		let store = lz77_encode(arr, start, &cost, max_chain)?;
		let total = best_bit_cost(arr, &store, 0, store.len(), options.try_static())
			.unwrap_or(u32::MAX);

		if total < best_cost {
			best_cost = total;
			best_store = Some(store.clone());
		}
		else if iteration > STAGNATION_AFTER && total == last_cost {
			// Stagnated: fall back to the best parse found so far and
			// perturb its symbol counts to try to escape the plateau.
			if let Some(best) = &best_store {
				let (ll, d) = best.histogram(0, best.len())?;
				current_ll = ll;
				current_d = d;
			}
			perturb_counts(&mut ran, &mut current_ll);
			perturb_counts(&mut ran, &mut current_d);
			cost = CostModel::learned(&current_ll, &current_d);
			last_cost = total;
			continue;
		}

		let (hist_ll, hist_d) = store.histogram(0, store.len())?;
		if iteration >= 2 {
			smooth_counts(&mut current_ll, &hist_ll);
			smooth_counts(&mut current_d, &hist_d);
		}
		else {
			current_ll = hist_ll;
			current_d = hist_d;
		}

		cost = CostModel::learned(&current_ll, &current_d);
		last_cost = total;
	}

	best_store.ok_or_else(|| super::zopfli_error!())
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_optimize_converges_on_repetitive_input() {
		let data = b"abcabcabcabcabcabcabcabcabcabcabcabcabc".repeat(4);
		let options = Options::new().with_iterations(std::num::NonZeroU32::new(5).unwrap());
		let store = optimize(&data, 0, &options).unwrap();
		assert!(store.len() < data.len());
	}

	#[test]
	fn t_optimize_handles_short_input() {
		let options = Options::new().with_iterations(std::num::NonZeroU32::new(3).unwrap());
		let store = optimize(b"ab", 0, &options).unwrap();
		assert_eq!(store.len(), 2);
	}
}
