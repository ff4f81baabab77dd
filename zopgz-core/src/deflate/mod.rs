/*!
# Zopgz Core: DEFLATE Compressor.

Ties together the match finder, cost model, LZ77 encoder, block splitter,
iterative optimizer, and block writer into the single entry point the
crate root and `container.rs` call: take a byte slice and a set of
options, produce a raw RFC 1951 DEFLATE stream.

A large input is processed in `ZOPFLI_MASTER_BLOCK_SIZE`-byte windows so
the match finder's and Huffman arena's working sets stay bounded (§5);
each window's encoder/optimizer pass still sees back into the previous
window's tail (up to the full 32K sliding window) so cross-window matches
remain reachable, it just doesn't re-emit tokens for bytes already
written.
*/

mod bitwriter;
mod blocks;
mod cost;
mod encoder;
mod hash;
mod katajainen;
mod lz77;
mod optimizer;
mod rle;
mod splitter;
mod stats;
mod symbols;

pub(crate) use crate::error::{zopfli_error, ZopfliError};
pub(crate) use symbols::{ZOPFLI_MASTER_BLOCK_SIZE, ZOPFLI_NUM_D, ZOPFLI_NUM_LL};

/// # Inflater Re-Exports.
///
/// `inflate.rs` lives outside this module (it shares no code with the
/// compressor beyond the DEFLATE parameter tables), so the handful of
/// symbol-table pieces it needs are re-exported here rather than
/// duplicated.
pub(crate) mod tables {
	pub(crate) use super::symbols::{
		distance_base,
		distance_extra_bits,
		length_base,
		length_extra_bits,
		CL_ORDER,
		FIXED_TREE_D,
		FIXED_TREE_LL,
		ZOPFLI_NUM_D,
		ZOPFLI_NUM_LL,
	};
}

use bitwriter::BitWriter;
use lz77::LZ77Store;
use crate::options::Options;



/// # Compress to Raw DEFLATE.
///
/// Produces an RFC 1951 bitstream with no gzip/zlib framing; see
/// `crate::container` for that.
pub(crate) fn compress(options: &Options, data: &[u8]) -> Result<Vec<u8>, ZopfliError> {
	let mut writer = BitWriter::new();

	if data.is_empty() {
		blocks::write_empty_block(&mut writer);
		return Ok(writer.finish());
	}

	let mut pos = 0;
	while pos < data.len() {
		let end = (pos + ZOPFLI_MASTER_BLOCK_SIZE).min(data.len());
		let arr = &data[..end];
		let is_last_chunk = end == data.len();

		let store = optimizer::optimize(arr, pos, options)?;
		let splits = splitter::split(arr, &store, options.block_split(), options.try_static())?;

		let mut bounds = Vec::with_capacity(splits.len() + 2);
		bounds.push(0);
		bounds.extend(splits);
		bounds.push(store.len());

		for w in bounds.windows(2) {
			let (lstart, lend) = (w[0], w[1]);
			if lstart == lend { continue; }
			let last_block = is_last_chunk && lend == store.len();
			blocks::write_block(&mut writer, arr, &store, lstart, lend, last_block, options.try_static())?;
		}

		pos = end;
	}

	Ok(writer.finish())
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::options::Options;

	#[test]
	fn t_compress_empty() {
		let out = compress(&Options::new(), &[]).unwrap();
		assert!(!out.is_empty());
	}

	#[test]
	fn t_compress_roundtrip_shape() {
		let data = b"the quick brown fox jumps over the lazy dog. the quick brown fox.";
		let out = compress(&Options::new().with_iterations(std::num::NonZeroU32::new(2).unwrap()), data).unwrap();
		assert!(!out.is_empty());
		assert!(out.len() < data.len() * 2);
	}

	#[test]
	fn t_compress_multi_chunk() {
		let data = vec![b'z'; ZOPFLI_MASTER_BLOCK_SIZE + 1000];
		let opts = Options::new().with_iterations(std::num::NonZeroU32::new(1).unwrap());
		let out = compress(&opts, &data).unwrap();
		assert!(!out.is_empty());
		assert!(out.len() < data.len());
	}
}
