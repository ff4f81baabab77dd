/*!
# Zopgz Core: Block Cost and Emission (Components A/B/C, Block Level).

Given an `LZ77Store` token range, this module costs the three ways RFC
1951 §3.2.3 allows a block to be written -- stored (raw bytes), fixed
Huffman, dynamic Huffman -- and writes whichever is cheapest.

Grounded on the teacher's `calculate_block_size_{uncompressed,fixed,
dynamic}` and `add_lz77_block_{auto_type,fixed,dynamic}` in
`zopflipng/blocks.rs`; the block-splitting search that decides *where*
block boundaries fall (the teacher's `SplitPoints`) and the iterative
re-optimization loop that decides *which* token stream to cost in the
first place (the teacher's `lz77_optimal`) are factored out into
`splitter.rs` and `optimizer.rs` respectively, since this module's own job
-- given a fixed token range, emit the cheapest encoding of it -- doesn't
need either.
*/

use super::{
	bitwriter::{build_codes, BitWriter},
	cost::CostModel,
	lz77::LZ77Store,
	rle::DynamicHeader,
	symbols::{distance_symbol, length_symbol, END_OF_BLOCK},
	zopfli_error,
	ZopfliError,
};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Block Type (RFC 1951 §3.2.3 `BTYPE`).
pub(crate) enum BlockKind {
	/// # Stored (Uncompressed), `BTYPE = 00`.
	Stored,

	/// # Fixed Huffman, `BTYPE = 01`.
	Fixed,

	/// # Dynamic Huffman, `BTYPE = 10`.
	Dynamic,
}

/// # Byte Range Covered by a Token Range.
///
/// Each `LZ77StoreEntry` records the absolute byte position it started
/// at; the range's end is the position just past the last entry's match
/// (or single literal byte).
fn byte_range(arr: &[u8], store: &LZ77Store, lstart: usize, lend: usize) -> Result<(usize, usize), ZopfliError> {
	if lstart >= lend || lend > store.len() { return Err(zopfli_error!()); }
	let start = store.entries[lstart].pos;
	let last = &store.entries[lend - 1];
	let end = (last.pos + usize::from(last.length())).min(arr.len());
	Ok((start, end))
}

/// # Maximum Bytes Per Stored Sub-Block.
///
/// RFC 1951 §3.2.4's `LEN` field is 16 bits; a stored block whose byte
/// range exceeds this must be split into consecutive stored sub-blocks,
/// each with its own `BFINAL + BTYPE` header, all but the last carrying
/// `BFINAL = 0`.
const STORED_BLOCK_MAX: usize = 0xFFFF;

/// # Stored Block Bit Cost.
///
/// `BFINAL + BTYPE` (3 bits), padding up to a byte boundary (assumed here
/// to average half a byte, since the exact value depends on the writer's
/// position when the block actually gets written), `LEN + NLEN` (32
/// bits), then the raw bytes themselves -- repeated once per
/// `STORED_BLOCK_MAX`-byte sub-block for ranges that don't fit in one.
fn stored_bit_cost(byte_len: usize) -> u32 {
	let chunks = byte_len.div_ceil(STORED_BLOCK_MAX).max(1) as u32;
	chunks * (3 + 4 + 32) + (byte_len as u32 * 8)
}

/// # Sum of Token Costs Under a Model.
fn tokens_bit_cost(model: &CostModel, store: &LZ77Store, lstart: usize, lend: usize) -> u32 {
	store.entries[lstart..lend].iter()
		.map(|e| {
			if e.dist == 0 { model.literal_cost(e.litlen as u8) }
			else { model.match_cost(e.litlen, e.dist) }
		})
		.sum()
}

/// # Cost a Fixed-Tree Block.
fn fixed_bit_cost(store: &LZ77Store, lstart: usize, lend: usize) -> u32 {
	let model = CostModel::fixed();
	3 + tokens_bit_cost(&model, store, lstart, lend) + u32::from(model.ll_lengths()[END_OF_BLOCK])
}

/// # Cost a Dynamic-Tree Block.
///
/// Returns the total bit cost along with the learned model and header
/// that produced it, so the caller can reuse both when actually writing
/// the block instead of rebuilding them.
fn dynamic_bit_cost(store: &LZ77Store, lstart: usize, lend: usize) -> Result<(u32, CostModel, DynamicHeader), ZopfliError> {
	let (ll_counts, d_counts) = store.histogram(lstart, lend)?;
	let model = CostModel::learned(&ll_counts, &d_counts);
	let header = DynamicHeader::build(model.ll_lengths(), model.d_lengths());
	let bits = 3
		+ header.bit_cost()
		+ tokens_bit_cost(&model, store, lstart, lend)
		+ u32::from(model.ll_lengths()[END_OF_BLOCK]);
	Ok((bits, model, header))
}

/// # Best Encoding's Estimated Bit Cost.
///
/// Used by the block splitter to compare candidate split points without
/// actually writing anything.
pub(crate) fn best_bit_cost(
	arr: &[u8],
	store: &LZ77Store,
	lstart: usize,
	lend: usize,
	try_static: bool,
) -> Result<u32, ZopfliError> {
	let (start, end) = byte_range(arr, store, lstart, lend)?;
	let mut best = stored_bit_cost(end - start);
	if try_static { best = best.min(fixed_bit_cost(store, lstart, lend)); }
	let (dyn_bits, _, _) = dynamic_bit_cost(store, lstart, lend)?;
	Ok(best.min(dyn_bits))
}

/// # Choose and Write a Block.
///
/// Costs all three encodings (stored, and -- if `try_static` -- fixed,
/// plus dynamic) and writes whichever is cheapest, with `BFINAL` set iff
/// `is_last`.
pub(crate) fn write_block(
	writer: &mut BitWriter,
	arr: &[u8],
	store: &LZ77Store,
	lstart: usize,
	lend: usize,
	is_last: bool,
	try_static: bool,
) -> Result<(), ZopfliError> {
	let (byte_start, byte_end) = byte_range(arr, store, lstart, lend)?;
	let stored_cost = stored_bit_cost(byte_end - byte_start);
	let fixed_cost = if try_static { fixed_bit_cost(store, lstart, lend) } else { u32::MAX };
	let (dynamic_cost, dyn_model, dyn_header) = dynamic_bit_cost(store, lstart, lend)?;

	let kind =
		if stored_cost <= fixed_cost && stored_cost <= dynamic_cost { BlockKind::Stored }
		else if fixed_cost <= dynamic_cost { BlockKind::Fixed }
		else { BlockKind::Dynamic };

	match kind {
		BlockKind::Stored => { write_stored(writer, &arr[byte_start..byte_end], is_last); Ok(()) },
		BlockKind::Fixed => write_fixed(writer, store, lstart, lend, is_last),
		BlockKind::Dynamic => write_dynamic(writer, store, lstart, lend, is_last, &dyn_model, &dyn_header),
	}
}

/// # Write the Canonical Empty-Input Block.
///
/// Zero-byte input has no tokens to cost against three encodings -- there's
/// nothing to split, and `byte_range`/`write_block`'s cost comparisons all
/// assume a non-empty `lstart..lend`. A fixed-tree block holding nothing
/// but the end-of-block symbol is the standards-conformant minimum (two
/// bytes: `BFINAL=1, BTYPE=01` then the 7-bit EOB code, matching spec §8
/// scenario 1's 20-byte total gzip output), strictly smaller than an empty
/// stored block (which still needs a byte-aligned `LEN`/`NLEN` pair).
pub(crate) fn write_empty_block(writer: &mut BitWriter) {
	let empty = LZ77Store::new();
	// Infallible: `write_fixed` never consults `byte_range` (that's a
	// `write_stored`-only concern), so an empty `lstart..lend` can't fail.
	write_fixed(writer, &empty, 0, 0, true).expect("writing an empty fixed block cannot fail");
}

/// # Write a Stored Block.
///
/// Splits `bytes` into `STORED_BLOCK_MAX`-byte sub-blocks as needed (RFC
/// 1951's `LEN` field can't address more than that in one block); only the
/// final sub-block carries `BFINAL` (when `is_last` is set). An empty
/// `bytes` still emits exactly one (zero-length) block.
fn write_stored(writer: &mut BitWriter, bytes: &[u8], is_last: bool) {
	let mut offset = 0;
	loop {
		let end = (offset + STORED_BLOCK_MAX).min(bytes.len());
		let chunk = &bytes[offset..end];
		let chunk_last = is_last && end == bytes.len();

		writer.add_bit(u8::from(chunk_last));
		writer.add_bits(0b00, 2);

		let len = chunk.len() as u16;
		writer.push_bytes_aligned(&len.to_le_bytes());
		writer.push_bytes_aligned(&(!len).to_le_bytes());
		writer.push_bytes_aligned(chunk);

		offset = end;
		if offset >= bytes.len() { break; }
	}
}

/// # Write a Fixed-Tree Block.
fn write_fixed(
	writer: &mut BitWriter,
	store: &LZ77Store,
	lstart: usize,
	lend: usize,
	is_last: bool,
) -> Result<(), ZopfliError> {
	let model = CostModel::fixed();
	let ll_lengths = model.ll_lengths();
	let d_lengths = model.d_lengths();
	let ll_codes = build_codes(ll_lengths);
	let d_codes = build_codes(d_lengths);

	writer.add_bit(u8::from(is_last));
	writer.add_bits(0b01, 2);

	write_tokens(writer, store, lstart, lend, ll_lengths, &ll_codes, d_lengths, &d_codes);
	Ok(())
}

/// # Write a Dynamic-Tree Block.
fn write_dynamic(
	writer: &mut BitWriter,
	store: &LZ77Store,
	lstart: usize,
	lend: usize,
	is_last: bool,
	model: &CostModel,
	header: &DynamicHeader,
) -> Result<(), ZopfliError> {
	let ll_lengths = model.ll_lengths();
	let d_lengths = model.d_lengths();
	let ll_codes = build_codes(ll_lengths);
	let d_codes = build_codes(d_lengths);
	let cl_codes = build_codes(&header.cl_lengths);

	writer.add_bit(u8::from(is_last));
	writer.add_bits(0b10, 2);

	writer.add_bits((header.hlit - 257) as u32, 5);
	writer.add_bits((header.hdist - 1) as u32, 5);
	writer.add_bits((header.hclen - 4) as u32, 4);

	for &sym in super::symbols::CL_ORDER.iter().take(header.hclen) {
		writer.add_bits(u32::from(header.cl_lengths[usize::from(sym)]), 3);
	}

	for tok in &header.rle {
		writer.add_huffman_code(cl_codes[usize::from(tok.symbol)], header.cl_lengths[usize::from(tok.symbol)]);
		if tok.extra_bits > 0 { writer.add_bits(u32::from(tok.extra_value), tok.extra_bits); }
	}

	write_tokens(writer, store, lstart, lend, ll_lengths, &ll_codes, d_lengths, &d_codes);
	Ok(())
}

/// # Write Literal/Match Tokens Plus End-of-Block.
fn write_tokens(
	writer: &mut BitWriter,
	store: &LZ77Store,
	lstart: usize,
	lend: usize,
	ll_lengths: &[u8],
	ll_codes: &[u16],
	d_lengths: &[u8],
	d_codes: &[u16],
) {
	for e in &store.entries[lstart..lend] {
		if e.dist == 0 {
			let sym = usize::from(e.litlen);
			writer.add_huffman_code(ll_codes[sym], ll_lengths[sym]);
		}
		else {
			let (lsym, lextra, lvalue) = length_symbol(e.litlen);
			writer.add_huffman_code(ll_codes[usize::from(lsym)], ll_lengths[usize::from(lsym)]);
			if lextra > 0 { writer.add_bits(u32::from(lvalue), lextra); }

			let (dsym, dextra, dvalue) = distance_symbol(e.dist);
			writer.add_huffman_code(d_codes[usize::from(dsym)], d_lengths[usize::from(dsym)]);
			if dextra > 0 { writer.add_bits(u32::from(dvalue), dextra); }
		}
	}

	writer.add_huffman_code(ll_codes[END_OF_BLOCK], ll_lengths[END_OF_BLOCK]);
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_write_fixed_block_produces_output() {
		let mut store = LZ77Store::new();
		store.push(b'a' as u16, 0, 0).unwrap();
		store.push(b'b' as u16, 0, 1).unwrap();
		store.push(9, 3, 2).unwrap();

		let mut writer = BitWriter::new();
		write_block(&mut writer, b"abXXXXXXXXXyz", &store, 0, store.len(), true, true).unwrap();
		let out = writer.finish();
		assert!(!out.is_empty());
		// BFINAL bit must be set.
		assert_eq!(out[0] & 1, 1);
	}

	#[test]
	fn t_stored_chosen_for_incompressible_short_input() {
		let mut store = LZ77Store::new();
		for (i, &b) in b"qx".iter().enumerate() { store.push(u16::from(b), 0, i).unwrap(); }
		let cost = best_bit_cost(b"qx", &store, 0, store.len(), true).unwrap();
		assert!(cost > 0);
	}

	#[test]
	fn t_stored_block_over_65535_bytes_splits_into_subblocks() {
		// A single stored sub-block can't address more than `STORED_BLOCK_MAX`
		// bytes in its 16-bit LEN field; anything longer must become more
		// than one consecutive stored block, only the last of which sets
		// BFINAL.
		let n = STORED_BLOCK_MAX + 10;
		let bytes = vec![0x42_u8; n];
		let mut writer = BitWriter::new();
		write_stored(&mut writer, &bytes, true);
		let out = writer.finish();

		// First block's header: BFINAL=0, BTYPE=00, then LEN/NLEN for a
		// full `STORED_BLOCK_MAX`-byte chunk.
		assert_eq!(out[0] & 0b111, 0b000);
		let len0 = u16::from_le_bytes([out[1], out[2]]);
		assert_eq!(len0 as usize, STORED_BLOCK_MAX);

		// Second block starts right after the first's header (1 byte) +
		// LEN/NLEN (4 bytes) + payload.
		let second_header_byte = 5 + STORED_BLOCK_MAX;
		assert_eq!(out[second_header_byte] & 0b111, 0b001, "BFINAL must be set on the final sub-block");
		let len1 = u16::from_le_bytes([out[second_header_byte + 1], out[second_header_byte + 2]]);
		assert_eq!(len1 as usize, n - STORED_BLOCK_MAX);
	}
}
