/*!
# Zopgz Core: Inflater (Component L).

A standards-conformant RFC 1951 decoder, independent of everything the
compressor builds: no cost model, no match finder, no iterative
optimizer, just "read this bitstream and produce the bytes it encodes,
or report why it can't be done."

Grounded on the classic `puff.c` reference decoder's canonical-Huffman
`count`/`symbol` table shape (count codes by length, prefix-sum into
per-length start offsets, then place symbols in code order) -- simple
enough to read a one-bit-at-a-time decode loop against without a big
generated lookup table, and a natural match for the length tables this
crate's own `deflate::symbols` module already carries for the encoder
side.
*/

use crate::{
	deflate::tables::{
		distance_base,
		distance_extra_bits,
		length_base,
		length_extra_bits,
		CL_ORDER,
		FIXED_TREE_D,
		FIXED_TREE_LL,
		ZOPFLI_NUM_D,
		ZOPFLI_NUM_LL,
	},
	error::DecompressError,
};

/// # End-of-Block Symbol.
const END_OF_BLOCK: u16 = 256;

/// # Maximum Huffman Code Length (RFC 1951 §3.2.7).
const MAXBITS: usize = 15;



/// # LSB-First Bit Reader.
///
/// DEFLATE packs everything except Huffman codes themselves LSB-first
/// (RFC 1951 §3.1.1); this reads one to several bits at a time from a
/// byte slice in that order, buffering up to a partial trailing byte
/// between calls.
struct BitReader<'a> {
	data: &'a [u8],
	pos: usize,
	buf: u32,
	nbits: u32,
}

impl<'a> BitReader<'a> {
	/// # New.
	const fn new(data: &'a [u8]) -> Self { Self { data, pos: 0, buf: 0, nbits: 0 } }

	/// # Ensure at Least `n` Bits Are Buffered.
	fn ensure(&mut self, n: u32) -> Result<(), DecompressError> {
		while self.nbits < n {
			let Some(&byte) = self.data.get(self.pos) else { return Err(DecompressError::Truncated); };
			self.buf |= u32::from(byte) << self.nbits;
			self.pos += 1;
			self.nbits += 8;
		}
		Ok(())
	}

	/// # Read `n` Bits (`n <= 16`), LSB First.
	fn read_bits(&mut self, n: u32) -> Result<u32, DecompressError> {
		if n == 0 { return Ok(0); }
		self.ensure(n)?;
		let mask = (1_u32 << n) - 1;
		let value = self.buf & mask;
		self.buf >>= n;
		self.nbits -= n;
		Ok(value)
	}

	/// # Discard to the Next Byte Boundary.
	///
	/// Any buffered bits belong to a byte at `self.pos - 1` that's already
	/// been consumed past `self.pos`'s boundary; dropping them realigns
	/// reading to start at `self.pos` itself. (`ensure` never buffers more
	/// than one partial trailing byte, since it only ever pulls in whole
	/// bytes up to the requested bit count, so this is always correct
	/// regardless of how many bits happen to be sitting in `buf`.)
	fn align(&mut self) {
		self.buf = 0;
		self.nbits = 0;
	}

	/// # Read Raw, Byte-Aligned Bytes.
	fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecompressError> {
		debug_assert_eq!(self.nbits, 0, "read_bytes called without aligning first");
		let end = self.pos.checked_add(n).ok_or(DecompressError::Truncated)?;
		let out = self.data.get(self.pos..end).ok_or(DecompressError::Truncated)?;
		self.pos = end;
		Ok(out)
	}
}



/// # Canonical Huffman Decode Table.
///
/// `counts[len]` is the number of symbols with that code length;
/// `symbols` holds every symbol with a non-zero length, ordered first by
/// length then by symbol value (the same order canonical assignment
/// hands out codes in), so a decoded `(length, offset-within-length)`
/// pair is a direct index into it.
struct HuffTree {
	counts: [u16; MAXBITS + 1],
	symbols: Vec<u16>,
}

impl HuffTree {
	/// # Build From Code Lengths.
	fn build(lengths: &[u8]) -> Result<Self, DecompressError> {
		let mut counts = [0_u16; MAXBITS + 1];
		for &l in lengths {
			if usize::from(l) > MAXBITS { return Err(DecompressError::PayloadCorrupted); }
			if l > 0 { counts[usize::from(l)] += 1; }
		}

		let mut offsets = [0_u16; MAXBITS + 2];
		for len in 1..=MAXBITS { offsets[len + 1] = offsets[len] + counts[len]; }

		let mut symbols = vec![0_u16; offsets[MAXBITS + 1] as usize];
		for (sym, &l) in lengths.iter().enumerate() {
			if l > 0 {
				let off = &mut offsets[usize::from(l)];
				symbols[*off as usize] = sym as u16;
				*off += 1;
			}
		}

		Ok(Self { counts, symbols })
	}

	/// # Decode One Symbol.
	///
	/// Reads one bit at a time, extending a running code value MSB-first
	/// (`code = code << 1 | bit`) until it falls within the range of codes
	/// assigned to some length, exactly mirroring how `BitWriter::
	/// add_huffman_code` wrote it.
	fn decode(&self, reader: &mut BitReader<'_>) -> Result<u16, DecompressError> {
		let mut code: i32 = 0;
		let mut first: i32 = 0;
		let mut index: i32 = 0;

		for len in 1..=MAXBITS {
			code |= reader.read_bits(1)? as i32;
			let count = i32::from(self.counts[len]);
			if code - first < count {
				return self.symbols.get((index + (code - first)) as usize)
					.copied()
					.ok_or(DecompressError::PayloadCorrupted);
			}
			index += count;
			first += count;
			first <<= 1;
			code <<= 1;
		}

		Err(DecompressError::PayloadCorrupted)
	}
}



/// # Inflate a Raw RFC 1951 Stream.
///
/// No gzip/zlib framing is expected or consumed; see `crate::container`
/// for that layer.
pub(crate) fn inflate_raw(data: &[u8]) -> Result<Vec<u8>, DecompressError> {
	inflate_raw_counted(data).map(|(out, _)| out)
}

/// # Inflate a Raw RFC 1951 Stream, Reporting Bytes Consumed.
///
/// Identical to [`inflate_raw`], but also returns how many bytes of
/// `data` the stream occupied -- `crate::container` needs this to find
/// the gzip/zlib trailer that immediately follows the deflate payload
/// (and, for gzip, where the next concatenated member begins).
pub(crate) fn inflate_raw_counted(data: &[u8]) -> Result<(Vec<u8>, usize), DecompressError> {
	let mut reader = BitReader::new(data);
	let mut out = Vec::with_capacity(data.len().saturating_mul(3));

	loop {
		let is_final = reader.read_bits(1)? != 0;
		let btype = reader.read_bits(2)?;

		match btype {
			0b00 => inflate_stored(&mut reader, &mut out)?,
			0b01 => inflate_fixed(&mut reader, &mut out)?,
			0b10 => inflate_dynamic(&mut reader, &mut out)?,
			_ => return Err(DecompressError::PayloadCorrupted),
		}

		if is_final { break; }
	}

	Ok((out, reader.pos))
}

/// # Inflate a Stored (`BTYPE = 00`) Block.
fn inflate_stored(reader: &mut BitReader<'_>, out: &mut Vec<u8>) -> Result<(), DecompressError> {
	reader.align();
	let header = reader.read_bytes(4)?;
	let len = u16::from_le_bytes([header[0], header[1]]);
	let nlen = u16::from_le_bytes([header[2], header[3]]);
	if len != !nlen { return Err(DecompressError::PayloadCorrupted); }

	out.extend_from_slice(reader.read_bytes(usize::from(len))?);
	Ok(())
}

/// # Inflate a Fixed-Tree (`BTYPE = 01`) Block.
fn inflate_fixed(reader: &mut BitReader<'_>, out: &mut Vec<u8>) -> Result<(), DecompressError> {
	let ll_tree = HuffTree::build(&FIXED_TREE_LL)?;
	let d_tree = HuffTree::build(&FIXED_TREE_D)?;
	inflate_block_data(reader, out, &ll_tree, &d_tree)
}

/// # Inflate a Dynamic-Tree (`BTYPE = 10`) Block.
fn inflate_dynamic(reader: &mut BitReader<'_>, out: &mut Vec<u8>) -> Result<(), DecompressError> {
	let hlit = reader.read_bits(5)? as usize + 257;
	let hdist = reader.read_bits(5)? as usize + 1;
	let hclen = reader.read_bits(4)? as usize + 4;

	if hlit > ZOPFLI_NUM_LL || hdist > ZOPFLI_NUM_D { return Err(DecompressError::PayloadCorrupted); }

	let mut cl_lengths = [0_u8; 19];
	for &sym in CL_ORDER.iter().take(hclen) {
		cl_lengths[usize::from(sym)] = reader.read_bits(3)? as u8;
	}
	let cl_tree = HuffTree::build(&cl_lengths)?;

	let mut lengths = Vec::with_capacity(hlit + hdist);
	while lengths.len() < hlit + hdist {
		let sym = cl_tree.decode(reader)?;
		match sym {
			0..=15 => lengths.push(sym as u8),
			16 => {
				let &prev = lengths.last().ok_or(DecompressError::PayloadCorrupted)?;
				let repeat = reader.read_bits(2)? + 3;
				for _ in 0..repeat { lengths.push(prev); }
			},
			17 => {
				let repeat = reader.read_bits(3)? + 3;
				for _ in 0..repeat { lengths.push(0); }
			},
			18 => {
				let repeat = reader.read_bits(7)? + 11;
				for _ in 0..repeat { lengths.push(0); }
			},
			_ => return Err(DecompressError::PayloadCorrupted),
		}
	}
	if lengths.len() != hlit + hdist { return Err(DecompressError::PayloadCorrupted); }

	let ll_tree = HuffTree::build(&lengths[..hlit])?;
	let d_tree = HuffTree::build(&lengths[hlit..])?;
	inflate_block_data(reader, out, &ll_tree, &d_tree)
}

/// # Decode Literal/Length/Distance Tokens Until End-of-Block.
fn inflate_block_data(
	reader: &mut BitReader<'_>,
	out: &mut Vec<u8>,
	ll_tree: &HuffTree,
	d_tree: &HuffTree,
) -> Result<(), DecompressError> {
	loop {
		let sym = ll_tree.decode(reader)?;

		if sym < END_OF_BLOCK {
			out.push(sym as u8);
			continue;
		}
		if sym == END_OF_BLOCK { return Ok(()); }
		if sym > 285 { return Err(DecompressError::PayloadCorrupted); }

		let lextra = length_extra_bits(sym);
		let length = length_base(sym) + reader.read_bits(u32::from(lextra))? as u16;

		let dsym = d_tree.decode(reader)?;
		if dsym > 29 { return Err(DecompressError::PayloadCorrupted); }
		let dextra = distance_extra_bits(dsym);
		let distance = distance_base(dsym) + reader.read_bits(u32::from(dextra))? as u16;

		let distance = usize::from(distance);
		if distance == 0 || distance > out.len() { return Err(DecompressError::PayloadCorrupted); }

		let start = out.len() - distance;
		for i in 0..usize::from(length) {
			let byte = out[start + i];
			out.push(byte);
		}
	}
}



#[cfg(test)]
mod test {
	use super::*;
	use crate::{deflate, options::Options};

	fn roundtrip(data: &[u8]) {
		let compressed = deflate::compress(&Options::new(), data).unwrap();
		let out = inflate_raw(&compressed).unwrap();
		assert_eq!(out, data);
	}

	#[test]
	fn t_roundtrip_empty() { roundtrip(b""); }

	#[test]
	fn t_roundtrip_short_literal() { roundtrip(b"hi"); }

	#[test]
	fn t_roundtrip_repetitive() {
		roundtrip(b"the quick brown fox jumps over the lazy dog. the quick brown fox.".repeat(8).as_slice());
	}

	#[test]
	fn t_roundtrip_binary() {
		let data: Vec<u8> = (0..=255_u8).cycle().take(5000).collect();
		roundtrip(&data);
	}

	#[test]
	fn t_truncated_input_is_an_error() {
		let compressed = deflate::compress(&Options::new(), b"hello world, this is a test").unwrap();
		let truncated = &compressed[..compressed.len() / 2];
		assert!(inflate_raw(truncated).is_err());
	}

	#[test]
	fn t_bad_stored_nlen_is_corrupted() {
		// BFINAL=1, BTYPE=00, then LEN=5 NLEN=5 (should be !LEN).
		let bytes = [0b0000_0001_u8, 5, 0, 5, 0, 1, 2, 3, 4, 5];
		assert!(matches!(inflate_raw(&bytes), Err(DecompressError::PayloadCorrupted)));
	}
}
