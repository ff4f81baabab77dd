/*!
# Zopgz Core: Container Framing (Component I).

Wraps (or unwraps) the raw RFC 1951 DEFLATE payload produced by
[`crate::deflate`] with a gzip (RFC 1952) or zlib (RFC 1950) header and
trailer. This module owns both directions: `compress` builds the framed
output the public [`crate::compress`] entry point returns, and the
`gunzip`/`unzlib`/`decompress` functions are the inflater's member-aware
front door (§4.10 of `SPEC_FULL.md`), grounded on
`examples/original_source/src/ungzlib.c`'s header-parsing shape
(`ungzlib_parse_header`'s magic sniff, `ungzlib_process_all`'s
member loop) reimplemented in safe Rust rather than linked against zlib.
*/

use crate::{
	deflate,
	error::{DecompressError, ZopfliError},
	options::{Container, Options},
};

/// # Gzip Magic Bytes (RFC 1952 §2.3.1).
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// # Deflate Compression Method (Both Containers).
const CM_DEFLATE: u8 = 8;

/// # FNAME Flag Bit (Gzip `FLG`).
const FLG_FNAME: u8 = 0x08;

/// # FEXTRA Flag Bit (Gzip `FLG`).
const FLG_FEXTRA: u8 = 0x04;

/// # FCOMMENT Flag Bit (Gzip `FLG`).
const FLG_FCOMMENT: u8 = 0x10;

/// # FHCRC Flag Bit (Gzip `FLG`).
const FLG_FHCRC: u8 = 0x02;

/// # A Single Parsed Gzip Member's Header Fields.
///
/// Mirrors `SPEC_FULL.md` §3's `GzipMember` record. The payload itself is
/// not stored here; `gunzip` appends each member's decompressed bytes
/// directly to the caller's output buffer and returns one header per
/// member found.
#[derive(Debug, Clone, Default)]
pub struct GzipHeader {
	/// # Modification Time (Seconds Since Epoch, 0 = Unknown).
	pub mtime: u32,

	/// # Extra Flags Byte (`XFL`).
	pub extra_flags: u8,

	/// # Operating System Byte (`OS`).
	pub os: u8,

	/// # Optional Extra Field (`FEXTRA`).
	pub extra: Option<Vec<u8>>,

	/// # Optional Original Filename (`FNAME`), NUL-Stripped.
	pub name: Option<String>,

	/// # Optional Comment (`FCOMMENT`), NUL-Stripped.
	pub comment: Option<String>,

	/// # Optional Header CRC16 (`FHCRC`), Not Verified on Read.
	pub header_crc16: Option<u16>,
}

/// # Frame a Raw DEFLATE Payload.
///
/// Dispatches on `options.container()`; `Container::Raw` returns the
/// payload unwrapped, matching the public API's "no container" mode.
pub(crate) fn compress(options: &Options, data: &[u8]) -> Result<Vec<u8>, ZopfliError> {
	let payload = deflate::compress(options, data)?;
	Ok(match options.container() {
		Container::Gzip => gzip_wrap(options, data, &payload),
		Container::Zlib => zlib_wrap(data, &payload),
		Container::Raw => payload,
	})
}

/// # Wrap a Payload in a Gzip (RFC 1952) Frame.
///
/// Emits the fixed 10-byte header plus, when a name was requested, the
/// `FNAME` field; `FEXTRA`/`FCOMMENT`/`FHCRC` are never written on
/// compression (§6 of `SPEC_FULL.md` -- this encoder only ever produces
/// what it itself needs to round-trip, it doesn't try to reproduce every
/// field another encoder might have written).
fn gzip_wrap(options: &Options, data: &[u8], payload: &[u8]) -> Vec<u8> {
	let has_name = options.name().is_some();
	let mut out = Vec::with_capacity(10 + payload.len() + 8 + options.name().map_or(0, |n| n.len() + 1));

	out.extend_from_slice(&GZIP_MAGIC);
	out.push(CM_DEFLATE);
	out.push(if has_name { FLG_FNAME } else { 0 });
	out.extend_from_slice(&options.mtime().to_le_bytes());
	out.push(2); // XFL: "maximum compression" per RFC 1952, conventional for slow/best encoders.
	out.push(3); // OS: 3 = Unix, matching the CLI's Linux-only target (SPEC_FULL.md §4.11).

	if let Some(name) = options.name() {
		out.extend_from_slice(name.as_bytes());
		out.push(0);
	}

	out.extend_from_slice(payload);
	out.extend_from_slice(&crc32fast::hash(data).to_le_bytes());
	out.extend_from_slice(&(data.len() as u32).to_le_bytes());
	out
}

/// # Wrap a Payload in a Zlib (RFC 1950) Frame.
fn zlib_wrap(data: &[u8], payload: &[u8]) -> Vec<u8> {
	let mut out = Vec::with_capacity(2 + payload.len() + 4);
	out.extend_from_slice(&zlib_header());
	out.extend_from_slice(payload);
	out.extend_from_slice(&adler32_of(data).to_be_bytes());
	out
}

/// # Build a Valid Zlib Header.
///
/// `CMF` = `0x78` (CM=8 deflate, CINFO=7 → 32K window, the conventional
/// value every zlib encoder emits); `FLG`'s low 5 bits are chosen so the
/// big-endian 16-bit header is an exact multiple of 31 (the "mod-31"
/// check, RFC 1950 §2.2), with `FDICT` unset and `FLEVEL` set to 3
/// ("maximum compression, slowest algorithm").
const fn zlib_header() -> [u8; 2] {
	let cmf: u8 = 0x78;
	let flevel: u8 = 3;
	let mut flg = flevel << 6;
	let check = ((cmf as u16) << 8 | flg as u16) % 31;
	if check != 0 { flg += (31 - check) as u8; }
	[cmf, flg]
}

/// # Adler-32 of a Buffer.
fn adler32_of(data: &[u8]) -> u32 {
	adler32::adler32(data).unwrap_or(1)
}



/// # Sniff and Decompress Auto-Detected Container.
///
/// Mirrors `ungzlib_parse_header`'s magic sniff: `0x1F 0x8B` is gzip,
/// `0x78` with a valid mod-31 `FLG` is zlib, anything else is
/// [`DecompressError::HeaderMalformed`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, DecompressError> {
	if data.len() >= 2 && data[0..2] == GZIP_MAGIC {
		return gunzip(data).map(|(out, _)| out);
	}
	if data.len() >= 2 && data[0] == 0x78 && u16::from_be_bytes([data[0], data[1]]) % 31 == 0 {
		return unzlib(data);
	}
	Err(DecompressError::HeaderMalformed)
}

/// # Decompress One or More Concatenated Gzip Members.
///
/// A `.gz` file may concatenate several independent gzip streams back to
/// back (RFC 1952 §2.2); each is decoded and its output appended, matching
/// `ungzlib_process_all`'s member loop. Returns the combined decompressed
/// bytes plus one [`GzipHeader`] per member, in file order.
pub fn gunzip(data: &[u8]) -> Result<(Vec<u8>, Vec<GzipHeader>), DecompressError> {
	let mut out = Vec::new();
	let mut headers = Vec::new();
	let mut pos = 0;

	while pos < data.len() {
		let (header, payload_start) = parse_gzip_header(&data[pos..])?;
		let member_start = pos + payload_start;

		let before = out.len();
		let consumed = deflate_into(&data[member_start..], &mut out)?;
		let payload_len = out.len() - before;

		let trailer_start = member_start + consumed;
		let trailer = data.get(trailer_start..trailer_start + 8).ok_or(DecompressError::Truncated)?;
		let crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
		let isize = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);

		if crc32fast::hash(&out[before..]) != crc { return Err(DecompressError::PayloadCorrupted); }
		if payload_len as u32 != isize { return Err(DecompressError::PayloadCorrupted); }

		headers.push(header);
		pos = trailer_start + 8;
	}

	if headers.is_empty() { return Err(DecompressError::Truncated); }
	Ok((out, headers))
}

/// # Decompress a Single Zlib (RFC 1950) Stream.
pub fn unzlib(data: &[u8]) -> Result<Vec<u8>, DecompressError> {
	if data.len() < 2 { return Err(DecompressError::Truncated); }
	let cmf = data[0];
	let flg = data[1];

	if cmf & 0x0F != CM_DEFLATE { return Err(DecompressError::HeaderMalformed); }
	if u16::from_be_bytes([cmf, flg]) % 31 != 0 { return Err(DecompressError::HeaderMalformed); }
	if flg & 0x20 != 0 { return Err(DecompressError::HeaderMalformed); } // FDICT unsupported.

	let mut out = Vec::new();
	let consumed = deflate_into(&data[2..], &mut out)?;

	let trailer_start = 2 + consumed;
	let trailer = data.get(trailer_start..trailer_start + 4).ok_or(DecompressError::Truncated)?;
	let adler = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
	if adler32_of(&out) != adler { return Err(DecompressError::PayloadCorrupted); }

	Ok(out)
}

/// # Inflate a Raw Deflate Stream, Reporting Bytes Consumed.
///
/// The inflater itself (`crate::inflate`) doesn't report how many input
/// bytes it consumed (it assumes the caller already sliced exactly one
/// member's payload); the container layer needs that to find the trailer
/// that follows, so it re-derives the consumed length here by re-running
/// the bit reader's position bookkeeping via a thin wrapper.
fn deflate_into(data: &[u8], out: &mut Vec<u8>) -> Result<usize, DecompressError> {
	let (bytes, consumed) = crate::inflate::inflate_raw_counted(data)?;
	out.extend_from_slice(&bytes);
	Ok(consumed)
}

/// # Parse a Gzip Header, Returning the Parsed Fields and the Payload's Start Offset.
fn parse_gzip_header(data: &[u8]) -> Result<(GzipHeader, usize), DecompressError> {
	if data.len() < 10 { return Err(DecompressError::Truncated); }
	if data[0..2] != GZIP_MAGIC { return Err(DecompressError::HeaderMalformed); }
	if data[2] != CM_DEFLATE { return Err(DecompressError::HeaderMalformed); }

	let flg = data[3];
	let mtime = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
	let extra_flags = data[8];
	let os = data[9];
	let mut pos = 10;

	let mut header = GzipHeader { mtime, extra_flags, os, ..GzipHeader::default() };

	if flg & FLG_FEXTRA != 0 {
		let xlen = *data.get(pos).ok_or(DecompressError::Truncated)? as usize
			| (*data.get(pos + 1).ok_or(DecompressError::Truncated)? as usize) << 8;
		pos += 2;
		let extra = data.get(pos..pos + xlen).ok_or(DecompressError::Truncated)?;
		header.extra = Some(extra.to_vec());
		pos += xlen;
	}

	if flg & FLG_FNAME != 0 {
		let (name, next) = read_cstring(data, pos)?;
		header.name = Some(name);
		pos = next;
	}

	if flg & FLG_FCOMMENT != 0 {
		let (comment, next) = read_cstring(data, pos)?;
		header.comment = Some(comment);
		pos = next;
	}

	if flg & FLG_FHCRC != 0 {
		let crc16 = data.get(pos..pos + 2).ok_or(DecompressError::Truncated)?;
		header.header_crc16 = Some(u16::from_le_bytes([crc16[0], crc16[1]]));
		pos += 2;
	}

	Ok((header, pos))
}

/// # Read a NUL-Terminated String, Returning It (Lossy) Plus the Offset Past the NUL.
fn read_cstring(data: &[u8], start: usize) -> Result<(String, usize), DecompressError> {
	let rel = data[start..].iter().position(|&b| b == 0).ok_or(DecompressError::Truncated)?;
	let s = String::from_utf8_lossy(&data[start..start + rel]).into_owned();
	Ok((s, start + rel + 1))
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_zlib_header_is_mod31() {
		let hdr = zlib_header();
		assert_eq!(u16::from_be_bytes(hdr) % 31, 0);
		assert_eq!(hdr[0], 0x78);
	}

	#[test]
	fn t_gzip_roundtrip_empty() {
		let out = compress(&Options::new(), b"").unwrap();
		// Spec §8 scenario 1: 10-byte header + 2-byte empty fixed block +
		// 4-byte CRC32 + 4-byte ISIZE = 20 bytes exactly.
		assert_eq!(out.len(), 20);

		let (data, headers) = gunzip(&out).unwrap();
		assert!(data.is_empty());
		assert_eq!(headers.len(), 1);
	}

	#[test]
	fn t_gzip_single_byte_matches_spec_scenario_2() {
		let out = compress(&Options::new(), b"A").unwrap();
		let (data, _) = gunzip(&out).unwrap();
		assert_eq!(data, b"A");
		assert_eq!(crc32fast::hash(b"A"), 0xD3D9_9E8B);

		let isize = u32::from_le_bytes(out[out.len() - 4..].try_into().unwrap());
		assert_eq!(isize, 1);
	}

	#[test]
	fn t_gzip_roundtrip_with_name() {
		let opts = Options::new()
			.with_name(Some("hello.txt".to_string()))
			.with_iterations(std::num::NonZeroU32::new(2).unwrap());
		let out = compress(&opts, b"hello world, hello world").unwrap();
		let (data, headers) = gunzip(&out).unwrap();
		assert_eq!(data, b"hello world, hello world");
		assert_eq!(headers[0].name.as_deref(), Some("hello.txt"));
	}

	#[test]
	fn t_zlib_roundtrip() {
		let opts = Options::new()
			.with_container(Container::Zlib)
			.with_iterations(std::num::NonZeroU32::new(2).unwrap());
		let out = compress(&opts, b"the quick brown fox jumps over the lazy dog").unwrap();
		let data = unzlib(&out).unwrap();
		assert_eq!(data, b"the quick brown fox jumps over the lazy dog");
	}

	#[test]
	fn t_decompress_auto_detects_gzip() {
		let out = compress(&Options::new(), b"auto-detect me").unwrap();
		let data = decompress(&out).unwrap();
		assert_eq!(data, b"auto-detect me");
	}

	#[test]
	fn t_decompress_auto_detects_zlib() {
		let opts = Options::new().with_container(Container::Zlib);
		let out = compress(&opts, b"auto-detect me too").unwrap();
		let data = decompress(&out).unwrap();
		assert_eq!(data, b"auto-detect me too");
	}

	#[test]
	fn t_decompress_rejects_garbage() {
		assert!(matches!(decompress(&[0, 1, 2, 3]), Err(DecompressError::HeaderMalformed)));
	}

	#[test]
	fn t_concatenated_members() {
		let a = compress(&Options::new(), b"first member").unwrap();
		let b = compress(&Options::new(), b"second member").unwrap();
		let mut both = a;
		both.extend_from_slice(&b);

		let (data, headers) = gunzip(&both).unwrap();
		assert_eq!(data, b"first membersecond member");
		assert_eq!(headers.len(), 2);
	}

	#[test]
	fn t_bad_crc_is_corrupted() {
		let mut out = compress(&Options::new(), b"integrity check").unwrap();
		let n = out.len();
		out[n - 8] ^= 0xFF; // Flip a bit in the CRC32 trailer.
		assert!(matches!(gunzip(&out), Err(DecompressError::PayloadCorrupted)));
	}
}
