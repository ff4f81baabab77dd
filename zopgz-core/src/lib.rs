/*!
# Zopgz Core

An iterative ([Zopfli](https://github.com/google/zopfli)-style) DEFLATE
recompressor, plus a small standards-conformant gzip/zlib/raw-deflate
inflater.

The compressor ([`compress`]) is the crate's reason for existing: rather
than emit a single greedy parse the way ordinary `deflate` encoders do, it
repeatedly re-encodes the same input against progressively better-fitted
Huffman statistics (`deflate::optimizer`), builds length-limited prefix
codes via the boundary package-merge algorithm (`deflate::katajainen`),
and searches for good block boundaries (`deflate::splitter`) -- trading
(substantially) more CPU time for a smaller, still strictly
standards-conformant, output. The inflater ([`decompress`] and friends) is
an ordinary decoder; it exists so round-trip correctness can be verified
without depending on an external zlib build.
*/

#![deny(unsafe_code)]

#![warn(
	clippy::filetype_is_file,
	clippy::integer_division,
	clippy::needless_borrow,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::suboptimal_flops,
	clippy::unneeded_field_pattern,
	macro_use_extern_crate,
	missing_copy_implementations,
	missing_debug_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unreachable_pub,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(
	clippy::module_name_repetitions,
	clippy::redundant_pub_crate,
)]

mod container;
mod deflate;
mod error;
mod inflate;
mod options;

pub use container::GzipHeader;
pub use error::DecompressError;
pub use options::{BlockSplit, Container, Options};



#[must_use]
/// # Compress.
///
/// Runs the iterative DEFLATE recompressor (§4.6 of `SPEC_FULL.md`) over
/// `input` and frames the result per `options.container()`. Infallible
/// given a valid `Options` record (§7): there is no input for which this
/// can fail short of a bug in the encoder itself, which would surface as
/// a debug-build panic rather than a return value, per `error::ZopfliError`'s
/// contract.
///
/// ```
/// use zopgz_core::Options;
///
/// let out = zopgz_core::compress(&Options::new(), b"hello, hello, hello");
/// assert!(out.starts_with(&[0x1F, 0x8B])); // gzip magic
/// ```
pub fn compress(options: &Options, input: &[u8]) -> Vec<u8> {
	container::compress(options, input)
		.unwrap_or_else(|e| panic!("zopgz-core BUG: {e}"))
}

/// # Decompress (Auto-Detect Container).
///
/// Sniffs `input`'s magic bytes to pick gzip or zlib framing (raw DEFLATE
/// cannot be auto-detected, since it has no magic of its own; call
/// [`decompress_raw`] directly if that's what you have) and returns the
/// decompressed payload.
///
/// # Errors
///
/// Returns [`DecompressError`] on any of the four kinds described in §7:
/// a malformed header, a corrupted payload, a truncated input, or an I/O
/// error (not applicable to this in-memory entry point, but part of the
/// shared error type used by the CLI's file-backed callers).
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, DecompressError> {
	container::decompress(input)
}

/// # Decompress One or More Concatenated Gzip Members.
///
/// Returns the combined decompressed bytes plus one [`GzipHeader`] per
/// member found, in file order (RFC 1952 §2.2 permits concatenation).
///
/// # Errors
///
/// See [`decompress`].
pub fn decompress_gzip(input: &[u8]) -> Result<(Vec<u8>, Vec<GzipHeader>), DecompressError> {
	container::gunzip(input)
}

/// # Decompress a Zlib (RFC 1950) Stream.
///
/// # Errors
///
/// See [`decompress`].
pub fn decompress_zlib(input: &[u8]) -> Result<Vec<u8>, DecompressError> {
	container::unzlib(input)
}

/// # Decompress a Raw DEFLATE (RFC 1951) Stream, No Framing.
///
/// # Errors
///
/// See [`decompress`].
pub fn decompress_raw(input: &[u8]) -> Result<Vec<u8>, DecompressError> {
	inflate::inflate_raw(input)
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_public_roundtrip_gzip() {
		let data = b"the quick brown fox jumps over the lazy dog, over and over and over.";
		let out = compress(&Options::new(), data);
		let (decoded, headers) = decompress_gzip(&out).unwrap();
		assert_eq!(decoded, data);
		assert_eq!(headers.len(), 1);
	}

	#[test]
	fn t_public_roundtrip_auto_detect() {
		let data = b"auto-detected container round trip";
		let gz = compress(&Options::new().with_container(Container::Gzip), data);
		let zl = compress(&Options::new().with_container(Container::Zlib), data);
		assert_eq!(decompress(&gz).unwrap(), data);
		assert_eq!(decompress(&zl).unwrap(), data);
	}

	#[test]
	fn t_public_raw_roundtrip() {
		let data = b"no framing at all";
		let out = compress(&Options::new().with_container(Container::Raw), data);
		assert_eq!(decompress_raw(&out).unwrap(), data);
	}

	#[test]
	fn t_empty_input_scenario() {
		// Spec §8 scenario 1: empty gzip payload is exactly 20 bytes and
		// decompresses to empty.
		let out = compress(&Options::new(), b"");
		assert_eq!(out.len(), 20);
		let (decoded, _) = decompress_gzip(&out).unwrap();
		assert!(decoded.is_empty());
	}

	#[test]
	fn t_single_byte_scenario() {
		// Spec §8 scenario 2.
		let out = compress(&Options::new(), b"A");
		let (decoded, _) = decompress_gzip(&out).unwrap();
		assert_eq!(decoded, b"A");
		assert_eq!(crc32fast::hash(b"A"), 0xD3D9_9E8B);
	}
}
