/*!
# Zopgz Core: Errors.

Two independent error universes, per §7/§4.8: the compressor has no
recoverable errors (violations are programming faults caught by debug
assertions), while the inflater reports four well-defined error kinds.
*/

#[cfg(debug_assertions)]
use std::fmt;
use std::fmt as stdfmt;



#[cfg(not(debug_assertions))]
/// # Core Error (Release).
///
/// The core encoder has no recoverable errors (§7); internal invariant
/// checks use `Result` the way conditionally-panicking assertions would.
/// In release builds the error carries no payload — callers that somehow
/// observe one have hit a bug, not a runtime condition.
pub(crate) type ZopfliError = ();

#[cfg(debug_assertions)]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Core Error (Debug).
///
/// Under `debug_assertions`, an invariant failure carries its source
/// location so it can be tracked down; the caller is expected to
/// `.expect()` or `panic!` on it rather than handle it, since by
/// construction it should never occur.
pub(crate) struct ZopfliError {
	/// # Source File.
	file: &'static str,

	/// # Source Line.
	line: u32,
}

#[cfg(debug_assertions)]
impl ZopfliError {
	/// # New Error.
	pub(crate) const fn new(file: &'static str, line: u32) -> Self {
		Self { file, line }
	}
}

#[cfg(debug_assertions)]
impl fmt::Display for ZopfliError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!(
			"zopgz-core BUG: invariant failed at {}:{}",
			self.file,
			self.line,
		))
	}
}

#[cfg(debug_assertions)]
/// # Error Macro (Debug).
macro_rules! zopfli_error { () => ($crate::error::ZopfliError::new(file!(), line!())); }

#[cfg(not(debug_assertions))]
/// # Error Macro (Release).
macro_rules! zopfli_error { () => (()); }

pub(crate) use zopfli_error;



#[derive(Debug)]
/// # Decompression Error.
///
/// The inflater's four error kinds, per §7. The CLI maps each to a
/// diagnostic and a non-zero exit code.
pub enum DecompressError {
	/// # Header Malformed.
	///
	/// The gzip/zlib magic or flag bytes are not well-formed, or a field
	/// (e.g. the zlib mod-31 check) fails validation.
	HeaderMalformed,

	/// # Payload Corrupted.
	///
	/// The DEFLATE bitstream is structurally invalid (bad block type, a
	/// Huffman code that doesn't form a valid prefix tree, a back-reference
	/// distance larger than the data decoded so far, ...), or a trailer
	/// checksum/length did not match the decompressed payload.
	PayloadCorrupted,

	/// # Truncated.
	///
	/// The input ended before a complete header, payload, or trailer could
	/// be read.
	Truncated,

	/// # I/O Error.
	Io(std::io::Error),
}

impl From<std::io::Error> for DecompressError {
	fn from(err: std::io::Error) -> Self { Self::Io(err) }
}

impl stdfmt::Display for DecompressError {
	fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
		match self {
			Self::HeaderMalformed => f.write_str("malformed header"),
			Self::PayloadCorrupted => f.write_str("corrupted payload"),
			Self::Truncated => f.write_str("truncated input"),
			Self::Io(e) => write!(f, "I/O error: {e}"),
		}
	}
}

impl std::error::Error for DecompressError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Io(e) => Some(e),
			_ => None,
		}
	}
}
