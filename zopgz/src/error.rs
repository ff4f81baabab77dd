/*!
# Zopgz: Errors.

Two kinds, matching the exit codes `SPEC_FULL.md` §6 requires: an
[`CliError::Arg`] aborts the whole run with exit code 2 before any file is
touched, while every other variant is a single file's operational failure
(exit code 1) that the CLI reports and then continues past, per §7's
"maps each [decompression error kind] to a diagnostic and a non-zero exit
code, continuing with remaining files when possible."
*/

use std::{
	fmt,
	path::PathBuf,
};
use zopgz_core::DecompressError;

#[derive(Debug)]
/// # CLI Error.
pub(crate) enum CliError {
	/// # Bad Argument(s).
	///
	/// Exit code 2; aborts immediately, no files are processed.
	Arg(String),

	/// # Source Is a Directory.
	IsDirectory(PathBuf),

	/// # Source Vanished or Couldn't Be Opened/Read.
	Read(PathBuf, std::io::Error),

	/// # Destination Couldn't Be Written.
	Write(PathBuf, std::io::Error),

	/// # Destination Already Exists.
	Exists(PathBuf),

	/// # Refusing to Write Compressed Bytes to a Terminal.
	Terminal,

	/// # Decompression Failed.
	Decompress(PathBuf, DecompressError),

	/// # `-r`/`--recursive` Was Given.
	///
	/// Listed in §6's flag surface precisely so it can be rejected with a
	/// diagnostic rather than silently ignored or misinterpreted.
	Recursive,
}

impl fmt::Display for CliError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Arg(msg) => write!(f, "{msg}"),
			Self::IsDirectory(p) => write!(f, "{}: is a directory", p.display()),
			Self::Read(p, e) => write!(f, "{}: {e}", p.display()),
			Self::Write(p, e) => write!(f, "{}: {e}", p.display()),
			Self::Exists(p) => write!(f, "{}: already exists; use -f to overwrite", p.display()),
			Self::Terminal => f.write_str("compressed data not written to a terminal (use -f to force)"),
			Self::Decompress(p, e) => write!(f, "{}: {e}", p.display()),
			Self::Recursive => f.write_str("-r/--recursive is not supported"),
		}
	}
}

impl std::error::Error for CliError {}

impl CliError {
	#[must_use]
	/// # Exit Code.
	///
	/// 2 for a bad argument, 1 for everything else (an operational
	/// failure on one file, per §6).
	pub(crate) const fn exit_code(&self) -> i32 {
		match self {
			Self::Arg(_) | Self::Recursive => 2,
			_ => 1,
		}
	}
}
