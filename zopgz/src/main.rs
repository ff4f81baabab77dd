/*!
# Zopgz

A gzip-compatible CLI built on an iterative (Zopfli-style) DEFLATE
recompressor: it reads one or more files (or stdin) and writes smaller,
byte-for-byte standards-conformant `.gz`/`.zlib` output than ordinary
`gzip(1)`, at the cost of substantially more CPU time.
*/

#![warn(clippy::filetype_is_file)]
#![warn(clippy::integer_division)]
#![warn(clippy::needless_borrow)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![warn(clippy::perf)]
#![warn(clippy::suboptimal_flops)]
#![warn(clippy::unneeded_field_pattern)]
#![warn(macro_use_extern_crate)]
#![warn(missing_copy_implementations)]
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(non_ascii_idents)]
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unreachable_pub)]
#![warn(unused_crate_dependencies)]
#![warn(unused_extern_crates)]
#![warn(unused_import_braces)]

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

mod cli;
mod error;
mod opts;

use fyi_msg::Msg;
use std::process::ExitCode;

fn main() -> ExitCode {
	// `-h`/`--help` and `-V`/`--version` are wired into `Argue` itself
	// (`with_help`/`with_version` in `opts::Opts::parse`), matching the
	// teacher's own `main.rs`: they short-circuit parsing before any other
	// argument is even looked at, so there's nothing to pre-scan for here.
	let opts = match opts::Opts::parse() {
		Ok(o) => o,
		Err(e) => {
			Msg::custom("Error", 1, &e.to_string()).eprint();
			return ExitCode::from(e.exit_code() as u8);
		},
	};

	ExitCode::from(cli::run(&opts) as u8)
}

#[cold]
/// # Print Help.
///
/// Passed to `Argue::with_help`; it takes the (sub)command the user asked
/// help for, which this CLI has no use for since it has none.
pub(crate) fn helper(_: Option<&str>) {
	Msg::from(format!(
		r"Zopgz v{}
{}

USAGE:
    zopgz [FLAGS] [OPTIONS] [PATH(s)...]

FLAGS:
    -c, --stdout        Write output to STDOUT; leave source file(s) untouched.
    -d, --decompress     Decompress rather than compress the given file(s).
    -f, --force          Overwrite existing outputs and allow writing to a terminal.
    -h, --help           Print this help screen and exit.
    -k, --keep           Keep (don't delete) the source file(s) after compressing.
    -n, --no-name        Do not store the original file name (default).
    -N, --name           Store (or restore) the original file name.
    -q, --quiet          Suppress all non-error output.
    -v, --verbose        Print per-file compression statistics.
    -V, --version        Print version information and exit.

OPTIONS:
    -S, --suffix <SUF>   Use <SUF> instead of .gz as the compressed-file suffix.

LEVELS:
    -1, --fast           Fewest iterations (fastest, largest output).
    -9, --best           Most iterations (slowest, smallest output). This is the default.

ARGS:
    <PATH(s)...>         One or more file paths to (de)compress; '-' or no path reads STDIN.
",
		env!("CARGO_PKG_VERSION"),
		env!("CARGO_PKG_DESCRIPTION"),
	)).print();
}
