//! Small pieces shared by the `ufs` command line tools.

pub mod util;

use std::fmt;
use std::process::exit;

/// Prints an error prefixed with the program's name, then exits with status `1`.
///
/// This is the common failure path for every `ufs` tool: none of them try to recover
/// from a misuse or a disk error, they just report it on stderr.
pub fn error(prog: &str, msg: impl fmt::Display) -> ! {
	eprintln!("{prog}: {msg}");
	exit(1);
}
