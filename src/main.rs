//! aspectdb binary entry point
//!
//! Parsing, dispatch, boot, and serving all live in the library's
//! `cli` module; this shim only renders a failed command to stderr
//! and sets the exit status. Keeping main this thin means integration
//! tests exercise the exact code path the binary runs.

use aspectdb::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
