// These Clippy lints are disabled because this is a CLI binary, not a library:
// - print_stderr: the top-level error is reported on stderr.
// - exit: Calling `std::process::exit()` is standard for CLI apps to signal failure to the shell.
#![allow(clippy::print_stderr, clippy::exit)]

fn main() {
    if let Err(e) = rule_intel_cli::cli::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
