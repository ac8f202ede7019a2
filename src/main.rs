//! # lookalike CLI
//!
//! Command-line interface for visual product search.
//!
//! ## Usage
//! ```bash
//! lookalike search photo.jpg --min-score 70
//! lookalike search --url https://example.com/shoe.jpg --output json
//! ```

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            cli::print_error(&e);
            ExitCode::FAILURE
        }
    }
}
