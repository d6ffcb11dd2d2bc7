//! The `translate` command: debug aid for dialect translation.

use jcdiff::{CommandLine, translate};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS};

pub fn cmd_translate(options: &str, release: Option<&str>) -> i32 {
    match translate(&CommandLine::parse(options), release) {
        Ok(line) => {
            println!("{line}");
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            EXIT_FAILURE
        }
    }
}
