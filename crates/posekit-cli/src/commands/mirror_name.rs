//! Mirror-name command implementation
//!
//! Prints the opposite-side name of each control.

use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;

use posekit_core::{is_central, mirror_name};

/// Run the mirror-name command
pub fn run(names: &[String]) -> Result<ExitCode> {
    for name in names {
        if is_central(name) {
            println!("{} {}", name, "(central)".dimmed());
        } else {
            println!("{} {} {}", name, "->".green(), mirror_name(name));
        }
    }
    Ok(ExitCode::SUCCESS)
}
