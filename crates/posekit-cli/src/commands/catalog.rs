//! Catalog command implementations
//!
//! Lists projects, categories and poses, and creates categories.

use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;

use crate::catalog::{filter_entries, Catalog};
use crate::config::Library;

/// Run the list command
///
/// Lists the poses of one category, or of every category when none is given.
pub fn run_list(
    library: &Library,
    category: Option<&str>,
    filter: Option<&str>,
) -> Result<ExitCode> {
    let catalog = Catalog::new(&library.store);
    let entries = match category {
        Some(category) => catalog.poses(&library.project, category),
        None => catalog.all_poses(&library.project),
    };
    let entries = filter_entries(entries, filter.unwrap_or(""));

    println!(
        "{} {}",
        "Poses in".cyan().bold(),
        library.project.cyan().bold()
    );
    if entries.is_empty() {
        println!("  {}", "(none)".dimmed());
        return Ok(ExitCode::SUCCESS);
    }
    for entry in &entries {
        let kind = if entry.is_partial() {
            "partial".yellow()
        } else {
            "full".green()
        };
        println!("  {:<8} {}/{}", kind, entry.category, entry.name);
    }
    println!("{} pose(s)", entries.len());
    Ok(ExitCode::SUCCESS)
}

/// Run the categories command
pub fn run_categories(library: &Library) -> Result<ExitCode> {
    let catalog = Catalog::new(&library.store);
    println!(
        "{} {}",
        "Categories in".cyan().bold(),
        library.project.cyan().bold()
    );
    for category in catalog.categories(&library.project) {
        println!("  {} {}", "->".green(), category);
    }
    Ok(ExitCode::SUCCESS)
}

/// Run the projects command
pub fn run_projects(library: &Library) -> Result<ExitCode> {
    let catalog = Catalog::new(&library.store);
    println!(
        "{} {}",
        "Projects in".cyan().bold(),
        library.store.root().display()
    );
    for project in catalog.projects() {
        let marker = if project == library.project { "*" } else { " " };
        println!("  {} {}", marker.green(), project);
    }
    Ok(ExitCode::SUCCESS)
}

/// Run the add-category command
pub fn run_add_category(library: &Library, name: &str) -> Result<ExitCode> {
    let catalog = Catalog::new(&library.store);
    let dir = catalog.add_category(&library.project, name)?;
    println!("{} Created: {}", "SUCCESS".green().bold(), dir.display());
    Ok(ExitCode::SUCCESS)
}
