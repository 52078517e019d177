//! PoseKit CLI - Command-line interface for rig pose libraries
//!
//! This binary saves poses from JSON rig scenes into a pose library, applies
//! them back (exactly, to the selection or as an overlay), mirrors them and
//! manages the library's categories.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

// Use modules from the library crate
use posekit_cli::commands;
use posekit_cli::commands::apply::ModeArg;
use posekit_cli::config::PosekitConfig;

/// PoseKit - Pose library for articulated character rigs
#[derive(Parser)]
#[command(name = "posekit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pose library root (overrides POSEKIT_LIBRARY and the config file)
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// Project inside the library (default: favorite_project from the config file)
    #[arg(long, global = true)]
    project: Option<String>,

    /// Config file (default: <config dir>/posekit/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the pose of a scene and save it
    Save {
        /// Pose name
        name: String,

        /// Scene file to capture
        #[arg(short, long)]
        scene: PathBuf,

        /// Category (default: default_category from the config file)
        #[arg(short, long)]
        category: Option<String>,

        /// Record only the selected controls (saved as a partial pose)
        #[arg(long)]
        selection: bool,

        /// Save even if space switches are outside their default space
        #[arg(long)]
        skip_space_check: bool,

        /// Overwrite an existing pose
        #[arg(short, long)]
        force: bool,

        /// Clear the read-only bit on blocked files and retry
        #[arg(long)]
        make_writable: bool,
    },

    /// Apply a saved pose to a scene
    Apply {
        /// Pose name or path to a pose file
        pose: String,

        /// Scene file to pose
        #[arg(short, long)]
        scene: PathBuf,

        /// Category of a named pose
        #[arg(short, long)]
        category: Option<String>,

        /// How the pose is applied
        #[arg(short, long, value_enum, default_value = "exact")]
        mode: ModeArg,

        /// Apply the pose mirrored left/right
        #[arg(long)]
        mirror: bool,
    },

    /// Paste a saved pose onto the opposite side of a scene
    PasteOpposite {
        /// Pose name or path to a pose file
        pose: String,

        /// Scene file to pose
        #[arg(short, long)]
        scene: PathBuf,

        /// Category of a named pose
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Build a ghost of a saved pose and snap the rig onto it
    Ghost {
        /// Pose name or path to a pose file
        pose: String,

        /// Scene file to pose
        #[arg(short, long)]
        scene: PathBuf,

        /// Category of a named pose
        #[arg(short, long)]
        category: Option<String>,

        /// Ghost the mirrored pose
        #[arg(long)]
        mirror: bool,

        /// Leave the ghost in the scene instead of snapping to it
        #[arg(long)]
        keep: bool,
    },

    /// Delete a saved pose and its thumbnail
    Delete {
        /// Pose name or path to a pose file
        pose: String,

        /// Category of a named pose
        #[arg(short, long)]
        category: Option<String>,

        /// Clear the read-only bit on blocked files and retry
        #[arg(long)]
        make_writable: bool,
    },

    /// List saved poses
    List {
        /// Only list this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only list poses whose name contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// List the categories of a project
    Categories,

    /// List the projects of the library
    Projects,

    /// Create a category
    AddCategory {
        /// Category name
        name: String,
    },

    /// Print the opposite-side name of controls
    MirrorName {
        /// Control names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Print the mirror rule table or the rule for specific controls
    Rules {
        /// Controls to look up
        controls: Vec<String>,

        /// Write the rule table to a file
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "posekit=debug" } else { "posekit=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => PosekitConfig::load(path),
        None => PosekitConfig::load_default(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            return ExitCode::from(1);
        }
    };

    let library = || config.library(cli.library.as_deref(), cli.project.as_deref());

    let result = match cli.command {
        Commands::Save {
            name,
            scene,
            category,
            selection,
            skip_space_check,
            force,
            make_writable,
        } => library().and_then(|library| {
            commands::save::run(
                &library,
                &scene,
                &name,
                &commands::save::SaveOptions {
                    category: category.as_deref(),
                    selection,
                    skip_space_check,
                    force,
                    make_writable,
                },
            )
        }),
        Commands::Apply {
            pose,
            scene,
            category,
            mode,
            mirror,
        } => library().and_then(|library| {
            commands::apply::run(
                &config,
                &library,
                &scene,
                &pose,
                category.as_deref(),
                mode,
                mirror,
            )
        }),
        Commands::PasteOpposite {
            pose,
            scene,
            category,
        } => library().and_then(|library| {
            commands::paste::run(&config, &library, &scene, &pose, category.as_deref())
        }),
        Commands::Ghost {
            pose,
            scene,
            category,
            mirror,
            keep,
        } => library().and_then(|library| {
            commands::ghost::run(
                &config,
                &library,
                &scene,
                &pose,
                category.as_deref(),
                mirror,
                keep,
            )
        }),
        Commands::Delete {
            pose,
            category,
            make_writable,
        } => library().and_then(|library| {
            commands::delete::run(&library, &pose, category.as_deref(), make_writable)
        }),
        Commands::List { category, filter } => library().and_then(|library| {
            commands::catalog::run_list(&library, category.as_deref(), filter.as_deref())
        }),
        Commands::Categories => {
            library().and_then(|library| commands::catalog::run_categories(&library))
        }
        Commands::Projects => {
            library().and_then(|library| commands::catalog::run_projects(&library))
        }
        Commands::AddCategory { name } => {
            library().and_then(|library| commands::catalog::run_add_category(&library, &name))
        }
        Commands::MirrorName { names } => commands::mirror_name::run(&names),
        Commands::Rules { controls, output } => {
            commands::rules::run(&config, &controls, output.as_deref())
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::from(1)
        }
    }
}
