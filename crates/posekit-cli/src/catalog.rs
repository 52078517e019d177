//! Pose catalog.
//!
//! Walks a pose library on disk to list projects, categories and the poses
//! inside them. Full and partial poses are told apart by their file stem.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use posekit_core::{PoseDialect, PoseStore};

/// One pose record found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoseEntry {
    pub name: String,
    pub category: String,
    pub dialect: PoseDialect,
    pub path: PathBuf,
}

impl PoseEntry {
    pub fn is_partial(&self) -> bool {
        self.dialect == PoseDialect::Partial
    }
}

/// Read-only view over the poses of a library.
pub struct Catalog<'a> {
    store: &'a PoseStore,
}

impl<'a> Catalog<'a> {
    pub fn new(store: &'a PoseStore) -> Self {
        Self { store }
    }

    /// Projects in the library: top-level folders with a poses directory.
    pub fn projects(&self) -> Vec<String> {
        let mut projects: Vec<String> = subdirectories(self.store.root())
            .into_iter()
            .filter(|project| self.store.poses_dir(project).is_dir())
            .collect();
        projects.sort();
        projects
    }

    /// Categories of a project, sorted by name.
    pub fn categories(&self, project: &str) -> Vec<String> {
        let mut categories = subdirectories(&self.store.poses_dir(project));
        categories.sort();
        categories
    }

    /// Poses of one category, sorted by name with full poses first.
    pub fn poses(&self, project: &str, category: &str) -> Vec<PoseEntry> {
        let dir = self.store.category_dir(project, category);
        let extension = self.store.layout().record_extension.as_str();

        let mut entries: Vec<PoseEntry> = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some(extension))
            .filter_map(|e| {
                let stem = e.path().file_stem()?.to_str()?;
                let (name, dialect) = PoseDialect::from_stem(stem);
                Some(PoseEntry {
                    name: name.to_string(),
                    category: category.to_string(),
                    dialect,
                    path: e.path().to_path_buf(),
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.is_partial().cmp(&b.is_partial()))
        });
        entries
    }

    /// Poses of every category of a project.
    pub fn all_poses(&self, project: &str) -> Vec<PoseEntry> {
        self.categories(project)
            .iter()
            .flat_map(|category| self.poses(project, category))
            .collect()
    }

    /// Creates an empty category. Fails if it already exists.
    pub fn add_category(&self, project: &str, category: &str) -> Result<PathBuf> {
        if category.trim().is_empty() || category.contains(['/', '\\']) {
            bail!("Invalid category name: '{}'", category);
        }
        let dir = self.store.category_dir(project, category);
        if dir.exists() {
            bail!("Category '{}' already exists in project '{}'", category, project);
        }
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create category: {}", dir.display()))?;
        Ok(dir)
    }
}

/// Keeps entries whose name contains `needle`, ignoring case.
pub fn filter_entries(entries: Vec<PoseEntry>, needle: &str) -> Vec<PoseEntry> {
    if needle.is_empty() {
        return entries;
    }
    let needle = needle.to_lowercase();
    entries
        .into_iter()
        .filter(|e| e.name.to_lowercase().contains(&needle))
        .collect()
}

fn subdirectories(dir: &Path) -> Vec<String> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect()
}
