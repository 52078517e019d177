//! Pose persistence.
//!
//! Records live at `<root>/<project>/<poses_dir>/<category>/<name>[suffix].json`
//! with the thumbnail beside them. Writes go through a temporary file and an
//! atomic rename; deletes treat the record and its thumbnail as one unit.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{PoseError, PoseResult};
use crate::host::{Decision, StoreDelegate};
use crate::snapshot::{PoseDialect, PoseRecord, Snapshot};

// =============================================================================
// Layout
// =============================================================================

/// Directory and extension conventions of a pose library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    /// Directory under each project holding the categories.
    pub poses_dir: String,
    /// Extension of pose records.
    pub record_extension: String,
    /// Extension of thumbnails.
    pub thumbnail_extension: String,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            poses_dir: "Poses".to_string(),
            record_extension: "json".to_string(),
            thumbnail_extension: "bmp".to_string(),
        }
    }
}

impl StoreLayout {
    /// Sets the poses directory name.
    pub fn with_poses_dir(mut self, dir: impl Into<String>) -> Self {
        self.poses_dir = dir.into();
        self
    }

    /// Sets the thumbnail extension.
    pub fn with_thumbnail_extension(mut self, ext: impl Into<String>) -> Self {
        self.thumbnail_extension = ext.into();
        self
    }
}

/// Logical address of a pose in the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoseLocation {
    pub project: String,
    pub category: String,
    pub name: String,
    pub dialect: PoseDialect,
}

impl PoseLocation {
    pub fn new(
        project: impl Into<String>,
        category: impl Into<String>,
        name: impl Into<String>,
        dialect: PoseDialect,
    ) -> Self {
        Self {
            project: project.into(),
            category: category.into(),
            name: name.into(),
            dialect,
        }
    }

    /// File stem including the dialect suffix.
    pub fn stem(&self) -> String {
        format!("{}{}", self.name, self.dialect.suffix())
    }
}

// =============================================================================
// Store
// =============================================================================

/// Reads and writes pose records under a library root.
#[derive(Debug, Clone)]
pub struct PoseStore {
    root: PathBuf,
    layout: StoreLayout,
}

impl PoseStore {
    /// Creates a store with the default layout.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            layout: StoreLayout::default(),
        }
    }

    /// Replaces the layout.
    pub fn with_layout(mut self, layout: StoreLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Library root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Layout in use.
    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Directory holding a project's categories.
    pub fn poses_dir(&self, project: &str) -> PathBuf {
        self.root.join(project).join(&self.layout.poses_dir)
    }

    /// Directory of one category.
    pub fn category_dir(&self, project: &str, category: &str) -> PathBuf {
        self.poses_dir(project).join(category)
    }

    /// Path of a pose record.
    pub fn data_path(&self, location: &PoseLocation) -> PathBuf {
        self.category_dir(&location.project, &location.category)
            .join(format!("{}.{}", location.stem(), self.layout.record_extension))
    }

    /// Path of the thumbnail belonging to a record path.
    pub fn thumbnail_for(&self, data_path: &Path) -> PathBuf {
        data_path.with_extension(&self.layout.thumbnail_extension)
    }

    /// Path of a pose thumbnail.
    pub fn thumbnail_path(&self, location: &PoseLocation) -> PathBuf {
        self.thumbnail_for(&self.data_path(location))
    }

    /// Saves a pose under `project/category/name`.
    ///
    /// An existing record is only replaced if the delegate confirms the
    /// overwrite. Returns the record path.
    pub fn save(
        &self,
        name: &str,
        category: &str,
        project: &str,
        snapshots: Vec<Snapshot>,
        partial: bool,
        delegate: &mut dyn StoreDelegate,
    ) -> PoseResult<PathBuf> {
        let dialect = if partial {
            PoseDialect::Partial
        } else {
            PoseDialect::Full
        };
        let record = PoseRecord::new(name, project, category, dialect, snapshots);
        self.save_record(&record, delegate)
    }

    /// Saves a prepared record.
    pub fn save_record(
        &self,
        record: &PoseRecord,
        delegate: &mut dyn StoreDelegate,
    ) -> PoseResult<PathBuf> {
        let location = PoseLocation::new(
            &record.project,
            &record.category,
            &record.name,
            record.dialect,
        );
        let path = self.data_path(&location);
        let json = serde_json::to_vec_pretty(record)?;
        self.write_guarded(&path, &json, delegate)?;
        info!(path = %path.display(), controls = record.snapshots.len(), "Saved pose");
        Ok(path)
    }

    /// Writes thumbnail bytes next to a pose record.
    pub fn write_thumbnail(
        &self,
        location: &PoseLocation,
        bytes: &[u8],
        delegate: &mut dyn StoreDelegate,
    ) -> PoseResult<PathBuf> {
        let path = self.thumbnail_path(location);
        self.write_guarded(&path, bytes, delegate)?;
        debug!(path = %path.display(), "Wrote thumbnail");
        Ok(path)
    }

    /// Loads the snapshots of a record.
    pub fn load(&self, path: &Path) -> PoseResult<Vec<Snapshot>> {
        load_snapshots(path)
    }

    /// Loads a full record with metadata.
    ///
    /// Bare snapshot arrays get their name and dialect from the file stem.
    pub fn load_record(&self, path: &Path) -> PoseResult<PoseRecord> {
        let value = read_json(path)?;
        let record = if value.is_array() {
            let snapshots: Vec<Snapshot> = serde_json::from_value(value)
                .map_err(|e| PoseError::corrupt(path, e.to_string()))?;
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            let (name, dialect) = PoseDialect::from_stem(stem);
            let category = parent_name(path, 1);
            let project = parent_name(path, 3);
            PoseRecord {
                format: crate::snapshot::RECORD_FORMAT,
                name: name.to_string(),
                project,
                category,
                dialect,
                saved_at: None,
                snapshots,
            }
        } else {
            serde_json::from_value(value).map_err(|e| PoseError::corrupt(path, e.to_string()))?
        };
        validate(path, &record.snapshots)?;
        Ok(record)
    }

    /// Deletes a record and its thumbnail as one unit.
    ///
    /// If either file is read-only, nothing is removed; the delegate may make
    /// them writable and the delete is retried once.
    pub fn delete(&self, path: &Path, delegate: &mut dyn StoreDelegate) -> PoseResult<()> {
        if !path.is_file() {
            return Err(PoseError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let thumbnail = self.thumbnail_for(path);

        match self.delete_unit(path, &thumbnail) {
            Err(PoseError::ReadOnly { path: blocked }) => {
                match delegate.recover_read_only(&blocked) {
                    Decision::Proceed => self.delete_unit(path, &thumbnail)?,
                    Decision::Cancel => return Err(PoseError::ReadOnly { path: blocked }),
                }
            }
            other => other?,
        }
        info!(path = %path.display(), "Deleted pose");
        Ok(())
    }

    fn delete_unit(&self, data: &Path, thumbnail: &Path) -> PoseResult<()> {
        ensure_writable(data)?;
        if thumbnail.exists() {
            ensure_writable(thumbnail)?;
        }
        if let Some(dir) = data.parent() {
            ensure_writable(dir)?;
        }

        // Move the record aside so a failed thumbnail removal can be undone.
        let aside = data.with_extension("deleting");
        fs::rename(data, &aside).map_err(|e| map_io(data, e))?;
        if thumbnail.exists() {
            if let Err(e) = fs::remove_file(thumbnail) {
                fs::rename(&aside, data).map_err(|e| map_io(data, e))?;
                return Err(map_io(thumbnail, e));
            }
        }
        fs::remove_file(&aside).map_err(|e| map_io(data, e))?;
        Ok(())
    }

    fn write_guarded(
        &self,
        path: &Path,
        bytes: &[u8],
        delegate: &mut dyn StoreDelegate,
    ) -> PoseResult<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| map_io(dir, e))?;
        }

        if path.exists() && delegate.confirm_overwrite(path) == Decision::Cancel {
            debug!(path = %path.display(), "Overwrite declined");
            return Err(PoseError::Cancelled);
        }

        match write_atomic(path, bytes) {
            Err(PoseError::ReadOnly { path: blocked }) => {
                match delegate.recover_read_only(&blocked) {
                    Decision::Proceed => write_atomic(path, bytes),
                    Decision::Cancel => Err(PoseError::ReadOnly { path: blocked }),
                }
            }
            other => other,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Loads and validates the snapshots of a record at `path`.
pub fn load_snapshots(path: &Path) -> PoseResult<Vec<Snapshot>> {
    let value = read_json(path)?;
    let snapshots: Vec<Snapshot> = if value.is_array() {
        serde_json::from_value(value).map_err(|e| PoseError::corrupt(path, e.to_string()))?
    } else {
        let record: PoseRecord =
            serde_json::from_value(value).map_err(|e| PoseError::corrupt(path, e.to_string()))?;
        record.snapshots
    };
    validate(path, &snapshots)?;
    Ok(snapshots)
}

fn read_json(path: &Path) -> PoseResult<serde_json::Value> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PoseError::NotFound {
            path: path.to_path_buf(),
        },
        _ => map_io(path, e),
    })?;
    serde_json::from_str(&text).map_err(|e| PoseError::corrupt(path, e.to_string()))
}

fn validate(path: &Path, snapshots: &[Snapshot]) -> PoseResult<()> {
    for snapshot in snapshots {
        if !snapshot.is_aligned() {
            return Err(PoseError::corrupt(
                path,
                format!(
                    "control '{}' has {} attributes but {} values",
                    snapshot.control,
                    snapshot.attributes.len(),
                    snapshot.values.len()
                ),
            ));
        }
    }
    Ok(())
}

fn parent_name(path: &Path, depth: usize) -> String {
    path.ancestors()
        .nth(depth)
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

fn ensure_writable(path: &Path) -> PoseResult<()> {
    let metadata = fs::metadata(path).map_err(|e| map_io(path, e))?;
    if metadata.permissions().readonly() {
        return Err(PoseError::ReadOnly {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> PoseResult<()> {
    if path.exists() {
        ensure_writable(path)?;
    }
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| map_io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| map_io(path, e))?;
    tmp.persist(path).map_err(|e| map_io(path, e.error))?;
    Ok(())
}

fn map_io(path: &Path, err: io::Error) -> PoseError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => PoseError::ReadOnly {
            path: path.to_path_buf(),
        },
        _ => PoseError::Io(err),
    }
}
