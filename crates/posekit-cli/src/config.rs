//! User configuration.
//!
//! The configuration lives at `<config dir>/posekit/config.json`. A missing
//! file is the same as an empty one. The library root resolves from the
//! command line first, then `POSEKIT_LIBRARY`, then the file.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use posekit_core::{MirrorRuleTable, PoseDialect, PoseLocation, PoseStore};

/// Environment variable overriding the configured library root.
pub const LIBRARY_ENV: &str = "POSEKIT_LIBRARY";

/// Category used when none is given.
pub const DEFAULT_CATEGORY: &str = "No Category";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Persistent CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PosekitConfig {
    /// Root folder holding one directory per project.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_root: Option<PathBuf>,
    /// Project used when `--project` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorite_project: Option<String>,
    #[serde(default = "default_category")]
    pub default_category: String,
    /// JSON rule file replacing the built-in mirror table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_rules: Option<PathBuf>,
}

impl Default for PosekitConfig {
    fn default() -> Self {
        Self {
            library_root: None,
            favorite_project: None,
            default_category: default_category(),
            mirror_rules: None,
        }
    }
}

impl PosekitConfig {
    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("posekit").join("config.json"))
    }

    /// Loads the config from the default location.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads a config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Writes the config, creating its parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json).with_context(|| format!("Failed to write config: {}", path.display()))
    }

    /// Resolves the pose library against a command-line override and the
    /// environment.
    pub fn library(&self, root: Option<&Path>, project: Option<&str>) -> Result<Library> {
        let env = std::env::var_os(LIBRARY_ENV).map(PathBuf::from);
        self.library_with(root, env, project)
    }

    /// Same as [`PosekitConfig::library`] with the environment value passed in.
    pub fn library_with(
        &self,
        root: Option<&Path>,
        env: Option<PathBuf>,
        project: Option<&str>,
    ) -> Result<Library> {
        let root = match (root, env, &self.library_root) {
            (Some(root), _, _) => root.to_path_buf(),
            (None, Some(env), _) => env,
            (None, None, Some(configured)) => configured.clone(),
            (None, None, None) => bail!(
                "No pose library configured. Pass --library, set {} or add library_root to the config file",
                LIBRARY_ENV
            ),
        };

        let project = match project.or(self.favorite_project.as_deref()) {
            Some(project) => project.to_string(),
            None => bail!("No project given. Pass --project or set favorite_project in the config file"),
        };

        Ok(Library {
            store: PoseStore::new(root),
            project,
            default_category: self.default_category.clone(),
        })
    }

    /// The mirror rule table: the configured rule file, or the built-in one.
    pub fn rule_table(&self) -> Result<MirrorRuleTable> {
        let Some(path) = &self.mirror_rules else {
            return Ok(MirrorRuleTable::builtin());
        };
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read mirror rules: {}", path.display()))?;
        MirrorRuleTable::from_json(&json)
            .with_context(|| format!("Invalid mirror rules: {}", path.display()))
    }
}

/// A resolved pose library scoped to one project.
#[derive(Debug, Clone)]
pub struct Library {
    pub store: PoseStore,
    pub project: String,
    pub default_category: String,
}

impl Library {
    /// Category name, falling back to the configured default.
    pub fn category<'a>(&'a self, category: Option<&'a str>) -> &'a str {
        category.unwrap_or(&self.default_category)
    }

    /// Location of a named pose in this project.
    pub fn location(&self, name: &str, category: Option<&str>, partial: bool) -> PoseLocation {
        let dialect = if partial {
            PoseDialect::Partial
        } else {
            PoseDialect::Full
        };
        PoseLocation::new(&self.project, self.category(category), name, dialect)
    }

    /// Resolves a pose argument: an existing file path is used as is,
    /// anything else is a pose name in this project.
    ///
    /// A name with no full record falls back to its partial record.
    pub fn resolve_pose(&self, pose: &str, category: Option<&str>) -> Result<PathBuf> {
        let direct = Path::new(pose);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        let full = self.store.data_path(&self.location(pose, category, false));
        if full.is_file() {
            return Ok(full);
        }
        let partial = self.store.data_path(&self.location(pose, category, true));
        if partial.is_file() {
            return Ok(partial);
        }
        bail!(
            "Pose '{}' not found in {}/{}",
            pose,
            self.project,
            self.category(category)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let config = PosekitConfig::load(&tmp.path().join("config.json")).unwrap();
        assert_eq!(config, PosekitConfig::default());
        assert_eq!(config.default_category, "No Category");
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("posekit").join("config.json");
        let config = PosekitConfig {
            library_root: Some(PathBuf::from("/poses")),
            favorite_project: Some("Hero".to_string()),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(PosekitConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"library": "/x"}"#).unwrap();
        assert!(PosekitConfig::load(&path).is_err());
    }

    #[test]
    fn test_library_resolution_order() {
        let config = PosekitConfig {
            library_root: Some(PathBuf::from("/configured")),
            favorite_project: Some("Hero".to_string()),
            ..Default::default()
        };

        let lib = config.library_with(None, None, None).unwrap();
        assert_eq!(lib.store.root(), Path::new("/configured"));
        assert_eq!(lib.project, "Hero");

        let lib = config
            .library_with(None, Some(PathBuf::from("/env")), Some("Villain"))
            .unwrap();
        assert_eq!(lib.store.root(), Path::new("/env"));
        assert_eq!(lib.project, "Villain");

        let lib = config
            .library_with(Some(Path::new("/flag")), Some(PathBuf::from("/env")), None)
            .unwrap();
        assert_eq!(lib.store.root(), Path::new("/flag"));
    }

    #[test]
    fn test_library_requires_root_and_project() {
        let config = PosekitConfig::default();
        assert!(config.library_with(None, None, Some("Hero")).is_err());
        assert!(config
            .library_with(Some(Path::new("/flag")), None, None)
            .is_err());
    }

    #[test]
    fn test_resolve_pose_by_name() {
        let tmp = TempDir::new().unwrap();
        let config = PosekitConfig::default();
        let lib = config
            .library_with(Some(tmp.path()), None, Some("Hero"))
            .unwrap();

        let partial = lib.store.data_path(&lib.location("wave", None, true));
        fs::create_dir_all(partial.parent().unwrap()).unwrap();
        fs::write(&partial, "[]").unwrap();

        assert_eq!(lib.resolve_pose("wave", None).unwrap(), partial);
        assert!(lib.resolve_pose("jump", None).is_err());
        assert_eq!(
            lib.resolve_pose(partial.to_str().unwrap(), Some("Other")).unwrap(),
            partial
        );
    }

    #[test]
    fn test_rule_table_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rules.json");
        fs::write(&path, MirrorRuleTable::builtin().to_json_pretty().unwrap()).unwrap();
        let config = PosekitConfig {
            mirror_rules: Some(path),
            ..Default::default()
        };
        assert_eq!(
            config.rule_table().unwrap().rule_set(),
            MirrorRuleTable::builtin().rule_set()
        );
    }
}
