//! Delete command implementation
//!
//! Removes a pose record together with its thumbnail.

use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;

use posekit_core::PoseError;

use crate::config::Library;
use crate::scene::FlagDelegate;

/// Run the delete command
///
/// # Returns
/// Exit code: 0 success, 1 if the pose is read-only
pub fn run(
    library: &Library,
    pose: &str,
    category: Option<&str>,
    make_writable: bool,
) -> Result<ExitCode> {
    let path = library.resolve_pose(pose, category)?;
    println!("{} {}", "Deleting:".cyan().bold(), path.display());

    let mut delegate = FlagDelegate::new(false, make_writable);
    match library.store.delete(&path, &mut delegate) {
        Ok(()) => {
            println!("{} Deleted", "SUCCESS".green().bold());
            Ok(ExitCode::SUCCESS)
        }
        Err(PoseError::ReadOnly { path }) => {
            println!(
                "{} {} is read-only; nothing was deleted. Pass --make-writable to retry",
                "REFUSED".red().bold(),
                path.display()
            );
            Ok(ExitCode::from(1))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PosekitConfig;
    use posekit_core::{DeclineAll, Snapshot};
    use std::fs;
    use tempfile::TempDir;

    fn set_readonly(path: &std::path::Path) {
        let mut permissions = fs::metadata(path).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(path, permissions).unwrap();
    }

    #[test]
    fn test_delete_read_only_then_recover() {
        let tmp = TempDir::new().unwrap();
        let library = PosekitConfig::default()
            .library_with(Some(tmp.path()), None, Some("Hero"))
            .unwrap();
        let pose = vec![Snapshot::new("hip_anim").with("tx", 1.0)];
        let path = library
            .store
            .save("stand", "Idle", "Hero", pose, false, &mut DeclineAll)
            .unwrap();
        let thumbnail = library.store.thumbnail_for(&path);
        fs::write(&thumbnail, b"BM").unwrap();
        set_readonly(&thumbnail);

        let code = run(&library, "stand", Some("Idle"), false).unwrap();
        assert_eq!(code, ExitCode::from(1));
        assert!(path.exists());
        assert!(thumbnail.exists());

        let code = run(&library, "stand", Some("Idle"), true).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(!path.exists());
        assert!(!thumbnail.exists());
    }

    #[test]
    fn test_delete_unknown_pose() {
        let tmp = TempDir::new().unwrap();
        let library = PosekitConfig::default()
            .library_with(Some(tmp.path()), None, Some("Hero"))
            .unwrap();
        assert!(run(&library, "ghost", None, false).is_err());
    }
}
