//! Recursive directory walk.
//!
//! Visits every file below a root in a stable (name-sorted) order and hands
//! it to a callback. The first error from the callback stops the walk.

use std::path::Path;

use walkdir::WalkDir;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};

/// Walk `root` and call `visit` for every file not excluded by `config`.
///
/// Returns the number of files visited. A missing root visits nothing.
pub fn walk_files<F>(root: &Path, config: &PipelineConfig, mut visit: F) -> Result<usize>
where
    F: FnMut(&Path) -> Result<()>,
{
    if !root.exists() {
        return Ok(0);
    }

    let mut visited = 0;
    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| PipelineError::Io {
            path: e.path().unwrap_or(root).to_path_buf(),
            message: format!("Failed to walk directory: {}", e),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if config.is_excluded(relative) {
            continue;
        }

        visit(path)?;
        visited += 1;
    }

    Ok(visited)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn collect(root: &Path, config: &PipelineConfig) -> Vec<PathBuf> {
        let mut seen = Vec::new();
        walk_files(root, config, |p| {
            seen.push(p.strip_prefix(root).unwrap().to_path_buf());
            Ok(())
        })
        .unwrap();
        seen
    }

    #[test]
    fn test_walk_recursive_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sprites/enemies")).unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("sprites/enemies/bat.aseprite"), "").unwrap();

        let seen = collect(dir.path(), &PipelineConfig::default());

        assert_eq!(
            seen,
            vec![
                PathBuf::from("a.json"),
                PathBuf::from("b.json"),
                PathBuf::from("sprites/enemies/bat.aseprite"),
            ]
        );
    }

    #[test]
    fn test_walk_skips_excluded() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("wip")).unwrap();
        fs::write(dir.path().join("hero.aseprite"), "").unwrap();
        fs::write(dir.path().join("wip/boss.aseprite"), "").unwrap();

        let config = PipelineConfig {
            excludes: vec!["wip/*".to_string()],
            ..Default::default()
        };

        assert_eq!(collect(dir.path(), &config), vec![PathBuf::from("hero.aseprite")]);
    }

    #[test]
    fn test_walk_missing_root() {
        let count = walk_files(
            Path::new("/nonexistent/pipeline/files"),
            &PipelineConfig::default(),
            |_| Ok(()),
        )
        .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_walk_stops_on_first_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();

        let mut calls = 0;
        let result = walk_files(dir.path(), &PipelineConfig::default(), |_| {
            calls += 1;
            Err(PipelineError::Build {
                message: "boom".to_string(),
                help: None,
            })
        });

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
