use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Candidate files produced by one root scan, plus the number of directory
/// entries that could not be read.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub files: Vec<PathBuf>,
    pub skipped: usize,
}

/// Walk a source root and collect files matching the extension filter.
/// Unreadable entries are counted, never fatal. The result is sorted by
/// path so repeated runs over an unchanged tree enumerate identically.
pub fn scan_root(root: &Path, extensions: &[String], exclude_globs: &[String]) -> Result<ScanOutcome> {
    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(exclude_globs.iter().cloned());
    let exclude_set = build_globset(&default_excludes)?;

    let mut outcome = ScanOutcome::default();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                outcome.skipped += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if exclude_set.is_match(relative) {
            continue;
        }

        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|want| want == ext))
            .unwrap_or(false);
        if !matches {
            continue;
        }

        outcome.files.push(path.to_path_buf());
    }

    outcome.files.sort();
    Ok(outcome)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn md_extensions() -> Vec<String> {
        vec!["md".to_string()]
    }

    #[test]
    fn test_scan_filters_by_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("keep.md"), "a").unwrap();
        fs::write(tmp.path().join("drop.txt"), "b").unwrap();
        fs::write(tmp.path().join("noext"), "c").unwrap();

        let outcome = scan_root(tmp.path(), &md_extensions(), &[]).unwrap();
        assert_eq!(outcome.files.len(), 1);
        assert!(outcome.files[0].ends_with("keep.md"));
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn test_scan_recurses_and_sorts() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("z")).unwrap();
        fs::create_dir_all(tmp.path().join("a")).unwrap();
        fs::write(tmp.path().join("z/one.md"), "1").unwrap();
        fs::write(tmp.path().join("a/two.md"), "2").unwrap();
        fs::write(tmp.path().join("root.md"), "3").unwrap();

        let first = scan_root(tmp.path(), &md_extensions(), &[]).unwrap();
        let second = scan_root(tmp.path(), &md_extensions(), &[]).unwrap();
        assert_eq!(first.files, second.files);
        assert_eq!(first.files.len(), 3);

        let mut sorted = first.files.clone();
        sorted.sort();
        assert_eq!(first.files, sorted);
    }

    #[test]
    fn test_scan_missing_root_yields_skip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let outcome = scan_root(&missing, &md_extensions(), &[]).unwrap();
        assert!(outcome.files.is_empty());
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_scan_applies_exclude_globs() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("drafts")).unwrap();
        fs::write(tmp.path().join("drafts/wip.md"), "x").unwrap();
        fs::write(tmp.path().join("final.md"), "y").unwrap();

        let outcome =
            scan_root(tmp.path(), &md_extensions(), &["drafts/**".to_string()]).unwrap();
        assert_eq!(outcome.files.len(), 1);
        assert!(outcome.files[0].ends_with("final.md"));
    }
}
