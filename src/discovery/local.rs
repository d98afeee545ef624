//! Filesystem enumeration under the configured search roots.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use walkdir::WalkDir;

use crate::models::CandidateDocument;

/// Recursive walker over the configured search roots.
///
/// Directories whose name matches an ignored segment are pruned whole, so
/// their contents are never visited. Unreadable entries are logged and
/// skipped; the walk continues with their siblings.
pub struct LocalScanner {
    roots: Vec<PathBuf>,
    ignored: Vec<String>,
    /// Lowercased extension allow-list. Empty means every file qualifies.
    allowed_extensions: HashSet<String>,
}

impl LocalScanner {
    pub fn new(roots: Vec<PathBuf>, ignored: Vec<String>, allowed_extensions: HashSet<String>) -> Self {
        Self {
            roots,
            ignored,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Walk all roots and return the qualifying candidates.
    pub fn scan(&self) -> Vec<CandidateDocument> {
        let mut candidates = Vec::new();
        for root in &self.roots {
            if !root.exists() {
                tracing::warn!("search root {} does not exist, skipping", root.display());
                continue;
            }
            self.scan_root(root, &mut candidates);
        }
        candidates
    }

    fn scan_root(&self, root: &PathBuf, candidates: &mut Vec<CandidateDocument>) {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                if entry.file_type().is_dir() {
                    let name = entry.file_name().to_string_lossy();
                    !self.ignored.iter().any(|seg| seg == name.as_ref())
                } else {
                    true
                }
            });

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::warn!("skipping unreadable entry under {}: {}", root.display(), err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if !self.extension_allowed(entry.path()) {
                continue;
            }
            let (size, modified) = match entry.metadata() {
                Ok(meta) => (meta.len(), system_time_to_utc(meta.modified().ok())),
                Err(err) => {
                    tracing::warn!("cannot stat {}: {}", entry.path().display(), err);
                    (0, None)
                }
            };
            candidates.push(CandidateDocument::local(
                entry.path().to_path_buf(),
                size,
                modified,
            ));
        }
    }

    fn extension_allowed(&self, path: &std::path::Path) -> bool {
        if self.allowed_extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.allowed_extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }
}

fn system_time_to_utc(time: Option<std::time::SystemTime>) -> Option<DateTime<Utc>> {
    time.map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &std::path::Path) {
        fs::write(path, b"content").unwrap();
    }

    #[test]
    fn scan_finds_files_with_allowed_extensions() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("syllabus.pdf"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("image.png"));

        let scanner = LocalScanner::new(
            vec![dir.path().to_path_buf()],
            vec![],
            ["pdf".to_string(), "txt".to_string()].into_iter().collect(),
        );
        let mut names: Vec<String> = scanner
            .scan()
            .into_iter()
            .map(|c| c.display_name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["notes.txt", "syllabus.pdf"]);
    }

    #[test]
    fn ignored_directories_are_pruned() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        touch(&dir.path().join("node_modules").join("inner.pdf"));
        touch(&dir.path().join("kept.pdf"));

        let scanner = LocalScanner::new(
            vec![dir.path().to_path_buf()],
            vec!["node_modules".to_string()],
            HashSet::new(),
        );
        let found = scanner.scan();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].display_name, "kept.pdf");
    }

    #[test]
    fn empty_allow_list_accepts_everything() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("anything.xyz"));
        touch(&dir.path().join("no_extension"));

        let scanner = LocalScanner::new(vec![dir.path().to_path_buf()], vec![], HashSet::new());
        assert_eq!(scanner.scan().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subtree_does_not_hide_siblings() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        touch(&locked.join("hidden.txt"));
        touch(&dir.path().join("visible.txt"));
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let scanner = LocalScanner::new(vec![dir.path().to_path_buf()], vec![], HashSet::new());
        let found = scanner.scan();
        // Permissions do not bind privileged users, so only assert the
        // pruned count when the directory is actually unreadable.
        let denied = fs::read_dir(&locked).is_err();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(found.iter().any(|c| c.display_name == "visible.txt"));
        if denied {
            assert_eq!(found.len(), 1);
        }
    }

    #[test]
    fn missing_root_is_skipped() {
        let scanner = LocalScanner::new(
            vec![PathBuf::from("/definitely/not/here")],
            vec![],
            HashSet::new(),
        );
        assert!(scanner.scan().is_empty());
    }
}
