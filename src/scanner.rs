//! Directory scanning: entry filtering and failure-tolerant traversal.

use crate::entry::Entry;
use crate::error::ScanError;
use clap::ValueEnum;
use jwalk::{Parallelism, WalkDir};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, Metadata};
use std::path::Path;

/// Which kinds of filesystem nodes are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Regular files only
    #[default]
    File,
    /// Everything except directories
    All,
}

impl ScanMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::All => "all",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type of a node as seen through symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
    Other,
    /// Metadata could not be read (dangling link, permissions, vanished node)
    Unknown,
}

impl NodeKind {
    fn of(meta: &std::io::Result<Metadata>) -> Self {
        match meta {
            Ok(m) if m.is_file() => Self::File,
            Ok(m) if m.is_dir() => Self::Dir,
            Ok(_) => Self::Other,
            Err(_) => Self::Unknown,
        }
    }
}

/// Whether a node of `kind` counts toward aggregation under `mode`.
pub fn qualifies(kind: NodeKind, mode: ScanMode) -> bool {
    match mode {
        ScanMode::File => kind == NodeKind::File,
        ScanMode::All => kind != NodeKind::Dir,
    }
}

/// Scanner configuration
#[derive(Debug, Default, Clone, Copy)]
pub struct Scanner {
    /// Node selection policy
    pub mode: ScanMode,
    /// Entries smaller than this many bytes are dropped
    pub min_size: u64,
}

impl Scanner {
    /// Create a new Scanner with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the selection mode
    pub fn with_mode(mut self, mode: ScanMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the minimum entry size in bytes
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Walk `root` lazily, yielding every qualifying entry.
    ///
    /// Nodes whose size cannot be read, and subdirectories that cannot be
    /// listed, are passed to `on_skip` and the walk carries on. Only an
    /// inaccessible `root` is an error.
    pub fn scan<F>(
        &self,
        root: &Path,
        mut on_skip: F,
    ) -> Result<impl Iterator<Item = Entry> + use<F>, ScanError>
    where
        F: FnMut(&Path, &dyn fmt::Display),
    {
        check_root(root)?;

        let Scanner { mode, min_size } = *self;
        let fallback = root.to_path_buf();
        let walker = WalkDir::new(root)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true);

        Ok(walker
            .into_iter()
            .filter_map(move |entry_result| match entry_result {
                Ok(mut entry) => {
                    let path = entry.path();
                    // jwalk hands back unlistable directories as Ok entries
                    if let Some(err) = entry.read_children_error.take() {
                        on_skip(&path, &err);
                    }
                    if entry.depth() == 0 {
                        return None;
                    }
                    let meta = fs::metadata(&path);
                    if !qualifies(NodeKind::of(&meta), mode) {
                        return None;
                    }
                    match meta {
                        Ok(meta) if meta.len() < min_size => None,
                        Ok(meta) => Some(Entry::new(path, meta.len())),
                        Err(err) => {
                            on_skip(&path, &err);
                            None
                        }
                    }
                }
                Err(err) => {
                    let path = err.path().map_or_else(|| fallback.clone(), Path::to_path_buf);
                    on_skip(&path, &err);
                    None
                }
            }))
    }
}

/// The root must exist, be a directory, and be listable.
fn check_root(root: &Path) -> Result<(), ScanError> {
    let access = |source| ScanError::RootAccess {
        path: root.to_path_buf(),
        source,
    };
    let meta = fs::metadata(root).map_err(access)?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    fs::read_dir(root).map_err(access)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    /// Entries plus every path reported to `on_skip`.
    fn collect(scanner: &Scanner, root: &Path) -> (Vec<Entry>, Vec<PathBuf>) {
        let mut skipped = Vec::new();
        let entries = scanner
            .scan(root, |path, _| skipped.push(path.to_path_buf()))
            .unwrap()
            .collect();
        (entries, skipped)
    }

    #[test]
    fn test_qualifies_file_mode() {
        assert!(qualifies(NodeKind::File, ScanMode::File));
        assert!(!qualifies(NodeKind::Dir, ScanMode::File));
        assert!(!qualifies(NodeKind::Other, ScanMode::File));
        assert!(!qualifies(NodeKind::Unknown, ScanMode::File));
    }

    #[test]
    fn test_qualifies_all_mode() {
        assert!(qualifies(NodeKind::File, ScanMode::All));
        assert!(qualifies(NodeKind::Other, ScanMode::All));
        assert!(qualifies(NodeKind::Unknown, ScanMode::All));
        assert!(!qualifies(NodeKind::Dir, ScanMode::All));
    }

    #[test]
    fn test_scan_empty_dir() {
        let dir = tempdir().unwrap();
        let (entries, skipped) = collect(&Scanner::new(), dir.path());
        assert!(entries.is_empty());
        assert!(skipped.is_empty());
    }

    #[test]
    fn test_scan_recurses_and_skips_dirs() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("small.txt"), "hello").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        fs::write(dir.path().join("subdir/nested.txt"), "nested content").unwrap();

        let (mut entries, _) = collect(&Scanner::new(), dir.path());
        entries.sort_by_key(|e| e.size);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].size, 5);
        assert_eq!(entries[1].size, 14);
        assert!(entries[1].path.ends_with("subdir/nested.txt"));
    }

    #[test]
    fn test_min_size_filters_without_skip_report() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a"), "x".repeat(100)).unwrap();
        fs::write(dir.path().join("b"), "x".repeat(200)).unwrap();

        let scanner = Scanner::new().with_min_size(150);
        let (entries, skipped) = collect(&scanner, dir.path());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].size, 200);
        assert!(skipped.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_node_is_skipped_once() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ten"), "x".repeat(10)).unwrap();
        fs::write(dir.path().join("twenty"), "x".repeat(20)).unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("dangling"))
            .unwrap();

        let scanner = Scanner::new().with_mode(ScanMode::All);
        let (mut entries, skipped) = collect(&scanner, dir.path());
        entries.sort_by_key(|e| e.size);

        assert_eq!(entries.iter().map(|e| e.size).collect::<Vec<_>>(), [10, 20]);
        assert_eq!(skipped.len(), 1);
        assert!(skipped[0].ends_with("dangling"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_mode_ignores_dangling_link_silently() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ten"), "x".repeat(10)).unwrap();
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("dangling"))
            .unwrap();

        let (entries, skipped) = collect(&Scanner::new(), dir.path());
        assert_eq!(entries.len(), 1);
        assert!(skipped.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdir_is_skipped_once() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        fs::write(dir.path().join("ten"), "x".repeat(10)).unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("twenty"), "x".repeat(20)).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can still list the directory
        let listable = fs::read_dir(&locked).is_ok();
        let (entries, skipped) = collect(&Scanner::new(), dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if listable {
            assert_eq!(entries.len(), 2);
            return;
        }
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].size, 10);
        assert_eq!(skipped, [locked]);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let result = Scanner::new().scan(&dir.path().join("nope"), |_, _| {});
        assert!(matches!(result, Err(ScanError::RootAccess { .. })));
    }

    #[test]
    fn test_file_root_is_an_error() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "content").unwrap();
        let result = Scanner::new().scan(&file, |_, _| {});
        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }
}
