//! Content tree walking.
//!
//! Discovery only: the scanner finds directories and source files, the
//! build driver reads and renders them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};

/// Entry found in the content tree, relative to its root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Entry {
    Directory(PathBuf),
    Document { source: PathBuf, relative: PathBuf },
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Walks a content tree in lexical order.
pub(crate) struct Scanner {
    root: PathBuf,
    patterns: Vec<Pattern>,
}

impl Scanner {
    /// Create a scanner matching files with one of `extensions`.
    ///
    /// # Errors
    ///
    /// Returns the offending pattern if an extension is not a valid glob.
    pub fn new(
        root: PathBuf,
        extensions: &[String],
    ) -> Result<Self, (String, glob::PatternError)> {
        let patterns = extensions
            .iter()
            .map(|ext| {
                let pattern = format!("*.{ext}");
                Pattern::new(&pattern).map_err(|e| (pattern, e))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { root, patterns })
    }

    /// Every directory and matching file below the root.
    ///
    /// A directory is listed before its contents; hidden entries are skipped.
    pub fn scan(&self) -> io::Result<Vec<Entry>> {
        let mut entries = Vec::new();
        self.scan_directory(&self.root, Path::new(""), &mut entries)?;
        Ok(entries)
    }

    fn scan_directory(&self, dir: &Path, relative: &Path, out: &mut Vec<Entry>) -> io::Result<()> {
        let mut children: Vec<_> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
            .collect();
        children.sort_by_key(fs::DirEntry::file_name);

        for child in children {
            let path = child.path();
            let name = child.file_name();
            let child_relative = relative.join(&name);

            if path.is_dir() {
                out.push(Entry::Directory(child_relative.clone()));
                self.scan_directory(&path, &child_relative, out)?;
            } else if path.is_file() && self.matches(&name.to_string_lossy()) {
                out.push(Entry::Document {
                    source: path,
                    relative: child_relative,
                });
            }
        }
        Ok(())
    }

    fn matches(&self, file_name: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(file_name, MATCH_OPTIONS))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn extensions() -> Vec<String> {
        vec!["md".to_owned(), "markdown".to_owned()]
    }

    #[test]
    fn test_scan_order_and_filtering() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("guide/deep")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("index.md"), "").unwrap();
        fs::write(root.join("notes.MARKDOWN"), "").unwrap();
        fs::write(root.join("style.css"), "").unwrap();
        fs::write(root.join(".draft.md"), "").unwrap();
        fs::write(root.join(".git/HEAD.md"), "").unwrap();
        fs::write(root.join("guide/b.md"), "").unwrap();
        fs::write(root.join("guide/a.md"), "").unwrap();
        fs::write(root.join("guide/deep/c.md"), "").unwrap();

        let scanner = Scanner::new(root.to_path_buf(), &extensions()).unwrap();
        let relative: Vec<_> = scanner
            .scan()
            .unwrap()
            .into_iter()
            .map(|entry| match entry {
                Entry::Directory(path) => format!("dir {}", path.display()),
                Entry::Document { relative, .. } => format!("doc {}", relative.display()),
            })
            .collect();

        assert_eq!(
            relative,
            [
                "dir guide",
                "doc guide/a.md",
                "doc guide/b.md",
                "dir guide/deep",
                "doc guide/deep/c.md",
                "doc index.md",
                "doc notes.MARKDOWN",
            ]
        );
    }

    #[test]
    fn test_document_source_is_absolute_under_root() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("a.md"), "").unwrap();
        let scanner = Scanner::new(temp.path().to_path_buf(), &extensions()).unwrap();
        assert_eq!(
            scanner.scan().unwrap(),
            [Entry::Document {
                source: temp.path().join("a.md"),
                relative: PathBuf::from("a.md"),
            }]
        );
    }

    #[test]
    fn test_invalid_extension_pattern() {
        let err = Scanner::new(PathBuf::from("."), &["[md".to_owned()]).err();
        assert_eq!(err.map(|(pattern, _)| pattern).as_deref(), Some("*.[md"));
    }

    #[test]
    fn test_missing_root_is_io_error() {
        let temp = tempfile::tempdir().unwrap();
        let scanner = Scanner::new(temp.path().join("missing"), &extensions()).unwrap();
        assert!(scanner.scan().is_err());
    }
}
