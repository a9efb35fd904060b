//! Finds application databases in an extracted device image.
//!
//! The image is a plain directory tree (e.g. the output of an Android
//! logical extraction). A database belongs to an application when one of
//! its ancestor directories is named after the application's package.

use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{ExtractError, Result};
use crate::host::DatabaseLocator;

/// Compile a SQL `LIKE` pattern into an anchored, case-insensitive regex.
///
/// `%` matches any run of characters and `_` matches exactly one.
pub fn like_to_regex(pattern: &str) -> Result<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    for c in pattern.chars() {
        match c {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    expr.push('$');

    RegexBuilder::new(&expr)
        .case_insensitive(true)
        .build()
        .map_err(|e| ExtractError::Discovery(format!("Invalid pattern {pattern}: {e}")))
}

/// Locates databases under a directory containing an extracted image
#[derive(Debug, Clone)]
pub struct ImageDirectoryLocator {
    root: PathBuf,
}

impl ImageDirectoryLocator {
    /// Locator rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root of the image
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths of matching files, sorted, without opening them
    pub fn matching_paths(&self, pattern: &str, exact: bool, package: &str) -> Result<Vec<PathBuf>> {
        if !self.root.is_dir() {
            return Err(ExtractError::Discovery(format!(
                "Image root is not a directory: {}",
                self.root.display()
            )));
        }

        let like = if exact { None } else { Some(like_to_regex(pattern)?) };

        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable image entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            let name_matches = like
                .as_ref()
                .map_or_else(|| name == pattern, |re| re.is_match(&name));
            if name_matches && in_package(entry.path(), package) {
                paths.push(entry.into_path());
            }
        }

        paths.sort();
        Ok(paths)
    }
}

fn in_package(path: &Path, package: &str) -> bool {
    path.parent()
        .is_some_and(|parent| parent.components().any(|c| c.as_os_str() == package))
}

impl DatabaseLocator for ImageDirectoryLocator {
    fn find_app_databases(&self, pattern: &str, exact: bool, package: &str) -> Result<Vec<PathBuf>> {
        let paths = self.matching_paths(pattern, exact, package)?;
        debug!(pattern, count = paths.len(), "Located application databases");
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_like_pattern() {
        let re = like_to_regex("%_im.db").unwrap();
        assert!(re.is_match("6812345_im.db"));
        assert!(re.is_match("X_IM.DB"));
        assert!(re.is_match("xim.db"));
        assert!(!re.is_match("123_im.db-journal"));
        assert!(!re.is_match("db_im_xx"));

        let literal = like_to_regex("a.b").unwrap();
        assert!(literal.is_match("a.b"));
        assert!(!literal.is_match("axb"));
    }

    #[test]
    fn test_matching_paths_scoped_to_package() {
        let dir = tempdir().unwrap();
        let app = dir.path().join("data/data/com.zhiliaoapp.musically/databases");
        let other = dir.path().join("data/data/com.other.app/databases");
        fs::create_dir_all(&app).unwrap();
        fs::create_dir_all(&other).unwrap();
        fs::write(app.join("111_im.db"), b"").unwrap();
        fs::write(app.join("db_im_xx"), b"").unwrap();
        fs::write(other.join("222_im.db"), b"").unwrap();

        let locator = ImageDirectoryLocator::new(dir.path());
        let messages = locator
            .matching_paths("%_im.db", false, "com.zhiliaoapp.musically")
            .unwrap();
        assert_eq!(messages, vec![app.join("111_im.db")]);

        let contacts = locator
            .matching_paths("db_im_xx", true, "com.zhiliaoapp.musically")
            .unwrap();
        assert_eq!(contacts, vec![app.join("db_im_xx")]);
    }

    #[test]
    fn test_located_databases_open_on_demand() {
        let dir = tempdir().unwrap();
        let app = dir.path().join("com.zhiliaoapp.musically/databases");
        fs::create_dir_all(&app).unwrap();
        rusqlite::Connection::open(app.join("7_im.db"))
            .unwrap()
            .execute_batch("CREATE TABLE msg (content TEXT);")
            .unwrap();

        let locator = ImageDirectoryLocator::new(dir.path());
        let paths = locator
            .find_app_databases("%_im.db", false, "com.zhiliaoapp.musically")
            .unwrap();
        assert_eq!(paths, vec![app.join("7_im.db")]);

        let db = locator.open(&paths[0]).unwrap();
        assert_eq!(db.file_name(), "7_im.db");
        let tables: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM sqlite_master WHERE name = 'msg'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(tables, 1);
        assert!(db.close().is_ok());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let locator = ImageDirectoryLocator::new("/definitely/not/here");
        assert!(locator.matching_paths("x", true, "p").is_err());
    }
}
