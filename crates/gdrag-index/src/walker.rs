//! Recursive file discovery filtered by extension and skip substrings.

use std::path::{Path, PathBuf};

/// Directories that never hold project sources.
pub const DEFAULT_SKIP_PATTERNS: &[&str] = &[".git/", ".import/", ".godot/"];

#[derive(Debug, Clone)]
pub struct ProjectWalker {
    extensions: Vec<String>,
    skip_patterns: Vec<String>,
}

impl ProjectWalker {
    #[must_use]
    pub fn new(extensions: Vec<String>, skip_patterns: Vec<String>) -> Self {
        Self {
            extensions: normalize_extensions(extensions),
            skip_patterns,
        }
    }

    /// Configured extensions, lowercase and without a leading dot.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Files under `root` with extension `ext`, sorted by path.
    ///
    /// Hidden files are included and ignore files are not consulted; only the
    /// skip substrings, matched against the `/`-separated relative path,
    /// exclude entries.
    #[must_use]
    pub fn discover(&self, root: &Path, ext: &str) -> Vec<PathBuf> {
        let ext = normalize_ext(ext);
        let mut files: Vec<PathBuf> = ignore::WalkBuilder::new(root)
            .standard_filters(false)
            .build()
            .flatten()
            .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
            .map(ignore::DirEntry::into_path)
            .filter(|p| {
                p.extension()
                    .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(&ext))
            })
            .filter(|p| !self.is_skipped(&relative_path(root, p)))
            .collect();
        files.sort();
        files
    }

    fn is_skipped(&self, rel_path: &str) -> bool {
        self.skip_patterns
            .iter()
            .any(|pat| !pat.is_empty() && rel_path.contains(pat.as_str()))
    }
}

fn normalize_ext(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}

/// Normalized extensions in first-seen order, without duplicates or blanks.
#[must_use]
pub fn normalize_extensions<S: AsRef<str>>(extensions: impl IntoIterator<Item = S>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for ext in extensions {
        let ext = normalize_ext(ext.as_ref());
        if !ext.is_empty() && !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

/// `path` relative to `root`, with `/` separators on every platform.
#[must_use]
pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Read a file as text, replacing undecodable bytes instead of failing.
///
/// # Errors
///
/// Returns an IO error if the file cannot be read at all.
pub async fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
