//! Fixed-stride character windows with undersized fragments dropped.

use crate::error::{IndexError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// Window length in characters (default: 1000).
    pub chunk_size: usize,
    /// Characters shared by consecutive windows (default: 200).
    pub chunk_overlap: usize,
    /// A window survives only if its trimmed length is strictly greater (default: 50).
    pub min_chunk_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            min_chunk_size: 50,
        }
    }
}

impl ChunkerConfig {
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidChunking`] if `chunk_size` is zero or the
    /// overlap is not smaller than the chunk size.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(IndexError::InvalidChunking {
                size: self.chunk_size,
                overlap: self.chunk_overlap,
            });
        }
        Ok(())
    }

    fn stride(&self) -> usize {
        self.chunk_size.saturating_sub(self.chunk_overlap).max(1)
    }
}

/// One window of a source file, ready to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub index: usize,
    pub total: usize,
    pub source: String,
    pub file_type: String,
}

/// Split `content` into windows of `chunk_size` characters starting every
/// `chunk_size - chunk_overlap` characters, clipped to the end of the text.
///
/// Windows whose trimmed length does not exceed `min_chunk_size` are dropped,
/// not merged. The stride is clamped to 1, so even an invalid config
/// terminates.
#[must_use]
pub fn chunk_text(content: &str, config: &ChunkerConfig) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    let size = config.chunk_size.max(1);

    (0..chars.len())
        .step_by(config.stride())
        .filter_map(|start| {
            let end = (start + size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            (window.trim().chars().count() > config.min_chunk_size).then_some(window)
        })
        .collect()
}

/// Chunk a file and attach position metadata. Index and total count only the
/// windows that were kept.
#[must_use]
pub fn chunk_file(content: &str, source: &str, config: &ChunkerConfig) -> Vec<Chunk> {
    let texts = chunk_text(content, config);
    let total = texts.len();
    let file_type = std::path::Path::new(source)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    texts
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            text,
            index,
            total,
            source: source.to_owned(),
            file_type: file_type.clone(),
        })
        .collect()
}
