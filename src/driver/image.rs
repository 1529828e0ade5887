//! Loading program images
//!
//! An image is a sequence of big-endian 32-bit words and becomes the
//! initial contents of the program array.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use codespan_reporting::diagnostic::Diagnostic;
use thiserror::Error;

/// Bytes per instruction word
pub const WORD_BYTES: usize = 4;

/// A malformed or unreadable program image
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("program image of {length} bytes is not a whole number of 4-byte words")]
    Misaligned {
        path: Option<PathBuf>,
        length: usize,
    },
    #[error("could not read program image {}: {}", .path.display(), .source)]
    Io { path: PathBuf, source: io::Error },
}

impl ImageError {
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let diagnostic = Diagnostic::error().with_message(self.to_string());
        match self {
            ImageError::Misaligned {
                path: Some(path), ..
            } => diagnostic.with_notes(vec![format!("in {}", path.display())]),
            _ => diagnostic,
        }
    }
}

/// Decode image bytes into program words
pub fn decode(bytes: &[u8]) -> Result<Vec<u32>, ImageError> {
    if bytes.len() % WORD_BYTES != 0 {
        return Err(ImageError::Misaligned {
            path: None,
            length: bytes.len(),
        });
    }

    Ok(bytes
        .chunks_exact(WORD_BYTES)
        .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Encode program words as image bytes
pub fn encode(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// Read and decode the image at `path`
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<u32>, ImageError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| ImageError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    decode(&bytes).map_err(|e| match e {
        ImageError::Misaligned { length, .. } => ImageError::Misaligned {
            path: Some(path.to_path_buf()),
            length,
        },
        e => e,
    })
}
