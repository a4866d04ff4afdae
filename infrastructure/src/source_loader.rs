use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use shared::types::{BotError, Result};

/// The plaintext file the index is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub text: String,
    /// Hex MD5 of the file contents.
    pub md5: String,
}

/// Read the whole source file. Missing, unreadable or non-UTF-8 files are `Io` errors.
pub fn load_source(path: impl AsRef<Path>) -> Result<SourceDocument> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| BotError::io(path, e))?;
    let md5 = format!("{:x}", md5::compute(&bytes));
    let text = String::from_utf8(bytes).map_err(|e| {
        BotError::io(
            path,
            io::Error::new(io::ErrorKind::InvalidData, format!("not valid UTF-8: {e}")),
        )
    })?;
    Ok(SourceDocument {
        path: path.to_path_buf(),
        text,
        md5,
    })
}
