//! Archive collaborators

use crate::{CertgenError, Result};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Receives generated files
pub trait ArchiveSink {
    /// Store `bytes` under a name derived from `name`, returning the name
    /// actually used
    fn add(&mut self, name: &str, bytes: &[u8]) -> Result<String>;
}

/// In-memory zip archive with unique entry names
pub struct ZipArchiveSink {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    names: HashSet<String>,
}

impl ZipArchiveSink {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            names: HashSet::new(),
        }
    }

    /// Number of entries written
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Write the central directory and return the archive bytes
    pub fn finish(self) -> Result<Vec<u8>> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| CertgenError::Archive(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    fn unique_name(&self, name: &str) -> String {
        if !self.names.contains(name) {
            return name.to_string();
        }
        let (stem, extension) = match name.rsplit_once('.') {
            Some((stem, extension)) => (stem, format!(".{extension}")),
            None => (name, String::new()),
        };
        (2..)
            .map(|n| format!("{stem}_{n}{extension}"))
            .find(|candidate| !self.names.contains(candidate))
            .unwrap_or_else(|| name.to_string())
    }
}

impl Default for ZipArchiveSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveSink for ZipArchiveSink {
    fn add(&mut self, name: &str, bytes: &[u8]) -> Result<String> {
        let name = self.unique_name(name);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer
            .start_file(name.as_str(), options)
            .map_err(|e| CertgenError::Archive(e.to_string()))?;
        self.writer
            .write_all(bytes)
            .map_err(|e| CertgenError::Archive(e.to_string()))?;
        self.names.insert(name.clone());
        Ok(name)
    }
}
