//! OPC package access: read parts out of a zip and write a modified copy.
//!
//! Untouched entries are copied raw (no recompression) so a write that only
//! changes `word/document.xml` leaves every other entry byte-identical.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::{DocfillError, Result};

/// Read-only view over a zip package held in memory.
pub(crate) struct PackageReader<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
}

impl<'a> PackageReader<'a> {
    pub(crate) fn open(bytes: &'a [u8]) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|err| DocfillError::malformed(format!("not a zip package: {err}")))?;
        Ok(Self { archive })
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.archive.index_for_name(name).is_some()
    }

    pub(crate) fn part_names(&self) -> Vec<String> {
        self.archive.file_names().map(ToString::to_string).collect()
    }

    /// Read a part that must exist.
    pub(crate) fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        self.read_optional(name)?
            .ok_or_else(|| DocfillError::malformed(format!("package has no part '{name}'")))
    }

    pub(crate) fn read_optional(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let mut buf = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut buf)?;
        Ok(Some(buf))
    }
}

/// Copy `source` into a new package, substituting the bytes of `replacements`.
///
/// Entry order is preserved. Replacement parts missing from the source are
/// appended at the end.
pub(crate) fn repackage(source: &[u8], replacements: &BTreeMap<String, Vec<u8>>) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(source))
        .map_err(|err| DocfillError::malformed(format!("not a zip package: {err}")))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(source.len())));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut written = Vec::with_capacity(replacements.len());
    for idx in 0..archive.len() {
        let entry = archive.by_index(idx)?;
        let name = entry.name().to_string();
        if let Some(bytes) = replacements.get(&name) {
            drop(entry);
            writer.start_file(name.as_str(), options)?;
            writer.write_all(bytes)?;
            written.push(name);
        } else {
            writer.raw_copy_file(entry)?;
        }
    }

    for (name, bytes) in replacements {
        if !written.contains(name) {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(bytes)?;
        }
    }

    let cursor = writer.finish()?;
    log::debug!(
        "repackaged {} entries, {} part(s) rewritten",
        archive.len(),
        replacements.len()
    );
    Ok(cursor.into_inner())
}
