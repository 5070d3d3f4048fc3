//! Physical access to a ZIP-based OPC package.
//!
//! The reader preloads every member into memory so that the logical package
//! holds no handle on the source file. Loading therefore doubles as the copy
//! boundary: an output written over the template path never races the read.

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PackURI};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Physical package reader with every member decompressed up front.
pub struct PhysPkgReader {
    members: HashMap<String, Vec<u8>>,
}

impl PhysPkgReader {
    /// Open an OPC package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(OpcError::PackageNotFound(path.display().to_string()));
        }
        Self::from_bytes(std::fs::read(path)?)
    }

    /// Read a package from an in-memory ZIP archive.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
        let mut members = HashMap::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut blob = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut blob)?;
            members.insert(file.name().to_string(), blob);
        }

        Ok(Self { members })
    }

    /// Blob of the member behind a partname.
    pub fn blob_for(&self, pack_uri: &PackURI) -> Result<&[u8]> {
        self.members
            .get(pack_uri.membername())
            .map(Vec::as_slice)
            .ok_or_else(|| OpcError::PartNotFound(pack_uri.to_string()))
    }

    /// The `[Content_Types].xml` member.
    pub fn content_types_xml(&self) -> Result<&[u8]> {
        self.members
            .get(&CONTENT_TYPES_URI[1..])
            .map(Vec::as_slice)
            .ok_or_else(|| OpcError::PartNotFound(CONTENT_TYPES_URI.to_string()))
    }

    /// The `.rels` member for a source partname, if the source has one.
    pub fn rels_xml_for(&self, source_uri: &PackURI) -> Option<&[u8]> {
        self.members
            .get(source_uri.rels_uri().membername())
            .map(Vec::as_slice)
    }

    #[inline]
    pub fn contains(&self, pack_uri: &PackURI) -> bool {
        self.members.contains_key(pack_uri.membername())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Physical package writer producing a deflated ZIP archive in memory.
pub struct PhysPkgWriter {
    zip_writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl PhysPkgWriter {
    pub fn new() -> Self {
        Self {
            zip_writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Write a member for the given partname.
    pub fn write(&mut self, pack_uri: &PackURI, blob: &[u8]) -> Result<()> {
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        self.zip_writer.start_file(pack_uri.membername(), options)?;
        self.zip_writer.write_all(blob)?;
        Ok(())
    }

    /// Finish the archive and return its bytes.
    pub fn finish(self) -> Result<Vec<u8>> {
        Ok(self.zip_writer.finish()?.into_inner())
    }
}

impl Default for PhysPkgWriter {
    fn default() -> Self {
        Self::new()
    }
}
