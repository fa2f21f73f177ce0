//! Destinations for request bodies.
//!
//! The body stage writes each accepted chunk straight to a [`BodySink`] and
//! never keeps the body itself, so a file-backed sink bounds the parser's
//! memory use regardless of body size.

use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

/// Creates a fresh sink for each request that carries a body.
pub trait BodyStorage {
    type Sink: BodySink;

    fn create(&self) -> io::Result<Self::Sink>;
}

/// Receives body bytes in order and hands back the finished content.
pub trait BodySink {
    /// What the finished request exposes as its body.
    type Content;

    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    fn finalize(self) -> io::Result<Self::Content>;
}

/// Body content type produced by storage `T`.
pub type ContentOf<T> = <<T as BodyStorage>::Sink as BodySink>::Content;

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Keeps bodies in a `Vec<u8>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStorage;

impl BodyStorage for MemoryStorage {
    type Sink = MemorySink;

    fn create(&self) -> io::Result<MemorySink> {
        Ok(MemorySink::default())
    }
}

#[derive(Debug, Default)]
pub struct MemorySink(Vec<u8>);

impl BodySink for MemorySink {
    type Content = Vec<u8>;

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.0.extend_from_slice(bytes);
        Ok(())
    }

    fn finalize(self) -> io::Result<Vec<u8>> {
        Ok(self.0)
    }
}

// ---------------------------------------------------------------------------
// Temporary file
// ---------------------------------------------------------------------------

/// Spools bodies to anonymous temporary files.
///
/// The files have no name on disk and disappear when the last handle is
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct TempFileStorage {
    dir: Option<PathBuf>,
}

impl TempFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create temporary files inside `dir` instead of the system default.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }
}

impl BodyStorage for TempFileStorage {
    type Sink = FileSink;

    fn create(&self) -> io::Result<FileSink> {
        let file = match &self.dir {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };
        Ok(FileSink {
            file: BufWriter::new(file),
            len: 0,
        })
    }
}

#[derive(Debug)]
pub struct FileSink {
    file: BufWriter<File>,
    len: u64,
}

impl BodySink for FileSink {
    type Content = FileBody;

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.len += bytes.len() as u64;
        Ok(())
    }

    fn finalize(self) -> io::Result<FileBody> {
        let mut file = self.file.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.seek(SeekFrom::Start(0))?;
        Ok(FileBody {
            file,
            len: self.len,
        })
    }
}

/// A finished body stored in a temporary file, positioned at its start.
#[derive(Debug)]
pub struct FileBody {
    file: File,
    len: u64,
}

impl FileBody {
    /// Body size in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read the remaining body into memory.
    pub fn into_bytes(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(usize::try_from(self.len).unwrap_or(0));
        self.file.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for FileBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}
