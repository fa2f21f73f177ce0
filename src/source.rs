//! Pull-model byte source: chunks read on demand from any [`Read`].

use std::io::{self, Read};

use crate::buffer::{ParseStatus, RequestBuffer};
use crate::error::ParseError;
use crate::header::HeaderFactory;
use crate::sink::{BodyStorage, ContentOf};
use crate::types::Request;

/// Iterator over chunks of at most `chunk_size` bytes read from `R`.
///
/// Ends at end-of-stream; a read error is yielded once and ends the
/// iteration.
#[derive(Debug)]
pub struct Chunks<R> {
    reader: R,
    chunk_size: usize,
    done: bool,
}

/// Read `reader` in chunks of at most `chunk_size` bytes (minimum 1).
pub fn chunks<R: Read>(reader: R, chunk_size: usize) -> Chunks<R> {
    Chunks {
        reader,
        chunk_size: chunk_size.max(1),
        done: false,
    }
}

impl<R: Read> Iterator for Chunks<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut chunk = vec![0; self.chunk_size];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(n) => {
                    chunk.truncate(n);
                    return Some(Ok(chunk));
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<F, T> RequestBuffer<F, T>
where
    F: HeaderFactory,
    T: BodyStorage,
{
    /// Pull chunks from `reader` until the request is complete or the
    /// stream ends, then finish.
    ///
    /// Reading stops as soon as the request is complete, so bytes after it
    /// stay unread whenever they fall in a later chunk.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Read`] if the reader fails, otherwise whatever
    /// [`feed`](Self::feed) or [`finish`](Self::finish) reports.
    pub fn read_from<R: Read>(
        mut self,
        reader: R,
        chunk_size: usize,
    ) -> Result<Request<ContentOf<T>>, ParseError> {
        for chunk in chunks(reader, chunk_size) {
            let chunk = chunk.map_err(|err| ParseError::Read(err.to_string()))?;
            if self.feed(&chunk)? == ParseStatus::Complete {
                break;
            }
        }
        self.finish()
    }
}
