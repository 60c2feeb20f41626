//! Chunked byte sources.
//!
//! [`ChunkReader`] turns an iterator of byte chunks into a [`BufRead`], so
//! the XML tokenizer pulls a new chunk only when the next event needs more
//! input. This is what lets a [`Document`](crate::Document) consume its
//! stream just in time.

use std::io::{self, BufRead, Read};
use std::iter::Fuse;

/// [`BufRead`] adapter over an iterator of fallible byte chunks.
///
/// Empty chunks are skipped. The adapter never reads ahead: a chunk is
/// taken from the iterator only once the previous one is fully consumed.
///
/// # Example
///
/// ```rust
/// use libearth_schema::ChunkReader;
/// use std::io::Read;
///
/// let chunks = vec!["<a>", "", "text</a>"].into_iter().map(Ok);
/// let mut reader = ChunkReader::new(chunks);
/// let mut out = String::new();
/// reader.read_to_string(&mut out).unwrap();
/// assert_eq!(out, "<a>text</a>");
/// assert_eq!(reader.chunks_pulled(), 3);
/// ```
pub struct ChunkReader<I, T>
where
    I: Iterator<Item = io::Result<T>>,
    T: AsRef<[u8]>,
{
    chunks: Fuse<I>,
    current: Option<T>,
    position: usize,
    pulled: usize,
}

impl<I, T> ChunkReader<I, T>
where
    I: Iterator<Item = io::Result<T>>,
    T: AsRef<[u8]>,
{
    /// Wraps a chunk iterator.
    pub fn new(chunks: I) -> Self {
        Self {
            chunks: chunks.fuse(),
            current: None,
            position: 0,
            pulled: 0,
        }
    }

    /// Number of chunks taken from the iterator so far.
    pub fn chunks_pulled(&self) -> usize {
        self.pulled
    }

    fn current_exhausted(&self) -> bool {
        match &self.current {
            Some(chunk) => self.position >= chunk.as_ref().len(),
            None => true,
        }
    }
}

impl<I, T> BufRead for ChunkReader<I, T>
where
    I: Iterator<Item = io::Result<T>>,
    T: AsRef<[u8]>,
{
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        while self.current_exhausted() {
            match self.chunks.next() {
                Some(chunk) => {
                    self.current = Some(chunk?);
                    self.position = 0;
                    self.pulled += 1;
                }
                None => {
                    self.current = None;
                    break;
                }
            }
        }
        Ok(match &self.current {
            Some(chunk) => &chunk.as_ref()[self.position..],
            None => &[],
        })
    }

    fn consume(&mut self, amount: usize) {
        if let Some(chunk) = &self.current {
            self.position = (self.position + amount).min(chunk.as_ref().len());
        }
    }
}

impl<I, T> Read for ChunkReader<I, T>
where
    I: Iterator<Item = io::Result<T>>,
    T: AsRef<[u8]>,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = self.fill_buf()?;
        let amount = available.len().min(buf.len());
        buf[..amount].copy_from_slice(&available[..amount]);
        self.consume(amount);
        Ok(amount)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    type StrChunks = std::iter::Map<
        std::vec::IntoIter<&'static str>,
        fn(&'static str) -> io::Result<&'static str>,
    >;

    fn reader(chunks: Vec<&'static str>) -> ChunkReader<StrChunks, &'static str> {
        ChunkReader::new(
            chunks
                .into_iter()
                .map(Ok as fn(&'static str) -> io::Result<&'static str>),
        )
    }

    #[test]
    fn test_pulls_lazily() {
        let mut r = reader(vec!["ab", "cd"]);
        assert_eq!(r.chunks_pulled(), 0);
        assert_eq!(r.fill_buf().unwrap(), b"ab");
        assert_eq!(r.chunks_pulled(), 1);
        r.consume(1);
        assert_eq!(r.fill_buf().unwrap(), b"b");
        assert_eq!(r.chunks_pulled(), 1);
        r.consume(1);
        assert_eq!(r.fill_buf().unwrap(), b"cd");
        assert_eq!(r.chunks_pulled(), 2);
    }

    #[test]
    fn test_skips_empty_chunks() {
        let mut r = reader(vec!["", "", "x", ""]);
        assert_eq!(r.fill_buf().unwrap(), b"x");
        r.consume(1);
        assert_eq!(r.fill_buf().unwrap(), b"");
        // Exhausted readers stay exhausted
        assert_eq!(r.fill_buf().unwrap(), b"");
    }

    #[test]
    fn test_read_to_string() {
        let mut r = reader(vec!["<a>", "b", "</a>"]);
        let mut out = String::new();
        r.read_to_string(&mut out).unwrap();
        assert_eq!(out, "<a>b</a>");
    }

    #[test]
    fn test_propagates_chunk_errors() {
        let chunks: Vec<io::Result<Vec<u8>>> = vec![
            Ok(b"ok".to_vec()),
            Err(io::Error::other("disk on fire")),
        ];
        let mut r = ChunkReader::new(chunks.into_iter());
        let mut out = Vec::new();
        let err = r.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.to_string(), "disk on fire");
        assert_eq!(out, b"ok");
    }

    #[test]
    fn test_consume_past_end_is_clamped() {
        let mut r = reader(vec!["ab"]);
        r.fill_buf().unwrap();
        r.consume(10);
        assert_eq!(r.fill_buf().unwrap(), b"");
    }
}
