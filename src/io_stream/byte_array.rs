//! In-memory seekable data source.
//!
//! Supports reads, seeks and writes over a growable byte buffer, so the same
//! object can be filled by one side of an update and read back by the other.

use std::io::{self, SeekFrom, Write};

use super::{ManagedStream, SeekableStream};
use crate::managed::ManagedFault;

#[derive(Debug, Clone, Default)]
pub struct ByteArrayStream {
    buf:      Vec<u8>,
    pos:      u64,
    /// Writes that would grow the buffer past this fail.
    max_size: Option<usize>,
}

impl ByteArrayStream {
    /// A stream over existing bytes, positioned at the start.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { buf: bytes, pos: 0, max_size: None }
    }

    /// An empty, writable stream capped at `max_size` bytes.
    pub fn with_max_size(max_size: usize) -> Self {
        Self { buf: Vec::new(), pos: 0, max_size: Some(max_size) }
    }

    pub fn len(&self) -> usize { self.buf.len() }

    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    pub fn position(&self) -> u64 { self.pos }

    pub fn rewind(&mut self) { self.pos = 0; }

    /// Drop everything and start over.
    pub fn truncate(&mut self) {
        self.buf.clear();
        self.pos = 0;
    }

    pub fn as_bytes(&self) -> &[u8] { &self.buf }
}

impl ManagedStream for ByteArrayStream {
    fn read(&mut self, out: &mut [u8]) -> Result<usize, ManagedFault> {
        let len = self.buf.len() as u64;
        if self.pos >= len {
            return Ok(0);
        }
        let start = self.pos as usize;
        let n = out.len().min(self.buf.len() - start);
        out[..n].copy_from_slice(&self.buf[start..start + n]);
        self.pos += n as u64;
        Ok(n)
    }

    fn as_seekable(&mut self) -> Option<&mut dyn SeekableStream> {
        Some(self)
    }
}

impl SeekableStream for ByteArrayStream {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, ManagedFault> {
        let (base, offset) = match pos {
            SeekFrom::Start(n)   => (0i128, i128::from(n)),
            SeekFrom::Current(n) => (i128::from(self.pos), i128::from(n)),
            SeekFrom::End(n)     => (self.buf.len() as i128, i128::from(n)),
        };
        let target = base + offset;
        if target < 0 || target > i128::from(u64::MAX) {
            return Err(ManagedFault::with_class(
                "SevenZipException",
                format!("seek to {target} is out of range"),
            ));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}

impl Write for ByteArrayStream {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let start = usize::try_from(self.pos)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "position exceeds address space"))?;
        let end = start + data.len();
        if let Some(max) = self.max_size {
            if end > max {
                return Err(io::Error::new(io::ErrorKind::OutOfMemory, format!(
                    "stream size would exceed the maximum of {max} bytes"
                )));
            }
        }
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[start..end].copy_from_slice(data);
        self.pos = end as u64;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_back() {
        let mut s = ByteArrayStream::with_max_size(64);
        s.write_all(b"ABCDEF").unwrap();
        s.rewind();
        let mut out = [0u8; 4];
        assert_eq!(ManagedStream::read(&mut s, &mut out).unwrap(), 4);
        assert_eq!(&out, b"ABCD");
        assert_eq!(ManagedStream::read(&mut s, &mut out).unwrap(), 2);
        assert_eq!(&out[..2], b"EF");
        assert_eq!(ManagedStream::read(&mut s, &mut out).unwrap(), 0);
    }

    #[test]
    fn overwrite_in_the_middle() {
        let mut s = ByteArrayStream::new(b"0123456789".to_vec());
        SeekableStream::seek(&mut s, SeekFrom::Start(3)).unwrap();
        s.write_all(b"abc").unwrap();
        assert_eq!(s.as_bytes(), b"012abc6789");
        assert_eq!(s.position(), 6);
    }

    #[test]
    fn max_size_is_enforced() {
        let mut s = ByteArrayStream::with_max_size(4);
        assert!(s.write_all(b"12345").is_err());
        assert!(s.is_empty());
    }

    #[test]
    fn negative_seek_faults() {
        let mut s = ByteArrayStream::new(vec![0; 8]);
        assert!(SeekableStream::seek(&mut s, SeekFrom::Current(-1)).is_err());
        assert_eq!(SeekableStream::seek(&mut s, SeekFrom::End(-2)).unwrap(), 6);
    }

    #[test]
    fn truncate_resets() {
        let mut s = ByteArrayStream::new(b"xyz".to_vec());
        s.truncate();
        assert_eq!(s.len(), 0);
        assert_eq!(s.position(), 0);
    }
}
