//! Stream adapters: managed data sources as native engine streams.
//!
//! # Capability probe
//! A managed data source always supports sequential reads.  Some also
//! support random access; [`ManagedStream::as_seekable`] answers that
//! question directly, so stream selection never relies on a failed call.
//! [`select`] probes once per `GetStream` call and builds either a
//! [`SequentialStreamAdapter`] or a [`RandomAccessStreamAdapter`].  The result
//! is never cached: each item may supply a different kind of source.
//!
//! # Ownership
//! A [`DataStream`] is a reference-counted pin on the managed source.  The
//! adapter holds its own clone for as long as the engine holds the adapter,
//! and dropping the adapter releases it.  No explicit close call exists.
//!
//! # Errors
//! Adapters implement `std::io::Read` (and `Seek`).  A managed fault during a
//! read or seek is surfaced as `io::ErrorKind::Other` carrying the
//! [`ManagedFault`] as its inner error.

pub mod byte_array;
pub mod reader;

use std::cell::{RefCell, RefMut};
use std::io::{self, Read, Seek, SeekFrom};
use std::rc::Rc;

use tracing::debug;

use crate::managed::ManagedFault;

pub use byte_array::ByteArrayStream;
pub use reader::ReaderStream;

// ── Managed-side stream contract ─────────────────────────────────────────────

/// A managed data source readable front to back.
pub trait ManagedStream {
    /// Read up to `buf.len()` bytes.  `Ok(0)` means end of stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ManagedFault>;

    /// Capability probe: the random-access view of this source, if it has one.
    fn as_seekable(&mut self) -> Option<&mut dyn SeekableStream> {
        None
    }
}

/// The random-access half of a managed data source.
pub trait SeekableStream {
    /// Move the read position; returns the new absolute position.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, ManagedFault>;
}

/// Reference-counted pin on a managed data source.
pub type DataStream = Rc<RefCell<dyn ManagedStream>>;

/// Pin a managed source.
pub fn data_stream<S: ManagedStream + 'static>(source: S) -> DataStream {
    Rc::new(RefCell::new(source))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamCapability {
    SequentialOnly,
    RandomAccess,
}

impl StreamCapability {
    pub fn probe(source: &DataStream) -> io::Result<Self> {
        let mut s = borrow(source)?;
        Ok(if s.as_seekable().is_some() {
            StreamCapability::RandomAccess
        } else {
            StreamCapability::SequentialOnly
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            StreamCapability::SequentialOnly => "sequential",
            StreamCapability::RandomAccess   => "random-access",
        }
    }
}

// ── Selector ─────────────────────────────────────────────────────────────────

/// Build the adapter matching what `source` can do.
pub fn select(source: DataStream) -> io::Result<NativeStream> {
    let capability = StreamCapability::probe(&source)?;
    debug!(capability = capability.name(), "stream adapter selected");
    Ok(match capability {
        StreamCapability::RandomAccess   => NativeStream::RandomAccess(RandomAccessStreamAdapter { source }),
        StreamCapability::SequentialOnly => NativeStream::Sequential(SequentialStreamAdapter { source }),
    })
}

fn borrow(source: &DataStream) -> io::Result<RefMut<'_, dyn ManagedStream + 'static>> {
    source
        .try_borrow_mut()
        .map_err(|_| io::Error::new(io::ErrorKind::WouldBlock, "managed stream is already in use"))
}

fn fault_to_io(fault: ManagedFault) -> io::Error {
    io::Error::new(io::ErrorKind::Other, fault)
}

fn read_from(source: &DataStream, buf: &mut [u8]) -> io::Result<usize> {
    if buf.is_empty() {
        return Ok(0);
    }
    let n = borrow(source)?.read(buf).map_err(fault_to_io)?;
    if n > buf.len() {
        return Err(io::Error::new(io::ErrorKind::InvalidData, format!(
            "managed stream reported {n} bytes read into a {}-byte buffer",
            buf.len()
        )));
    }
    Ok(n)
}

// ── Adapters ─────────────────────────────────────────────────────────────────

/// Append-only view: reads, nothing else.
pub struct SequentialStreamAdapter {
    source: DataStream,
}

impl Read for SequentialStreamAdapter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_from(&self.source, buf)
    }
}

/// Seekable view with a size query.
pub struct RandomAccessStreamAdapter {
    source: DataStream,
}

impl RandomAccessStreamAdapter {
    /// Total length of the source.  The read position is preserved.
    pub fn size(&mut self) -> io::Result<u64> {
        let pos = self.seek(SeekFrom::Current(0))?;
        let end = self.seek(SeekFrom::End(0))?;
        if pos != end {
            self.seek(SeekFrom::Start(pos))?;
        }
        Ok(end)
    }
}

impl Read for RandomAccessStreamAdapter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_from(&self.source, buf)
    }
}

impl Seek for RandomAccessStreamAdapter {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut s = borrow(&self.source)?;
        let moved = match s.as_seekable() {
            Some(seekable) => seekable.seek(pos).map_err(fault_to_io),
            None => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "managed stream no longer offers random access",
            )),
        };
        moved
    }
}

// ── NativeStream ─────────────────────────────────────────────────────────────

/// What `GetStream` hands to the engine.
pub enum NativeStream {
    Sequential(SequentialStreamAdapter),
    RandomAccess(RandomAccessStreamAdapter),
}

impl NativeStream {
    pub fn capability(&self) -> StreamCapability {
        match self {
            NativeStream::Sequential(_)   => StreamCapability::SequentialOnly,
            NativeStream::RandomAccess(_) => StreamCapability::RandomAccess,
        }
    }

    /// Size of the source, when it supports random access.
    pub fn size(&mut self) -> Option<io::Result<u64>> {
        match self {
            NativeStream::Sequential(_)   => None,
            NativeStream::RandomAccess(s) => Some(s.size()),
        }
    }
}

impl Read for NativeStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            NativeStream::Sequential(s)   => s.read(buf),
            NativeStream::RandomAccess(s) => s.read(buf),
        }
    }
}

impl std::fmt::Debug for NativeStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NativeStream({})", self.capability().name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;
    impl ManagedStream for Failing {
        fn read(&mut self, _: &mut [u8]) -> Result<usize, ManagedFault> {
            Err(ManagedFault::with_class("IOException", "disk gone"))
        }
    }

    #[test]
    fn byte_array_selects_random_access() {
        let source = data_stream(ByteArrayStream::new(b"0123456789".to_vec()));
        let mut stream = select(source).unwrap();
        assert_eq!(stream.capability(), StreamCapability::RandomAccess);
        assert_eq!(stream.size().unwrap().unwrap(), 10);

        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"0123456789");
    }

    #[test]
    fn plain_reader_selects_sequential() {
        let source = data_stream(ReaderStream::new(&b"abc"[..]));
        let mut stream = select(source).unwrap();
        assert_eq!(stream.capability(), StreamCapability::SequentialOnly);
        assert!(stream.size().is_none());

        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        assert_eq!(out, "abc");
    }

    #[test]
    fn size_preserves_position() {
        let source = data_stream(ByteArrayStream::new(b"hello world".to_vec()));
        let NativeStream::RandomAccess(mut s) = select(source).unwrap() else {
            panic!("expected random access");
        };
        s.seek(SeekFrom::Start(6)).unwrap();
        assert_eq!(s.size().unwrap(), 11);
        let mut out = String::new();
        s.read_to_string(&mut out).unwrap();
        assert_eq!(out, "world");
    }

    #[test]
    fn managed_fault_surfaces_as_io_error() {
        let mut stream = select(data_stream(Failing)).unwrap();
        let err = stream.read(&mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        let fault = err.get_ref().and_then(|e| e.downcast_ref::<ManagedFault>()).unwrap();
        assert_eq!(fault.message, "disk gone");
    }

    #[test]
    fn adapter_keeps_source_pinned_until_dropped() {
        let source = data_stream(ByteArrayStream::new(vec![1, 2, 3]));
        let stream = select(source.clone()).unwrap();
        assert_eq!(Rc::strong_count(&source), 2);
        drop(stream);
        assert_eq!(Rc::strong_count(&source), 1);
    }
}
