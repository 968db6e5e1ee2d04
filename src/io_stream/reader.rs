//! Sequential-only data source over any `std::io::Read`.

use std::io::Read;

use super::ManagedStream;
use crate::managed::ManagedFault;

pub struct ReaderStream<R: Read> {
    inner: R,
}

impl<R: Read> ReaderStream<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> ManagedStream for ReaderStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ManagedFault> {
        self.inner
            .read(buf)
            .map_err(|e| ManagedFault::with_class("IOException", e.to_string()))
    }
}
