//! Byte-count progress reporting for upload bodies.
//!
//! `ProgressReader` is a `Read` proxy: it hands through exactly the bytes
//! of the wrapped reader and tells a `ProgressSink` how far it got after
//! every successful read.

use std::io::{self, Read};

use indicatif::ProgressBar;

/// Receiver of progress updates, usually a terminal progress bar.
pub trait ProgressSink: Send {
    /// Called after each non-empty read with the cumulative byte count.
    fn update(&self, position: u64, total: u64);

    /// Called once when the reader is closed.
    fn finish(&self);
}

impl ProgressSink for ProgressBar {
    fn update(&self, position: u64, _total: u64) {
        self.set_position(position);
    }

    fn finish(&self) {
        ProgressBar::finish(self);
    }
}

/// Reader of known length `total` that reports progress as it is consumed.
///
/// At most `total` bytes are delivered, so the count handed to the sink
/// never exceeds the declared length. Dropping the reader closes the inner
/// reader and finishes the sink.
pub struct ProgressReader<R> {
    inner: R,
    sink: Box<dyn ProgressSink>,
    position: u64,
    total: u64,
    finished: bool,
}

impl<R> ProgressReader<R> {
    pub fn new(inner: R, total: u64, sink: Box<dyn ProgressSink>) -> Self {
        ProgressReader {
            inner,
            sink,
            position: 0,
            total,
            finished: false,
        }
    }

    /// Declared length, suitable for `Content-Length`.
    pub fn len(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Bytes delivered so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.sink.finish();
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.total - self.position;
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }
        let max = remaining.min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..max])?;
        if n > 0 {
            self.position += n as u64;
            self.sink.update(self.position, self.total);
        }
        Ok(n)
    }
}

impl<R> Drop for ProgressReader<R> {
    fn drop(&mut self) {
        self.finish();
    }
}
