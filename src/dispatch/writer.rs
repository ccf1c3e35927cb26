//! Bounded text output for command interpreters.

use std::fmt;

use super::DispatchError;

/// Writes a reply into a fixed-capacity buffer, failing instead of
/// truncating.
///
/// `write!(writer, ...)` returns `Result<(), DispatchError>`.
#[derive(Debug)]
pub struct ReplyWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> ReplyWriter<'a> {
    /// Wrap an output buffer.
    #[must_use]
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Total capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing was written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append raw bytes.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), DispatchError> {
        let end = self.len + bytes.len();
        if end > self.buf.len() {
            return Err(DispatchError::Truncated {
                capacity: self.buf.len(),
            });
        }
        self.buf[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    /// Append a string.
    pub fn push_str(&mut self, text: &str) -> Result<(), DispatchError> {
        self.push_bytes(text.as_bytes())
    }

    /// Append formatted text; backs the `write!` macro.
    pub fn write_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<(), DispatchError> {
        struct Adapter<'w, 'a> {
            writer: &'w mut ReplyWriter<'a>,
        }

        impl fmt::Write for Adapter<'_, '_> {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                self.writer.push_str(s).map_err(|_| fmt::Error)
            }
        }

        let capacity = self.buf.len();
        fmt::write(&mut Adapter { writer: self }, args)
            .map_err(|_| DispatchError::Truncated { capacity })
    }

    /// Consume the writer, returning the written bytes.
    #[must_use]
    pub fn into_written(self) -> &'a [u8] {
        let Self { buf, len } = self;
        &buf[..len]
    }
}
