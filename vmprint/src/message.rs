//! The rendered message buffer
//!
//! A `RenderedMessage` owns exactly one allocation: the formatted bytes plus
//! a trailing NUL. It lives for a single forwarding call and is released by
//! `Drop` on every exit path, including a panicking sink.

use std::borrow::Cow;
use std::ffi::{c_char, CStr};
use std::fmt;

/// Owned, NUL-terminated output of one formatting run
pub struct RenderedMessage {
    /// Formatted bytes followed by exactly one terminating NUL
    buf: Vec<u8>,
}

impl RenderedMessage {
    /// Wrap a buffer whose last byte is the terminator
    pub(crate) fn from_terminated(buf: Vec<u8>) -> Self {
        debug_assert_eq!(buf.last(), Some(&0));
        Self { buf }
    }

    /// Length in bytes, terminator excluded
    pub fn len(&self) -> usize {
        self.buf.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Formatted bytes without the terminator
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    /// Formatted bytes including the terminator
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf
    }

    /// The text as a C string, i.e. up to the first NUL.
    ///
    /// Only differs from [`as_bytes`](Self::as_bytes) when a `%c` wrote a
    /// zero byte.
    pub fn as_c_str(&self) -> &CStr {
        CStr::from_bytes_until_nul(&self.buf).unwrap_or_default()
    }

    pub fn as_ptr(&self) -> *const c_char {
        self.buf.as_ptr().cast()
    }

    /// Capacity of the underlying allocation
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }
}

impl fmt::Debug for RenderedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedMessage")
            .field("text", &self.to_string_lossy())
            .field("len", &self.len())
            .finish()
    }
}

impl fmt::Display for RenderedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}
