//! Core types for the vmprint library
//!
//! This module defines the handle that identifies a host-side VM, the typed
//! arguments accepted by the formatter, and the error type every operation
//! returns.

use std::ffi::CStr;
use std::fmt;

/// Result type for vmprint operations
pub type Result<T> = std::result::Result<T, ForwardError>;

/// Opaque identifier of a host-side VM instance.
///
/// The value is threaded through to the sinks unchanged and never
/// dereferenced; only the host knows what it stands for.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VmHandle(usize);

impl VmHandle {
    /// Wrap a raw handle value
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// The raw value, bit-for-bit as it was supplied
    pub const fn raw(self) -> usize {
        self.0
    }
}

impl From<usize> for VmHandle {
    fn from(raw: usize) -> Self {
        Self(raw)
    }
}

impl<T> From<*const T> for VmHandle {
    fn from(ptr: *const T) -> Self {
        Self(ptr as usize)
    }
}

impl<T> From<*mut T> for VmHandle {
    fn from(ptr: *mut T) -> Self {
        Self(ptr as usize)
    }
}

impl fmt::Display for VmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A single printf argument.
///
/// Each directive checks the variant it is handed, so a mismatch between the
/// format string and the argument list is an error instead of a misread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    /// Signed integer (`%d`, `%i`, `%c`, `*` width/precision)
    Int(i64),
    /// Unsigned integer (`%u`, `%o`, `%x`, `%X`)
    UInt(u64),
    /// Floating-point value (`%f`, `%e`, `%g` and uppercase forms)
    Float(f64),
    /// Byte string (`%s`); output stops at the first NUL byte
    Str(&'a [u8]),
    /// Pointer-sized address (`%p`)
    Ptr(usize),
}

impl Arg<'_> {
    /// Short name of the variant, used in mismatch errors
    pub fn kind(&self) -> &'static str {
        match self {
            Arg::Int(_) => "int",
            Arg::UInt(_) => "uint",
            Arg::Float(_) => "float",
            Arg::Str(_) => "str",
            Arg::Ptr(_) => "ptr",
        }
    }
}

macro_rules! arg_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Arg<'_> {
            fn from(v: $t) -> Self {
                Arg::Int(v as i64)
            }
        })*
    };
}

macro_rules! arg_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Arg<'_> {
            fn from(v: $t) -> Self {
                Arg::UInt(v as u64)
            }
        })*
    };
}

arg_from_signed!(i8, i16, i32, i64, isize);
arg_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for Arg<'_> {
    fn from(v: f32) -> Self {
        Arg::Float(v.into())
    }
}

impl From<f64> for Arg<'_> {
    fn from(v: f64) -> Self {
        Arg::Float(v)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(v: &'a str) -> Self {
        Arg::Str(v.as_bytes())
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(v: &'a String) -> Self {
        Arg::Str(v.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(v: &'a [u8]) -> Self {
        Arg::Str(v)
    }
}

impl<'a> From<&'a CStr> for Arg<'a> {
    fn from(v: &'a CStr) -> Self {
        Arg::Str(v.to_bytes())
    }
}

impl<T> From<*const T> for Arg<'_> {
    fn from(v: *const T) -> Self {
        Arg::Ptr(v as usize)
    }
}

impl<T> From<*mut T> for Arg<'_> {
    fn from(v: *mut T) -> Self {
        Arg::Ptr(v as usize)
    }
}

/// Errors that can occur while rendering or forwarding a message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForwardError {
    #[error("Out of memory: could not allocate {requested} bytes for the rendered message")]
    OutOfMemory { requested: usize },

    #[error("Missing argument {index} for %{conversion}")]
    MissingArgument { index: usize, conversion: char },

    #[error("Argument {index} is {found}, which %{conversion} cannot take")]
    ArgumentMismatch {
        index: usize,
        conversion: char,
        found: &'static str,
    },

    #[error("Unsupported conversion %{conversion} at byte {offset}")]
    UnsupportedConversion { offset: usize, conversion: char },

    #[error("Incomplete format directive at byte {offset}")]
    IncompleteSpecifier { offset: usize },

    #[error("Field width or precision too large at byte {offset}")]
    FieldOverflow { offset: usize },

    #[error("Rendered message is {len} bytes, limit is {limit}")]
    MessageTooLong { len: usize, limit: usize },
}

impl ForwardError {
    /// True for errors caused by the format string or its arguments
    pub fn is_format_error(&self) -> bool {
        !matches!(
            self,
            ForwardError::OutOfMemory { .. } | ForwardError::MessageTooLong { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_identity() {
        let raw = 0xdead_beef_usize;
        let handle = VmHandle::from(raw);
        assert_eq!(handle.raw(), raw);
        assert_eq!(handle.to_string(), "0xdeadbeef");
    }

    #[test]
    fn test_arg_conversions() {
        assert_eq!(Arg::from(7i32), Arg::Int(7));
        assert_eq!(Arg::from(-1i8), Arg::Int(-1));
        assert_eq!(Arg::from(7u32), Arg::UInt(7));
        assert_eq!(Arg::from(2.5f32), Arg::Float(2.5));
        assert_eq!(Arg::from("fail"), Arg::Str(b"fail"));
        assert_eq!(Arg::from(std::ptr::null::<u8>()), Arg::Ptr(0));
        let cstr = CStr::from_bytes_with_nul(b"abc\0").unwrap();
        assert_eq!(Arg::from(cstr), Arg::Str(b"abc"));
    }

    #[test]
    fn test_error_classification() {
        assert!(ForwardError::IncompleteSpecifier { offset: 0 }.is_format_error());
        assert!(!ForwardError::OutOfMemory { requested: 1 }.is_format_error());
        assert_eq!(
            ForwardError::MissingArgument { index: 2, conversion: 'd' }.to_string(),
            "Missing argument 2 for %d"
        );
    }
}
