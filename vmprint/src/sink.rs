//! Host sinks
//!
//! A sink is the capability the forwarder delivers text to. Rust hosts can
//! register closures; C hosts register plain function pointers through
//! [`ffi`](crate::ffi), which are wrapped in the `C*Sink` adapters below.
//!
//! Every borrowed argument is only valid for the duration of the call. A
//! sink that needs the text later must copy it.

use crate::types::VmHandle;
use std::ffi::{c_char, CStr};

/// Receives formatted print or error text
pub trait Sink: Send + Sync {
    fn deliver(&self, handle: VmHandle, text: &CStr);
}

impl<F> Sink for F
where
    F: Fn(VmHandle, &CStr) + Send + Sync,
{
    fn deliver(&self, handle: VmHandle, text: &CStr) {
        self(handle, text)
    }
}

/// Which of the two text sinks a message is meant for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Print,
    Error,
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkKind::Print => write!(f, "print"),
            SinkKind::Error => write!(f, "error"),
        }
    }
}

/// A compiler diagnostic reported by the VM
#[derive(Debug, Clone, Copy)]
pub struct CompileError<'a> {
    pub desc: &'a CStr,
    pub source: &'a CStr,
    pub line: i64,
    pub column: i64,
}

/// Receives compiler diagnostics
pub trait CompileErrorSink: Send + Sync {
    fn compile_error(&self, handle: VmHandle, error: &CompileError<'_>);
}

impl<F> CompileErrorSink for F
where
    F: Fn(VmHandle, &CompileError<'_>) + Send + Sync,
{
    fn compile_error(&self, handle: VmHandle, error: &CompileError<'_>) {
        self(handle, error)
    }
}

/// Kind of event reported through the native debug hook
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub enum DebugHookType {
    CallFunc,
    ExecLine,
    RetFunc,
    Unknown,
}

impl From<i64> for DebugHookType {
    fn from(value: i64) -> Self {
        match value {
            0x63 => Self::CallFunc, // 'c'
            0x6c => Self::ExecLine, // 'l'
            0x72 => Self::RetFunc,  // 'r'
            _ => Self::Unknown,
        }
    }
}

/// One debug hook event
#[derive(Debug, Clone, Copy)]
pub struct DebugEvent<'a> {
    pub kind: DebugHookType,
    pub source: &'a CStr,
    pub line: i64,
    pub function: &'a CStr,
}

/// Receives debug hook events
pub trait DebugHookSink: Send + Sync {
    fn debug_event(&self, handle: VmHandle, event: &DebugEvent<'_>);
}

impl<F> DebugHookSink for F
where
    F: Fn(VmHandle, &DebugEvent<'_>) + Send + Sync,
{
    fn debug_event(&self, handle: VmHandle, event: &DebugEvent<'_>) {
        self(handle, event)
    }
}

/// `void (*)(uintptr_t handle, const char *text)`
pub type CSinkFn = unsafe extern "C" fn(handle: usize, text: *const c_char);

/// `void (*)(uintptr_t, const char *desc, const char *source, int64_t line, int64_t column)`
pub type CCompileErrorFn = unsafe extern "C" fn(
    handle: usize,
    desc: *const c_char,
    source: *const c_char,
    line: i64,
    column: i64,
);

/// `void (*)(uintptr_t, int64_t type, const char *source, int64_t line, const char *func)`
pub type CDebugHookFn = unsafe extern "C" fn(
    handle: usize,
    kind: i64,
    source: *const c_char,
    line: i64,
    function: *const c_char,
);

/// Text sink backed by a C function pointer
#[derive(Debug, Clone, Copy)]
pub struct CSink(CSinkFn);

impl CSink {
    /// # Safety
    ///
    /// `f` must be safe to call from any thread the VM prints on, with a
    /// pointer that is only valid until it returns.
    pub unsafe fn new(f: CSinkFn) -> Self {
        Self(f)
    }
}

impl Sink for CSink {
    fn deliver(&self, handle: VmHandle, text: &CStr) {
        // SAFETY: `CSink::new` requires the callee to honour the contract,
        // and `text` outlives the call.
        unsafe { (self.0)(handle.raw(), text.as_ptr()) }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CCompileErrorSink(CCompileErrorFn);

impl CCompileErrorSink {
    /// # Safety
    ///
    /// Same contract as [`CSink::new`].
    pub unsafe fn new(f: CCompileErrorFn) -> Self {
        Self(f)
    }
}

impl CompileErrorSink for CCompileErrorSink {
    fn compile_error(&self, handle: VmHandle, error: &CompileError<'_>) {
        // SAFETY: see `CCompileErrorSink::new`.
        unsafe {
            (self.0)(
                handle.raw(),
                error.desc.as_ptr(),
                error.source.as_ptr(),
                error.line,
                error.column,
            )
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CDebugHookSink(CDebugHookFn);

impl CDebugHookSink {
    /// # Safety
    ///
    /// Same contract as [`CSink::new`].
    pub unsafe fn new(f: CDebugHookFn) -> Self {
        Self(f)
    }
}

impl DebugHookSink for CDebugHookSink {
    fn debug_event(&self, handle: VmHandle, event: &DebugEvent<'_>) {
        let kind = match event.kind {
            DebugHookType::CallFunc => 0x63,
            DebugHookType::ExecLine => 0x6c,
            DebugHookType::RetFunc => 0x72,
            DebugHookType::Unknown => 0,
        };
        // SAFETY: see `CDebugHookSink::new`.
        unsafe {
            (self.0)(
                handle.raw(),
                kind,
                event.source.as_ptr(),
                event.line,
                event.function.as_ptr(),
            )
        }
    }
}
