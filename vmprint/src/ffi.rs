//! C ABI surface
//!
//! Hosts written in C register plain function pointers as sinks and the VM
//! calls either the typed entry points below or the variadic ones compiled
//! from `csrc/vmprint_variadic.c`, which forward here. Everything goes
//! through the [global](crate::global) forwarder.
//!
//! No panic crosses this boundary.

use crate::forward::{global, panic_message};
use crate::sink::{
    CCompileErrorSink, CDebugHookSink, CSink, CompileError, CompileErrorSink, DebugEvent,
    DebugHookSink, Sink, SinkKind,
};
use crate::types::{Arg, ForwardError, VmHandle};
use std::ffi::{c_char, c_int, c_void, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

pub use crate::sink::{CCompileErrorFn, CDebugHookFn, CSinkFn};

pub const VMPRINT_OK: c_int = 0;
pub const VMPRINT_E_FORMAT: c_int = -1;
pub const VMPRINT_E_NOMEM: c_int = -2;
pub const VMPRINT_E_TOO_LONG: c_int = -3;
pub const VMPRINT_E_INVALID: c_int = -4;

pub const VMPRINT_ARG_INT: u32 = 0;
pub const VMPRINT_ARG_UINT: u32 = 1;
pub const VMPRINT_ARG_FLOAT: u32 = 2;
pub const VMPRINT_ARG_STR: u32 = 3;
pub const VMPRINT_ARG_PTR: u32 = 4;

/// Payload of a [`VmPrintArg`], selected by its `kind`
#[repr(C)]
#[derive(Clone, Copy)]
pub union VmPrintValue {
    pub i: i64,
    pub u: u64,
    pub f: f64,
    pub s: *const c_char,
    pub p: *const c_void,
}

/// `vmprint_arg` in `vmprint.h`
#[repr(C)]
#[derive(Clone, Copy)]
pub struct VmPrintArg {
    pub kind: u32,
    pub value: VmPrintValue,
}

impl VmPrintArg {
    pub fn int(i: i64) -> Self {
        Self { kind: VMPRINT_ARG_INT, value: VmPrintValue { i } }
    }

    pub fn uint(u: u64) -> Self {
        Self { kind: VMPRINT_ARG_UINT, value: VmPrintValue { u } }
    }

    pub fn float(f: f64) -> Self {
        Self { kind: VMPRINT_ARG_FLOAT, value: VmPrintValue { f } }
    }

    pub fn str(s: *const c_char) -> Self {
        Self { kind: VMPRINT_ARG_STR, value: VmPrintValue { s } }
    }

    pub fn ptr(p: *const c_void) -> Self {
        Self { kind: VMPRINT_ARG_PTR, value: VmPrintValue { p } }
    }

    /// # Safety
    ///
    /// A `VMPRINT_ARG_STR` argument must hold null or a valid C string that
    /// outlives `'a`.
    unsafe fn to_arg<'a>(self) -> Option<Arg<'a>> {
        // SAFETY: `kind` selects the union field that was written.
        unsafe {
            match self.kind {
                VMPRINT_ARG_INT => Some(Arg::Int(self.value.i)),
                VMPRINT_ARG_UINT => Some(Arg::UInt(self.value.u)),
                VMPRINT_ARG_FLOAT => Some(Arg::Float(self.value.f)),
                VMPRINT_ARG_STR if self.value.s.is_null() => Some(Arg::Str(b"(null)")),
                VMPRINT_ARG_STR => Some(Arg::Str(CStr::from_ptr(self.value.s).to_bytes())),
                VMPRINT_ARG_PTR => Some(Arg::Ptr(self.value.p as usize)),
                _ => None,
            }
        }
    }
}

impl std::fmt::Debug for VmPrintArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // SAFETY: reading the field `kind` names; the string is not followed.
        unsafe {
            match self.kind {
                VMPRINT_ARG_INT => write!(f, "Int({})", self.value.i),
                VMPRINT_ARG_UINT => write!(f, "UInt({})", self.value.u),
                VMPRINT_ARG_FLOAT => write!(f, "Float({})", self.value.f),
                VMPRINT_ARG_STR => write!(f, "Str({:p})", self.value.s),
                VMPRINT_ARG_PTR => write!(f, "Ptr({:p})", self.value.p),
                other => write!(f, "Invalid(kind={})", other),
            }
        }
    }
}

fn status_for(error: &ForwardError) -> c_int {
    match error {
        ForwardError::OutOfMemory { .. } => VMPRINT_E_NOMEM,
        ForwardError::MessageTooLong { .. } => VMPRINT_E_TOO_LONG,
        _ => VMPRINT_E_FORMAT,
    }
}

/// # Safety
///
/// `ptr` must be null or a valid C string that outlives `'a`.
unsafe fn c_str_or_empty<'a>(ptr: *const c_char) -> &'a CStr {
    if ptr.is_null() {
        Default::default()
    } else {
        // SAFETY: non-null and valid per the caller's contract.
        unsafe { CStr::from_ptr(ptr) }
    }
}

/// Contain a panic so it never unwinds into C
fn contained<R>(what: &str, fallback: R, call: impl FnOnce() -> R) -> R {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(value) => value,
        Err(payload) => {
            log::error!("Panic in {}: {}", what, panic_message(payload.as_ref()));
            fallback
        }
    }
}

unsafe fn forward_typed(
    kind: SinkKind,
    handle: usize,
    fmt: *const c_char,
    args: *const VmPrintArg,
    count: usize,
) -> c_int {
    let handle = VmHandle::new(handle);
    if fmt.is_null() || (args.is_null() && count > 0) {
        log::warn!("Invalid {} call for VM {}: null format or arguments", kind, handle);
        return VMPRINT_E_INVALID;
    }

    // SAFETY: checked non-null above; the caller guarantees validity.
    let fmt = unsafe { CStr::from_ptr(fmt) };
    let raw_args: &[VmPrintArg] = if count == 0 {
        &[]
    } else {
        // SAFETY: `args` points to `count` initialised elements.
        unsafe { std::slice::from_raw_parts(args, count) }
    };

    let mut typed = Vec::with_capacity(raw_args.len());
    for (index, raw) in raw_args.iter().enumerate() {
        // SAFETY: string arguments are valid for the duration of this call.
        match unsafe { raw.to_arg() } {
            Some(arg) => typed.push(arg),
            None => {
                log::warn!(
                    "Invalid {} call for VM {}: argument {} has unknown kind {}",
                    kind,
                    handle,
                    index,
                    raw.kind
                );
                return VMPRINT_E_INVALID;
            }
        }
    }

    contained("vmprint forward", VMPRINT_OK, || {
        match global().forward(handle, kind, fmt.to_bytes(), &typed) {
            Ok(()) => VMPRINT_OK,
            Err(e) => {
                log::warn!("Dropped {} message for VM {}: {}", kind, handle, e);
                status_for(&e)
            }
        }
    })
}

/// Format and deliver to the print sink of `handle`.
///
/// # Safety
///
/// `fmt` must be a valid C string, `args` must point to `count` arguments,
/// and string arguments must be null or valid C strings.
#[no_mangle]
pub unsafe extern "C" fn vmprint_print_args(
    handle: usize,
    fmt: *const c_char,
    args: *const VmPrintArg,
    count: usize,
) -> c_int {
    // SAFETY: forwarded caller contract.
    unsafe { forward_typed(SinkKind::Print, handle, fmt, args, count) }
}

/// Format and deliver to the error sink of `handle`.
///
/// # Safety
///
/// Same as [`vmprint_print_args`].
#[no_mangle]
pub unsafe extern "C" fn vmprint_error_args(
    handle: usize,
    fmt: *const c_char,
    args: *const VmPrintArg,
    count: usize,
) -> c_int {
    // SAFETY: forwarded caller contract.
    unsafe { forward_typed(SinkKind::Error, handle, fmt, args, count) }
}

fn set_text_sink(handle: usize, kind: SinkKind, sink: Option<CSinkFn>) {
    // SAFETY: the C host registering the sink takes on `CSink`'s contract.
    let sink = sink.map(|f| Arc::new(unsafe { CSink::new(f) }) as Arc<dyn Sink>);
    global().registry().set_sink(VmHandle::new(handle), kind, sink);
}

/// Install (or clear, with null) the print sink of `handle`
#[no_mangle]
pub extern "C" fn vmprint_set_print_sink(handle: usize, sink: Option<CSinkFn>) {
    contained("vmprint_set_print_sink", (), || {
        set_text_sink(handle, SinkKind::Print, sink)
    })
}

/// Install (or clear, with null) the error sink of `handle`
#[no_mangle]
pub extern "C" fn vmprint_set_error_sink(handle: usize, sink: Option<CSinkFn>) {
    contained("vmprint_set_error_sink", (), || {
        set_text_sink(handle, SinkKind::Error, sink)
    })
}

#[no_mangle]
pub extern "C" fn vmprint_set_compile_error_sink(handle: usize, sink: Option<CCompileErrorFn>) {
    contained("vmprint_set_compile_error_sink", (), || {
        // SAFETY: see `set_text_sink`.
        let sink = sink
            .map(|f| Arc::new(unsafe { CCompileErrorSink::new(f) }) as Arc<dyn CompileErrorSink>);
        global()
            .registry()
            .set_compile_error(VmHandle::new(handle), sink);
    })
}

#[no_mangle]
pub extern "C" fn vmprint_set_debug_hook_sink(handle: usize, sink: Option<CDebugHookFn>) {
    contained("vmprint_set_debug_hook_sink", (), || {
        // SAFETY: see `set_text_sink`.
        let sink =
            sink.map(|f| Arc::new(unsafe { CDebugHookSink::new(f) }) as Arc<dyn DebugHookSink>);
        global().registry().set_debug_hook(VmHandle::new(handle), sink);
    })
}

/// Drop every sink of `handle`; call when its VM is closed
#[no_mangle]
pub extern "C" fn vmprint_release(handle: usize) {
    contained("vmprint_release", (), || {
        global().release(handle);
    })
}

/// Compiler error trampoline, matching the VM's compiler-error callback.
///
/// # Safety
///
/// `desc` and `source` must be null or valid C strings.
#[no_mangle]
pub unsafe extern "C" fn vmprint_compile_error(
    handle: usize,
    desc: *const c_char,
    source: *const c_char,
    line: i64,
    column: i64,
) {
    // SAFETY: forwarded caller contract.
    let error = unsafe {
        CompileError {
            desc: c_str_or_empty(desc),
            source: c_str_or_empty(source),
            line,
            column,
        }
    };
    contained("vmprint_compile_error", (), || {
        global().compile_error(handle, &error)
    })
}

/// Native debug hook trampoline.
///
/// # Safety
///
/// `source` and `function` must be null or valid C strings.
#[no_mangle]
pub unsafe extern "C" fn vmprint_debug_hook(
    handle: usize,
    kind: i64,
    source: *const c_char,
    line: i64,
    function: *const c_char,
) {
    // SAFETY: forwarded caller contract.
    let event = unsafe {
        DebugEvent {
            kind: kind.into(),
            source: c_str_or_empty(source),
            line,
            function: c_str_or_empty(function),
        }
    };
    contained("vmprint_debug_hook", (), || global().debug_hook(handle, &event))
}

extern "C" {
    /// Variadic print entry point from `csrc/vmprint_variadic.c`
    pub fn vmprint_print(handle: usize, fmt: *const c_char, ...);

    /// Variadic error entry point from `csrc/vmprint_variadic.c`
    pub fn vmprint_error(handle: usize, fmt: *const c_char, ...);
}
