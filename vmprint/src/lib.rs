//! vmprint
//!
//! Print and error forwarding for an embedded scripting VM. The VM hands over
//! a printf-style format string and its arguments together with an opaque
//! handle; vmprint renders the text into an exactly-sized buffer, delivers it
//! to the sink the host registered for that handle, and releases the buffer.
//!
//! # Architecture
//!
//! - [`render`] / [`measure`]: printf-style engine with a dry-run pass that
//!   sizes the buffer before the real pass writes it
//! - [`Sink`]: the capability a message is delivered to (closures or C
//!   function pointers)
//! - [`SinkRegistry`]: handle → sinks, never dereferencing the handle
//! - [`Forwarder`]: one routine behind both the print and the error path
//! - [`ffi`]: C ABI, including variadic entry points built from `csrc/`
//!
//! # Example Usage
//!
//! ```
//! use std::ffi::CStr;
//! use vmprint::{Arg, Forwarder, VmHandle};
//!
//! let forwarder = Forwarder::default();
//! forwarder.set_print_sink(42usize, |handle: VmHandle, text: &CStr| {
//!     println!("[vm {}] {}", handle, text.to_string_lossy());
//! });
//!
//! forwarder.print(42usize, "%d apples", &[Arg::Int(7)]).unwrap();
//! ```

// Public modules
pub mod config;
pub mod ffi;
pub mod types;

// Re-export main types for convenience
pub use config::ForwarderConfig;
pub use format::{measure, render};
pub use forward::{
    forward_error, forward_print, global, init_global, render_and_forward, Forwarder,
};
pub use message::RenderedMessage;
pub use registry::{SinkRegistry, SinkSet};
pub use sink::{
    CCompileErrorSink, CDebugHookSink, CSink, CompileError, CompileErrorSink, DebugEvent,
    DebugHookSink, DebugHookType, Sink, SinkKind,
};
pub use types::{Arg, ForwardError, Result, VmHandle};

// Internal modules (re-exported above)
mod format;
mod forward;
mod message;
mod registry;
mod sink;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Format and deliver to the print sink of the global forwarder.
///
/// Arguments go through [`Arg::from`], so plain integers, floats, strings
/// and pointers can be passed directly.
#[macro_export]
macro_rules! vm_print {
    ($handle:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::forward_print($handle, $fmt, &[$($crate::Arg::from($arg)),*])
    };
}

/// Format and deliver to the error sink of the global forwarder
#[macro_export]
macro_rules! vm_error {
    ($handle:expr, $fmt:expr $(, $arg:expr)* $(,)?) => {
        $crate::forward_error($handle, $fmt, &[$($crate::Arg::from($arg)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_library_basics() {
        // Smoke test: a fresh forwarder has no sinks
        let forwarder = Forwarder::default();
        assert!(forwarder.registry().is_empty());
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_macros_use_global_forwarder() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handle = VmHandle::new(0xAB01);

        let sink_seen = Arc::clone(&seen);
        global().set_print_sink(handle, move |_: VmHandle, text: &CStr| {
            sink_seen.lock().unwrap().push(text.to_string_lossy().into_owned());
        });
        let sink_seen = Arc::clone(&seen);
        global().set_error_sink(handle, move |_: VmHandle, text: &CStr| {
            sink_seen.lock().unwrap().push(format!("E: {}", text.to_string_lossy()));
        });

        vm_print!(handle, "%d apples", 7i32).unwrap();
        vm_error!(handle, "code=%d msg=%s", 500i32, "fail").unwrap();
        vm_print!(handle, "").unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["7 apples", "E: code=500 msg=fail", ""]
        );
        global().release(handle);
    }
}
