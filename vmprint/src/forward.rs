//! The Formatter-Forwarder
//!
//! [`render_and_forward`] is the single routine behind both the print and
//! the error path: render the message into an exactly-sized buffer, hand it
//! to one sink exactly once, release the buffer. [`Forwarder`] adds the
//! handle → sink lookup on top of it.

use crate::config::ForwarderConfig;
use crate::format::render_limited;
use crate::registry::SinkRegistry;
use crate::sink::{CompileError, CompileErrorSink, DebugEvent, DebugHookSink, Sink, SinkKind};
use crate::types::{Arg, Result, VmHandle};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

/// Render `fmt` against `args` and deliver the text to `sink`.
///
/// Errors are only returned for rendering failures, before the sink is
/// called. Once the sink has been called the routine always returns `Ok`,
/// whatever the sink did; the buffer is released on every path.
pub fn render_and_forward(
    handle: VmHandle,
    sink: &dyn Sink,
    fmt: &[u8],
    args: &[Arg<'_>],
    config: &ForwarderConfig,
) -> Result<()> {
    let message = render_limited(fmt, args, config.max_message_len)?;
    log::trace!("Delivering {} bytes to VM {}", message.len(), handle);

    guarded(config.catch_sink_panics, handle, "text", || {
        sink.deliver(handle, message.as_c_str())
    });

    Ok(())
}

/// Run a sink call, containing a panic when `catch` is set
fn guarded(catch: bool, handle: VmHandle, what: &str, call: impl FnOnce()) {
    if !catch {
        call();
        return;
    }
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(call)) {
        log::error!(
            "{} sink for VM {} panicked: {}",
            what,
            handle,
            panic_message(payload.as_ref())
        );
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// Sink registry plus the configuration messages are rendered with
#[derive(Debug, Default)]
pub struct Forwarder {
    config: ForwarderConfig,
    registry: SinkRegistry,
}

impl Forwarder {
    pub fn new(config: ForwarderConfig) -> Self {
        Self {
            config,
            registry: SinkRegistry::new(),
        }
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    pub fn registry(&self) -> &SinkRegistry {
        &self.registry
    }

    pub fn set_print_sink(&self, handle: impl Into<VmHandle>, sink: impl Sink + 'static) {
        self.registry.set_print(handle.into(), sink);
    }

    pub fn set_error_sink(&self, handle: impl Into<VmHandle>, sink: impl Sink + 'static) {
        self.registry.set_error(handle.into(), sink);
    }

    pub fn set_compile_error_sink(
        &self,
        handle: impl Into<VmHandle>,
        sink: impl CompileErrorSink + 'static,
    ) {
        self.registry
            .set_compile_error(handle.into(), Some(Arc::new(sink)));
    }

    pub fn set_debug_hook_sink(&self, handle: impl Into<VmHandle>, sink: impl DebugHookSink + 'static) {
        self.registry.set_debug_hook(handle.into(), Some(Arc::new(sink)));
    }

    /// Forget every sink of `handle`, typically when its VM is closed
    pub fn release(&self, handle: impl Into<VmHandle>) -> bool {
        self.registry.release(handle.into())
    }

    /// Print path
    pub fn print(
        &self,
        handle: impl Into<VmHandle>,
        fmt: impl AsRef<[u8]>,
        args: &[Arg<'_>],
    ) -> Result<()> {
        self.forward(handle.into(), SinkKind::Print, fmt.as_ref(), args)
    }

    /// Error path
    pub fn error(
        &self,
        handle: impl Into<VmHandle>,
        fmt: impl AsRef<[u8]>,
        args: &[Arg<'_>],
    ) -> Result<()> {
        self.forward(handle.into(), SinkKind::Error, fmt.as_ref(), args)
    }

    /// Look up the `kind` sink of `handle` and forward to it.
    ///
    /// Without a registered sink the message is dropped before rendering.
    pub fn forward(
        &self,
        handle: VmHandle,
        kind: SinkKind,
        fmt: &[u8],
        args: &[Arg<'_>],
    ) -> Result<()> {
        match self.registry.sink(handle, kind) {
            Some(sink) => render_and_forward(handle, sink.as_ref(), fmt, args, &self.config),
            None => {
                log::trace!("No {} sink for VM {}, message dropped", kind, handle);
                Ok(())
            }
        }
    }

    pub fn compile_error(&self, handle: impl Into<VmHandle>, error: &CompileError<'_>) {
        let handle = handle.into();
        if let Some(sink) = self.registry.compile_error_sink(handle) {
            guarded(self.config.catch_sink_panics, handle, "compile error", || {
                sink.compile_error(handle, error)
            });
        }
    }

    pub fn debug_hook(&self, handle: impl Into<VmHandle>, event: &DebugEvent<'_>) {
        let handle = handle.into();
        if let Some(sink) = self.registry.debug_hook_sink(handle) {
            guarded(self.config.catch_sink_panics, handle, "debug hook", || {
                sink.debug_event(handle, event)
            });
        }
    }
}

static GLOBAL: OnceLock<Forwarder> = OnceLock::new();

/// The process-wide forwarder used by the C entry points and macros
pub fn global() -> &'static Forwarder {
    GLOBAL.get_or_init(Forwarder::default)
}

/// Configure the global forwarder. Returns `false` if it already exists.
pub fn init_global(config: ForwarderConfig) -> bool {
    let installed = GLOBAL.set(Forwarder::new(config)).is_ok();
    if !installed {
        log::warn!("Global forwarder already initialised, configuration ignored");
    }
    installed
}

/// Print path of the global forwarder
pub fn forward_print(
    handle: impl Into<VmHandle>,
    fmt: impl AsRef<[u8]>,
    args: &[Arg<'_>],
) -> Result<()> {
    global().print(handle, fmt, args)
}

/// Error path of the global forwarder
pub fn forward_error(
    handle: impl Into<VmHandle>,
    fmt: impl AsRef<[u8]>,
    args: &[Arg<'_>],
) -> Result<()> {
    global().error(handle, fmt, args)
}
