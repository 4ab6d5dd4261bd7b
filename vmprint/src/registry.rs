//! Per-handle sink registry
//!
//! The host keeps the mapping from handle to VM; this registry keeps the
//! mapping from handle to the sinks that VM prints into. Lookups clone the
//! `Arc` out so the lock is never held while a sink runs.

use crate::sink::{CompileErrorSink, DebugHookSink, Sink, SinkKind};
use crate::types::VmHandle;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The sinks registered for one handle
#[derive(Default, Clone)]
pub struct SinkSet {
    pub print: Option<Arc<dyn Sink>>,
    pub error: Option<Arc<dyn Sink>>,
    pub compile_error: Option<Arc<dyn CompileErrorSink>>,
    pub debug_hook: Option<Arc<dyn DebugHookSink>>,
}

impl SinkSet {
    fn is_empty(&self) -> bool {
        self.print.is_none()
            && self.error.is_none()
            && self.compile_error.is_none()
            && self.debug_hook.is_none()
    }
}

impl std::fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkSet")
            .field("print", &self.print.is_some())
            .field("error", &self.error.is_some())
            .field("compile_error", &self.compile_error.is_some())
            .field("debug_hook", &self.debug_hook.is_some())
            .finish()
    }
}

/// Handle → sinks mapping, safe to share between threads
#[derive(Debug, Default)]
pub struct SinkRegistry {
    slots: RwLock<HashMap<VmHandle, SinkSet>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A sink that panicked while a lock was held cannot leave the map
    // half-updated, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<VmHandle, SinkSet>> {
        self.slots.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<VmHandle, SinkSet>> {
        self.slots.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `update` to the slot set of `handle`, dropping it once empty
    fn update(&self, handle: VmHandle, update: impl FnOnce(&mut SinkSet)) {
        let mut slots = self.write();
        let set = slots.entry(handle).or_default();
        update(set);
        if set.is_empty() {
            slots.remove(&handle);
        }
    }

    /// Install or clear the print or error sink of `handle`
    pub fn set_sink(&self, handle: VmHandle, kind: SinkKind, sink: Option<Arc<dyn Sink>>) {
        log::debug!(
            "{} {} sink for VM {}",
            if sink.is_some() { "Registering" } else { "Clearing" },
            kind,
            handle
        );
        self.update(handle, |set| match kind {
            SinkKind::Print => set.print = sink,
            SinkKind::Error => set.error = sink,
        });
    }

    pub fn set_print(&self, handle: VmHandle, sink: impl Sink + 'static) {
        self.set_sink(handle, SinkKind::Print, Some(Arc::new(sink)));
    }

    pub fn set_error(&self, handle: VmHandle, sink: impl Sink + 'static) {
        self.set_sink(handle, SinkKind::Error, Some(Arc::new(sink)));
    }

    pub fn set_compile_error(&self, handle: VmHandle, sink: Option<Arc<dyn CompileErrorSink>>) {
        log::debug!("Updating compile error sink for VM {}", handle);
        self.update(handle, |set| set.compile_error = sink);
    }

    pub fn set_debug_hook(&self, handle: VmHandle, sink: Option<Arc<dyn DebugHookSink>>) {
        log::debug!("Updating debug hook sink for VM {}", handle);
        self.update(handle, |set| set.debug_hook = sink);
    }

    /// The print or error sink registered for `handle`, if any
    pub fn sink(&self, handle: VmHandle, kind: SinkKind) -> Option<Arc<dyn Sink>> {
        let slots = self.read();
        let set = slots.get(&handle)?;
        match kind {
            SinkKind::Print => set.print.clone(),
            SinkKind::Error => set.error.clone(),
        }
    }

    pub fn compile_error_sink(&self, handle: VmHandle) -> Option<Arc<dyn CompileErrorSink>> {
        self.read().get(&handle)?.compile_error.clone()
    }

    pub fn debug_hook_sink(&self, handle: VmHandle) -> Option<Arc<dyn DebugHookSink>> {
        self.read().get(&handle)?.debug_hook.clone()
    }

    /// Drop every sink registered for `handle`. Returns whether any existed.
    pub fn release(&self, handle: VmHandle) -> bool {
        let removed = self.write().remove(&handle).is_some();
        if removed {
            log::debug!("Released sinks for VM {}", handle);
        }
        removed
    }

    pub fn contains(&self, handle: VmHandle) -> bool {
        self.read().contains_key(&handle)
    }

    /// Number of handles with at least one sink
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
