//! Host sinks for the harness VM
//!
//! Builds the print and error sinks named in `[sinks]` and installs them on
//! a forwarder. Library sinks keep their dynamic library loaded for as long
//! as the forwarder holds them.

use crate::config::{SinkTarget, SinksConfig};
use anyhow::{Context, Result};
use libloading::Library;
use std::ffi::CStr;
use std::io::{self, Write};
use std::sync::Arc;
use vmprint::ffi::CSinkFn;
use vmprint::{CSink, Forwarder, Sink, SinkKind, VmHandle};

/// Writes each message as one line to stdout or stderr
struct StreamSink {
    kind: SinkKind,
    stderr: bool,
    prefix_handle: bool,
}

impl StreamSink {
    fn write_line(&self, out: &mut dyn Write, handle: VmHandle, text: &CStr) -> io::Result<()> {
        if self.prefix_handle {
            write!(out, "[vm {}] ", handle)?;
        }
        out.write_all(text.to_bytes())?;
        out.write_all(b"\n")?;
        out.flush()
    }
}

impl Sink for StreamSink {
    fn deliver(&self, handle: VmHandle, text: &CStr) {
        let result = if self.stderr {
            self.write_line(&mut io::stderr().lock(), handle, text)
        } else {
            self.write_line(&mut io::stdout().lock(), handle, text)
        };
        if let Err(e) = result {
            log::warn!("Failed to write {} message for VM {}: {}", self.kind, handle, e);
        }
    }
}

/// Sends print text to `log::info!` and error text to `log::error!`
struct LogSink {
    kind: SinkKind,
    prefix_handle: bool,
}

impl Sink for LogSink {
    fn deliver(&self, handle: VmHandle, text: &CStr) {
        let text = text.to_string_lossy();
        let level = match self.kind {
            SinkKind::Print => log::Level::Info,
            SinkKind::Error => log::Level::Error,
        };
        if self.prefix_handle {
            log::log!(target: "vm", level, "[vm {}] {}", handle, text);
        } else {
            log::log!(target: "vm", level, "{}", text);
        }
    }
}

/// A C sink resolved from a dynamic library
struct LibrarySink {
    sink: CSink,
    _library: Arc<Library>,
}

impl Sink for LibrarySink {
    fn deliver(&self, handle: VmHandle, text: &CStr) {
        self.sink.deliver(handle, text)
    }
}

fn load_library_sink(library: &Arc<Library>, symbol: &str) -> Result<LibrarySink> {
    // SAFETY: the configured symbol is declared to have the C sink signature;
    // the function pointer is only used while `_library` keeps it loaded.
    let func: CSinkFn = unsafe {
        *library
            .get::<CSinkFn>(symbol.as_bytes())
            .with_context(|| format!("Symbol {:?} not found in sink library", symbol))?
    };
    Ok(LibrarySink {
        // SAFETY: see above, the library is trusted to honour the sink contract.
        sink: unsafe { CSink::new(func) },
        _library: Arc::clone(library),
    })
}

fn open_library(config: &SinksConfig) -> Result<Option<Arc<Library>>> {
    let uses_library = config.print == SinkTarget::Library || config.error == SinkTarget::Library;
    let Some(path) = config.library.as_ref().filter(|_| uses_library) else {
        return Ok(None);
    };

    log::debug!("Loading sink library {:?}", path);
    // SAFETY: loading runs the library's initialisers, which the user vouches for.
    let library = unsafe { Library::new(path) }
        .with_context(|| format!("Failed to load sink library: {:?}", path))?;
    Ok(Some(Arc::new(library)))
}

fn build_sink(
    target: SinkTarget,
    kind: SinkKind,
    config: &SinksConfig,
    library: Option<&Arc<Library>>,
) -> Result<Arc<dyn Sink>> {
    let prefix_handle = config.prefix_handle;
    let sink: Arc<dyn Sink> = match target {
        SinkTarget::Stdout => Arc::new(StreamSink {
            kind,
            stderr: false,
            prefix_handle,
        }),
        SinkTarget::Stderr => Arc::new(StreamSink {
            kind,
            stderr: true,
            prefix_handle,
        }),
        SinkTarget::Log => Arc::new(LogSink {
            kind,
            prefix_handle,
        }),
        SinkTarget::Library => {
            let library = library.context("Library sink requested but no library is loaded")?;
            let symbol = match kind {
                SinkKind::Print => &config.print_symbol,
                SinkKind::Error => &config.error_symbol,
            };
            Arc::new(load_library_sink(library, symbol)?)
        }
    };
    Ok(sink)
}

/// Install the configured print and error sinks for `handle`
pub fn install(forwarder: &Forwarder, handle: VmHandle, config: &SinksConfig) -> Result<()> {
    let library = open_library(config)?;

    for (kind, target) in [(SinkKind::Print, config.print), (SinkKind::Error, config.error)] {
        let sink = build_sink(target, kind, config, library.as_ref())?;
        log::debug!("{} sink for VM {}: {:?}", kind, handle, target);
        forwarder.registry().set_sink(handle, kind, Some(sink));
    }

    Ok(())
}
