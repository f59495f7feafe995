//! Logging subscriber that writes to the browser console.

use std::io::{self, Write};

use tracing::{Level, Metadata};
use tracing_subscriber::{
    EnvFilter,
    fmt::MakeWriter,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};
use txt_client::settings::Settings;
use wasm_bindgen::JsValue;

/// Install the global subscriber, filtered by `settings.log_level`.
///
/// An unparsable filter falls back to `info`.
///
/// # Errors
///
/// Returns an error when a global subscriber is already installed.
pub fn init(settings: &Settings) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|error| {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "invalid log level {:?}: {error}",
            settings.log_level
        )));
        EnvFilter::new("info")
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_ansi(false)
                .with_target(true)
                .with_writer(ConsoleMakeWriter),
        )
        .with(filter)
        .try_init()
}

/// Hands out one [`ConsoleWriter`] per event.
#[derive(Debug, Clone, Copy)]
struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

/// Buffers one formatted event and flushes it to the console on drop.
#[derive(Debug)]
struct ConsoleWriter {
    level: Level,
    buffer: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: Level) -> Self {
        Self {
            level,
            buffer: Vec::new(),
        }
    }
}

impl Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let Some(line) = console_line(&self.buffer) else {
            return;
        };

        let line = JsValue::from_str(&line);

        match self.level {
            Level::ERROR => web_sys::console::error_1(&line),
            Level::WARN => web_sys::console::warn_1(&line),
            Level::INFO => web_sys::console::info_1(&line),
            _ => web_sys::console::debug_1(&line),
        }
    }
}

/// The buffered event without its trailing newline, if there is anything to
/// print.
fn console_line(buffer: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(buffer);
    let line = line.trim_end_matches(['\n', '\r']);

    (!line.is_empty()).then(|| line.to_string())
}
