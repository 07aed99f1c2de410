//! `tracing` setup. In the browser each formatted event is forwarded to the
//! devtools console at the matching severity; native builds write to stderr.
//! Events must never include access tokens.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Config key holding the log level (`error`..`trace` or `0`..`4`).
pub const LOG_LEVEL: &str = "LOG_LEVEL";

pub const DEFAULT_LEVEL: Level = Level::INFO;

/// Parses a level name or a numeric verbosity (0 = error .. 4 = trace).
#[must_use]
pub fn parse_level(value: &str) -> Option<Level> {
    if let Ok(parsed) = value.trim().parse::<u8>() {
        return match parsed {
            0 => Some(Level::ERROR),
            1 => Some(Level::WARN),
            2 => Some(Level::INFO),
            3 => Some(Level::DEBUG),
            4 => Some(Level::TRACE),
            _ => None,
        };
    }

    match value.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

fn filter(level: Level) -> EnvFilter {
    EnvFilter::new(format!(
        "{}={}",
        env!("CARGO_CRATE_NAME"),
        level.as_str().to_lowercase()
    ))
}

/// Installs the global subscriber. Returns `false` if one was already set.
pub fn init(level: Level) -> bool {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_target(false)
        .without_time();

    #[cfg(target_arch = "wasm32")]
    let result = builder.with_writer(console::ConsoleMakeWriter).try_init();
    #[cfg(not(target_arch = "wasm32"))]
    let result = builder.with_writer(std::io::stderr).try_init();

    result.is_ok()
}

#[cfg(target_arch = "wasm32")]
mod console {
    use std::io;
    use tracing::{Level, Metadata};
    use tracing_subscriber::fmt::MakeWriter;
    use wasm_bindgen::JsValue;

    pub struct ConsoleMakeWriter;

    /// Buffers one formatted event and emits it on drop.
    pub struct ConsoleWriter {
        level: Level,
        buffer: Vec<u8>,
    }

    impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
        type Writer = ConsoleWriter;

        fn make_writer(&'a self) -> Self::Writer {
            ConsoleWriter {
                level: Level::INFO,
                buffer: Vec::new(),
            }
        }

        fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
            ConsoleWriter {
                level: *meta.level(),
                buffer: Vec::new(),
            }
        }
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            if self.buffer.is_empty() {
                return;
            }
            let line = String::from_utf8_lossy(&self.buffer);
            let message = JsValue::from_str(line.trim_end());
            match self.level {
                Level::ERROR => web_sys::console::error_1(&message),
                Level::WARN => web_sys::console::warn_1(&message),
                Level::DEBUG | Level::TRACE => web_sys::console::debug_1(&message),
                _ => web_sys::console::log_1(&message),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{init, parse_level};
    use tracing::Level;

    #[test]
    fn parse_level_accepts_names_and_numbers() {
        assert_eq!(parse_level("warn"), Some(Level::WARN));
        assert_eq!(parse_level(" DEBUG "), Some(Level::DEBUG));
        assert_eq!(parse_level("0"), Some(Level::ERROR));
        assert_eq!(parse_level("4"), Some(Level::TRACE));
        assert_eq!(parse_level("5"), None);
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn second_init_is_rejected() {
        let _ = init(Level::DEBUG);
        assert!(!init(Level::DEBUG));
    }
}
