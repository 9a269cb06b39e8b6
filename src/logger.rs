//! Prefixed status lines on stderr.
//!
//! ```ignore
//! log!("fetch"; "loaded {} sections", count);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use colored::{ColoredString, Colorize as _};

/// Set by `--quiet`; checked on every line.
static QUIET: AtomicBool = AtomicBool::new(false);

/// Log a message with a colored module prefix.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Write `[module] message` to stderr unless logging is silenced.
pub fn log(module: &str, message: &str) {
    if QUIET.load(Ordering::Relaxed) {
        return;
    }
    let prefix = colorize_prefix(module);
    eprintln!("{prefix} {message}");
}

/// Silence or re-enable all log output.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    return match module {
        "error" => prefix.bright_red().bold(),
        "watch" => prefix.bright_green().bold(),
        "contact" => prefix.bright_blue().bold(),
        _ => prefix.bright_yellow().bold(),
    };
}
