/// Macro for prefixed status logging to stderr (only when stderr is a terminal).
///
/// Usage:
/// ```ignore
/// log_status!("deploy", "Syncing {} to {}", workdir, target);
/// log_status!("scm", "Checked out {}", reference);
/// ```
#[macro_export]
macro_rules! log_status {
    ($prefix:expr, $($arg:tt)*) => {
        if ::std::io::IsTerminal::is_terminal(&::std::io::stderr()) {
            eprintln!(concat!("[", $prefix, "] {}"), format_args!($($arg)*));
        }
    };
}

pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `deckhand::scm` instead of `deckhand::core::scm`
pub use crate::core::*;
pub use crate::utils::*;
