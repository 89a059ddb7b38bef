#![deny(missing_docs)]
//! Shared logging utilities for the reelwatch workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a process-wide task context that tags every line with the active task id,
//! and a minimal test initializer for the global logger.

use std::sync::RwLock;

#[doc(hidden)]
pub use log as __log;

/// Task id of the job currently being tracked, shared by every thread.
static TASK_CONTEXT: RwLock<Option<String>> = RwLock::new(None);

/// Tags subsequent log lines from any thread with `task_id`.
pub fn set_task_context(task_id: &str) {
    if let Ok(mut guard) = TASK_CONTEXT.write() {
        *guard = Some(task_id.to_string());
    }
}

/// Stops tagging log lines with a task id.
pub fn clear_task_context() {
    if let Ok(mut guard) = TASK_CONTEXT.write() {
        *guard = None;
    }
}

/// Returns the task id currently used to tag log lines, if any.
pub fn task_context() -> Option<String> {
    TASK_CONTEXT.read().ok().and_then(|guard| guard.clone())
}

/// Returns the line prefix for the current task context (empty when idle).
#[doc(hidden)]
pub fn context_prefix() -> String {
    match task_context() {
        Some(task_id) => format!("[task={task_id}] "),
        None => String::new(),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        $crate::__log::trace!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        $crate::__log::info!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        $crate::__log::debug!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        $crate::__log::warn!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        $crate::__log::error!("{}{}", $crate::context_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_context_round_trips_into_prefix() {
        set_task_context("ab12cd34");
        assert_eq!(task_context().as_deref(), Some("ab12cd34"));
        assert_eq!(context_prefix(), "[task=ab12cd34] ");

        clear_task_context();
        assert_eq!(task_context(), None);
        assert_eq!(context_prefix(), "");
    }
}
