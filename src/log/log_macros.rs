//! Leveled logging macros for the process-wide registry and explicit registries.
//!
//! # Feature Flags
//! specific log levels are controlled by cargo features:
//! `log-trace`, `log-debug`, `log-info`, `log-warn`, `log-error`.
//!
//! If a feature is disabled, the corresponding macros expand to `()`, removing
//! all formatting and allocation overhead at compile time.
//!
//! Every macro takes the subsystem tag first, then `format!`-style arguments:
//!
//! ```rust
//! sinklog::log_info!("net", "listening on {}", 8303);
//! ```

// ============================================================================
// 1. GENERIC MACROS
// ============================================================================
// Not feature-gated: callers that pick the level at runtime use these.

#[macro_export]
macro_rules! log_at {
    ($lvl:expr, $sys:expr, $($arg:tt)*) => {{
        $crate::log::registry::log($lvl, $sys, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! log_color {
    ($lvl:expr, $color:expr, $sys:expr, $($arg:tt)*) => {{
        $crate::log::registry::log_color($lvl, $color, $sys, format_args!($($arg)*));
    }};
}

#[macro_export]
macro_rules! registry_log {
    ($registry:expr, $lvl:expr, $sys:expr, $($arg:tt)*) => {{
        $registry.log($lvl, $sys, None, format_args!($($arg)*));
    }};
}

// ============================================================================
// 2. LEVEL-SPECIFIC MACROS (Feature Gated)
// ============================================================================

// ---------------------- TRACE ----------------------
#[cfg(feature = "log-trace")]
#[macro_export]
macro_rules! log_trace { ($sys:expr, $($arg:tt)*) => { $crate::log_at!($crate::log::log_level::LogLevel::Trace, $sys, $($arg)*) } }
#[cfg(feature = "log-trace")]
#[macro_export]
macro_rules! registry_trace { ($registry:expr, $sys:expr, $($arg:tt)*) => { $crate::registry_log!($registry, $crate::log::log_level::LogLevel::Trace, $sys, $($arg)*) } }

#[cfg(not(feature = "log-trace"))]
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        ()
    };
}
#[cfg(not(feature = "log-trace"))]
#[macro_export]
macro_rules! registry_trace {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- DEBUG ----------------------
#[cfg(feature = "log-debug")]
#[macro_export]
macro_rules! log_debug { ($sys:expr, $($arg:tt)*) => { $crate::log_at!($crate::log::log_level::LogLevel::Debug, $sys, $($arg)*) } }
#[cfg(feature = "log-debug")]
#[macro_export]
macro_rules! registry_debug { ($registry:expr, $sys:expr, $($arg:tt)*) => { $crate::registry_log!($registry, $crate::log::log_level::LogLevel::Debug, $sys, $($arg)*) } }

#[cfg(not(feature = "log-debug"))]
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        ()
    };
}
#[cfg(not(feature = "log-debug"))]
#[macro_export]
macro_rules! registry_debug {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- INFO ----------------------
#[cfg(feature = "log-info")]
#[macro_export]
macro_rules! log_info { ($sys:expr, $($arg:tt)*) => { $crate::log_at!($crate::log::log_level::LogLevel::Info, $sys, $($arg)*) } }
#[cfg(feature = "log-info")]
#[macro_export]
macro_rules! registry_info { ($registry:expr, $sys:expr, $($arg:tt)*) => { $crate::registry_log!($registry, $crate::log::log_level::LogLevel::Info, $sys, $($arg)*) } }

#[cfg(not(feature = "log-info"))]
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        ()
    };
}
#[cfg(not(feature = "log-info"))]
#[macro_export]
macro_rules! registry_info {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- WARN ----------------------
#[cfg(feature = "log-warn")]
#[macro_export]
macro_rules! log_warn { ($sys:expr, $($arg:tt)*) => { $crate::log_at!($crate::log::log_level::LogLevel::Warn, $sys, $($arg)*) } }
#[cfg(feature = "log-warn")]
#[macro_export]
macro_rules! registry_warn { ($registry:expr, $sys:expr, $($arg:tt)*) => { $crate::registry_log!($registry, $crate::log::log_level::LogLevel::Warn, $sys, $($arg)*) } }

#[cfg(not(feature = "log-warn"))]
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        ()
    };
}
#[cfg(not(feature = "log-warn"))]
#[macro_export]
macro_rules! registry_warn {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- ERROR ----------------------
// Generally always enabled, but consistent structure allows user to disable if really needed.
#[cfg(feature = "log-error")]
#[macro_export]
macro_rules! log_error { ($sys:expr, $($arg:tt)*) => { $crate::log_at!($crate::log::log_level::LogLevel::Error, $sys, $($arg)*) } }
#[cfg(feature = "log-error")]
#[macro_export]
macro_rules! registry_error { ($registry:expr, $sys:expr, $($arg:tt)*) => { $crate::registry_log!($registry, $crate::log::log_level::LogLevel::Error, $sys, $($arg)*) } }

#[cfg(not(feature = "log-error"))]
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        ()
    };
}
#[cfg(not(feature = "log-error"))]
#[macro_export]
macro_rules! registry_error {
    ($($arg:tt)*) => {
        ()
    };
}
