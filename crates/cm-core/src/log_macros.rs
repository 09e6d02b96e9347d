//! Domain-aware logging macros.
//!
//! Each macro injects a `domain` field so log consumers can filter by
//! subsystem without parsing targets. Domains in use:
//!
//! - `sys`: process lifecycle and bootstrap
//! - `pipe`: record flow through evaluators and sinks
//! - `conn`: delivery sessions against external channels
//! - `conf`: configuration loading and plugin construction
//!
//! ```ignore
//! cm_info!(sys, events = 2, alerts = 1, "pipeline ready");
//! cm_warn!(conn, error = %e, "email delivery failed");
//! cm_debug!(pipe, record_type = rt, "record not applicable");
//! ```
//!
//! The domain is a bare identifier, not a string; the macro stringifies it.
//! Callers need `tracing` in scope as a dependency.

/// Internal helper. Use the level macros below.
#[doc(hidden)]
#[macro_export]
macro_rules! cm_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        ::tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

/// Log at ERROR level with an automatic `domain` field.
#[macro_export]
macro_rules! cm_error {
    ($domain:ident, $($rest:tt)*) => {
        $crate::cm_log!(error, $domain, $($rest)*)
    };
}

/// Log at WARN level with an automatic `domain` field.
#[macro_export]
macro_rules! cm_warn {
    ($domain:ident, $($rest:tt)*) => {
        $crate::cm_log!(warn, $domain, $($rest)*)
    };
}

/// Log at INFO level with an automatic `domain` field.
#[macro_export]
macro_rules! cm_info {
    ($domain:ident, $($rest:tt)*) => {
        $crate::cm_log!(info, $domain, $($rest)*)
    };
}

/// Log at DEBUG level with an automatic `domain` field.
#[macro_export]
macro_rules! cm_debug {
    ($domain:ident, $($rest:tt)*) => {
        $crate::cm_log!(debug, $domain, $($rest)*)
    };
}

/// Log at TRACE level with an automatic `domain` field.
#[macro_export]
macro_rules! cm_trace {
    ($domain:ident, $($rest:tt)*) => {
        $crate::cm_log!(trace, $domain, $($rest)*)
    };
}
