pub mod async_log_sink;
pub mod backlog_log_sink;
pub mod collection_log_sink;
pub mod deferred_log_sink;
pub mod filter_log_sink;
pub mod log_color;
pub mod log_error;
pub mod log_file;
pub mod log_level;
pub mod log_macros;
pub mod log_record;
pub mod log_sink;
pub mod noop_log_sink;
pub mod platform_log_sink;
pub mod registry;
pub use noop_log_sink::NoopLogSink;
