//! sinklog is a process-wide logging layer built around one global sink.
//!
//! Records are formatted on the calling thread and handed to a sink tree:
//! asynchronous file/console writers, a deferred sink that buffers until its
//! real target exists, fan-out collections, level filters and platform
//! backends. The crate is structured into two modules:

/// Handles configuration loading and the `[Logging]` section.
pub mod config;
/// Records, sinks, the global registry and the logging macros.
pub mod log;
