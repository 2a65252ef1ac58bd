//! Process-wide sink registry and the formatting entry point.
//!
//! A [`Registry`] moves through `unset -> set once -> read-only`. The root sink
//! is published with a single compare-and-set; a second attempt panics because
//! silently ignoring it could strand half of the intended backends.
//!
//! Each thread may additionally push a scope sink that takes precedence over
//! the root for that thread only. Scopes are tracked per registry, and a guard
//! removes exactly the entry it pushed, whatever order guards are dropped in.
//! The first time a thread logs through a registry a weak handle to the
//! resolved root is cached in thread-local storage.
//!
//! Logging is lossy on purpose in two cases:
//! * nothing is installed yet: the call is a no-op;
//! * a sink logs from inside its own `emit` on the same thread: the nested
//!   record is dropped so a misbehaving backend cannot recurse without bound.

use std::{
    cell::{Cell, RefCell},
    fmt, mem,
    marker::PhantomData,
    sync::{
        Arc, OnceLock, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::log::{
    async_log_sink::ColorMode, log_color::LogColor, log_error::LogError, log_level::LogLevel,
    log_record::Record, log_sink::LogSink, platform_log_sink,
};

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// The registry used by the free functions and the `log_*!` macros.
static GLOBAL: Registry = Registry::new();

thread_local! {
    static IN_LOGGER: Cell<bool> = const { Cell::new(false) };
    static CONTEXT: RefCell<ThreadContext> = const { RefCell::new(ThreadContext::new()) };
}

struct ScopeEntry {
    token: u64,
    registry: u64,
    sink: Arc<dyn LogSink>,
}

/// Per-thread state, keyed by registry id.
///
/// Sinks removed from here must be dropped after the `RefCell` borrow ends:
/// a sink's `Drop` may log, which borrows the context again.
struct ThreadContext {
    scopes: Vec<ScopeEntry>,
    next_token: u64,
    cached_roots: Vec<(u64, Weak<dyn LogSink>)>,
}

impl ThreadContext {
    const fn new() -> Self {
        Self {
            scopes: Vec::new(),
            next_token: 0,
            cached_roots: Vec::new(),
        }
    }

    fn push_scope(&mut self, registry: u64, sink: Arc<dyn LogSink>) -> u64 {
        self.next_token += 1;
        let token = self.next_token;
        self.scopes.push(ScopeEntry {
            token,
            registry,
            sink,
        });
        token
    }

    fn scope(&self, id: u64) -> Option<Arc<dyn LogSink>> {
        self.scopes
            .iter()
            .rev()
            .find(|entry| entry.registry == id)
            .map(|entry| entry.sink.clone())
    }

    fn cached_root(&self, id: u64) -> Option<Arc<dyn LogSink>> {
        self.cached_roots
            .iter()
            .find(|(owner, _)| *owner == id)
            .and_then(|(_, root)| root.upgrade())
    }

    /// Entries of dropped registries are pruned here, so the cache only
    /// holds live registries. Dropping a `Weak` never runs the sink's `Drop`.
    fn cache_root(&mut self, id: u64, root: &Arc<dyn LogSink>) {
        self.cached_roots.retain(|(_, root)| root.strong_count() > 0);
        self.cached_roots.push((id, Arc::downgrade(root)));
    }
}

/// Holds the root sink and resolves the effective sink per thread.
pub struct Registry {
    root: OnceLock<Arc<dyn LogSink>>,
    id: AtomicU64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: OnceLock::new(),
            id: AtomicU64::new(0),
        }
    }

    /// Lazily assigned so `new` can stay `const`.
    fn id(&self) -> u64 {
        let id = self.id.load(Ordering::Acquire);
        if id != 0 {
            return id;
        }
        let fresh = NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed);
        match self
            .id
            .compare_exchange(0, fresh, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => fresh,
            Err(existing) => existing,
        }
    }

    /// Installs the root sink. The registry owns it from now on.
    ///
    /// # Panics
    ///
    /// Panics if a root sink has already been set.
    pub fn set_global(&self, sink: Box<dyn LogSink>) {
        if self.root.set(Arc::from(sink)).is_err() {
            panic!("global logger has already been set and can only be set once");
        }
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.root.get().is_some()
    }

    /// The root sink, if one has been installed.
    #[must_use]
    pub fn global(&self) -> Option<Arc<dyn LogSink>> {
        self.root.get().cloned()
    }

    /// Resolves the sink a log call on this thread would use:
    /// the innermost scope sink, else the root, else nothing.
    #[must_use]
    pub fn effective_sink(&self) -> Option<Arc<dyn LogSink>> {
        let id = self.id();
        let resolved = CONTEXT.try_with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            if let Some(sink) = ctx.scope(id).or_else(|| ctx.cached_root(id)) {
                return Some(sink);
            }
            let root = self.root.get()?.clone();
            ctx.cache_root(id, &root);
            Some(root)
        });
        match resolved {
            Ok(sink) => sink,
            // Thread-local storage already torn down (thread or process exit).
            Err(_) => self.root.get().cloned(),
        }
    }

    /// Replaces this thread's scope sinks with `sink`, or clears them so the
    /// thread falls back to the root.
    ///
    /// Guards whose scope was replaced this way become no-ops.
    pub fn set_scope_override(&self, sink: Option<Arc<dyn LogSink>>) {
        let id = self.id();
        let removed = CONTEXT.try_with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            let (removed, kept): (Vec<_>, Vec<_>) = mem::take(&mut ctx.scopes)
                .into_iter()
                .partition(|entry| entry.registry == id);
            ctx.scopes = kept;
            if let Some(sink) = sink {
                ctx.push_scope(id, sink);
            }
            removed
        });
        drop(removed);
    }

    /// Pushes `sink` as this thread's scope sink until the guard is dropped.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use sinklog::log::{
    ///     backlog_log_sink::BacklogLogSink, log_level::LogLevel, registry::Registry,
    /// };
    ///
    /// let registry = Registry::new();
    /// let capture = Arc::new(BacklogLogSink::new(8));
    /// {
    ///     let _scope = registry.scope(capture.clone());
    ///     registry.log(LogLevel::Info, "doc", None, format_args!("captured"));
    /// }
    /// registry.log(LogLevel::Info, "doc", None, format_args!("dropped"));
    /// assert_eq!(capture.len(), 1);
    /// ```
    #[must_use = "the scope ends when the guard is dropped"]
    pub fn scope(&self, sink: Arc<dyn LogSink>) -> ScopeGuard {
        let id = self.id();
        let token = CONTEXT
            .try_with(|ctx| ctx.borrow_mut().push_scope(id, sink))
            .ok();
        ScopeGuard {
            token,
            _not_send: PhantomData,
        }
    }

    /// Builds a record and hands it to the effective sink.
    ///
    /// Never fails and never reaches the caller with an error. Nested calls
    /// made from inside a sink on the same thread are dropped.
    pub fn log(
        &self,
        level: LogLevel,
        system: &str,
        color: Option<LogColor>,
        args: fmt::Arguments<'_>,
    ) {
        let Some(_guard) = ReentrancyGuard::enter() else {
            return;
        };
        let Some(sink) = self.effective_sink() else {
            return;
        };
        let record = Record::new(level, system, color, args);
        sink.emit(&record);
    }

    /// Drains the root sink. Meant to run once, at orderly shutdown.
    pub fn finish(&self) {
        if let Some(root) = self.root.get() {
            root.finish();
        }
    }
}

/// Removes the scope sink it pushed when dropped.
pub struct ScopeGuard {
    token: Option<u64>,
    _not_send: PhantomData<*const ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let Some(token) = self.token else {
            return;
        };
        let removed = CONTEXT.try_with(|ctx| {
            let mut ctx = ctx.borrow_mut();
            let pos = ctx.scopes.iter().rposition(|entry| entry.token == token)?;
            Some(ctx.scopes.remove(pos))
        });
        drop(removed);
    }
}

struct ReentrancyGuard;

impl ReentrancyGuard {
    fn enter() -> Option<Self> {
        IN_LOGGER.with(|flag| (!flag.replace(true)).then_some(ReentrancyGuard))
    }
}

impl Drop for ReentrancyGuard {
    fn drop(&mut self) {
        IN_LOGGER.with(|flag| flag.set(false));
    }
}

/// The process-wide registry.
#[must_use]
pub fn global() -> &'static Registry {
    &GLOBAL
}

extern "C" fn finish_at_exit() {
    GLOBAL.finish();
}

/// Installs the process-wide root sink and registers a drain at process exit.
///
/// # Panics
///
/// Panics if the process-wide root has already been set.
pub fn set_global_logger(sink: Box<dyn LogSink>) {
    GLOBAL.set_global(sink);
    // SAFETY: `finish_at_exit` is a plain `extern "C"` function with no
    // arguments, as `atexit` requires.
    unsafe {
        libc::atexit(finish_at_exit);
    }
}

/// Installs the platform default sink as the process-wide root.
///
/// # Errors
///
/// Returns an error if the default sink cannot be created.
///
/// # Panics
///
/// Panics if the process-wide root has already been set.
pub fn set_global_logger_default() -> Result<(), LogError> {
    let sink = platform_log_sink::default_sink(ColorMode::Auto)?;
    set_global_logger(Box::new(sink));
    Ok(())
}

/// Drains the process-wide root. Also runs automatically at normal exit.
pub fn global_logger_finish() {
    GLOBAL.finish();
}

/// Replaces or clears this thread's scope sink on the process-wide registry.
pub fn set_scope_logger(sink: Option<Arc<dyn LogSink>>) {
    GLOBAL.set_scope_override(sink);
}

/// Scoped override on the process-wide registry.
#[must_use = "the scope ends when the guard is dropped"]
pub fn scope(sink: Arc<dyn LogSink>) -> ScopeGuard {
    GLOBAL.scope(sink)
}

pub fn log(level: LogLevel, system: &str, args: fmt::Arguments<'_>) {
    GLOBAL.log(level, system, None, args);
}

pub fn log_color(level: LogLevel, color: LogColor, system: &str, args: fmt::Arguments<'_>) {
    GLOBAL.log(level, system, Some(color), args);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::backlog_log_sink::BacklogLogSink;
    use std::thread;

    fn messages(sink: &BacklogLogSink) -> Vec<String> {
        sink.drain().iter().map(|r| r.message().to_owned()).collect()
    }

    #[test]
    fn logging_without_sink_is_noop() {
        let registry = Registry::new();
        assert!(registry.effective_sink().is_none());
        registry.log(LogLevel::Error, "early", None, format_args!("nobody listens"));
    }

    #[test]
    #[should_panic(expected = "global logger has already been set and can only be set once")]
    fn second_set_global_is_fatal() {
        let registry = Registry::new();
        registry.set_global(Box::new(BacklogLogSink::new(1)));
        registry.set_global(Box::new(BacklogLogSink::new(1)));
    }

    #[test]
    fn every_thread_sees_the_same_root() {
        let registry = Arc::new(Registry::new());
        let root = Arc::new(BacklogLogSink::new(64));
        registry.set_global(Box::new(root.clone()));

        let here = registry.effective_sink().unwrap();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                let here = here.clone();
                thread::spawn(move || {
                    let there = registry.effective_sink().unwrap();
                    Arc::ptr_eq(&here, &there)
                })
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
    }

    #[test]
    fn scope_overrides_root_and_restores_on_drop() {
        let registry = Registry::new();
        let root = Arc::new(BacklogLogSink::new(16));
        let scoped = Arc::new(BacklogLogSink::new(16));
        registry.set_global(Box::new(root.clone()));

        {
            let _guard = registry.scope(scoped.clone());
            registry.log(LogLevel::Info, "t", None, format_args!("inner"));
        }
        registry.log(LogLevel::Info, "t", None, format_args!("outer"));

        assert_eq!(messages(&scoped), ["inner"]);
        assert_eq!(messages(&root), ["outer"]);
    }

    #[test]
    fn scope_is_invisible_to_other_threads() {
        let registry = Arc::new(Registry::new());
        let root = Arc::new(BacklogLogSink::new(16));
        let scoped = Arc::new(BacklogLogSink::new(16));
        registry.set_global(Box::new(root.clone()));

        let _guard = registry.scope(scoped.clone());
        let other = registry.clone();
        thread::spawn(move || other.log(LogLevel::Info, "t", None, format_args!("elsewhere")))
            .join()
            .unwrap();

        assert_eq!(messages(&root), ["elsewhere"]);
        assert!(scoped.is_empty());
    }

    #[test]
    fn set_scope_override_none_falls_back_to_root() {
        let registry = Registry::new();
        let root = Arc::new(BacklogLogSink::new(16));
        let scoped = Arc::new(BacklogLogSink::new(16));
        registry.set_global(Box::new(root.clone()));

        registry.set_scope_override(Some(scoped.clone() as Arc<dyn LogSink>));
        registry.log(LogLevel::Info, "t", None, format_args!("a"));
        registry.set_scope_override(None);
        registry.log(LogLevel::Info, "t", None, format_args!("b"));

        assert_eq!(messages(&scoped), ["a"]);
        assert_eq!(messages(&root), ["b"]);
    }

    #[test]
    fn scope_works_before_root_is_set() {
        let registry = Registry::new();
        let scoped = Arc::new(BacklogLogSink::new(4));
        let _guard = registry.scope(scoped.clone());
        registry.log(LogLevel::Warn, "t", None, format_args!("early"));
        assert_eq!(scoped.len(), 1);
    }

    /// Sink that logs again from inside `emit`.
    struct Echo {
        registry: Arc<Registry>,
        seen: Arc<BacklogLogSink>,
    }

    impl LogSink for Echo {
        fn emit(&self, record: &Record) {
            self.seen.emit(record);
            self.registry
                .log(LogLevel::Error, "echo", None, format_args!("nested"));
        }
    }

    #[test]
    fn reentrant_log_is_dropped_and_outer_delivered() {
        let registry = Arc::new(Registry::new());
        let seen = Arc::new(BacklogLogSink::new(16));
        registry.set_global(Box::new(Echo {
            registry: registry.clone(),
            seen: seen.clone(),
        }));

        registry.log(LogLevel::Info, "t", None, format_args!("outer"));
        registry.log(LogLevel::Info, "t", None, format_args!("again"));

        assert_eq!(messages(&seen), ["outer", "again"]);
    }

    #[test]
    fn scopes_of_different_registries_do_not_interfere() {
        let a = Registry::new();
        let b = Registry::new();
        let sa = Arc::new(BacklogLogSink::new(4));
        let sb = Arc::new(BacklogLogSink::new(4));

        let ga = a.scope(sa.clone());
        let _gb = b.scope(sb.clone());
        drop(ga);

        b.log(LogLevel::Info, "t", None, format_args!("to b"));
        a.log(LogLevel::Info, "t", None, format_args!("to a"));

        assert_eq!(messages(&sb), ["to b"]);
        assert!(sa.is_empty());
    }

    #[test]
    fn out_of_order_guard_drop_keeps_later_scope() {
        let registry = Registry::new();
        let root = Arc::new(BacklogLogSink::new(4));
        let s1 = Arc::new(BacklogLogSink::new(4));
        let s2 = Arc::new(BacklogLogSink::new(4));
        registry.set_global(Box::new(root.clone()));

        let g1 = registry.scope(s1.clone());
        let g2 = registry.scope(s2.clone());
        drop(g1);
        registry.log(LogLevel::Info, "t", None, format_args!("still scoped"));
        drop(g2);
        registry.log(LogLevel::Info, "t", None, format_args!("back to root"));

        assert!(s1.is_empty());
        assert_eq!(messages(&s2), ["still scoped"]);
        assert_eq!(messages(&root), ["back to root"]);
    }

    #[test]
    fn guard_of_replaced_scope_leaves_override_alone() {
        let registry = Registry::new();
        let s1 = Arc::new(BacklogLogSink::new(4));
        let s2 = Arc::new(BacklogLogSink::new(4));

        let guard = registry.scope(s1.clone());
        registry.set_scope_override(Some(s2.clone() as Arc<dyn LogSink>));
        drop(guard);
        registry.log(LogLevel::Info, "t", None, format_args!("override"));

        assert!(s1.is_empty());
        assert_eq!(messages(&s2), ["override"]);
    }

    #[test]
    fn dropped_registry_releases_its_root() {
        let root = Arc::new(BacklogLogSink::new(4));
        {
            let registry = Registry::new();
            registry.set_global(Box::new(root.clone()));
            registry.log(LogLevel::Info, "t", None, format_args!("cached"));
        }
        assert_eq!(Arc::strong_count(&root), 1);

        // A later registry on the same thread prunes the dead cache entry.
        let next = Registry::new();
        next.set_global(Box::new(BacklogLogSink::new(1)));
        next.log(LogLevel::Info, "t", None, format_args!("x"));
        let cached = CONTEXT.with(|ctx| {
            ctx.borrow()
                .cached_roots
                .iter()
                .filter(|(_, root)| root.strong_count() == 0)
                .count()
        });
        assert_eq!(cached, 0);
    }

    /// Scope sink that logs through its registry when it is dropped.
    struct LogsOnDrop {
        registry: Arc<Registry>,
    }

    impl LogSink for LogsOnDrop {
        fn emit(&self, _record: &Record) {}
    }

    impl Drop for LogsOnDrop {
        fn drop(&mut self) {
            self.registry
                .log(LogLevel::Info, "t", None, format_args!("scope sink dropped"));
        }
    }

    #[test]
    fn scope_sink_may_log_from_its_drop() {
        let registry = Arc::new(Registry::new());
        let root = Arc::new(BacklogLogSink::new(4));
        registry.set_global(Box::new(root.clone()));

        let guard = registry.scope(Arc::new(LogsOnDrop {
            registry: registry.clone(),
        }));
        drop(guard);

        registry.set_scope_override(Some(Arc::new(LogsOnDrop {
            registry: registry.clone(),
        }) as Arc<dyn LogSink>));
        registry.set_scope_override(None);

        assert_eq!(messages(&root), ["scope sink dropped", "scope sink dropped"]);
    }

    #[test]
    fn registries_are_independent() {
        let a = Registry::new();
        let b = Registry::new();
        let sink_a = Arc::new(BacklogLogSink::new(4));
        a.set_global(Box::new(sink_a.clone()));

        b.log(LogLevel::Info, "t", None, format_args!("to b"));
        a.log(LogLevel::Info, "t", None, format_args!("to a"));

        assert!(b.effective_sink().is_none());
        assert_eq!(messages(&sink_a), ["to a"]);
    }
}
