//! Runtime context shared by every landing-pad evaluation.
//!
//! The [`RuntimeContext`] bundles the collaborators a landing pad consults but
//! does not own: the native type-match oracle, the value-to-address resolver,
//! the target data layout and the optional trace writer. It is immutable after
//! construction and can be shared across threads.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crate::{
    emulation::{
        config::{DataLayout, EmulationConfig, TraceCategories},
        engine::trace::{TraceEvent, TraceWriter},
        runtime::{AddressResolver, TypeMatcher},
    },
    Result,
};

/// Collaborators and settings for landing-pad evaluation.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use landingpad::emulation::{EmulationConfig, RuntimeContext, SymbolResolver, TypeInfoRegistry};
///
/// let ctx = RuntimeContext::new(
///     EmulationConfig::traced(),
///     Arc::new(TypeInfoRegistry::new()),
///     Arc::new(SymbolResolver::new()),
/// )?;
/// assert!(ctx.tracer().is_some());
/// # Ok::<(), landingpad::Error>(())
/// ```
pub struct RuntimeContext {
    config: EmulationConfig,
    type_matcher: Arc<dyn TypeMatcher>,
    resolver: Arc<dyn AddressResolver>,
    tracer: Option<Arc<TraceWriter>>,
    /// Number of times the type matcher was handed out to a clause.
    matcher_acquisitions: AtomicU64,
}

impl RuntimeContext {
    /// Creates a context from a configuration and the two collaborators.
    ///
    /// A trace writer is created when tracing is enabled in `config.tracing`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if a trace output file cannot be opened.
    pub fn new(
        config: EmulationConfig,
        type_matcher: Arc<dyn TypeMatcher>,
        resolver: Arc<dyn AddressResolver>,
    ) -> Result<Self> {
        let tracing = &config.tracing;
        let tracer = if !tracing.is_enabled() {
            None
        } else if let Some(path) = &tracing.output_path {
            Some(Arc::new(TraceWriter::new_file(
                path,
                tracing.context_prefix.clone(),
            )?))
        } else {
            Some(Arc::new(TraceWriter::new_memory(
                tracing.max_trace_entries,
                tracing.context_prefix.clone(),
            )))
        };

        Ok(RuntimeContext {
            config,
            type_matcher,
            resolver,
            tracer,
            matcher_acquisitions: AtomicU64::new(0),
        })
    }

    /// Returns the configuration this context was built from.
    #[must_use]
    pub fn config(&self) -> &EmulationConfig {
        &self.config
    }

    /// Returns the target data layout.
    #[must_use]
    pub fn layout(&self) -> DataLayout {
        self.config.layout
    }

    /// Hands out the type-match oracle.
    ///
    /// Clauses call this once, on their first predicate use, and keep the
    /// returned handle for every later evaluation.
    #[must_use]
    pub fn type_matcher(&self) -> Arc<dyn TypeMatcher> {
        self.matcher_acquisitions.fetch_add(1, Ordering::Relaxed);
        Arc::clone(&self.type_matcher)
    }

    /// How many times [`type_matcher`](Self::type_matcher) was called.
    #[must_use]
    pub fn matcher_acquisitions(&self) -> u64 {
        self.matcher_acquisitions.load(Ordering::Relaxed)
    }

    /// Returns the value-to-native-address resolver.
    #[must_use]
    pub fn resolver(&self) -> &dyn AddressResolver {
        self.resolver.as_ref()
    }

    /// Returns the trace writer, if tracing is enabled.
    #[must_use]
    pub fn tracer(&self) -> Option<&TraceWriter> {
        self.tracer.as_deref()
    }

    /// Records an event if its category is enabled.
    ///
    /// The event is built lazily so disabled tracing costs nothing.
    pub(crate) fn trace<F>(&self, category: TraceCategories, event: F)
    where
        F: FnOnce() -> TraceEvent,
    {
        if let Some(tracer) = &self.tracer {
            if self.config.tracing.categories.contains(category) {
                tracer.write(event());
            }
        }
    }
}

impl std::fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("config", &self.config)
            .field("tracer", &self.tracer)
            .field("matcher_acquisitions", &self.matcher_acquisitions())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulation::{
        MemoryConfig, NativeAddress, SymbolResolver, TracingConfig, TypeInfoRegistry,
    };

    fn context(config: EmulationConfig) -> RuntimeContext {
        RuntimeContext::new(
            config,
            Arc::new(TypeInfoRegistry::new()),
            Arc::new(SymbolResolver::new()),
        )
        .unwrap()
    }

    fn propagate_event() -> TraceEvent {
        TraceEvent::ExceptionPropagated {
            pad: Arc::from("lpad"),
            unwind_header: NativeAddress::new(1),
        }
    }

    #[test]
    fn test_tracing_disabled_by_default() {
        let ctx = context(EmulationConfig::default());
        assert!(ctx.tracer().is_none());
        ctx.trace(TraceCategories::DISPATCH, || {
            panic!("event must not be built when tracing is off")
        });
    }

    #[test]
    fn test_category_filter() {
        let mut tracing = TracingConfig::full_memory(16);
        tracing.categories = TraceCategories::DISPATCH;
        let ctx = context(EmulationConfig::default().with_tracing(tracing));

        ctx.trace(TraceCategories::CLAUSES, propagate_event);
        ctx.trace(TraceCategories::DISPATCH, propagate_event);

        let events = ctx.tracer().unwrap().take_buffer().unwrap();
        assert_eq!(events, vec![propagate_event()]);
    }

    #[test]
    fn test_matcher_acquisition_counter() {
        let ctx = context(EmulationConfig::minimal());
        assert_eq!(ctx.matcher_acquisitions(), 0);
        let _matcher = ctx.type_matcher();
        let _again = ctx.type_matcher();
        assert_eq!(ctx.matcher_acquisitions(), 2);
    }

    #[test]
    fn test_file_tracing_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = EmulationConfig::default()
            .with_memory(MemoryConfig::default())
            .with_tracing(TracingConfig::full_trace(dir.path().join("missing/trace.log")));
        let result = RuntimeContext::new(
            config,
            Arc::new(TypeInfoRegistry::new()),
            Arc::new(SymbolResolver::new()),
        );
        assert!(matches!(result, Err(crate::Error::FileError(_))));
    }
}
