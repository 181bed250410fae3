//! The single model slot and the `replace` operation that mutates it.
//!
//! `replace` disposes whatever the slot holds before it assembles, compiles,
//! loads and invokes the new snippet. A failed attempt therefore leaves the
//! slot empty. Every failure is reported as a [`Diagnostic`].

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::{Deserialize, Serialize};
use shared::{Diagnostic, ModelId, ModelSummary, Note};
use tracing::{debug, info, warn};

use crate::compiler::{compile, CompileError};
use crate::config::EngineConfig;
use crate::geometry::Model;
use crate::invoker::invoke;
use crate::loader::load;
use crate::template::{assemble, CompilableUnit};
use crate::whitelist::SymbolTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Assemble,
    Compile,
    Load,
    Execute,
}

/// Hooks into slot transitions. Both methods default to doing nothing.
pub trait SlotObserver: Send {
    /// The held model was released
    fn disposed(&mut self, _model_id: ModelId) {}

    /// A pipeline stage is about to run
    fn stage_started(&mut self, _stage: PipelineStage) {}
}

struct NoopObserver;

impl SlotObserver for NoopObserver {}

/// Work done since the lifecycle was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub replacements: u64,
    pub compilations: u64,
    pub loads: u64,
    pub invocations: u64,
    pub disposals: u64,
}

/// Weak, opaque reference to a model held by a slot.
///
/// Disposal releases the slot's reference. Once that happens the handle stops
/// resolving, unless a caller still holds an `Arc` obtained from [`get`].
///
/// [`get`]: ModelHandle::get
#[derive(Debug, Clone)]
pub struct ModelHandle {
    id: ModelId,
    model: Weak<Model>,
}

impl ModelHandle {
    fn new(model: &Arc<Model>) -> Self {
        Self {
            id: model.id(),
            model: Arc::downgrade(model),
        }
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    /// Strong reference to the model while the slot still holds it.
    ///
    /// Keep the returned `Arc` only for the duration of one use (one frame);
    /// holding it keeps the geometry alive past disposal.
    pub fn get(&self) -> Option<Arc<Model>> {
        self.model.upgrade()
    }

    pub fn is_live(&self) -> bool {
        self.model.strong_count() > 0
    }
}

enum Slot {
    Empty,
    Occupied(Arc<Model>),
}

/// Owner of the single current-model slot
pub struct Lifecycle {
    slot: Slot,
    symbols: &'static SymbolTable,
    config: EngineConfig,
    observer: Box<dyn SlotObserver>,
    stats: EngineStats,
}

impl Lifecycle {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_symbols(SymbolTable::global(), config)
    }

    pub fn with_symbols(symbols: &'static SymbolTable, config: EngineConfig) -> Self {
        Self {
            slot: Slot::Empty,
            symbols,
            config,
            observer: Box::new(NoopObserver),
            stats: EngineStats::default(),
        }
    }

    pub fn with_observer(mut self, observer: impl SlotObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn is_occupied(&self) -> bool {
        matches!(self.slot, Slot::Occupied(_))
    }

    /// Handle to the held model, if any
    pub fn current(&self) -> Option<ModelHandle> {
        match &self.slot {
            Slot::Occupied(model) => Some(ModelHandle::new(model)),
            Slot::Empty => None,
        }
    }

    pub fn current_model(&self) -> Option<&Model> {
        match &self.slot {
            Slot::Occupied(model) => Some(model),
            Slot::Empty => None,
        }
    }

    /// Dispose the held model, then build a new one from `snippet`
    pub fn replace(&mut self, snippet: &str) -> Result<ModelHandle, Diagnostic> {
        self.install(snippet).map(|model| ModelHandle::new(&model))
    }

    fn install(&mut self, snippet: &str) -> Result<Arc<Model>, Diagnostic> {
        self.stats.replacements += 1;
        self.dispose();

        match self.attempt(snippet) {
            Ok(model) => {
                let model = Arc::new(model);
                info!(
                    model_id = model.id(),
                    nodes = model.node_count(),
                    parts = model.part_count(),
                    "model replaced"
                );
                self.slot = Slot::Occupied(Arc::clone(&model));
                Ok(model)
            }
            Err(diagnostic) => {
                warn!(stage = %diagnostic.stage, message = %diagnostic.message, "replace failed");
                Err(diagnostic)
            }
        }
    }

    fn dispose(&mut self) {
        if let Slot::Occupied(model) = mem::replace(&mut self.slot, Slot::Empty) {
            let id = model.id();
            self.stats.disposals += 1;
            drop(model);
            self.observer.disposed(id);
            debug!(model_id = id, "model disposed");
        }
    }

    fn attempt(&mut self, snippet: &str) -> Result<Model, Diagnostic> {
        self.observer.stage_started(PipelineStage::Assemble);
        let unit = assemble(snippet);

        self.observer.stage_started(PipelineStage::Compile);
        self.stats.compilations += 1;
        let artifact = compile(&unit, self.symbols, &self.config)
            .map_err(|errors| compile_diagnostic(&unit, errors))?;

        self.observer.stage_started(PipelineStage::Load);
        self.stats.loads += 1;
        let loaded = load(artifact).map_err(|e| Diagnostic::compile(format!("load: {e}"), None))?;

        self.observer.stage_started(PipelineStage::Execute);
        self.stats.invocations += 1;
        invoke(&loaded, &self.config).map_err(|fault| {
            let location = fault
                .span
                .and_then(|s| unit.snippet_location(s.line, s.column));
            Diagnostic::execute(fault.message, location)
        })
    }
}

fn compile_diagnostic(unit: &CompilableUnit, errors: Vec<CompileError>) -> Diagnostic {
    let locate = |e: &CompileError| e.span.and_then(|s| unit.snippet_location(s.line, s.column));
    let mut errors = errors.into_iter();
    let Some(first) = errors.next() else {
        return Diagnostic::compile("compilation failed", None);
    };
    let notes = errors
        .map(|e| Note {
            location: locate(&e),
            message: e.message,
        })
        .collect();
    let location = locate(&first);
    Diagnostic::compile(first.message, location).with_notes(notes)
}

/// A [`Lifecycle`] shared between threads; overlapping `replace` calls queue
/// on the lock.
pub struct ModelSession {
    inner: Mutex<Lifecycle>,
}

impl ModelSession {
    pub fn new(config: EngineConfig) -> Self {
        Self::from_lifecycle(Lifecycle::new(config))
    }

    pub fn from_lifecycle(lifecycle: Lifecycle) -> Self {
        Self {
            inner: Mutex::new(lifecycle),
        }
    }

    pub fn replace(&self, snippet: &str) -> Result<ModelHandle, Diagnostic> {
        self.lock().replace(snippet)
    }

    pub fn current(&self) -> Option<ModelHandle> {
        self.lock().current()
    }

    /// Replace and summarize the new model under one lock, so the summary
    /// always describes this call's model
    pub fn replace_summary(&self, snippet: &str) -> Result<ModelSummary, Diagnostic> {
        self.lock().install(snippet).map(|model| model.summary())
    }

    pub fn summary(&self) -> Option<ModelSummary> {
        self.lock().current_model().map(Model::summary)
    }

    /// Run `f` against the held model while the slot is locked
    pub fn with_model<R>(&self, f: impl FnOnce(&Model) -> R) -> Option<R> {
        self.lock().current_model().map(f)
    }

    pub fn stats(&self) -> EngineStats {
        self.lock().stats()
    }

    // replace never leaves the slot half-updated, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use shared::Stage;

    #[test]
    fn test_success_occupies_slot() {
        let mut lc = Lifecycle::new(EngineConfig::default());
        let handle = lc.replace(fixtures::COLORED_BOX).unwrap();
        assert!(lc.is_occupied());
        assert!(handle.is_live());
        assert_eq!(lc.current().unwrap().id(), handle.id());
    }

    #[test]
    fn test_failure_empties_slot_and_kills_handle() {
        let mut lc = Lifecycle::new(EngineConfig::default());
        let handle = lc.replace(fixtures::COLORED_BOX).unwrap();
        let err = lc.replace("let x = ;").unwrap_err();
        assert_eq!(err.stage, Stage::Compile);
        assert!(!lc.is_occupied());
        assert!(!handle.is_live());
        assert_eq!(lc.stats().disposals, 1);
    }

    #[test]
    fn test_compile_error_location_is_snippet_relative() {
        let mut lc = Lifecycle::new(EngineConfig::default());
        let err = lc.replace("let a = 1;\nlet b = Math::PI;").unwrap_err();
        assert_eq!(err.location.map(|l| l.line), Some(2));
    }

    #[test]
    fn test_execute_error_location() {
        let mut lc = Lifecycle::new(EngineConfig::default());
        let err = lc.replace(fixtures::NEGATIVE_SIZE).unwrap_err();
        assert_eq!(err.stage, Stage::Execute);
        assert!(err.location.is_some());
    }

    #[test]
    fn test_extra_errors_become_notes() {
        let mut lc = Lifecycle::new(EngineConfig::default());
        let err = lc.replace("let a = Math::PI;\nlet b = Files::read(\"x\");").unwrap_err();
        assert_eq!(err.error_count(), 2);
    }

    #[test]
    fn test_session_summary() {
        let session = ModelSession::new(EngineConfig::default());
        assert!(session.summary().is_none());
        session.replace(fixtures::COLORED_BOX).unwrap();
        let summary = session.summary().unwrap();
        assert_eq!(summary.part_count, 1);
        assert_eq!(session.with_model(|m| m.vertex_count()), Some(24));
    }

    #[test]
    fn test_replace_summary_describes_this_call() {
        let session = ModelSession::new(EngineConfig::default());
        let summary = session.replace_summary(&fixtures::stacked_spheres(3, 8)).unwrap();
        assert_eq!(summary.part_count, 3);
        assert_eq!(session.current().map(|h| h.id()), Some(summary.id));

        let err = session.replace_summary(fixtures::RETURNS_NULL).unwrap_err();
        assert_eq!(err.stage, Stage::Execute);
        assert!(session.summary().is_none());
    }

    #[test]
    fn test_kept_arc_outlives_disposal() {
        let mut lc = Lifecycle::new(EngineConfig::default());
        let handle = lc.replace(fixtures::COLORED_BOX).unwrap();
        let kept = handle.get().unwrap();
        lc.replace(fixtures::HIERARCHY).unwrap();
        assert!(handle.is_live());
        drop(kept);
        assert!(!handle.is_live());
        assert!(handle.get().is_none());
    }
}
