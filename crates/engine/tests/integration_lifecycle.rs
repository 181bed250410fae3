//! Integration tests for the model slot: disposal order, handles, sharing.

use std::sync::{Arc, Mutex};
use std::thread;

use modelsnip_engine::compiler::compile;
use modelsnip_engine::fixtures::*;
use modelsnip_engine::invoker::{call_creator, Instance, ModelBuilder};
use modelsnip_engine::loader::load;
use modelsnip_engine::runtime::Fault;
use modelsnip_engine::template::assemble;
use modelsnip_engine::{
    EngineConfig, Lifecycle, Model, ModelCreator, ModelSession, PipelineStage, SlotObserver,
    Stage, SymbolTable,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Disposed(u64),
    Stage(PipelineStage),
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<Event>>>);

impl Recorder {
    fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }
}

impl SlotObserver for Recorder {
    fn disposed(&mut self, model_id: u64) {
        self.0.lock().unwrap().push(Event::Disposed(model_id));
    }

    fn stage_started(&mut self, stage: PipelineStage) {
        self.0.lock().unwrap().push(Event::Stage(stage));
    }
}

#[test]
fn test_dispose_runs_once_before_next_attempt() {
    let recorder = Recorder::default();
    let mut lc = Lifecycle::new(EngineConfig::default()).with_observer(recorder.clone());

    let first = lc.replace(COLORED_BOX).unwrap();
    lc.replace(HIERARCHY).unwrap();

    let events = recorder.events();
    let disposals: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, Event::Disposed(_)))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(disposals.len(), 1);
    assert_eq!(events[disposals[0]], Event::Disposed(first.id()));
    assert_eq!(events[disposals[0] + 1], Event::Stage(PipelineStage::Assemble));
    assert_eq!(events[disposals[0] + 2], Event::Stage(PipelineStage::Compile));
}

#[test]
fn test_first_replace_disposes_nothing() {
    let recorder = Recorder::default();
    let mut lc = Lifecycle::new(EngineConfig::default()).with_observer(recorder.clone());
    lc.replace(COLORED_BOX).unwrap();
    assert_eq!(
        recorder.events(),
        [
            Event::Stage(PipelineStage::Assemble),
            Event::Stage(PipelineStage::Compile),
            Event::Stage(PipelineStage::Load),
            Event::Stage(PipelineStage::Execute),
        ]
    );
}

#[test]
fn test_compile_failure_stops_pipeline() {
    let recorder = Recorder::default();
    let mut lc = Lifecycle::new(EngineConfig::default()).with_observer(recorder.clone());
    lc.replace(FORBIDDEN_NAMES[0]).unwrap_err();
    assert!(!recorder.events().contains(&Event::Stage(PipelineStage::Load)));
    assert_eq!(lc.stats().loads, 0);
}

#[test]
fn test_replacements_are_independent() {
    let mut lc = Lifecycle::new(EngineConfig::default());
    let a = lc.replace(COLORED_BOX).unwrap();
    let b = lc.replace(COLORED_BOX).unwrap();

    assert_ne!(a.id(), b.id());
    assert!(!a.is_live());
    assert!(b.is_live());

    let stats = lc.stats();
    assert_eq!(stats.replacements, 2);
    assert_eq!(stats.compilations, 2);
    assert_eq!(stats.loads, 2);
    assert_eq!(stats.invocations, 2);
    assert_eq!(stats.disposals, 1);
}

#[test]
fn test_valid_then_invalid_leaves_slot_empty() {
    let mut lc = Lifecycle::new(EngineConfig::default());
    let a = lc.replace(COLORED_BOX).unwrap();
    let err = lc.replace(FORBIDDEN_NAMES[1]).unwrap_err();

    assert_eq!(err.stage, Stage::Compile);
    assert!(a.get().is_none());
    assert!(lc.current().is_none());
    assert!(lc.current_model().is_none());
}

#[test]
fn test_session_shared_between_threads() {
    let session = Arc::new(ModelSession::new(EngineConfig::default()));

    let workers: Vec<_> = (0..4)
        .map(|i| {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                for _ in 0..5 {
                    if i % 2 == 0 {
                        session.replace(COLORED_BOX).unwrap();
                    } else {
                        session.replace(NEGATIVE_SIZE).unwrap_err();
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let stats = session.stats();
    assert_eq!(stats.replacements, 20);
    assert_eq!(stats.invocations, 20);
}

#[test]
fn test_session_summary() {
    let session = ModelSession::new(EngineConfig::default());
    assert!(session.summary().is_none());

    session.replace(HIERARCHY).unwrap();
    let summary = session.summary().unwrap();
    assert_eq!(summary.node_count, 2);
    assert_eq!(summary.part_count, 2);
    assert!(summary.bounds.is_some());
    assert_eq!(session.with_model(|m| m.id()), Some(summary.id));
}

#[test]
fn test_valid_then_invalid_disposes_once() {
    let recorder = Recorder::default();
    let mut lc = Lifecycle::new(EngineConfig::default()).with_observer(recorder.clone());
    let a = lc.replace(COLORED_BOX).unwrap();
    lc.replace(UNBALANCED).unwrap_err();
    lc.replace(UNBALANCED).unwrap_err();

    let disposed: Vec<Event> = recorder
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::Disposed(_)))
        .collect();
    assert_eq!(disposed, [Event::Disposed(a.id())]);
    assert!(!lc.is_occupied());
}

/// Counts every call that reaches the entry point
struct CountingCreator<'a, 'n> {
    inner: Instance<'a>,
    calls: &'n mut u32,
}

impl ModelCreator for CountingCreator<'_, '_> {
    fn create_model(&mut self, builder: ModelBuilder) -> Result<Option<Model>, Fault> {
        *self.calls += 1;
        self.inner.create_model(builder)
    }
}

#[test]
fn test_same_snippet_is_rebuilt_from_scratch() {
    let config = EngineConfig::default();
    let mut calls = 0;
    let mut context_ids = Vec::new();
    let mut model_ids = Vec::new();

    for _ in 0..2 {
        let artifact = compile(&assemble(COLORED_BOX), SymbolTable::global(), &config).unwrap();
        let loaded = load(artifact).unwrap();
        context_ids.push(loaded.context().id());

        let mut instance = Instance::new(&loaded, &config);
        let builder = instance.new_builder();
        let mut creator = CountingCreator {
            inner: instance,
            calls: &mut calls,
        };
        model_ids.push(call_creator(&mut creator, builder).unwrap().id());
    }

    assert_eq!(calls, 2);
    assert_ne!(context_ids[0], context_ids[1]);
    assert_ne!(model_ids[0], model_ids[1]);
}

#[test]
fn test_every_replace_runs_the_entry_point() {
    let recorder = Recorder::default();
    let mut lc = Lifecycle::new(EngineConfig::default()).with_observer(recorder.clone());
    let a = lc.replace(COLORED_BOX).unwrap();
    let b = lc.replace(COLORED_BOX).unwrap();

    let executions = recorder
        .events()
        .iter()
        .filter(|e| **e == Event::Stage(PipelineStage::Execute))
        .count();
    assert_eq!(executions, 2);
    assert_ne!(a.id(), b.id());
}
