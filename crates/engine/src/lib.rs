//! Snippet-to-model engine.
//!
//! A snippet is wrapped into a fixed compilable unit, compiled against a closed
//! symbol table, loaded into a fresh single-purpose context, invoked once through
//! the [`invoker::ModelCreator`] interface, and the resulting model is held in the
//! single slot owned by [`lifecycle::Lifecycle`].

pub mod compiler;
pub mod config;
pub mod export;
pub mod fixtures;
pub mod geometry;
pub mod invoker;
pub mod lifecycle;
pub mod loader;
pub mod runtime;
pub mod template;
pub mod validation;
pub mod whitelist;

pub use config::EngineConfig;
pub use export::build_glb;
pub use geometry::{MeshData, Model, ModelNode};
pub use invoker::{ExecutionFault, ModelCreator};
pub use loader::LoaderError;
pub use lifecycle::{EngineStats, Lifecycle, ModelHandle, ModelSession, PipelineStage, SlotObserver};
pub use shared::{Diagnostic, Location, ModelSummary, Stage};
pub use validation::validate_model;
pub use whitelist::SymbolTable;
