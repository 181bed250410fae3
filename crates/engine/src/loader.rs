//! Binds a compiled artifact to a fresh loading context.
//!
//! A context carries the natives for exactly the types its artifact
//! references and nothing else. Contexts are never reused: each load takes a
//! new id and the context is dropped with its artifact.

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::debug;

use crate::compiler::program::Program;
use crate::compiler::CompiledArtifact;
use crate::runtime::natives::{self, BindingTable};
use crate::template::ENTRY_POINT;
use crate::whitelist::types::{MODEL, MODEL_BUILDER};
use crate::whitelist::ValueType;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoaderError {
    #[error("entry point 'createModel' not found (unit declares '{0}')")]
    MissingEntryPoint(String),
    #[error("entry point 'createModel' has signature ({param}) -> {ret}, expected (ModelBuilder) -> Model")]
    WrongSignature { param: ValueType, ret: ValueType },
    #[error("no runtime binding for '{0}'")]
    Unbound(&'static str),
}

/// Isolated, single-purpose context one artifact runs in
#[derive(Debug)]
pub struct LoadingContext {
    id: u64,
    bindings: BindingTable,
}

impl LoadingContext {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Qualified names of the types this context can call into
    pub fn bound_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.bindings.keys().copied()
    }

    pub(crate) fn bindings(&self) -> &BindingTable {
        &self.bindings
    }
}

/// A compiled artifact made invocable
#[derive(Debug)]
pub struct LoadedArtifact {
    context: LoadingContext,
    artifact: CompiledArtifact,
}

impl LoadedArtifact {
    pub fn context(&self) -> &LoadingContext {
        &self.context
    }

    pub fn artifact(&self) -> &CompiledArtifact {
        &self.artifact
    }

    pub(crate) fn program(&self) -> &Program {
        self.artifact.program()
    }
}

/// Verify the entry point and bind natives for every referenced type
pub fn load(artifact: CompiledArtifact) -> Result<LoadedArtifact, LoaderError> {
    let entry = artifact.entry();
    if entry.name != ENTRY_POINT {
        return Err(LoaderError::MissingEntryPoint(entry.name.clone()));
    }
    if entry.param != ValueType::Class(MODEL_BUILDER) || entry.ret != ValueType::Class(MODEL) {
        return Err(LoaderError::WrongSignature {
            param: entry.param,
            ret: entry.ret,
        });
    }

    let mut bindings = BindingTable::new();
    let required = [MODEL_BUILDER, MODEL]
        .into_iter()
        .chain(artifact.referenced_symbols().iter().copied());
    for name in required {
        let binding = natives::lookup(name).ok_or(LoaderError::Unbound(name))?;
        bindings.insert(name, binding);
    }

    let id = NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed);
    debug!(context_id = id, bound = bindings.len(), "artifact loaded");
    Ok(LoadedArtifact {
        context: LoadingContext { id, bindings },
        artifact,
    })
}
