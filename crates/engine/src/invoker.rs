//! Invocation of loaded artifacts through the fixed [`ModelCreator`] interface.

use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::{debug, error};

use crate::compiler::Span;
use crate::config::EngineConfig;
use crate::geometry::Model;
use crate::loader::LoadedArtifact;
use crate::runtime::machine::Machine;
use crate::runtime::{Fault, Runtime, Value};

/// Builder value handed to the entry point; only an [`Instance`] can make one
#[derive(Debug)]
pub struct ModelBuilder(Value);

/// The single contract every loaded unit is called through
pub trait ModelCreator {
    fn create_model(&mut self, builder: ModelBuilder) -> Result<Option<Model>, Fault>;
}

/// Any failure while running the entry point, including a missing result
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ExecutionFault {
    pub message: String,
    pub span: Option<Span>,
}

impl From<Fault> for ExecutionFault {
    fn from(fault: Fault) -> Self {
        Self {
            message: fault.message,
            span: fault.span,
        }
    }
}

impl ExecutionFault {
    fn no_model() -> Self {
        Self {
            message: "createModel produced no model".to_string(),
            span: None,
        }
    }
}

/// One instantiation of a loaded artifact with its own heap and step budget
pub struct Instance<'a> {
    loaded: &'a LoadedArtifact,
    runtime: Runtime<'a>,
}

impl<'a> Instance<'a> {
    pub fn new(loaded: &'a LoadedArtifact, config: &'a EngineConfig) -> Self {
        Self {
            loaded,
            runtime: Runtime::new(config),
        }
    }

    pub fn new_builder(&mut self) -> ModelBuilder {
        ModelBuilder(self.runtime.new_builder())
    }

    pub fn steps(&self) -> u64 {
        self.runtime.steps()
    }
}

impl ModelCreator for Instance<'_> {
    fn create_model(&mut self, builder: ModelBuilder) -> Result<Option<Model>, Fault> {
        let program = self.loaded.program();
        let bindings = self.loaded.context().bindings();
        match Machine::new(program, bindings, &mut self.runtime).run(builder.0)? {
            Value::Null => Ok(None),
            Value::Ref(r) => self.runtime.heap.take_model(r).map(Some),
            other => Err(Fault::type_mismatch("Model", &other)),
        }
    }
}

/// Call `creator` once with `builder`, converting every failure mode into an
/// [`ExecutionFault`]. Panics are contained here.
pub fn call_creator(
    creator: &mut dyn ModelCreator,
    builder: ModelBuilder,
) -> Result<Model, ExecutionFault> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| creator.create_model(builder)));
    match outcome {
        Ok(Ok(Some(model))) => Ok(model),
        Ok(Ok(None)) => Err(ExecutionFault::no_model()),
        Ok(Err(fault)) => Err(fault.into()),
        Err(payload) => {
            let detail = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(%detail, "entry point panicked");
            Err(ExecutionFault {
                message: format!("internal fault while running snippet: {detail}"),
                span: None,
            })
        }
    }
}

/// Instantiate `loaded` and invoke its entry point with a fresh builder
pub fn invoke(loaded: &LoadedArtifact, config: &EngineConfig) -> Result<Model, ExecutionFault> {
    let mut instance = Instance::new(loaded, config);
    let builder = instance.new_builder();
    let result = call_creator(&mut instance, builder);
    debug!(
        context_id = loaded.context().id(),
        steps = instance.steps(),
        ok = result.is_ok(),
        "invocation finished"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::loader::load;
    use crate::template::assemble;
    use crate::whitelist::SymbolTable;

    fn run(snippet: &str, config: &EngineConfig) -> Result<Model, ExecutionFault> {
        let artifact = compile(&assemble(snippet), SymbolTable::global(), config).unwrap();
        let loaded = load(artifact).unwrap();
        invoke(&loaded, config)
    }

    struct Panicking;

    impl ModelCreator for Panicking {
        fn create_model(&mut self, _: ModelBuilder) -> Result<Option<Model>, Fault> {
            panic!("boom")
        }
    }

    struct Empty;

    impl ModelCreator for Empty {
        fn create_model(&mut self, _: ModelBuilder) -> Result<Option<Model>, Fault> {
            Ok(None)
        }
    }

    #[test]
    fn test_valid_snippet_builds_model() {
        let model = run(crate::fixtures::COLORED_BOX, &EngineConfig::default()).unwrap();
        assert_eq!(model.part_count(), 1);
    }

    #[test]
    fn test_null_return_is_fault() {
        let err = run("return null;", &EngineConfig::default()).unwrap_err();
        assert!(err.message.contains("no model"));
    }

    #[test]
    fn test_runtime_fault_carries_span() {
        let err = run("let a = 0;\nlet b = 1 / a;", &EngineConfig::default()).unwrap_err();
        assert!(err.message.contains("division by zero"));
        assert!(err.span.is_some());
    }

    #[test]
    fn test_null_receiver() {
        let err = run("let n: Node = null;\nn.addChild(n);", &EngineConfig::default()).unwrap_err();
        assert!(err.message.contains("null reference"));
    }

    #[test]
    fn test_infinite_loop_hits_step_limit() {
        let config = EngineConfig {
            max_steps: 10_000,
            ..EngineConfig::default()
        };
        let err = run("for i in 0..Integer::MAX_VALUE { }", &config).unwrap_err();
        assert!(err.message.contains("step limit"));
    }

    #[test]
    fn test_panic_is_contained() {
        let err = call_creator(&mut Panicking, ModelBuilder(Value::Null)).unwrap_err();
        assert!(err.message.contains("boom"));
    }

    #[test]
    fn test_none_is_fault() {
        let err = call_creator(&mut Empty, ModelBuilder(Value::Null)).unwrap_err();
        assert_eq!(err, ExecutionFault::no_model());
    }
}
