//! Evaluation of checked programs.
//!
//! A [`Runtime`] is created for exactly one invocation. It owns the object
//! heap, the builder state and the step counter; nothing survives it except
//! the model it hands back.

pub mod builder;
pub mod heap;
pub(crate) mod machine;
pub mod natives;
pub mod value;

use std::mem;

use crate::config::EngineConfig;
use builder::BuilderState;
use heap::{Heap, Object};

pub use natives::Binding;
pub use value::{Fault, FaultResult, ObjRef, Value};

pub struct Runtime<'c> {
    pub(crate) heap: Heap,
    pub(crate) builder: BuilderState,
    pub(crate) limits: &'c EngineConfig,
    steps: u64,
    heap_bytes: usize,
}

impl<'c> Runtime<'c> {
    pub fn new(limits: &'c EngineConfig) -> Self {
        Self {
            heap: Heap::default(),
            builder: BuilderState::default(),
            limits,
            steps: 0,
            heap_bytes: 0,
        }
    }

    /// Fresh builder object for the entry point
    pub fn new_builder(&mut self) -> Value {
        Value::Ref(self.heap.alloc(Object::Builder))
    }

    /// Charge one evaluation step
    pub fn tick(&mut self) -> FaultResult<()> {
        charge_step(&mut self.steps, self.limits.max_steps)
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Bytes allocated so far; never decreases during an invocation
    pub fn heap_bytes(&self) -> usize {
        self.heap_bytes
    }

    /// Charge `bytes` against the allocation budget
    pub(crate) fn charge_bytes(&mut self, bytes: usize) -> FaultResult<()> {
        self.heap_bytes = self.heap_bytes.saturating_add(bytes);
        if self.heap_bytes > self.limits.max_heap_bytes {
            return Err(Fault::new(format!(
                "heap limit of {} bytes exceeded",
                self.limits.max_heap_bytes
            )));
        }
        Ok(())
    }

    pub(crate) fn string(&mut self, s: String) -> FaultResult<Value> {
        check_string_len(s.len(), self.limits.max_string_len)?;
        self.charge_bytes(s.len())?;
        Ok(Value::Str(s))
    }

    pub(crate) fn alloc(&mut self, object: Object) -> FaultResult<Value> {
        self.tick()?;
        self.charge_bytes(mem::size_of::<Object>())?;
        Ok(Value::Ref(self.heap.alloc(object)))
    }

    /// Text form of `value`, charging a step per element written.
    ///
    /// Faults as soon as the text grows past the string limit.
    pub(crate) fn display(&mut self, value: &Value) -> FaultResult<String> {
        let max_steps = self.limits.max_steps;
        let max_len = self.limits.max_string_len;
        let steps = &mut self.steps;
        let mut out = String::new();
        self.heap.write_display(&mut out, value, max_len, &mut || {
            charge_step(steps, max_steps)
        })?;
        Ok(out)
    }
}

fn charge_step(steps: &mut u64, max_steps: u64) -> FaultResult<()> {
    *steps += 1;
    if *steps > max_steps {
        return Err(Fault::new(format!(
            "evaluation step limit of {max_steps} exceeded"
        )));
    }
    Ok(())
}

pub(crate) fn check_string_len(len: usize, max_len: usize) -> FaultResult<()> {
    if len > max_len {
        return Err(Fault::new(format!(
            "string of {len} bytes exceeds the limit of {max_len}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_budget() {
        let config = EngineConfig {
            max_heap_bytes: 100,
            ..EngineConfig::default()
        };
        let mut rt = Runtime::new(&config);
        assert!(rt.string("a".repeat(60)).is_ok());
        let err = rt.string("b".repeat(60)).unwrap_err();
        assert!(err.message.contains("heap limit"), "{}", err.message);
        assert_eq!(rt.heap_bytes(), 120);
    }

    #[test]
    fn test_display_stops_at_string_limit() {
        let config = EngineConfig {
            max_string_len: 32,
            ..EngineConfig::default()
        };
        let mut rt = Runtime::new(&config);
        let items = vec![Value::Str("0123456789".to_string()); 100];
        let arr = rt.alloc(Object::Array(items)).unwrap();
        let before = rt.steps();
        let err = rt.display(&arr).unwrap_err();
        assert!(err.message.contains("exceeds the limit of 32"), "{}", err.message);
        assert!(rt.steps() - before < 10);
    }
}
