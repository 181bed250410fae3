//! Compilation pipeline: source text of a compilable unit to a checked program.
//!
//! Stages run in order and stop at the first stage that reports errors:
//! lexing and parsing produce a [`ast::Unit`], the checker resolves every name
//! through the [`SymbolTable`] and lowers the tree to a [`program::Program`].
//! Nothing is cached between calls.

pub mod ast;
mod checker;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod program;

use std::collections::BTreeSet;

use tracing::debug;

pub use error::{CompileError, Span};
pub use program::EntryPoint;

use crate::config::EngineConfig;
use crate::template::CompilableUnit;
use crate::whitelist::SymbolTable;
use checker::Checker;
use parser::Parser;
use program::Program;

/// Output of one successful compilation. Never shared between attempts.
#[derive(Debug)]
pub struct CompiledArtifact {
    program: Program,
}

impl CompiledArtifact {
    pub fn entry(&self) -> &EntryPoint {
        &self.program.entry
    }

    /// Qualified names of the types the program uses
    pub fn referenced_symbols(&self) -> &BTreeSet<&'static str> {
        &self.program.references
    }

    pub(crate) fn program(&self) -> &Program {
        &self.program
    }
}

/// Compile `unit` against `symbols`.
///
/// On failure returns at least one error; the list is capped at
/// `config.max_diagnostics`.
pub fn compile(
    unit: &CompilableUnit,
    symbols: &SymbolTable,
    config: &EngineConfig,
) -> Result<CompiledArtifact, Vec<CompileError>> {
    if unit.snippet_bytes() > config.max_snippet_bytes {
        return Err(vec![CompileError::unlocated(format!(
            "snippet is {} bytes, limit is {}",
            unit.snippet_bytes(),
            config.max_snippet_bytes
        ))]);
    }

    let ast = Parser::new(unit.source(), config.max_nesting)
        .and_then(|mut p| p.parse_unit())
        .map_err(|e| vec![e])?;

    let program = Checker::new(symbols, config.max_diagnostics).check(&ast)?;
    debug!(
        slots = program.slots,
        references = program.references.len(),
        "compiled unit"
    );
    Ok(CompiledArtifact { program })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::assemble;
    use crate::whitelist::types::{MATH, MODEL, NODE, VECTOR3};
    use crate::whitelist::ValueType;

    fn compile_snippet(snippet: &str) -> Result<CompiledArtifact, Vec<CompileError>> {
        compile(&assemble(snippet), SymbolTable::global(), &EngineConfig::default())
    }

    fn first_error(snippet: &str) -> String {
        match compile_snippet(snippet) {
            Ok(_) => panic!("snippet compiled: {snippet}"),
            Err(errors) => errors[0].message.clone(),
        }
    }

    #[test]
    fn test_empty_snippet_compiles() {
        let artifact = compile_snippet("").unwrap();
        assert_eq!(artifact.entry().name, "createModel");
        assert_eq!(artifact.entry().ret, ValueType::Class(MODEL));
    }

    #[test]
    fn test_references_collected() {
        let artifact = compile_snippet(
            "let n = modelBuilder.node();\n\
             n.translation.set(1, 2, 3);",
        )
        .unwrap();
        let refs = artifact.referenced_symbols();
        assert!(refs.contains(NODE));
        assert!(refs.contains(VECTOR3));
    }

    #[test]
    fn test_host_only_type_is_unresolved() {
        assert!(first_error("let x = Math::sin(1.0);").contains("cannot resolve symbol 'Math'"));
        assert!(first_error("let x = lang.Math::sin(1.0);").contains(MATH));
        assert!(first_error("host.System::exit(0);").contains("host.System"));
    }

    #[test]
    fn test_qualified_static_call() {
        compile_snippet("let c = graphics.Color::new(1, 0, 0, 1);").unwrap();
    }

    #[test]
    fn test_unknown_member() {
        assert!(first_error("modelBuilder.explode();").contains("'explode'"));
    }

    #[test]
    fn test_type_mismatch() {
        assert!(first_error("let x: int = 1.5;").contains("mismatched types"));
        assert!(first_error("modelBuilder.box(\"a\", 1, 1);").contains("mismatched types"));
    }

    #[test]
    fn test_arity() {
        assert!(first_error("modelBuilder.box(1, 1);").contains("expects 3 argument(s)"));
    }

    #[test]
    fn test_int_widens_to_float() {
        compile_snippet("let f: float = 2;\nlet g = f * 3;\nmodelBuilder.sphere(g, 8);").unwrap();
    }

    #[test]
    fn test_string_concat() {
        compile_snippet("let n = modelBuilder.node();\nn.id = \"part\" + 1;").unwrap();
    }

    #[test]
    fn test_redeclare_is_error() {
        assert!(first_error("let a = 1;\nlet a = 2;").contains("already defined"));
        assert!(first_error("let modelBuilder = 1;").contains("already defined"));
    }

    #[test]
    fn test_parameter_not_assignable() {
        assert!(first_error("modelBuilder = null;").contains("cannot assign"));
    }

    #[test]
    fn test_ref_field_not_assignable() {
        let err = first_error("let n = modelBuilder.node();\nn.translation = Vector3::zero();");
        assert!(err.contains("cannot be reassigned"));
    }

    #[test]
    fn test_condition_must_be_bool() {
        assert!(first_error("if 1 { }").contains("condition must be bool"));
    }

    #[test]
    fn test_range_bounds_must_be_int() {
        assert!(first_error("for i in 0..2.5 { }").contains("range bound"));
    }

    #[test]
    fn test_loop_variable_readonly() {
        assert!(first_error("for i in 0..3 { i = 2; }").contains("cannot assign"));
    }

    #[test]
    fn test_null_needs_annotation() {
        assert!(first_error("let x = null;").contains("cannot infer"));
        compile_snippet("let x: Node = null;").unwrap();
    }

    #[test]
    fn test_return_null_compiles() {
        compile_snippet("return null;").unwrap();
    }

    #[test]
    fn test_bare_return() {
        assert!(first_error("return;").contains("missing return value"));
    }

    #[test]
    fn test_multiple_errors_reported() {
        let errors = compile_snippet("let a = Math::PI;\nlet b = Files::read(\"x\");").unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_diagnostics_capped() {
        let snippet = "let a = Math::PI;\n".repeat(100);
        let config = EngineConfig {
            max_diagnostics: 5,
            ..EngineConfig::default()
        };
        let errors = compile(&assemble(&snippet), SymbolTable::global(), &config).unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_snippet_size_limit() {
        let config = EngineConfig {
            max_snippet_bytes: 8,
            ..EngineConfig::default()
        };
        let errors = compile(&assemble("let a = 1;"), SymbolTable::global(), &config).unwrap_err();
        assert!(errors[0].message.contains("limit"));
        assert!(errors[0].span.is_none());
    }

    #[test]
    fn test_unbalanced_braces() {
        let errors = compile_snippet("}\nfn evil(b: ModelBuilder) -> Model {").unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_error_span_points_into_snippet() {
        let unit = assemble("let a = 1;\nlet b = Math::PI;");
        let errors = compile(&unit, SymbolTable::global(), &EngineConfig::default()).unwrap_err();
        let span = errors[0].span.unwrap();
        let loc = unit.snippet_location(span.line, span.column).unwrap();
        assert_eq!(loc.line, 2);
    }

    #[test]
    fn test_restricted_table_rejects_otherwise_valid_code() {
        let table = SymbolTable::from_names(&[crate::whitelist::types::MODEL_BUILDER]);
        let errors = compile(&assemble(""), &table, &EngineConfig::default()).unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("model.Model")));
    }
}
