//! Integration tests for the sandbox boundary and resource limits.

use modelsnip_engine::fixtures::*;
use modelsnip_engine::{EngineConfig, Lifecycle, Stage};

#[test]
fn test_forbidden_names_never_resolve() {
    let mut lc = Lifecycle::new(EngineConfig::default());
    for snippet in FORBIDDEN_NAMES {
        lc.replace(COLORED_BOX).unwrap();
        let err = lc.replace(snippet).unwrap_err();
        assert_eq!(err.stage, Stage::Compile, "{snippet}");
        assert!(!lc.is_occupied(), "{snippet}");
    }
}

#[test]
fn test_snippet_cannot_escape_entry_point() {
    let mut lc = Lifecycle::new(EngineConfig::default());
    let err = lc
        .replace("return modelBuilder.end();\n}\nfn other(modelBuilder: ModelBuilder) -> Model {\n")
        .unwrap_err();
    assert_eq!(err.stage, Stage::Compile);
}

#[test]
fn test_infinite_loop_hits_step_limit() {
    let config = EngineConfig {
        max_steps: 10_000,
        ..EngineConfig::default()
    };
    let mut lc = Lifecycle::new(config);
    let err = lc
        .replace("for i in 0..Integer::MAX_VALUE {\n    let x = i;\n}\n")
        .unwrap_err();
    assert_eq!(err.stage, Stage::Execute);
    assert!(err.message.contains("step limit"), "{}", err.message);
}

#[test]
fn test_vertex_limit() {
    let config = EngineConfig {
        max_vertices: 1_000,
        ..EngineConfig::default()
    };
    let mut lc = Lifecycle::new(config);
    let err = lc.replace(&stacked_spheres(20, 32)).unwrap_err();
    assert_eq!(err.stage, Stage::Execute);
}

#[test]
fn test_oversized_snippet() {
    let config = EngineConfig {
        max_snippet_bytes: 64,
        ..EngineConfig::default()
    };
    let mut lc = Lifecycle::new(config);
    let err = lc.replace(EXAMPLE_SNIPPET).unwrap_err();
    assert_eq!(err.stage, Stage::Compile);
    assert!(err.location.is_none());
}

#[test]
fn test_deep_nesting_is_rejected() {
    let mut snippet = String::new();
    for _ in 0..500 {
        snippet.push_str("if true {\n");
    }
    for _ in 0..500 {
        snippet.push_str("}\n");
    }
    let mut lc = Lifecycle::new(EngineConfig::default());
    let err = lc.replace(&snippet).unwrap_err();
    assert_eq!(err.stage, Stage::Compile);
}

#[test]
fn test_integer_overflow_faults() {
    let mut lc = Lifecycle::new(EngineConfig::default());
    let err = lc
        .replace("let big = Integer::MAX_VALUE;\nlet boom = big + 1;\n")
        .unwrap_err();
    assert_eq!(err.stage, Stage::Execute);
    assert_eq!(err.location.map(|l| l.line), Some(2));
}

#[test]
fn test_self_referencing_array_display_is_bounded() {
    let mut lc = Lifecycle::new(EngineConfig::default());
    let started = std::time::Instant::now();
    let err = lc
        .replace(
            "let a = Array::new();\n\
             for i in 0..20 {\n    a.add(a);\n}\n\
             let s = \"\" + a;\n",
        )
        .unwrap_err();
    assert_eq!(err.stage, Stage::Execute);
    assert!(err.message.contains("exceeds the limit"), "{}", err.message);
    assert_eq!(err.location.map(|l| l.line), Some(5));
    assert!(started.elapsed().as_secs() < 2);
}

#[test]
fn test_display_work_is_charged_as_steps() {
    let config = EngineConfig {
        max_steps: 500,
        ..EngineConfig::default()
    };
    let mut lc = Lifecycle::new(config);
    let err = lc
        .replace(
            "let a = Array::new();\n\
             for i in 0..20 {\n    a.add(i);\n}\n\
             for j in 0..50 {\n    let s = \"\" + a;\n}\n",
        )
        .unwrap_err();
    assert_eq!(err.stage, Stage::Execute);
    assert!(err.message.contains("step limit"), "{}", err.message);
}

#[test]
fn test_retained_strings_hit_heap_limit() {
    let mut lc = Lifecycle::new(EngineConfig::default());
    let err = lc
        .replace(
            "let s = \"x\";\n\
             for i in 0..16 {\n    s = s + s;\n}\n\
             let a = Array::new();\n\
             for i in 0..4000 {\n    a.add(s);\n}\n",
        )
        .unwrap_err();
    assert_eq!(err.stage, Stage::Execute);
    assert!(err.message.contains("heap limit"), "{}", err.message);
}

#[test]
fn test_array_length_limit() {
    let config = EngineConfig {
        max_array_len: 100,
        ..EngineConfig::default()
    };
    let mut lc = Lifecycle::new(config);
    let err = lc
        .replace("let a = Array::new();\nfor i in 0..1000 {\n    a.add(i);\n}\n")
        .unwrap_err();
    assert_eq!(err.stage, Stage::Execute);
    assert!(err.message.contains("array length limit"), "{}", err.message);
}
