//! Snippets used by tests and by the server's smoke checks.
//!
//! Each constant is a complete snippet body; the factory functions build
//! parameterized variants.

pub use shared::EXAMPLE_SNIPPET;

/// One red 1x1x1 box on a single node
pub const COLORED_BOX: &str = r#"let partId = modelBuilder.box(1, 1, 1);
let node = modelBuilder.node();
node.id = "box";
node.addPart(partId, Material::of(ColorAttribute::createDiffuse(Color::RED)));
"#;

/// Parent and child node, child offset along Y
pub const HIERARCHY: &str = r#"let cube = modelBuilder.box(1, 1, 1);
let ball = modelBuilder.sphere(0.5, 12);
let paint = Material::of(ColorAttribute::createDiffuse(Color::BLUE));

let base = modelBuilder.node();
base.id = "base";
base.addPart(cube, paint);

let top = modelBuilder.node();
top.id = "top";
top.setTranslation(0, 1.5, 0);
top.addPart(ball, paint);
base.addChild(top);
"#;

/// Loops, conditionals and arithmetic: a row of boxes with alternating colors
pub const ROW_OF_BOXES: &str = r#"let cube = modelBuilder.box(0.8, 0.8, 0.8);
let light = Material::of(ColorAttribute::createDiffuse(Color::WHITE));
let dark = Material::of(ColorAttribute::createDiffuse(Color::GRAY));
for i in 0..5 {
    let n = modelBuilder.node();
    n.id = "cell" + i;
    n.translation.x = i * 1.0;
    if i % 2 == 0 {
        n.addPart(cube, light);
    } else {
        n.addPart(cube, dark);
    }
}
"#;

/// Uses only granted types; builds nothing
pub const EMPTY_MODEL: &str = "let nothing = 0;\n";

/// Builder misuse that faults at run time
pub const NEGATIVE_SIZE: &str = "let id = modelBuilder.box(-1, 1, 1);\n";

/// Compiles, returns no model
pub const RETURNS_NULL: &str = "return null;\n";

/// Braces do not balance
pub const UNBALANCED: &str = "if true {\n    let a = 1;\n";

/// Host types that exist but are not granted
pub const FORBIDDEN_NAMES: &[&str] = &[
    "let t = lang.Math::sin(1.0);\n",
    "host.System::exit(0);\n",
    "let s = host.Files::read(\"/etc/passwd\");\n",
    "let env = graphics.Environment::new();\n",
    "let fs = std.fs.File::open(\"x\");\n",
];

/// Box with the given dimensions
pub fn box_snippet(w: f64, h: f64, d: f64) -> String {
    format!(
        "let id = modelBuilder.box({w:?}, {h:?}, {d:?});\n\
         let n = modelBuilder.node();\n\
         n.addPart(id, Material::new());\n"
    )
}

/// `count` spheres stacked along Y
pub fn stacked_spheres(count: u32, divisions: u32) -> String {
    format!(
        "let ball = modelBuilder.sphere(0.5, {divisions});\n\
         let m = Material::of(ColorAttribute::createDiffuse(Color::GREEN));\n\
         for i in 0..{count} {{\n    \
             let n = modelBuilder.node();\n    \
             n.setTranslation(0, i, 0);\n    \
             n.addPart(ball, m);\n\
         }}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::config::EngineConfig;
    use crate::template::assemble;
    use crate::whitelist::SymbolTable;

    fn compiles(snippet: &str) -> bool {
        compile(&assemble(snippet), SymbolTable::global(), &EngineConfig::default()).is_ok()
    }

    #[test]
    fn test_valid_fixtures_compile() {
        for snippet in [
            COLORED_BOX,
            HIERARCHY,
            ROW_OF_BOXES,
            EMPTY_MODEL,
            NEGATIVE_SIZE,
            RETURNS_NULL,
            EXAMPLE_SNIPPET,
        ] {
            assert!(compiles(snippet), "{snippet}");
        }
        assert!(compiles(&box_snippet(1.0, 2.0, 3.0)));
        assert!(compiles(&stacked_spheres(3, 8)));
    }

    #[test]
    fn test_invalid_fixtures_do_not_compile() {
        assert!(!compiles(UNBALANCED));
        for snippet in FORBIDDEN_NAMES {
            assert!(!compiles(snippet), "{snippet}");
        }
    }
}
