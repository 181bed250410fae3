//! Wraps a raw snippet into the fixed compilable unit.

use shared::Location;

/// Name of the single mandated entry point
pub const ENTRY_POINT: &str = "createModel";
/// Name of the builder parameter visible to snippets
pub const BUILDER_PARAM: &str = "modelBuilder";

const HEADER: &str = "module modelsnip.runtime;

use model.ModelBuilder;
use model.Model;
use model.Node;
use model.Material;
use graphics.Color;
use graphics.ColorAttribute;
use math.Vector3;
use util.Array;
use lang.String;
use lang.Integer;
use lang.Float;
use lang.Double;
use lang.Boolean;
use lang.Object;

fn createModel(modelBuilder: ModelBuilder) -> Model {
    // snippet begins
";

const TRAILER: &str = "
    // snippet ends
    return modelBuilder.end();
}
";

/// A snippet wrapped with the fixed header and trailer.
#[derive(Debug, Clone)]
pub struct CompilableUnit {
    source: String,
    first_snippet_line: u32,
    snippet_lines: u32,
    snippet_bytes: usize,
}

impl CompilableUnit {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Size of the wrapped snippet alone
    pub fn snippet_bytes(&self) -> usize {
        self.snippet_bytes
    }

    /// Map a unit position to snippet coordinates.
    ///
    /// Positions inside the fixed header or trailer have no snippet location.
    pub fn snippet_location(&self, line: u32, column: u32) -> Option<Location> {
        let last = self.first_snippet_line + self.snippet_lines;
        if line >= self.first_snippet_line && line < last {
            Some(Location::new(line - self.first_snippet_line + 1, column))
        } else {
            None
        }
    }
}

/// Unit over arbitrary source with no snippet region
#[cfg(test)]
pub(crate) fn raw_unit(source: &str) -> CompilableUnit {
    CompilableUnit {
        source: source.to_string(),
        first_snippet_line: 1,
        snippet_lines: 0,
        snippet_bytes: 0,
    }
}

/// Build the compilable unit for `snippet`. Performs no validation.
pub fn assemble(snippet: &str) -> CompilableUnit {
    let mut source = String::with_capacity(HEADER.len() + snippet.len() + TRAILER.len());
    source.push_str(HEADER);
    source.push_str(snippet);
    source.push_str(TRAILER);

    let header_lines = HEADER.matches('\n').count() as u32;
    CompilableUnit {
        source,
        first_snippet_line: header_lines + 1,
        snippet_lines: snippet.matches('\n').count() as u32 + 1,
        snippet_bytes: snippet.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_is_fixed() {
        let a = assemble("let x = 1;");
        let b = assemble("}}} fn other() {");
        assert!(a.source().starts_with(HEADER));
        assert!(b.source().starts_with(HEADER));
        assert!(a.source().ends_with(TRAILER));
        assert!(b.source().ends_with(TRAILER));
    }

    #[test]
    fn test_snippet_inserted_verbatim() {
        let snippet = "let a = 1;\nlet b = \"}\";";
        let unit = assemble(snippet);
        assert!(unit.source().contains(snippet));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(assemble("x").source(), assemble("x").source());
    }

    #[test]
    fn test_snippet_location_mapping() {
        let unit = assemble("a\nb\nc");
        let first = HEADER.matches('\n').count() as u32 + 1;
        assert_eq!(unit.snippet_location(first, 4), Some(Location::new(1, 4)));
        assert_eq!(unit.snippet_location(first + 2, 1), Some(Location::new(3, 1)));
        assert_eq!(unit.snippet_location(first + 3, 1), None);
        assert_eq!(unit.snippet_location(1, 1), None);
    }
}
