//! Статические тексты для внешнего генератора кода: шаблон запроса и пример сниппета.

/// Шаблон запроса, описывающий ожидаемую форму сниппета
pub const PROMPT_TEMPLATE: &str = r#"Generate ONLY the body of a modelsnip `createModel` function that builds a low-poly, game-ready 3D model of: [DESCRIBE YOUR OBJECT HERE].

Return ONLY statements, no function header, no `use` lines, no explanations. The body runs inside:

fn createModel(modelBuilder: ModelBuilder) -> Model {
    // your statements here
    return modelBuilder.end();
}

Language rules:
- declare variables with `let name = expr;` or `let name: Type = expr;`
- loops: `for i in 0..n { ... }`, branches: `if cond { ... } else { ... }`
- static members use `Type::member`, instance members use `value.member`
- numbers are `int` or `float`; ints widen to floats automatically

Available API (nothing else resolves):
- ModelBuilder: box(w, h, d), sphere(r, divisions), cylinder(r, h, divisions), cone(r, h, divisions), plane(w, d) -> part id; node() -> Node; part(node, partId, material)
- Node: id, translation, rotation (degrees), scale; addPart(partId, material), addChild(node), setTranslation(x, y, z)
- Vector3: Vector3::new(x, y, z), set, add, sub, scl, len, nor, cpy, dot, crs
- Color: Color::new(r, g, b, a), Color::rgb(r, g, b), Color::WHITE/BLACK/RED/GREEN/BLUE/GRAY/BROWN, lerp, cpy
- ColorAttribute: createDiffuse(color), createSpecular(color), createEmissive(color)
- Material: Material::new(), Material::of(attribute), set(attribute)
- Array, String, Integer, Float, Double, Boolean helpers

Keep part counts small (under 50 parts) and divisions between 3 and 64."#;

/// Пример сниппета: простое низкополигональное дерево
pub const EXAMPLE_SNIPPET: &str = r#"// Simple low-poly tree

// Trunk (brown cylinder)
let trunkId = modelBuilder.cylinder(0.3, 1.5, 16);
let trunk = modelBuilder.node();
trunk.id = "trunk";
trunk.translation.set(0, 0.75, 0);
trunk.addPart(trunkId, Material::of(ColorAttribute::createDiffuse(Color::new(0.4, 0.25, 0.1, 1))));

// Foliage (green cone)
let foliageId = modelBuilder.cone(1.2, 2, 8);
let foliage = modelBuilder.node();
foliage.id = "foliage";
foliage.translation.set(0, 2.5, 0);
foliage.addPart(foliageId, Material::of(ColorAttribute::createDiffuse(Color::new(0.2, 0.6, 0.2, 1))));

// Ground plane
let groundId = modelBuilder.box(4, 0.1, 4);
let ground = modelBuilder.node();
ground.id = "ground";
ground.addPart(groundId, Material::of(ColorAttribute::createDiffuse(Color::rgb(0.3, 0.5, 0.3))));
"#;
