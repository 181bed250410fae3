//! Binary glTF export of a built model for a rendering collaborator.

use glam::{EulerRot, Quat};
use serde_json::{json, Value as Json};

use crate::geometry::mesh::STRIDE;
use crate::geometry::{MeshPart, Model, ModelNode};

/// GLB magic number: "glTF"
const GLB_MAGIC: u32 = 0x46546C67;
/// GLB version 2
const GLB_VERSION: u32 = 2;
/// JSON chunk type
const CHUNK_TYPE_JSON: u32 = 0x4E4F534A;
/// BIN chunk type
const CHUNK_TYPE_BIN: u32 = 0x004E4942;

/// glTF component types
const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;

/// glTF buffer view targets
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

#[derive(Default)]
struct GltfBuilder {
    bin: Vec<u8>,
    buffer_views: Vec<Json>,
    accessors: Vec<Json>,
    materials: Vec<Json>,
    meshes: Vec<Json>,
    nodes: Vec<Json>,
}

impl GltfBuilder {
    fn push_view(&mut self, bytes: &[u8], target: u32) -> usize {
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        // Pad to 4-byte alignment
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        self.buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
            "target": target
        }));
        self.buffer_views.len() - 1
    }

    fn push_accessor(&mut self, accessor: Json) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    /// One primitive per part; `None` for an empty part
    fn primitive(&mut self, part: &MeshPart) -> Option<Json> {
        let mesh = &part.mesh;
        let vertex_count = mesh.vertex_count();
        if vertex_count == 0 || mesh.indices.is_empty() {
            return None;
        }

        let mut positions = Vec::with_capacity(vertex_count * 3);
        let mut normals = Vec::with_capacity(vertex_count * 3);
        let mut pos_min = [f32::MAX; 3];
        let mut pos_max = [f32::MIN; 3];
        for v in mesh.vertices.chunks_exact(STRIDE) {
            positions.extend_from_slice(&v[0..3]);
            normals.extend_from_slice(&v[3..6]);
            for axis in 0..3 {
                pos_min[axis] = pos_min[axis].min(v[axis]);
                pos_max[axis] = pos_max[axis].max(v[axis]);
            }
        }

        let pos_view = self.push_view(&floats_to_bytes(&positions), ARRAY_BUFFER);
        let norm_view = self.push_view(&floats_to_bytes(&normals), ARRAY_BUFFER);
        let idx_view = self.push_view(&u32s_to_bytes(&mesh.indices), ELEMENT_ARRAY_BUFFER);

        let position = self.push_accessor(json!({
            "bufferView": pos_view,
            "componentType": FLOAT,
            "count": vertex_count,
            "type": "VEC3",
            "min": pos_min,
            "max": pos_max
        }));
        let normal = self.push_accessor(json!({
            "bufferView": norm_view,
            "componentType": FLOAT,
            "count": vertex_count,
            "type": "VEC3"
        }));
        let indices = self.push_accessor(json!({
            "bufferView": idx_view,
            "componentType": UNSIGNED_INT,
            "count": mesh.indices.len(),
            "type": "SCALAR"
        }));

        let m = &part.material;
        let mut material = json!({
            "name": m.id,
            "pbrMetallicRoughness": {
                "baseColorFactor": m.diffuse,
                "metallicFactor": 0.0,
                "roughnessFactor": if m.specular.is_some() { 0.3 } else { 0.8 }
            }
        });
        if let Some([r, g, b, _]) = m.emissive {
            material["emissiveFactor"] = json!([r, g, b]);
        }
        self.materials.push(material);

        Some(json!({
            "attributes": { "POSITION": position, "NORMAL": normal },
            "indices": indices,
            "material": self.materials.len() - 1
        }))
    }

    /// Add `node` and its subtree, returning the node index
    fn node(&mut self, node: &ModelNode) -> usize {
        let primitives: Vec<Json> = node.parts.iter().filter_map(|p| self.primitive(p)).collect();
        let children: Vec<usize> = node.children.iter().map(|c| self.node(c)).collect();

        let t = &node.transform;
        let r = t.rotation;
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            r.x.to_radians(),
            r.y.to_radians(),
            r.z.to_radians(),
        );
        let mut gltf_node = json!({
            "name": node.id,
            "translation": t.translation.to_array(),
            "rotation": rotation.to_array(),
            "scale": t.scale.to_array()
        });
        if !primitives.is_empty() {
            self.meshes.push(json!({ "name": node.id, "primitives": primitives }));
            gltf_node["mesh"] = json!(self.meshes.len() - 1);
        }
        if !children.is_empty() {
            gltf_node["children"] = json!(children);
        }
        self.nodes.push(gltf_node);
        self.nodes.len() - 1
    }
}

/// Build a complete GLB (binary glTF) file from a model.
///
/// Node hierarchy and transforms are preserved; every part becomes one
/// primitive with its own material. Returns an empty vector for a model
/// without geometry.
pub fn build_glb(model: &Model) -> Vec<u8> {
    if model.is_empty() {
        return Vec::new();
    }

    // ── Phase 1: binary buffer and glTF objects ──────────────
    let mut gltf = GltfBuilder::default();
    let roots: Vec<usize> = model.nodes().iter().map(|n| gltf.node(n)).collect();

    // ── Phase 2: glTF JSON ───────────────────────────────────
    let gltf_json = json!({
        "asset": {
            "version": "2.0",
            "generator": "modelsnip"
        },
        "scene": 0,
        "scenes": [{
            "name": format!("model-{}", model.id()),
            "nodes": roots
        }],
        "nodes": gltf.nodes,
        "meshes": gltf.meshes,
        "materials": gltf.materials,
        "accessors": gltf.accessors,
        "bufferViews": gltf.buffer_views,
        "buffers": [{
            "byteLength": gltf.bin.len()
        }]
    });

    let mut json_bytes = serde_json::to_vec(&gltf_json).unwrap_or_default();
    let mut bin_data = gltf.bin;

    // Pad JSON with spaces, BIN with zeros (GLB chunk alignment)
    while json_bytes.len() % 4 != 0 {
        json_bytes.push(b' ');
    }
    while bin_data.len() % 4 != 0 {
        bin_data.push(0);
    }

    // ── Phase 3: assemble GLB ────────────────────────────────
    let json_chunk_length = json_bytes.len() as u32;
    let bin_chunk_length = bin_data.len() as u32;

    let total_length: u32 = 12 // header
        + 8 + json_chunk_length  // JSON chunk header + data
        + 8 + bin_chunk_length; // BIN chunk header + data

    let mut glb = Vec::with_capacity(total_length as usize);

    glb.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    glb.extend_from_slice(&GLB_VERSION.to_le_bytes());
    glb.extend_from_slice(&total_length.to_le_bytes());

    glb.extend_from_slice(&json_chunk_length.to_le_bytes());
    glb.extend_from_slice(&CHUNK_TYPE_JSON.to_le_bytes());
    glb.extend_from_slice(&json_bytes);

    glb.extend_from_slice(&bin_chunk_length.to_le_bytes());
    glb.extend_from_slice(&CHUNK_TYPE_BIN.to_le_bytes());
    glb.extend_from_slice(&bin_data);

    glb
}

fn floats_to_bytes(data: &[f32]) -> Vec<u8> {
    data.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn u32s_to_bytes(data: &[u32]) -> Vec<u8> {
    data.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{mesh, Material, Transform};

    fn part() -> MeshPart {
        MeshPart {
            mesh: mesh::cuboid(1.0, 1.0, 1.0, [1.0, 0.0, 0.0]),
            material: Material {
                id: "red".to_string(),
                diffuse: [1.0, 0.0, 0.0, 1.0],
                ..Material::default()
            },
        }
    }

    fn read_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn json_chunk(glb: &[u8]) -> Json {
        let len = read_u32(glb, 12) as usize;
        serde_json::from_slice(&glb[20..20 + len]).unwrap()
    }

    #[test]
    fn test_empty_model_exports_nothing() {
        assert!(build_glb(&Model::new(1, Vec::new())).is_empty());
    }

    #[test]
    fn test_header_and_alignment() {
        let node = ModelNode {
            id: "n".to_string(),
            transform: Transform::default(),
            parts: vec![part()],
            children: Vec::new(),
        };
        let glb = build_glb(&Model::new(1, vec![node]));
        assert_eq!(read_u32(&glb, 0), GLB_MAGIC);
        assert_eq!(read_u32(&glb, 4), GLB_VERSION);
        assert_eq!(read_u32(&glb, 8) as usize, glb.len());
        assert_eq!(glb.len() % 4, 0);
        assert_eq!(read_u32(&glb, 16), CHUNK_TYPE_JSON);
    }

    #[test]
    fn test_hierarchy_and_materials() {
        let child = ModelNode {
            id: "child".to_string(),
            transform: Transform::default(),
            parts: vec![part()],
            children: Vec::new(),
        };
        let root = ModelNode {
            id: "root".to_string(),
            transform: Transform::default(),
            parts: vec![part(), part()],
            children: vec![child],
        };
        let doc = json_chunk(&build_glb(&Model::new(5, vec![root])));

        assert_eq!(doc["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(doc["materials"].as_array().unwrap().len(), 3);
        assert_eq!(doc["scenes"][0]["nodes"], json!([1]));
        assert_eq!(doc["nodes"][1]["children"], json!([0]));
        assert_eq!(doc["materials"][0]["pbrMetallicRoughness"]["baseColorFactor"], json!([1.0, 0.0, 0.0, 1.0]));
    }
}
