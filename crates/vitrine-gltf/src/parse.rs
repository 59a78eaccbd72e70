use anyhow::{Context, bail};
use glam::{Mat3, Mat4, Vec3};
use std::collections::HashMap;

/// Deeper hierarchies are rejected instead of exhausting the loader's stack.
const MAX_NODE_DEPTH: usize = 256;
use vitrine_3d::{MaterialData, MeshData, ModelData, Vertex};

/// Flattens the default scene of a glTF asset into model-space meshes.
pub fn parse_model(bytes: &[u8]) -> anyhow::Result<ModelData> {
    let (document, buffers, _images) =
        gltf::import_slice(bytes).context("invalid glTF asset")?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .context("glTF asset has no scenes")?;

    let mut builder = ModelBuilder {
        buffers: &buffers,
        model: ModelData::default(),
        material_slots: HashMap::new(),
        ancestors: Vec::new(),
    };

    for node in scene.nodes() {
        builder.visit(&node, Mat4::IDENTITY)?;
    }

    let model = builder.model;
    if model.triangle_count() == 0 {
        bail!("glTF asset contains no triangle geometry");
    }

    log::debug!(
        "parsed model: {} meshes, {} triangles, {} materials",
        model.meshes.len(),
        model.triangle_count(),
        model.materials.len()
    );
    Ok(model)
}

struct ModelBuilder<'a> {
    buffers: &'a [gltf::buffer::Data],
    model: ModelData,
    material_slots: HashMap<Option<usize>, usize>,
    /// Node indices from the scene root down to the node being visited.
    ancestors: Vec<usize>,
}

impl ModelBuilder<'_> {
    fn visit(&mut self, node: &gltf::Node, parent: Mat4) -> anyhow::Result<()> {
        if self.ancestors.contains(&node.index()) {
            bail!("node hierarchy contains a cycle at node {}", node.index());
        }
        if self.ancestors.len() >= MAX_NODE_DEPTH {
            bail!("node hierarchy deeper than {MAX_NODE_DEPTH} levels");
        }
        self.ancestors.push(node.index());

        let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if primitive.mode() != gltf::mesh::Mode::Triangles {
                    log::warn!(
                        "skipping {:?} primitive in mesh {}",
                        primitive.mode(),
                        mesh.name().unwrap_or("<unnamed>")
                    );
                    continue;
                }
                if let Some(data) = self.read_primitive(&primitive, world)? {
                    self.model.meshes.push(data);
                }
            }
        }

        for child in node.children() {
            self.visit(&child, world)?;
        }
        self.ancestors.pop();
        Ok(())
    }

    fn read_primitive(
        &mut self,
        primitive: &gltf::Primitive,
        world: Mat4,
    ) -> anyhow::Result<Option<MeshData>> {
        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

        let Some(positions) = reader.read_positions() else {
            return Ok(None);
        };
        let positions: Vec<Vec3> = positions
            .map(|p| world.transform_point3(Vec3::from_array(p)))
            .collect();
        if positions.is_empty() {
            return Ok(None);
        }

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        if let Some(bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            bail!("index {bad} out of range for {} vertices", positions.len());
        }
        let indices: Vec<u32> = indices[..indices.len() - indices.len() % 3].to_vec();

        let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
        let normals: Vec<Vec3> = match reader.read_normals() {
            Some(normals) => normals
                .map(|n| (normal_matrix * Vec3::from_array(n)).normalize_or_zero())
                .collect(),
            None => smooth_normals(&positions, &indices),
        };

        let vertices = positions
            .iter()
            .zip(normals.iter().chain(std::iter::repeat(&Vec3::Y)))
            .map(|(p, n)| Vertex::new(*p, *n))
            .collect();

        let material = self.material_slot(&primitive.material());

        Ok(Some(MeshData {
            vertices,
            indices,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }))
    }

    fn material_slot(&mut self, material: &gltf::Material) -> usize {
        let key = material.index();
        if let Some(slot) = self.material_slots.get(&key) {
            return *slot;
        }

        let pbr = material.pbr_metallic_roughness();
        let slot = self.model.materials.len();
        self.model.materials.push(MaterialData {
            base_color: pbr.base_color_factor(),
            metalness: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
        });
        self.material_slots.insert(key, slot);
        slot
    }
}

/// Area-weighted vertex normals for primitives that ship without any.
fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i as usize);
        let n = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal embedded glTF: one triangle, no normals, translated by +10 on X.
    pub(crate) const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0, "translation": [10.0, 0.0, 0.0] }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }],
        "materials": [{ "pbrMetallicRoughness": {
            "baseColorFactor": [0.5, 0.5, 0.5, 1.0],
            "metallicFactor": 0.9,
            "roughnessFactor": 0.1
        } }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "buffers": [{
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
        }]
    }"#;

    #[test]
    fn test_parse_embedded_triangle() {
        let model = parse_model(TRIANGLE_GLTF.as_bytes()).unwrap();
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.triangle_count(), 1);

        let mesh = &model.meshes[0];
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices[1].position, [11.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[0].normal, [0.0, 0.0, 1.0]);

        let material = model.material_of(mesh);
        assert_eq!(material.base_color, [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(material.metalness, 0.9);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(parse_model(b"definitely not a model").is_err());
    }

    #[test]
    fn test_asset_without_geometry_is_rejected() {
        let empty = r#"{
            "asset": { "version": "2.0" },
            "scenes": [{ "nodes": [0] }],
            "nodes": [{ "name": "empty" }]
        }"#;
        let err = parse_model(empty.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("no triangle geometry"));
    }

    pub(crate) const CYCLIC_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "children": [0] }]
    }"#;

    #[test]
    fn test_cyclic_hierarchy_is_rejected() {
        let err = parse_model(CYCLIC_GLTF.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("cycle"), "{err:#}");
    }

    #[test]
    fn test_nested_nodes_compose_transforms() {
        let nested = TRIANGLE_GLTF
            .replace(
                r#""nodes": [{ "mesh": 0, "translation": [10.0, 0.0, 0.0] }]"#,
                r#""nodes": [
                    { "children": [1], "translation": [0.0, 5.0, 0.0] },
                    { "mesh": 0, "translation": [10.0, 0.0, 0.0] },
                    { "children": [3] },
                    { "mesh": 0 }
                ]"#,
            )
            .replace(
                r#""scenes": [{ "nodes": [0] }]"#,
                r#""scenes": [{ "nodes": [0, 2] }]"#,
            );

        let model = parse_model(nested.as_bytes()).unwrap();
        assert_eq!(model.meshes.len(), 2);
        assert_eq!(model.meshes[0].vertices[1].position, [11.0, 5.0, 0.0]);
        assert_eq!(model.meshes[1].vertices[1].position, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_smooth_normals_of_flat_quad() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(1.0, 1.0, 0.0)];
        let normals = smooth_normals(&positions, &[0, 1, 2, 1, 3, 2]);
        assert!(normals.iter().all(|n| (*n - Vec3::Z).length() < 1e-6));
    }
}
