//! Procedural placeholder shown until (or instead of) the real asset.

use glam::Vec3;
use vitrine_3d::{MaterialData, MeshData, ModelData, Vertex};

pub const FALLBACK_RADIUS: f32 = 2.5;
pub const FALLBACK_DETAIL: u32 = 2;
pub const FALLBACK_ELEVATION: f32 = 1.5;

const T: f32 = 1.618_034;

const ICOSAHEDRON_VERTICES: [[f32; 3]; 12] = [
    [-1.0, T, 0.0],
    [1.0, T, 0.0],
    [-1.0, -T, 0.0],
    [1.0, -T, 0.0],
    [0.0, -1.0, T],
    [0.0, 1.0, T],
    [0.0, -1.0, -T],
    [0.0, 1.0, -T],
    [T, 0.0, -1.0],
    [T, 0.0, 1.0],
    [-T, 0.0, -1.0],
    [-T, 0.0, 1.0],
];

const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

pub fn fallback_materials() -> Vec<MaterialData> {
    vec![
        MaterialData::from_hex(0xff4d80, 0.2, 0.4),
        MaterialData::from_hex(0x00a3ff, 0.3, 0.5),
        MaterialData::from_hex(0x8a2be2, 0.4, 0.3),
        MaterialData::from_hex(0xffb800, 0.3, 0.6),
    ]
}

/// Splits one triangle into `(detail + 1)^2` smaller ones, row by row from `a`
/// towards `c`.
fn subdivide_face(a: Vec3, b: Vec3, c: Vec3, detail: u32, out: &mut Vec<[Vec3; 3]>) {
    let cols = detail as usize + 1;
    let mut rows: Vec<Vec<Vec3>> = Vec::with_capacity(cols + 1);

    for i in 0..=cols {
        let t = i as f32 / cols as f32;
        let aj = a.lerp(c, t);
        let bj = b.lerp(c, t);
        let count = cols - i;
        let row = (0..=count)
            .map(|j| {
                if count == 0 {
                    aj
                } else {
                    aj.lerp(bj, j as f32 / count as f32)
                }
            })
            .collect();
        rows.push(row);
    }

    for i in 0..cols {
        for j in 0..(2 * (cols - i) - 1) {
            let k = j / 2;
            if j % 2 == 0 {
                out.push([rows[i][k + 1], rows[i + 1][k], rows[i][k]]);
            } else {
                out.push([rows[i][k + 1], rows[i + 1][k + 1], rows[i + 1][k]]);
            }
        }
    }
}

/// Triangles of a geodesic sphere, in face order.
pub fn icosphere_triangles(radius: f32, detail: u32) -> Vec<[Vec3; 3]> {
    let corners = ICOSAHEDRON_VERTICES.map(Vec3::from_array);
    let per_face = (detail as usize + 1).pow(2);
    let mut triangles = Vec::with_capacity(ICOSAHEDRON_FACES.len() * per_face);

    for [a, b, c] in ICOSAHEDRON_FACES {
        subdivide_face(corners[a], corners[b], corners[c], detail, &mut triangles);
    }

    for tri in &mut triangles {
        for v in tri.iter_mut() {
            *v = v.normalize() * radius;
        }
    }
    triangles
}

/// Flat-shaded subdivided icosahedron with four materials cycling over its
/// triangles. One mesh per material.
pub fn build_fallback() -> ModelData {
    let materials = fallback_materials();
    let mut meshes: Vec<MeshData> = (0..materials.len())
        .map(|material| MeshData {
            vertices: Vec::new(),
            indices: Vec::new(),
            material,
            cast_shadow: true,
            receive_shadow: true,
        })
        .collect();

    for (i, [a, b, c]) in icosphere_triangles(FALLBACK_RADIUS, FALLBACK_DETAIL)
        .into_iter()
        .enumerate()
    {
        let mut normal = (b - a).cross(c - a).normalize_or_zero();
        if normal.dot(a + b + c) < 0.0 {
            normal = -normal;
        }

        let mesh = &mut meshes[i % materials.len()];
        let base = mesh.vertices.len() as u32;
        mesh.vertices.extend([a, b, c].map(|p| Vertex::new(p, normal)));
        mesh.indices.extend([base, base + 1, base + 2]);
    }

    ModelData { meshes, materials }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_count() {
        let model = build_fallback();
        assert_eq!(model.triangle_count(), 20 * 9);
        assert_eq!(model.meshes.len(), 4);
        assert!(model.meshes.iter().all(|m| m.triangle_count() == 45));
    }

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(build_fallback(), build_fallback());
    }

    #[test]
    fn test_vertices_on_sphere() {
        let model = build_fallback();
        for p in model.positions() {
            assert!((p.length() - FALLBACK_RADIUS).abs() < 1e-4);
        }
    }

    #[test]
    fn test_normals_point_outwards() {
        let model = build_fallback();
        for mesh in &model.meshes {
            for v in &mesh.vertices {
                let n = Vec3::from_array(v.normal);
                let p = Vec3::from_array(v.position);
                assert!(n.dot(p) > 0.0);
                assert!((n.length() - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_materials_cycle() {
        let model = build_fallback();
        for (i, mesh) in model.meshes.iter().enumerate() {
            assert_eq!(mesh.material, i);
            assert!(mesh.cast_shadow && mesh.receive_shadow);
        }
        assert_eq!(model.materials[3], MaterialData::from_hex(0xffb800, 0.3, 0.6));
    }

    #[test]
    fn test_detail_zero_is_plain_icosahedron() {
        assert_eq!(icosphere_triangles(1.0, 0).len(), 20);
    }
}
