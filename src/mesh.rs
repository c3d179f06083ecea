//! Letterform geometry and a minimal Wavefront OBJ reader.
//!
//! Supports `v`, `vt`, `vn`, `f` (all four index forms, negative indices
//! included) and starts a new mesh on every `o`/`g` that follows geometry.
//! Everything else (materials, smoothing groups, lines) is skipped.

use glam::{Vec2, Vec3};

use crate::error::{NeonError, Result};
use crate::geometry::{Aabb, Ray};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Floats per interleaved vertex.
    pub const STRIDE: usize = 8;
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub bounds: Aabb,
}

impl MeshData {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let bounds = Aabb::from_points(vertices.iter().map(|v| Vec3::from(v.position)));
        Self {
            name: name.into(),
            vertices,
            indices,
            bounds,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// `position, normal, uv` per vertex, ready for a vertex buffer.
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.vertices.len() * Vertex::STRIDE);
        for v in &self.vertices {
            out.extend_from_slice(&v.position);
            out.extend_from_slice(&v.normal);
            out.extend_from_slice(&v.uv);
        }
        out
    }

    /// Nearest hit of a mesh-space ray.
    pub fn raycast(&self, ray: &Ray) -> Option<f32> {
        ray.intersect_aabb(&self.bounds)?;
        self.indices
            .chunks_exact(3)
            .filter_map(|tri| {
                let p = |i: u32| Vec3::from(self.vertices[i as usize].position);
                ray.intersect_triangle(p(tri[0]), p(tri[1]), p(tri[2]))
            })
            .min_by(|a, b| a.total_cmp(b))
    }
}

#[derive(Default)]
struct Builder {
    name: String,
    corners: Vec<(usize, Option<usize>, Option<usize>)>,
    faces: Vec<[usize; 3]>,
}

impl Builder {
    fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    fn finish(self, positions: &[Vec3], uvs: &[Vec2], normals: &[Vec3]) -> MeshData {
        let has_uvs = self.corners.iter().all(|c| c.1.is_some());
        let local_bounds = Aabb::from_points(self.corners.iter().map(|c| positions[c.0]));
        let extent = local_bounds.size();

        let mut vertices: Vec<Vertex> = self
            .corners
            .iter()
            .map(|&(p, t, n)| {
                let pos = positions[p];
                let uv = match t {
                    Some(t) if has_uvs => uvs[t],
                    _ => planar_uv(pos, &local_bounds, extent),
                };
                Vertex {
                    position: pos.to_array(),
                    normal: n.map(|n| normals[n].to_array()).unwrap_or([0.0; 3]),
                    uv: uv.to_array(),
                }
            })
            .collect();

        for face in &self.faces {
            let [a, b, c] = face.map(|i| Vec3::from(vertices[i].position));
            let face_normal = (b - a).cross(c - a).normalize_or_zero().to_array();
            for &i in face {
                if self.corners[i].2.is_none() {
                    vertices[i].normal = face_normal;
                }
            }
        }

        let indices = self.faces.iter().flatten().map(|&i| i as u32).collect();
        MeshData::new(self.name, vertices, indices)
    }
}

fn planar_uv(p: Vec3, bounds: &Aabb, extent: Vec3) -> Vec2 {
    let u = if extent.x > 0.0 { (p.x - bounds.min.x) / extent.x } else { 0.0 };
    let v = if extent.y > 0.0 { (p.y - bounds.min.y) / extent.y } else { 0.0 };
    Vec2::new(u, v)
}

fn parse_floats<const N: usize>(parts: &[&str], line: usize) -> Result<[f32; N]> {
    if parts.len() < N {
        return Err(NeonError::Mesh {
            line,
            msg: format!("expected {} components, found {}", N, parts.len()),
        });
    }
    let mut out = [0.0; N];
    for (slot, text) in out.iter_mut().zip(parts) {
        *slot = text.parse().map_err(|_| NeonError::Mesh {
            line,
            msg: format!("bad number {:?}", text),
        })?;
    }
    Ok(out)
}

/// Resolve a 1-based (or negative, relative) OBJ index.
fn resolve(text: &str, len: usize, line: usize) -> Result<usize> {
    let bad = || NeonError::Mesh {
        line,
        msg: format!("index {:?} out of range (have {})", text, len),
    };
    let raw: i64 = text.parse().map_err(|_| bad())?;
    let idx = if raw > 0 { raw - 1 } else { len as i64 + raw };
    if raw == 0 || idx < 0 || idx as usize >= len {
        return Err(bad());
    }
    Ok(idx as usize)
}

pub fn parse_obj(src: &str) -> Result<Vec<MeshData>> {
    let mut positions = Vec::new();
    let mut uvs = Vec::new();
    let mut normals = Vec::new();
    let mut meshes = Vec::new();
    let mut current = Builder::default();

    for (n, raw) in src.lines().enumerate() {
        let line = n + 1;
        let mut parts = raw.split_whitespace();
        let Some(tag) = parts.next() else { continue };
        let rest: Vec<&str> = parts.collect();

        match tag {
            "v" => positions.push(Vec3::from(parse_floats::<3>(&rest, line)?)),
            "vt" => uvs.push(Vec2::from(parse_floats::<2>(&rest, line)?)),
            "vn" => normals.push(Vec3::from(parse_floats::<3>(&rest, line)?)),
            "o" | "g" => {
                let name = rest.join(" ");
                if current.is_empty() {
                    current.name = name;
                } else {
                    let done = std::mem::replace(
                        &mut current,
                        Builder { name, ..Default::default() },
                    );
                    meshes.push(done.finish(&positions, &uvs, &normals));
                }
            }
            "f" => {
                if rest.len() < 3 {
                    return Err(NeonError::Mesh {
                        line,
                        msg: "face needs at least 3 corners".into(),
                    });
                }
                let base = current.corners.len();
                for corner in &rest {
                    let mut fields = corner.split('/');
                    let p = resolve(fields.next().unwrap_or(""), positions.len(), line)?;
                    let t = match fields.next() {
                        Some(s) if !s.is_empty() => Some(resolve(s, uvs.len(), line)?),
                        _ => None,
                    };
                    let nrm = match fields.next() {
                        Some(s) if !s.is_empty() => Some(resolve(s, normals.len(), line)?),
                        _ => None,
                    };
                    current.corners.push((p, t, nrm));
                }
                // fan triangulation
                for i in 1..rest.len() - 1 {
                    current.faces.push([base, base + i, base + i + 1]);
                }
            }
            _ => {}
        }
    }

    if !current.is_empty() {
        meshes.push(current.finish(&positions, &uvs, &normals));
    }
    Ok(meshes)
}
