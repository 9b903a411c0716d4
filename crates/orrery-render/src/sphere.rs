//! UV sphere mesh generation for the celestial bodies and the backdrop.

use glam::Vec3;

use crate::buffer::VertexPositionNormalUv;

/// A unit sphere tessellated along latitude rings and longitude segments.
pub struct SphereMesh {
    /// Vertex positions on the unit sphere.
    pub positions: Vec<Vec3>,
    /// Equirectangular UV coordinates per vertex.
    pub uvs: Vec<[f32; 2]>,
    /// Normal vectors (same as positions for a unit sphere).
    pub normals: Vec<Vec3>,
    /// Triangle indices, counter-clockwise when viewed from outside.
    pub indices: Vec<u32>,
}

impl SphereMesh {
    /// Interleave positions, normals, and UVs into the vertex format the
    /// sphere pipelines consume.
    pub fn vertices(&self) -> Vec<VertexPositionNormalUv> {
        self.positions
            .iter()
            .zip(self.normals.iter())
            .zip(self.uvs.iter())
            .map(|((pos, norm), uv)| VertexPositionNormalUv {
                position: pos.to_array(),
                normal: norm.to_array(),
                uv: *uv,
            })
            .collect()
    }
}

/// Generate a unit UV sphere with `rings` latitude divisions and `segments`
/// longitude divisions.
///
/// Vertices along the texture seam and at the poles are duplicated so that
/// equirectangular UVs stay continuous across every triangle. V runs 0 at the
/// north pole to 1 at the south pole, matching image row order.
pub fn generate_uv_sphere(rings: u32, segments: u32) -> SphereMesh {
    let vertex_count = ((rings + 1) * (segments + 1)) as usize;
    let mut positions = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let phi = v * std::f32::consts::PI;
        let (sin_phi, cos_phi) = phi.sin_cos();

        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let theta = u * std::f32::consts::TAU;
            let (sin_theta, cos_theta) = theta.sin_cos();

            positions.push(Vec3::new(
                sin_phi * cos_theta,
                cos_phi,
                sin_phi * sin_theta,
            ));
            uvs.push([u, v]);
        }
    }

    let mut indices = Vec::with_capacity((rings * segments * 6) as usize);
    let stride = segments + 1;

    for ring in 0..rings {
        for segment in 0..segments {
            let i0 = ring * stride + segment;
            let i1 = i0 + stride;

            // The top and bottom rings collapse to a pole, so one triangle
            // of each quad there is degenerate and gets skipped.
            if ring != 0 {
                indices.extend_from_slice(&[i0, i0 + 1, i1]);
            }
            if ring != rings - 1 {
                indices.extend_from_slice(&[i0 + 1, i1 + 1, i1]);
            }
        }
    }

    let normals = positions.clone();

    SphereMesh {
        positions,
        uvs,
        normals,
        indices,
    }
}
