//! Mesh generation for the instanced ornament pipeline

use bytemuck::{Pod, Zeroable};

/// Vertex with position and normal
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Generate a unit UV sphere
pub fn uv_sphere(stacks: u32, slices: u32) -> (Vec<MeshVertex>, Vec<u16>) {
    let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
    let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);

    for stack in 0..=stacks {
        let v = stack as f32 / stacks as f32;
        let phi = v * std::f32::consts::PI;
        for slice in 0..=slices {
            let u = slice as f32 / slices as f32;
            let theta = u * std::f32::consts::TAU;
            let x = phi.sin() * theta.cos();
            let y = phi.cos();
            let z = phi.sin() * theta.sin();
            vertices.push(MeshVertex {
                position: [x, y, z],
                normal: [x, y, z],
            });
        }
    }

    let ring = slices + 1;
    for stack in 0..stacks {
        for slice in 0..slices {
            let a = stack * ring + slice;
            let b = a + ring;
            indices.push(a as u16);
            indices.push(b as u16);
            indices.push((a + 1) as u16);
            indices.push((a + 1) as u16);
            indices.push(b as u16);
            indices.push((b + 1) as u16);
        }
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_counts() {
        let (vertices, indices) = uv_sphere(12, 16);
        assert_eq!(vertices.len(), 13 * 17);
        assert_eq!(indices.len(), 12 * 16 * 6);
        assert_eq!(indices.len() % 3, 0);
    }

    #[test]
    fn test_sphere_indices_in_range() {
        let (vertices, indices) = uv_sphere(12, 16);
        for &i in &indices {
            assert!((i as usize) < vertices.len());
        }
    }

    #[test]
    fn test_sphere_on_unit_surface() {
        let (vertices, _) = uv_sphere(8, 8);
        for v in &vertices {
            let len = (v.position[0] * v.position[0]
                + v.position[1] * v.position[1]
                + v.position[2] * v.position[2])
                .sqrt();
            assert!((len - 1.0).abs() < 1e-4);
            let nlen = (v.normal[0] * v.normal[0]
                + v.normal[1] * v.normal[1]
                + v.normal[2] * v.normal[2])
                .sqrt();
            assert!((nlen - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_sphere_fits_u16_indices() {
        let (vertices, _) = uv_sphere(12, 16);
        assert!(vertices.len() <= u16::MAX as usize);
    }
}
