//! Procedural primitive meshes.
//!
//! Each generator produces positions, normals and UVs with 16-bit
//! indices, which is plenty for editor primitives.

use crate::scene::PrimitiveKind;

pub const CYLINDER_SEGMENTS: usize = 32;
pub const SPHERE_RINGS: usize = 16;
pub const SPHERE_SECTORS: usize = 24;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    fn push_quad(&mut self, corners: [[f32; 3]; 4], normal: [f32; 3]) {
        let base = self.vertices.len() as u16;
        let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        for (corner, uv) in corners.iter().zip(uvs) {
            self.vertices.push(Vertex {
                position: *corner,
                normal,
                uv,
            });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

pub fn primitive_mesh(kind: &PrimitiveKind) -> MeshData {
    match *kind {
        PrimitiveKind::Cube {
            width,
            height,
            depth,
        } => cube(width, height, depth),
        PrimitiveKind::Cylinder { radius, height } => {
            cylinder(radius, height, CYLINDER_SEGMENTS)
        }
        PrimitiveKind::Plane { width, depth } => plane(width, depth),
        PrimitiveKind::Sphere { radius } => sphere(radius, SPHERE_RINGS, SPHERE_SECTORS),
    }
}

fn cube(width: f32, height: f32, depth: f32) -> MeshData {
    let (hx, hy, hz) = (width * 0.5, height * 0.5, depth * 0.5);
    let mut mesh = MeshData::default();
    // Corners listed counter-clockwise as seen from outside each face.
    // +X
    mesh.push_quad(
        [
            [hx, -hy, -hz],
            [hx, hy, -hz],
            [hx, hy, hz],
            [hx, -hy, hz],
        ],
        [1.0, 0.0, 0.0],
    );
    // -X
    mesh.push_quad(
        [
            [-hx, -hy, -hz],
            [-hx, -hy, hz],
            [-hx, hy, hz],
            [-hx, hy, -hz],
        ],
        [-1.0, 0.0, 0.0],
    );
    // +Y
    mesh.push_quad(
        [
            [-hx, hy, -hz],
            [-hx, hy, hz],
            [hx, hy, hz],
            [hx, hy, -hz],
        ],
        [0.0, 1.0, 0.0],
    );
    // -Y
    mesh.push_quad(
        [
            [-hx, -hy, -hz],
            [hx, -hy, -hz],
            [hx, -hy, hz],
            [-hx, -hy, hz],
        ],
        [0.0, -1.0, 0.0],
    );
    // +Z
    mesh.push_quad(
        [
            [-hx, -hy, hz],
            [hx, -hy, hz],
            [hx, hy, hz],
            [-hx, hy, hz],
        ],
        [0.0, 0.0, 1.0],
    );
    // -Z
    mesh.push_quad(
        [
            [hx, -hy, -hz],
            [-hx, -hy, -hz],
            [-hx, hy, -hz],
            [hx, hy, -hz],
        ],
        [0.0, 0.0, -1.0],
    );
    mesh
}

fn plane(width: f32, depth: f32) -> MeshData {
    let (hx, hz) = (width * 0.5, depth * 0.5);
    let mut mesh = MeshData::default();
    mesh.push_quad(
        [
            [-hx, 0.0, -hz],
            [-hx, 0.0, hz],
            [hx, 0.0, hz],
            [hx, 0.0, -hz],
        ],
        [0.0, 1.0, 0.0],
    );
    mesh
}

fn cylinder(radius: f32, height: f32, segments: usize) -> MeshData {
    let n = segments.max(8);
    let hy = height * 0.5;
    let mut mesh = MeshData::default();

    // Side wall: two rings of vertices sharing radial normals. One extra
    // column so UVs can wrap without a seam in the texture coordinates.
    for i in 0..=n {
        let t = (i as f32 / n as f32) * std::f32::consts::TAU;
        let (sin, cos) = t.sin_cos();
        let normal = [cos, 0.0, sin];
        let u = i as f32 / n as f32;
        mesh.vertices.push(Vertex {
            position: [radius * cos, -hy, radius * sin],
            normal,
            uv: [u, 1.0],
        });
        mesh.vertices.push(Vertex {
            position: [radius * cos, hy, radius * sin],
            normal,
            uv: [u, 0.0],
        });
    }
    for i in 0..n {
        let a = (i * 2) as u16;
        mesh.indices
            .extend_from_slice(&[a, a + 1, a + 3, a, a + 3, a + 2]);
    }

    // Caps: center vertex fan with axial normals.
    for (y, normal, winding_flip) in [(hy, [0.0, 1.0, 0.0], false), (-hy, [0.0, -1.0, 0.0], true)]
    {
        let center = mesh.vertices.len() as u16;
        mesh.vertices.push(Vertex {
            position: [0.0, y, 0.0],
            normal,
            uv: [0.5, 0.5],
        });
        for i in 0..n {
            let t = (i as f32 / n as f32) * std::f32::consts::TAU;
            let (sin, cos) = t.sin_cos();
            mesh.vertices.push(Vertex {
                position: [radius * cos, y, radius * sin],
                normal,
                uv: [0.5 + cos * 0.5, 0.5 + sin * 0.5],
            });
        }
        for i in 0..n {
            let next = ((i + 1) % n) as u16;
            let (a, b) = if winding_flip {
                (center + 1 + i as u16, center + 1 + next)
            } else {
                (center + 1 + next, center + 1 + i as u16)
            };
            mesh.indices.extend_from_slice(&[center, a, b]);
        }
    }

    mesh
}

fn sphere(radius: f32, rings: usize, sectors: usize) -> MeshData {
    let rings = rings.max(3);
    let sectors = sectors.max(3);
    let mut mesh = MeshData::default();

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let phi = v * std::f32::consts::PI;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for sector in 0..=sectors {
            let u = sector as f32 / sectors as f32;
            let theta = u * std::f32::consts::TAU;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let normal = [sin_phi * cos_theta, cos_phi, sin_phi * sin_theta];
            mesh.vertices.push(Vertex {
                position: [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                normal,
                uv: [u, v],
            });
        }
    }

    let stride = (sectors + 1) as u16;
    for ring in 0..rings as u16 {
        for sector in 0..sectors as u16 {
            let a = ring * stride + sector;
            let b = a + stride;
            mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_valid(mesh: &MeshData) {
        assert!(!mesh.vertices.is_empty());
        assert_eq!(mesh.indices.len() % 3, 0);
        for index in &mesh.indices {
            assert!((*index as usize) < mesh.vertices.len());
        }
        for vertex in &mesh.vertices {
            let n = vertex.normal;
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-3, "normal not unit length: {:?}", n);
            assert!(vertex.position.iter().all(|value| value.is_finite()));
        }
    }

    #[test]
    fn cube_has_six_faces() {
        let mesh = cube(1.0, 2.0, 3.0);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_valid(&mesh);
    }

    #[test]
    fn plane_is_a_single_quad() {
        let mesh = plane(4.0, 4.0);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.indices.len(), 6);
        assert_valid(&mesh);
    }

    #[test]
    fn cylinder_is_closed() {
        let mesh = cylinder(0.5, 2.0, CYLINDER_SEGMENTS);
        // Wall quads plus two cap fans.
        assert_eq!(
            mesh.indices.len(),
            CYLINDER_SEGMENTS * 6 + CYLINDER_SEGMENTS * 3 * 2
        );
        assert_valid(&mesh);
    }

    #[test]
    fn sphere_vertices_sit_on_the_radius() {
        let radius = 1.5;
        let mesh = sphere(radius, SPHERE_RINGS, SPHERE_SECTORS);
        assert_valid(&mesh);
        for vertex in &mesh.vertices {
            let p = vertex.position;
            let len = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
            assert!((len - radius).abs() < 1e-3);
        }
    }

    #[test]
    fn primitive_mesh_covers_every_kind() {
        for kind in [
            PrimitiveKind::cube(),
            PrimitiveKind::cylinder(),
            PrimitiveKind::plane(),
            PrimitiveKind::sphere(),
        ] {
            assert_valid(&primitive_mesh(&kind));
        }
    }
}
