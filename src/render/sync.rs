//! Scene-to-renderer synchronization.
//!
//! The renderer retains one GPU object per scene object, keyed by id.
//! Every frame the declared scene is diffed against the retained set:
//! unknown ids are created, known ids are refreshed (and re-meshed only
//! when their geometry revision moved), and retained ids the scene no
//! longer declares are disposed. The diff itself is a pure function so
//! it can be tested without a device.

use crate::render::mesh::{self, Vertex};
use crate::render::texture::TextureCache;
use crate::scene::SceneState;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    /// x = roughness, y = metalness, z = selected flag, w = textured flag.
    pub params: [f32; 4],
}

pub struct RenderObject {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
    pub(crate) uniform_buffer: wgpu::Buffer,
    pub(crate) bind_group: wgpu::BindGroup,
    pub(crate) texture_bind_group: Arc<wgpu::BindGroup>,
    pub(crate) visible: bool,
    pub(crate) selected: bool,
    geometry_revision: u64,
    texture_path: Option<String>,
}

/// Everything the sync needs from the render context to do GPU work.
pub struct SyncResources<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub object_layout: &'a wgpu::BindGroupLayout,
    pub texture_layout: &'a wgpu::BindGroupLayout,
    pub texture_sampler: &'a wgpu::Sampler,
    pub white_texture: &'a Arc<wgpu::BindGroup>,
}

/// The work a sync pass will do, as plain data.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncPlan {
    pub create: Vec<Uuid>,
    pub remesh: Vec<Uuid>,
    pub refresh: Vec<Uuid>,
    pub remove: Vec<Uuid>,
}

/// Pure reconciliation: diff the declared scene against the retained
/// ids and their last-seen geometry revisions.
pub fn plan_sync(scene: &SceneState, retained: &HashMap<Uuid, u64>) -> SyncPlan {
    let mut plan = SyncPlan::default();
    let mut seen: HashSet<Uuid> = HashSet::with_capacity(scene.objects().len());
    for object in scene.objects() {
        seen.insert(object.id);
        match retained.get(&object.id) {
            None => plan.create.push(object.id),
            Some(revision) if *revision != object.geometry_revision => {
                plan.remesh.push(object.id)
            }
            Some(_) => plan.refresh.push(object.id),
        }
    }
    for id in retained.keys() {
        if !seen.contains(id) {
            plan.remove.push(*id);
        }
    }
    plan
}

#[derive(Default)]
pub struct SceneSync {
    objects: HashMap<Uuid, RenderObject>,
    warned_missing_material: HashSet<Uuid>,
}

impl SceneSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every retained object, e.g. when a different project is
    /// opened and the whole scene is replaced.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.warned_missing_material.clear();
    }

    pub fn retained_revisions(&self) -> HashMap<Uuid, u64> {
        self.objects
            .iter()
            .map(|(id, object)| (*id, object.geometry_revision))
            .collect()
    }

    pub fn objects(&self) -> impl Iterator<Item = &RenderObject> {
        self.objects.values()
    }

    pub fn object(&self, id: Uuid) -> Option<&RenderObject> {
        self.objects.get(&id)
    }

    /// Mirrors the scene into the retained set. Returns the executed plan
    /// (handy for logging and tests against a real device).
    pub fn sync(
        &mut self,
        resources: &SyncResources<'_>,
        textures: &mut TextureCache,
        scene: &SceneState,
    ) -> SyncPlan {
        let plan = plan_sync(scene, &self.retained_revisions());

        for id in &plan.remove {
            // Buffers are dropped with the entry; wgpu reclaims them.
            self.objects.remove(id);
            self.warned_missing_material.remove(id);
        }
        for id in plan.create.iter().chain(&plan.remesh) {
            let Some(object) = scene.object(*id) else {
                continue;
            };
            let mesh = mesh::primitive_mesh(&object.primitive);
            let entry = self.build_object(resources, object.geometry_revision, &mesh);
            self.objects.insert(*id, entry);
        }
        for id in plan
            .create
            .iter()
            .chain(&plan.remesh)
            .chain(&plan.refresh)
        {
            self.refresh_object(resources, textures, scene, *id);
        }

        if !plan.create.is_empty() || !plan.remesh.is_empty() || !plan.remove.is_empty() {
            log::debug!(
                "Scene sync: {} created, {} re-meshed, {} removed, {} retained",
                plan.create.len(),
                plan.remesh.len(),
                plan.remove.len(),
                self.objects.len()
            );
        }
        plan
    }

    fn build_object(
        &self,
        resources: &SyncResources<'_>,
        geometry_revision: u64,
        mesh: &mesh::MeshData,
    ) -> RenderObject {
        let device = resources.device;
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("object_vertices"),
            contents: bytemuck::cast_slice::<Vertex, u8>(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("object_indices"),
            contents: bytemuck::cast_slice::<u16, u8>(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("object_uniform"),
            size: std::mem::size_of::<ObjectUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("object_bind_group"),
            layout: resources.object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        RenderObject {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            uniform_buffer,
            bind_group,
            texture_bind_group: resources.white_texture.clone(),
            visible: true,
            selected: false,
            geometry_revision,
            texture_path: None,
        }
    }

    fn refresh_object(
        &mut self,
        resources: &SyncResources<'_>,
        textures: &mut TextureCache,
        scene: &SceneState,
        id: Uuid,
    ) {
        let Some(object) = scene.object(id) else {
            return;
        };
        if scene.material_ref_dangling(object) {
            if self.warned_missing_material.insert(id) {
                log::warn!(
                    "Object '{}' references a missing material; using default",
                    object.name
                );
            }
        } else {
            self.warned_missing_material.remove(&id);
        }
        let material = scene.resolve_material(object);
        let selected = scene.selected() == Some(id);

        let texture_path = material.texture.as_ref().map(|texture| texture.path.clone());
        let Some(entry) = self.objects.get_mut(&id) else {
            return;
        };
        entry.geometry_revision = object.geometry_revision;
        entry.visible = object.visible;
        entry.selected = selected;

        if entry.texture_path != texture_path {
            entry.texture_bind_group = texture_path
                .as_deref()
                .and_then(|path| {
                    textures.load(
                        resources.device,
                        resources.queue,
                        resources.texture_layout,
                        resources.texture_sampler,
                        path,
                    )
                })
                .unwrap_or_else(|| resources.white_texture.clone());
            entry.texture_path = texture_path;
        }
        let textured = entry
            .texture_path
            .as_ref()
            .map(|_| !Arc::ptr_eq(&entry.texture_bind_group, resources.white_texture))
            .unwrap_or(false);

        let uniform = ObjectUniform {
            model: object.transform.matrix().to_cols_array_2d(),
            base_color: material.base_color,
            params: [
                material.roughness.clamp(0.04, 1.0),
                material.metalness.clamp(0.0, 1.0),
                if selected { 1.0 } else { 0.0 },
                if textured { 1.0 } else { 0.0 },
            ],
        };
        resources
            .queue
            .write_buffer(&entry.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{PrimitiveKind, SceneState};

    fn ids(mut list: Vec<Uuid>) -> Vec<Uuid> {
        list.sort();
        list
    }

    #[test]
    fn empty_scene_against_empty_retained_plans_nothing() {
        let scene = SceneState::new();
        let plan = plan_sync(&scene, &HashMap::new());
        assert_eq!(plan, SyncPlan::default());
    }

    #[test]
    fn new_objects_are_planned_as_creates() {
        let mut scene = SceneState::new();
        let a = scene.add_object(PrimitiveKind::cube());
        let b = scene.add_object(PrimitiveKind::plane());
        let plan = plan_sync(&scene, &HashMap::new());
        assert_eq!(ids(plan.create), ids(vec![a, b]));
        assert!(plan.remesh.is_empty());
        assert!(plan.refresh.is_empty());
        assert!(plan.remove.is_empty());
    }

    #[test]
    fn known_objects_refresh_without_remesh() {
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::cube());
        let retained = HashMap::from([(id, 0u64)]);
        let plan = plan_sync(&scene, &retained);
        assert_eq!(plan.refresh, vec![id]);
        assert!(plan.create.is_empty());
        assert!(plan.remesh.is_empty());
    }

    #[test]
    fn geometry_revision_change_forces_remesh() {
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::cube());
        scene.set_primitive(
            id,
            PrimitiveKind::Cube {
                width: 2.0,
                height: 1.0,
                depth: 1.0,
            },
        );
        let retained = HashMap::from([(id, 0u64)]);
        let plan = plan_sync(&scene, &retained);
        assert_eq!(plan.remesh, vec![id]);
        assert!(plan.refresh.is_empty());
    }

    #[test]
    fn transform_edits_do_not_remesh() {
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::cube());
        scene.set_transform(
            id,
            crate::scene::Transform {
                position: [5.0, 0.0, 0.0],
                ..Default::default()
            },
        );
        let retained = HashMap::from([(id, 0u64)]);
        let plan = plan_sync(&scene, &retained);
        assert_eq!(plan.refresh, vec![id]);
        assert!(plan.remesh.is_empty());
    }

    #[test]
    fn deleted_objects_are_planned_as_removes() {
        let mut scene = SceneState::new();
        let keep = scene.add_object(PrimitiveKind::cube());
        let gone = Uuid::new_v4();
        let retained = HashMap::from([(keep, 0u64), (gone, 0u64)]);
        let plan = plan_sync(&scene, &retained);
        assert_eq!(plan.remove, vec![gone]);
        assert_eq!(plan.refresh, vec![keep]);
    }

    #[test]
    fn plan_never_touches_ids_it_was_not_shown() {
        let mut scene = SceneState::new();
        let a = scene.add_object(PrimitiveKind::cube());
        let retained = HashMap::from([(a, 0u64)]);
        let plan = plan_sync(&scene, &retained);
        let mut touched: Vec<Uuid> = Vec::new();
        touched.extend(&plan.create);
        touched.extend(&plan.remesh);
        touched.extend(&plan.refresh);
        touched.extend(&plan.remove);
        assert_eq!(touched, vec![a]);
    }
}
