pub mod serialization;

use glam::{EulerRot, Mat4, Quat, Vec3};
use uuid::Uuid;

/// Position / rotation / scale, the way the property panel edits them.
/// Rotation is stored in degrees (Z * Y * X application order).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform {
    pub position: [f32; 3],
    pub rotation_deg: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation_deg: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::ZYX,
            self.rotation_deg[2].to_radians(),
            self.rotation_deg[1].to_radians(),
            self.rotation_deg[0].to_radians(),
        );
        Mat4::from_scale_rotation_translation(
            Vec3::from_array(self.scale),
            rotation,
            Vec3::from_array(self.position),
        )
    }
}

/// Primitive shape plus its type-specific dimensions - this is what the
/// dimensions section of the property panel edits.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PrimitiveKind {
    Cube { width: f32, height: f32, depth: f32 },
    Cylinder { radius: f32, height: f32 },
    Plane { width: f32, depth: f32 },
    Sphere { radius: f32 },
}

impl PrimitiveKind {
    pub fn cube() -> Self {
        Self::Cube {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
        }
    }

    pub fn cylinder() -> Self {
        Self::Cylinder {
            radius: 0.5,
            height: 1.0,
        }
    }

    pub fn plane() -> Self {
        Self::Plane {
            width: 4.0,
            depth: 4.0,
        }
    }

    pub fn sphere() -> Self {
        Self::Sphere { radius: 0.5 }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cube { .. } => "Cube",
            Self::Cylinder { .. } => "Cylinder",
            Self::Plane { .. } => "Plane",
            Self::Sphere { .. } => "Sphere",
        }
    }

    /// Local-space half extents of the primitive before its transform is
    /// applied. Used for picking bounds and camera framing.
    pub fn half_extents(&self) -> [f32; 3] {
        match *self {
            Self::Cube {
                width,
                height,
                depth,
            } => [width * 0.5, height * 0.5, depth * 0.5],
            Self::Cylinder { radius, height } => [radius, height * 0.5, radius],
            // Planes get a sliver of height so a ray can still hit them.
            Self::Plane { width, depth } => [width * 0.5, 0.01, depth * 0.5],
            Self::Sphere { radius } => [radius, radius, radius],
        }
    }
}

/// Optional texture reference on a material. The renderer resolves the
/// path and keys its GPU cache by content hash.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextureRef {
    pub path: String,
}

/// Editable material - matches the material panel fields.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MaterialProperties {
    pub id: Uuid,
    pub name: String,
    pub base_color: [f32; 4],
    pub roughness: f32,
    pub metalness: f32,
    pub texture: Option<TextureRef>,
}

impl MaterialProperties {
    fn default_material(id: Uuid) -> Self {
        Self {
            id,
            name: "Default".to_string(),
            base_color: [0.78, 0.78, 0.78, 1.0],
            roughness: 0.7,
            metalness: 0.0,
            texture: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub direction: [f32; 3],
    pub cast_shadows: bool,
    pub shadow_bias: f32,
}

/// Scene lighting - mirrored 1:1 into the renderer every sync.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LightingState {
    pub ambient: AmbientLight,
    pub sun: DirectionalLight,
}

impl Default for LightingState {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                color: [1.0, 1.0, 1.0],
                intensity: 0.35,
            },
            sun: DirectionalLight {
                color: [1.0, 0.98, 0.92],
                intensity: 1.6,
                direction: [-0.4, -1.0, -0.3],
                cast_shadows: true,
                shadow_bias: 0.0015,
            },
        }
    }
}

/// Serializable scene object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SceneObject {
    pub id: Uuid,
    pub name: String,
    pub primitive: PrimitiveKind,
    pub transform: Transform,
    pub material_id: Option<Uuid>,
    pub visible: bool,
    pub locked: bool,
    /// Bumped whenever the primitive dimensions change so the renderer
    /// knows to rebuild mesh buffers. Not persisted.
    #[serde(skip)]
    pub geometry_revision: u64,
}

/// The UI-facing scene store. All mutation goes through these methods so
/// the invariants (unique ids, live selection, untouched shared default
/// material, locked objects rejecting edits) hold in one place.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SceneState {
    objects: Vec<SceneObject>,
    materials: Vec<MaterialProperties>,
    default_material_id: Uuid,
    lighting: LightingState,
    name_counter: u64,
    #[serde(skip)]
    selected: Option<Uuid>,
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneState {
    pub fn new() -> Self {
        let default_material_id = Uuid::new_v4();
        Self {
            objects: Vec::new(),
            materials: vec![MaterialProperties::default_material(default_material_id)],
            default_material_id,
            lighting: LightingState::default(),
            name_counter: 0,
            selected: None,
        }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn object(&self, id: Uuid) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    fn object_mut(&mut self, id: Uuid) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    pub fn add_object(&mut self, primitive: PrimitiveKind) -> Uuid {
        self.name_counter += 1;
        let id = Uuid::new_v4();
        self.objects.push(SceneObject {
            id,
            name: format!("{} {}", primitive.label(), self.name_counter),
            primitive,
            transform: Transform::default(),
            material_id: None,
            visible: true,
            locked: false,
            geometry_revision: 0,
        });
        id
    }

    /// Copies an object under a fresh id, nudged sideways so the copy is
    /// visible next to the original.
    pub fn duplicate_object(&mut self, id: Uuid) -> Option<Uuid> {
        let source = self.object(id)?.clone();
        let copy_id = Uuid::new_v4();
        let mut copy = source;
        copy.id = copy_id;
        copy.name = format!("{} Copy", copy.name);
        copy.transform.position[0] += 0.5;
        copy.locked = false;
        copy.geometry_revision = 0;
        self.objects.push(copy);
        Some(copy_id)
    }

    /// Removes an object; clears the selection if it pointed at it.
    pub fn remove_object(&mut self, id: Uuid) -> bool {
        let before = self.objects.len();
        self.objects.retain(|object| object.id != id);
        let removed = self.objects.len() != before;
        if removed && self.selected == Some(id) {
            self.selected = None;
        }
        removed
    }

    pub fn rename_object(&mut self, id: Uuid, name: &str) -> bool {
        match self.object_mut(id) {
            Some(object) => {
                object.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Rejected for locked objects.
    pub fn set_transform(&mut self, id: Uuid, transform: Transform) -> bool {
        match self.object_mut(id) {
            Some(object) if !object.locked => {
                object.transform = transform;
                true
            }
            _ => false,
        }
    }

    /// Rejected for locked objects. Bumps the geometry revision when the
    /// dimensions actually changed so the renderer re-meshes.
    pub fn set_primitive(&mut self, id: Uuid, primitive: PrimitiveKind) -> bool {
        match self.object_mut(id) {
            Some(object) if !object.locked => {
                if object.primitive != primitive {
                    object.primitive = primitive;
                    object.geometry_revision += 1;
                }
                true
            }
            _ => false,
        }
    }

    pub fn set_visible(&mut self, id: Uuid, visible: bool) -> bool {
        match self.object_mut(id) {
            Some(object) => {
                object.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn set_locked(&mut self, id: Uuid, locked: bool) -> bool {
        match self.object_mut(id) {
            Some(object) => {
                object.locked = locked;
                true
            }
            None => false,
        }
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.selected
    }

    /// Selection only ever refers to a live object.
    pub fn select(&mut self, id: Option<Uuid>) {
        self.selected = match id {
            Some(id) if self.object(id).is_some() => Some(id),
            _ => None,
        };
    }

    pub fn materials(&self) -> &[MaterialProperties] {
        &self.materials
    }

    pub fn material(&self, id: Uuid) -> Option<&MaterialProperties> {
        self.materials.iter().find(|material| material.id == id)
    }

    pub fn default_material_id(&self) -> Uuid {
        self.default_material_id
    }

    /// Resolves an object's material, falling back to the shared default
    /// when the reference is missing or dangling. The caller decides
    /// whether the dangling case deserves a warning.
    pub fn resolve_material(&self, object: &SceneObject) -> &MaterialProperties {
        object
            .material_id
            .and_then(|id| self.material(id))
            .unwrap_or_else(|| {
                self.material(self.default_material_id)
                    .expect("default material always present")
            })
    }

    /// True when the object's material reference does not resolve (as
    /// opposed to intentionally using the default).
    pub fn material_ref_dangling(&self, object: &SceneObject) -> bool {
        matches!(object.material_id, Some(id) if self.material(id).is_none())
    }

    pub fn add_material(&mut self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        let mut material = MaterialProperties::default_material(id);
        material.name = name.to_string();
        self.materials.push(material);
        id
    }

    pub fn remove_material(&mut self, id: Uuid) -> bool {
        if id == self.default_material_id {
            return false;
        }
        let before = self.materials.len();
        self.materials.retain(|material| material.id != id);
        self.materials.len() != before
    }

    pub fn assign_material(&mut self, object_id: Uuid, material_id: Option<Uuid>) -> bool {
        if let Some(id) = material_id {
            if self.material(id).is_none() {
                return false;
            }
        }
        match self.object_mut(object_id) {
            Some(object) => {
                object.material_id = material_id;
                true
            }
            None => false,
        }
    }

    /// Edits the material an object renders with. If the object still
    /// shares the default material, the default is cloned first and the
    /// clone assigned, so the shared default is never mutated. Returns
    /// the id of the material that was edited.
    pub fn edit_object_material<F>(&mut self, object_id: Uuid, edit: F) -> Option<Uuid>
    where
        F: FnOnce(&mut MaterialProperties),
    {
        let object = self.object(object_id)?;
        let resolved = self.resolve_material(object).id;
        let target = if resolved == self.default_material_id {
            let clone_id = Uuid::new_v4();
            let mut clone = self
                .material(self.default_material_id)
                .expect("default material always present")
                .clone();
            clone.id = clone_id;
            clone.name = format!("{} Material", object.name);
            self.materials.push(clone);
            if let Some(object) = self.object_mut(object_id) {
                object.material_id = Some(clone_id);
            }
            clone_id
        } else {
            resolved
        };
        let material = self
            .materials
            .iter_mut()
            .find(|material| material.id == target)?;
        edit(material);
        Some(target)
    }

    pub fn edit_material<F>(&mut self, material_id: Uuid, edit: F) -> bool
    where
        F: FnOnce(&mut MaterialProperties),
    {
        // The shared default stays pristine; per-object edits go through
        // edit_object_material, which clones it first.
        if material_id == self.default_material_id {
            return false;
        }
        match self
            .materials
            .iter_mut()
            .find(|material| material.id == material_id)
        {
            Some(material) => {
                edit(material);
                true
            }
            None => false,
        }
    }

    pub fn lighting(&self) -> &LightingState {
        &self.lighting
    }

    pub fn set_lighting(&mut self, lighting: LightingState) {
        self.lighting = lighting;
    }

    /// World-space bounds of all visible objects, as (center, extent).
    /// Falls back to a unit box around the origin for an empty scene so
    /// camera framing and the shadow fit always have something to aim at.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut any = false;
        for object in &self.objects {
            if !object.visible {
                continue;
            }
            any = true;
            let half = Vec3::from_array(object.primitive.half_extents());
            let model = object.transform.matrix();
            for corner in corner_offsets() {
                let world = model.transform_point3(corner * half);
                min = min.min(world);
                max = max.max(world);
            }
        }
        if !any {
            return (Vec3::ZERO, Vec3::splat(1.0));
        }
        ((min + max) * 0.5, (max - min) * 0.5)
    }
}

fn corner_offsets() -> [Vec3; 8] {
    [
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_object_assigns_unique_ids_and_names() {
        let mut scene = SceneState::new();
        let a = scene.add_object(PrimitiveKind::cube());
        let b = scene.add_object(PrimitiveKind::cube());
        assert_ne!(a, b);
        assert_ne!(scene.object(a).unwrap().name, scene.object(b).unwrap().name);
    }

    #[test]
    fn remove_selected_object_clears_selection() {
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::cylinder());
        scene.select(Some(id));
        assert_eq!(scene.selected(), Some(id));
        assert!(scene.remove_object(id));
        assert_eq!(scene.selected(), None);
    }

    #[test]
    fn select_rejects_dead_ids() {
        let mut scene = SceneState::new();
        scene.select(Some(Uuid::new_v4()));
        assert_eq!(scene.selected(), None);
    }

    #[test]
    fn locked_object_rejects_transform_and_dimension_edits() {
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::cube());
        scene.set_locked(id, true);
        let moved = Transform {
            position: [1.0, 2.0, 3.0],
            ..Transform::default()
        };
        assert!(!scene.set_transform(id, moved));
        assert!(!scene.set_primitive(id, PrimitiveKind::sphere()));
        assert_eq!(scene.object(id).unwrap().transform, Transform::default());
    }

    #[test]
    fn dimension_edit_bumps_geometry_revision() {
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::cube());
        assert_eq!(scene.object(id).unwrap().geometry_revision, 0);
        assert!(scene.set_primitive(
            id,
            PrimitiveKind::Cube {
                width: 2.0,
                height: 1.0,
                depth: 1.0,
            },
        ));
        assert_eq!(scene.object(id).unwrap().geometry_revision, 1);
        // Same dimensions again: no bump.
        assert!(scene.set_primitive(
            id,
            PrimitiveKind::Cube {
                width: 2.0,
                height: 1.0,
                depth: 1.0,
            },
        ));
        assert_eq!(scene.object(id).unwrap().geometry_revision, 1);
    }

    #[test]
    fn editing_default_material_clones_it_first() {
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::cube());
        let default_id = scene.default_material_id();
        let default_before = scene.material(default_id).unwrap().clone();

        let edited = scene
            .edit_object_material(id, |material| {
                material.base_color = [0.8, 0.1, 0.1, 1.0];
            })
            .unwrap();

        assert_ne!(edited, default_id);
        assert_eq!(scene.object(id).unwrap().material_id, Some(edited));
        assert_eq!(scene.material(default_id).unwrap(), &default_before);
        assert_eq!(
            scene.material(edited).unwrap().base_color,
            [0.8, 0.1, 0.1, 1.0]
        );
    }

    #[test]
    fn second_material_edit_reuses_the_clone() {
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::cube());
        let first = scene
            .edit_object_material(id, |material| material.roughness = 0.2)
            .unwrap();
        let second = scene
            .edit_object_material(id, |material| material.metalness = 1.0)
            .unwrap();
        assert_eq!(first, second);
        let material = scene.material(first).unwrap();
        assert_eq!(material.roughness, 0.2);
        assert_eq!(material.metalness, 1.0);
    }

    #[test]
    fn dangling_material_reference_falls_back_to_default() {
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::cube());
        let material_id = scene.add_material("Plaster");
        assert!(scene.assign_material(id, Some(material_id)));
        assert!(scene.remove_material(material_id));

        let object = scene.object(id).unwrap();
        assert!(scene.material_ref_dangling(object));
        assert_eq!(
            scene.resolve_material(object).id,
            scene.default_material_id()
        );
    }

    #[test]
    fn assign_material_validates_reference() {
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::plane());
        assert!(!scene.assign_material(id, Some(Uuid::new_v4())));
        assert!(scene.assign_material(id, None));
    }

    #[test]
    fn default_material_cannot_be_edited_or_removed() {
        let mut scene = SceneState::new();
        let default_id = scene.default_material_id();
        assert!(!scene.edit_material(default_id, |material| material.roughness = 0.0));
        assert!(!scene.remove_material(default_id));
    }

    #[test]
    fn bounds_cover_transformed_objects() {
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::cube());
        let transform = Transform {
            position: [10.0, 0.0, 0.0],
            ..Transform::default()
        };
        scene.set_transform(id, transform);
        let (center, extent) = scene.bounds();
        assert!((center.x - 10.0).abs() < 1e-4);
        assert!(extent.x >= 0.5 - 1e-4);
    }
}
