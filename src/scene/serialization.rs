use crate::scene::SceneState;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

pub fn save_scene_to_file(scene: &SceneState, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(scene)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_scene_from_file(path: &Path) -> Result<SceneState> {
    let json = std::fs::read_to_string(path)?;
    let scene: SceneState = serde_json::from_str(&json)?;
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use crate::scene::{LightingState, PrimitiveKind, SceneState, Transform};

    #[test]
    fn test_empty_scene_serialization() {
        let scene = SceneState::new();
        let json = serde_json::to_string_pretty(&scene).unwrap();
        let loaded: SceneState = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.objects().len(), 0);
        assert_eq!(loaded.materials().len(), 1);
    }

    #[test]
    fn test_scene_with_lighting_roundtrip() {
        let mut scene = SceneState::new();
        let mut lighting = LightingState::default();
        lighting.sun.intensity = 2.5;
        lighting.sun.direction = [0.0, -1.0, -0.5];
        lighting.ambient.intensity = 0.1;
        lighting.sun.shadow_bias = 0.004;
        scene.set_lighting(lighting);

        let json = serde_json::to_string_pretty(&scene).unwrap();
        let loaded: SceneState = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.lighting().sun.intensity, 2.5);
        assert_eq!(loaded.lighting().sun.direction, [0.0, -1.0, -0.5]);
        assert_eq!(loaded.lighting().ambient.intensity, 0.1);
        assert_eq!(loaded.lighting().sun.shadow_bias, 0.004);
    }

    #[test]
    fn test_runtime_fields_are_not_serialized() {
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::cube());
        scene.set_primitive(
            id,
            PrimitiveKind::Cube {
                width: 3.0,
                height: 1.0,
                depth: 1.0,
            },
        );
        scene.select(Some(id));

        let json = serde_json::to_string_pretty(&scene).unwrap();
        assert!(!json.contains("geometry_revision"));
        assert!(!json.contains("selected"));

        let loaded: SceneState = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.objects().len(), 1);
        assert_eq!(loaded.objects()[0].geometry_revision, 0);
        assert_eq!(loaded.selected(), None);
    }

    #[test]
    fn test_material_assignment_roundtrip() {
        let mut scene = SceneState::new();
        let object_id = scene.add_object(PrimitiveKind::cylinder());
        let edited = scene
            .edit_object_material(object_id, |material| {
                material.base_color = [0.2, 0.3, 0.4, 1.0];
                material.roughness = 0.25;
                material.metalness = 0.8;
            })
            .unwrap();

        let json = serde_json::to_string_pretty(&scene).unwrap();
        let loaded: SceneState = serde_json::from_str(&json).unwrap();
        let object = loaded.object(object_id).unwrap();
        assert_eq!(object.material_id, Some(edited));
        let material = loaded.material(edited).unwrap();
        assert_eq!(material.base_color, [0.2, 0.3, 0.4, 1.0]);
        assert_eq!(material.roughness, 0.25);
        assert_eq!(material.metalness, 0.8);
    }

    #[test]
    fn test_name_counter_survives_reload() {
        let mut scene = SceneState::new();
        scene.add_object(PrimitiveKind::cube());
        scene.add_object(PrimitiveKind::cube());

        let json = serde_json::to_string_pretty(&scene).unwrap();
        let mut loaded: SceneState = serde_json::from_str(&json).unwrap();
        let id = loaded.add_object(PrimitiveKind::cube());
        assert_eq!(loaded.object(id).unwrap().name, "Cube 3");
    }

    #[test]
    fn test_save_load_stress_loop_via_file() {
        let mut scene = SceneState::new();
        let cube = scene.add_object(PrimitiveKind::cube());
        scene.set_transform(
            cube,
            Transform {
                position: [1.0, 2.0, 3.0],
                rotation_deg: [10.0, 20.0, 30.0],
                scale: [1.0, 1.0, 1.0],
            },
        );
        scene.add_object(PrimitiveKind::plane());
        scene.edit_object_material(cube, |material| material.roughness = 0.4);

        let mut path = std::env::temp_dir();
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        path.push(format!(
            "maquette_scene_stress_{}_{}.json",
            std::process::id(),
            nonce
        ));

        for _ in 0..50 {
            super::save_scene_to_file(&scene, &path).unwrap();
            scene = super::load_scene_from_file(&path).unwrap();
            assert_eq!(scene.objects().len(), 2);
            let object = scene.object(cube).expect("cube survives round-trip");
            assert_eq!(object.transform.position, [1.0, 2.0, 3.0]);
            assert_eq!(scene.materials().len(), 2);
        }

        let _ = std::fs::remove_file(path);
    }
}
