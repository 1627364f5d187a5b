//! Project persistence.
//!
//! One JSON file holds every project as an array of records; each save
//! rewrites the whole file (write to a temp sibling, then rename). There
//! is no incremental diffing - a project is persisted wholesale, scene
//! snapshot included.

pub mod thumbnail;

use crate::scene::SceneState;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no project with id {0}")]
    NotFound(Uuid),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Saved camera pose, restored when a project is opened.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CameraPose {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: [4.0, 3.0, 6.0],
            yaw: std::f32::consts::PI * 1.2,
            pitch: -0.35,
        }
    }
}

/// One persisted project: metadata plus the full scene snapshot.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProjectRecord {
    pub id: Uuid,
    pub name: String,
    /// Unix milliseconds of the last save or rename.
    pub last_modified: u64,
    /// PNG, base64-encoded, as the project list shows it.
    pub thumbnail: Option<String>,
    pub scene: SceneState,
    pub camera: CameraPose,
}

/// What the project list panel needs, without the scene payload.
#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub last_modified: u64,
    pub has_thumbnail: bool,
}

pub struct ProjectStore {
    path: PathBuf,
}

impl ProjectStore {
    /// Opens (or prepares to create) the store file at `path`. The parent
    /// directory is created eagerly so the first save cannot fail on it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Summaries of every stored project, newest first.
    pub fn list(&self) -> Result<Vec<ProjectSummary>> {
        let mut records = self.read_all()?;
        records.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(records
            .into_iter()
            .map(|record| ProjectSummary {
                id: record.id,
                name: record.name,
                last_modified: record.last_modified,
                has_thumbnail: record.thumbnail.is_some(),
            })
            .collect())
    }

    /// Creates and persists a new project around the given scene snapshot.
    pub fn create(&self, name: &str, scene: SceneState, camera: CameraPose) -> Result<ProjectRecord> {
        let record = ProjectRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            last_modified: now_ms(),
            thumbnail: None,
            scene,
            camera,
        };
        let mut records = self.read_all()?;
        records.push(record.clone());
        self.write_all(&records)?;
        Ok(record)
    }

    /// Upserts a record, bumping its modification time.
    pub fn save(&self, record: &ProjectRecord) -> Result<u64> {
        let mut records = self.read_all()?;
        let stamped = now_ms();
        let mut updated = record.clone();
        updated.last_modified = stamped;
        match records.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = updated,
            None => records.push(updated),
        }
        self.write_all(&records)?;
        Ok(stamped)
    }

    pub fn load(&self, id: Uuid) -> Result<ProjectRecord> {
        self.read_all()?
            .into_iter()
            .find(|record| record.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    pub fn rename(&self, id: Uuid, name: &str) -> Result<()> {
        let mut records = self.read_all()?;
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(StoreError::NotFound(id))?;
        record.name = name.to_string();
        record.last_modified = now_ms();
        self.write_all(&records)
    }

    /// Returns true if something was actually deleted.
    pub fn delete(&self, id: Uuid) -> Result<bool> {
        let mut records = self.read_all()?;
        let before = records.len();
        records.retain(|record| record.id != id);
        let removed = records.len() != before;
        if removed {
            self.write_all(&records)?;
        }
        Ok(removed)
    }

    pub fn set_thumbnail(&self, id: Uuid, png_base64: String) -> Result<()> {
        let mut records = self.read_all()?;
        let record = records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(StoreError::NotFound(id))?;
        record.thumbnail = Some(png_base64);
        self.write_all(&records)
    }

    fn read_all(&self) -> Result<Vec<ProjectRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.path)?;
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&json)?)
    }

    fn write_all(&self, records: &[ProjectRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        // Write-then-rename so a crash mid-write cannot truncate the store.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{PrimitiveKind, SceneState};

    fn temp_store() -> (ProjectStore, PathBuf) {
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!(
            "maquette_store_{}_{}",
            std::process::id(),
            nonce
        ));
        path.push("projects.json");
        (ProjectStore::open(&path).unwrap(), path)
    }

    #[test]
    fn created_project_appears_in_summaries() {
        let (store, path) = temp_store();
        let mut scene = SceneState::new();
        scene.add_object(PrimitiveKind::cube());
        let record = store
            .create("Atrium Study", scene, CameraPose::default())
            .unwrap();

        let summaries = store.list().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, record.id);
        assert_eq!(summaries[0].name, "Atrium Study");
        assert!(!summaries[0].has_thumbnail);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn save_round_trips_scene_payload() {
        let (store, path) = temp_store();
        let mut scene = SceneState::new();
        let id = scene.add_object(PrimitiveKind::cylinder());
        let record = store
            .create("Lobby", scene, CameraPose::default())
            .unwrap();

        let loaded = store.load(record.id).unwrap();
        assert!(loaded.scene.object(id).is_some());
        assert_eq!(loaded.name, "Lobby");

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn rename_bumps_last_modified_and_persists() {
        let (store, path) = temp_store();
        let record = store
            .create("Draft", SceneState::new(), CameraPose::default())
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.rename(record.id, "Final").unwrap();

        let reloaded = store.load(record.id).unwrap();
        assert_eq!(reloaded.name, "Final");
        assert!(reloaded.last_modified >= record.last_modified);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn delete_removes_the_record() {
        let (store, path) = temp_store();
        let a = store
            .create("Keep", SceneState::new(), CameraPose::default())
            .unwrap();
        let b = store
            .create("Drop", SceneState::new(), CameraPose::default())
            .unwrap();

        assert!(store.delete(b.id).unwrap());
        assert!(!store.delete(b.id).unwrap());
        let summaries = store.list().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, a.id);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn listing_is_newest_first() {
        let (store, path) = temp_store();
        let first = store
            .create("First", SceneState::new(), CameraPose::default())
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = store
            .create("Second", SceneState::new(), CameraPose::default())
            .unwrap();

        let summaries = store.list().unwrap();
        assert_eq!(summaries[0].id, second.id);
        assert_eq!(summaries[1].id, first.id);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_store_file_lists_empty() {
        let (store, path) = temp_store();
        assert!(store.list().unwrap().is_empty());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn corrupt_store_file_surfaces_an_error() {
        let (store, path) = temp_store();
        std::fs::write(&path, "{not valid json").unwrap();
        assert!(matches!(store.list(), Err(StoreError::Json(_))));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn load_unknown_id_is_not_found() {
        let (store, path) = temp_store();
        let id = Uuid::new_v4();
        assert!(matches!(store.load(id), Err(StoreError::NotFound(found)) if found == id));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn thumbnail_is_stored_on_the_record() {
        let (store, path) = temp_store();
        let record = store
            .create("Thumbs", SceneState::new(), CameraPose::default())
            .unwrap();
        store
            .set_thumbnail(record.id, "aGVsbG8=".to_string())
            .unwrap();
        let summaries = store.list().unwrap();
        assert!(summaries[0].has_thumbnail);
        let _ = std::fs::remove_file(path);
    }
}
