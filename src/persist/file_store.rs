use crate::persist::{ArtworkStore, StoreError};
use crate::scene::serialization::{save_gallery_to_file, GalleryDocument};
use crate::scene::{ArtworkId, TransformRecord};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Writes transforms back into the gallery JSON document on disk.
pub struct JsonFileStore {
    path: PathBuf,
    document: GalleryDocument,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, document: GalleryDocument) -> Self {
        Self {
            path: path.into(),
            document,
        }
    }
}

impl ArtworkStore for JsonFileStore {
    fn save(&mut self, id: &ArtworkId, record: &TransformRecord) -> Result<(), StoreError> {
        if !self.document.apply_transform(id, record) {
            return Err(StoreError::UnknownArtwork(id.clone()));
        }
        save_gallery_to_file(&self.document, &self.path)?;
        log::debug!("Wrote {} to {}", id, self.path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryStoreState {
    saves: Vec<(ArtworkId, TransformRecord)>,
    failing: bool,
}

/// In-memory store. Clones share the same log of saves, so a caller can keep
/// one handle while the other is moved onto the save worker.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryStoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following save fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    pub fn saves(&self) -> Vec<(ArtworkId, TransformRecord)> {
        self.lock().saves.clone()
    }

    pub fn saves_for(&self, id: &ArtworkId) -> Vec<TransformRecord> {
        self.lock()
            .saves
            .iter()
            .filter(|(saved, _)| saved == id)
            .map(|(_, record)| *record)
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStoreState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ArtworkStore for MemoryStore {
    fn save(&mut self, id: &ArtworkId, record: &TransformRecord) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.failing {
            return Err(StoreError::Rejected(format!("save of {} refused", id)));
        }
        state.saves.push((id.clone(), *record));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::serialization::load_gallery_from_file;
    use crate::scene::{Artwork, Position, RotationDegrees, Scale2};

    fn temp_path() -> PathBuf {
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "gallery_store_{}_{}.json",
            std::process::id(),
            nonce
        ))
    }

    fn record() -> TransformRecord {
        TransformRecord {
            position: Position::new(0.5, 0.2, -1.9),
            rotation: RotationDegrees::new(0.0, 30.0, 0.0),
            scale: Scale2::new(1.2, 0.9),
        }
    }

    #[test]
    fn json_store_rewrites_the_document() {
        let mut document = GalleryDocument::new("Hall");
        document.artworks.push(Artwork::new("a1", "Dawn", "dawn.png"));
        let path = temp_path();
        let mut store = JsonFileStore::new(&path, document);

        store.save(&ArtworkId::new("a1"), &record()).unwrap();
        let reloaded = load_gallery_from_file(&path).unwrap();
        let artwork = reloaded.artwork(&ArtworkId::new("a1")).unwrap();
        assert_eq!(artwork.position, Some(Position::new(0.5, 0.2, -1.9)));
        assert_eq!(artwork.rotation, Some(RotationDegrees::new(0.0, 30.0, 0.0)));
        assert_eq!(artwork.scale, Some(Scale2::new(1.2, 0.9)));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn json_store_rejects_unknown_ids() {
        let path = temp_path();
        let mut store = JsonFileStore::new(&path, GalleryDocument::new("Hall"));
        assert!(matches!(
            store.save(&ArtworkId::new("nope"), &record()),
            Err(StoreError::UnknownArtwork(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn memory_store_clones_share_saves() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        writer.save(&ArtworkId::new("a1"), &record()).unwrap();
        assert_eq!(store.saves_for(&ArtworkId::new("a1")), vec![record()]);
        store.set_failing(true);
        assert!(writer.save(&ArtworkId::new("a1"), &record()).is_err());
        assert_eq!(store.saves().len(), 1);
    }
}
