use crate::scene::{Artwork, ArtworkId, TransformRecord};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

/// A gallery as stored on disk: a title and its artwork records.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GalleryDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artworks: Vec<Artwork>,
}

impl GalleryDocument {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            artworks: Vec::new(),
        }
    }

    pub fn artwork(&self, id: &ArtworkId) -> Option<&Artwork> {
        self.artworks.iter().find(|artwork| &artwork.id == id)
    }

    /// Overwrite the transform fields of one artwork. Returns false if unknown.
    pub fn apply_transform(&mut self, id: &ArtworkId, record: &TransformRecord) -> bool {
        match self.artworks.iter_mut().find(|artwork| &artwork.id == id) {
            Some(artwork) => {
                artwork.apply_record(record);
                true
            }
            None => false,
        }
    }
}

pub fn save_gallery_to_file(gallery: &GalleryDocument, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(gallery)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_gallery_from_file(path: &Path) -> Result<GalleryDocument> {
    let json = std::fs::read_to_string(path)?;
    let gallery: GalleryDocument = serde_json::from_str(&json)?;
    Ok(gallery)
}
