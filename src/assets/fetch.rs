use crate::assets::AssetError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Flat grey placeholder, mostly for tests and headless runs.
    pub fn solid(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0x80; width as usize * height as usize * 4],
        }
    }

    /// Width over height; None for a degenerate image.
    pub fn aspect(&self) -> Option<f32> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some(self.width as f32 / self.height as f32)
    }
}

/// Loads and decodes artwork images. Runs on the asset worker thread.
pub trait ImageFetcher: Send {
    fn fetch(&mut self, uri: &str) -> Result<DecodedImage, AssetError>;
}

/// Reads image files from disk. Relative paths and `file://` URIs resolve
/// against `base_dir`.
pub struct FsImageFetcher {
    base_dir: PathBuf,
}

impl FsImageFetcher {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, uri: &str) -> Result<PathBuf, AssetError> {
        let path = match uri.split_once("://") {
            Some(("file", rest)) => rest,
            Some(_) => return Err(AssetError::UnsupportedUri(uri.to_string())),
            None => uri,
        };
        let path = Path::new(path);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.base_dir.join(path))
        }
    }
}

impl ImageFetcher for FsImageFetcher {
    fn fetch(&mut self, uri: &str) -> Result<DecodedImage, AssetError> {
        let path = self.resolve(uri)?;
        let bytes = std::fs::read(&path).map_err(|source| AssetError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|source| AssetError::Decode {
            uri: uri.to_string(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::EmptyImage {
                uri: uri.to_string(),
            });
        }
        log::debug!("Decoded {} ({}x{})", path.display(), width, height);
        Ok(DecodedImage {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }
}

/// Serves pre-decoded images by URI; anything unknown is a not-found error.
#[derive(Debug, Default, Clone)]
pub struct MemoryImageFetcher {
    images: HashMap<String, DecodedImage>,
}

impl MemoryImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, uri: &str, image: DecodedImage) -> Self {
        self.insert(uri, image);
        self
    }

    pub fn insert(&mut self, uri: &str, image: DecodedImage) {
        self.images.insert(uri.to_string(), image);
    }
}

impl ImageFetcher for MemoryImageFetcher {
    fn fetch(&mut self, uri: &str) -> Result<DecodedImage, AssetError> {
        self.images
            .get(uri)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(uri.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let nonce = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "gallery_fetch_{}_{}_{}",
            tag,
            std::process::id(),
            nonce
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn decodes_png_relative_to_base_dir() {
        let dir = temp_dir("png");
        let image = image::RgbaImage::from_pixel(4, 2, image::Rgba([255, 0, 0, 255]));
        image.save(dir.join("wide.png")).unwrap();

        let mut fetcher = FsImageFetcher::new(&dir);
        let decoded = fetcher.fetch("wide.png").unwrap();
        assert_eq!((decoded.width, decoded.height), (4, 2));
        assert_eq!(decoded.aspect(), Some(2.0));
        assert_eq!(decoded.pixels.len(), 4 * 2 * 4);

        let via_uri = fetcher.fetch("file://wide.png").unwrap();
        assert_eq!(via_uri, decoded);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = temp_dir("missing");
        let mut fetcher = FsImageFetcher::new(&dir);
        assert!(matches!(
            fetcher.fetch("nope.png"),
            Err(AssetError::Read { .. })
        ));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn garbage_bytes_are_a_decode_error() {
        let dir = temp_dir("garbage");
        std::fs::write(dir.join("bad.png"), b"not an image").unwrap();
        let mut fetcher = FsImageFetcher::new(&dir);
        assert!(matches!(
            fetcher.fetch("bad.png"),
            Err(AssetError::Decode { .. })
        ));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn remote_uris_are_rejected() {
        let mut fetcher = FsImageFetcher::new(".");
        assert!(matches!(
            fetcher.fetch("https://example.com/a.png"),
            Err(AssetError::UnsupportedUri(_))
        ));
    }

    #[test]
    fn memory_fetcher_reports_unknown_uri() {
        let mut fetcher = MemoryImageFetcher::new().with_image("a.png", DecodedImage::solid(2, 1));
        assert_eq!(fetcher.fetch("a.png").unwrap().aspect(), Some(2.0));
        assert!(matches!(fetcher.fetch("b.png"), Err(AssetError::NotFound(_))));
    }
}
