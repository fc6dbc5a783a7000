mod fetch;

pub use fetch::{DecodedImage, FsImageFetcher, ImageFetcher, MemoryImageFetcher};

use crate::config::AssetConfig;
use crate::scene::{Artwork, ArtworkId, RotationRadians, SceneObject};
use crate::worker::{catch_panic, Execution, Worker};
use glam::{Vec2, Vec3};
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read image at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {uri}: {source}")]
    Decode {
        uri: String,
        #[source]
        source: image::ImageError,
    },
    #[error("image {uri} has no pixels")]
    EmptyImage { uri: String },
    #[error("unsupported image URI: {0}")]
    UnsupportedUri(String),
    #[error("image not found: {0}")]
    NotFound(String),
    #[error("image fetcher panicked on {uri}: {message}")]
    FetcherPanicked { uri: String, message: String },
    #[error("image worker is not running")]
    WorkerUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Pending,
    Loaded,
    Failed,
}

/// Completion count for the current batch of loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadProgress {
    pub attempted: usize,
    pub total: usize,
}

impl LoadProgress {
    pub fn is_complete(&self) -> bool {
        self.attempted >= self.total
    }
}

#[derive(Debug)]
pub enum LoadEvent {
    Loaded(ArtworkId),
    Failed {
        id: ArtworkId,
        title: String,
        error: AssetError,
    },
    /// Every load in the batch has finished, whether it worked or not.
    AllAttempted(LoadProgress),
}

/// Decoded pixels bound to one artwork plane.
#[derive(Debug)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneGeometry {
    pub width: f32,
    pub height: f32,
}

/// Everything the scene holds for one displayed artwork.
#[derive(Debug)]
pub struct LoadedArtwork {
    pub object: SceneObject,
    pub description: Option<String>,
    pub geometry: PlaneGeometry,
    pub texture: Texture,
}

impl LoadedArtwork {
    fn dispose(self) {
        log::debug!(
            "Disposed plane {:.2}x{:.2} and {}x{} texture for {}",
            self.geometry.width,
            self.geometry.height,
            self.texture.width,
            self.texture.height,
            self.object.artwork_id
        );
    }
}

struct FetchJob {
    id: ArtworkId,
    generation: u64,
    uri: String,
}

struct FetchResult {
    id: ArtworkId,
    generation: u64,
    image: Result<DecodedImage, AssetError>,
}

struct PendingLoad {
    artwork: Artwork,
    generation: u64,
    slot: usize,
}

/// Owns the `id -> LoadedArtwork` map. Scene objects only carry the id back.
pub struct ArtworkManager {
    config: AssetConfig,
    worker: Worker<FetchJob, FetchResult>,
    pending: HashMap<ArtworkId, PendingLoad>,
    loaded: BTreeMap<ArtworkId, LoadedArtwork>,
    status: HashMap<ArtworkId, LoadStatus>,
    events: VecDeque<LoadEvent>,
    progress: LoadProgress,
    batch_open: bool,
    next_slot: usize,
    next_generation: u64,
}

impl ArtworkManager {
    pub fn new(
        config: AssetConfig,
        mut fetcher: Box<dyn ImageFetcher>,
        execution: Execution,
    ) -> std::io::Result<Self> {
        let worker = Worker::start("artwork-loader", execution, move |job: FetchJob| {
            let image = catch_panic(|| fetcher.fetch(&job.uri)).unwrap_or_else(|message| {
                Err(AssetError::FetcherPanicked {
                    uri: job.uri.clone(),
                    message,
                })
            });
            FetchResult {
                image,
                id: job.id,
                generation: job.generation,
            }
        })?;
        Ok(Self {
            config,
            worker,
            pending: HashMap::new(),
            loaded: BTreeMap::new(),
            status: HashMap::new(),
            events: VecDeque::new(),
            progress: LoadProgress::default(),
            batch_open: false,
            next_slot: 0,
            next_generation: 0,
        })
    }

    /// Queue a batch of loads. An empty batch completes immediately.
    pub fn load_all(&mut self, artworks: &[Artwork]) {
        if artworks.is_empty() {
            self.events
                .push_back(LoadEvent::AllAttempted(LoadProgress::default()));
            return;
        }
        for artwork in artworks {
            self.load(artwork);
        }
    }

    /// Start an asynchronous fetch for one artwork. Returns false if the id is
    /// already pending or displayed.
    pub fn load(&mut self, artwork: &Artwork) -> bool {
        if self.pending.contains_key(&artwork.id) || self.loaded.contains_key(&artwork.id) {
            log::debug!("Artwork {} already loading or loaded", artwork.id);
            return false;
        }
        if !self.batch_open {
            self.progress = LoadProgress::default();
            self.batch_open = true;
        }
        self.progress.total += 1;

        let generation = self.next_generation;
        self.next_generation += 1;
        let slot = self.next_slot;
        self.next_slot += 1;

        self.status.insert(artwork.id.clone(), LoadStatus::Pending);
        let job = FetchJob {
            id: artwork.id.clone(),
            generation,
            uri: artwork.image_url.clone(),
        };
        self.pending.insert(
            artwork.id.clone(),
            PendingLoad {
                artwork: artwork.clone(),
                generation,
                slot,
            },
        );
        log::info!("Loading artwork {} from {}", artwork.id, artwork.image_url);

        if self.worker.submit(job).is_err() {
            log::warn!("Image worker unavailable, {} not loaded", artwork.id);
            self.complete(FetchResult {
                id: artwork.id.clone(),
                generation,
                image: Err(AssetError::WorkerUnavailable),
            });
        }
        true
    }

    /// Apply finished fetches to the scene and return what happened.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        for result in self.worker.drain() {
            self.complete(result);
        }
        self.events.drain(..).collect()
    }

    fn complete(&mut self, result: FetchResult) {
        let matches = self
            .pending
            .get(&result.id)
            .is_some_and(|pending| pending.generation == result.generation);
        if !matches {
            log::debug!("Discarding stale image result for {}", result.id);
            return;
        }
        let Some(pending) = self.pending.remove(&result.id) else {
            return;
        };
        let id = result.id;

        let image = result.image.and_then(|image| match image.aspect() {
            Some(_) => Ok(image),
            None => Err(AssetError::EmptyImage {
                uri: pending.artwork.image_url.clone(),
            }),
        });
        match image {
            Ok(image) => {
                let loaded = self.instantiate(&pending, image);
                log::info!(
                    "Loaded artwork {} at {:?}",
                    id,
                    loaded.object.position.to_array()
                );
                self.loaded.insert(id.clone(), loaded);
                self.status.insert(id.clone(), LoadStatus::Loaded);
                self.events.push_back(LoadEvent::Loaded(id));
            }
            Err(error) => {
                log::warn!("Failed to load artwork {}: {}", id, error);
                self.status.insert(id.clone(), LoadStatus::Failed);
                self.events.push_back(LoadEvent::Failed {
                    id,
                    title: pending.artwork.title,
                    error,
                });
            }
        }
        self.record_attempt();
    }

    fn record_attempt(&mut self) {
        self.progress.attempted += 1;
        if self.batch_open && self.progress.is_complete() {
            self.batch_open = false;
            log::info!(
                "All {} artwork loads attempted",
                self.progress.total
            );
            self.events.push_back(LoadEvent::AllAttempted(self.progress));
        }
    }

    fn instantiate(&self, pending: &PendingLoad, image: DecodedImage) -> LoadedArtwork {
        let artwork = &pending.artwork;
        let aspect = image.aspect().unwrap_or(1.0);
        let geometry = PlaneGeometry {
            width: self.config.plane_width,
            height: self.config.plane_width / aspect,
        };
        let position = artwork
            .stored_position()
            .unwrap_or_else(|| default_layout(&self.config, pending.slot));
        let rotation = artwork
            .rotation
            .map(|rotation| rotation.to_radians())
            .unwrap_or(RotationRadians::ZERO);
        let scale = artwork.stored_scale().unwrap_or(Vec2::ONE);

        LoadedArtwork {
            object: SceneObject {
                artwork_id: artwork.id.clone(),
                title: artwork.title.clone(),
                position,
                rotation,
                scale,
                size: Vec2::new(geometry.width, geometry.height),
            },
            description: artwork.description.clone(),
            geometry,
            texture: Texture {
                width: image.width,
                height: image.height,
                pixels: image.pixels,
            },
        }
    }

    pub fn status(&self, id: &ArtworkId) -> Option<LoadStatus> {
        self.status.get(id).copied()
    }

    pub fn progress(&self) -> LoadProgress {
        self.progress
    }

    pub fn loaded(&self, id: &ArtworkId) -> Option<&LoadedArtwork> {
        self.loaded.get(id)
    }

    pub fn object(&self, id: &ArtworkId) -> Option<&SceneObject> {
        self.loaded.get(id).map(|loaded| &loaded.object)
    }

    pub fn object_mut(&mut self, id: &ArtworkId) -> Option<&mut SceneObject> {
        self.loaded.get_mut(id).map(|loaded| &mut loaded.object)
    }

    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.loaded.values().map(|loaded| &loaded.object)
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// Drop an artwork from the scene, or cancel its pending load.
    pub fn remove(&mut self, id: &ArtworkId) -> bool {
        self.status.remove(id);
        if self.pending.remove(id).is_some() {
            log::debug!("Cancelled pending load for {}", id);
            self.record_attempt();
            return true;
        }
        match self.loaded.remove(id) {
            Some(loaded) => {
                loaded.dispose();
                true
            }
            None => false,
        }
    }

    /// Dispose every displayed artwork and forget pending loads.
    pub fn cleanup(&mut self) {
        let count = self.loaded.len();
        for (_, loaded) in std::mem::take(&mut self.loaded) {
            loaded.dispose();
        }
        self.pending.clear();
        self.status.clear();
        self.events.clear();
        self.batch_open = false;
        if count > 0 {
            log::info!("Disposed {} artworks", count);
        }
    }
}

impl Drop for ArtworkManager {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Fallback placement on the back wall, filled row by row in load order.
pub fn default_layout(config: &AssetConfig, slot: usize) -> Vec3 {
    let columns = config.layout_columns.max(1) as usize;
    let column = (slot % columns) as f32;
    let row = (slot / columns) as f32;
    let [x, y, z] = config.layout_origin;
    Vec3::new(
        x + column * config.layout_spacing[0],
        y - row * config.layout_spacing[1],
        z,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Position, RotationDegrees, Scale2};

    fn manager(fetcher: MemoryImageFetcher) -> ArtworkManager {
        ArtworkManager::new(AssetConfig::default(), Box::new(fetcher), Execution::Inline).unwrap()
    }

    fn fetcher() -> MemoryImageFetcher {
        MemoryImageFetcher::new()
            .with_image("wide.png", DecodedImage::solid(4, 2))
            .with_image("tall.png", DecodedImage::solid(2, 4))
    }

    #[test]
    fn plane_height_follows_aspect() {
        let mut manager = manager(fetcher());
        manager.load(&Artwork::new("a1", "Wide", "wide.png"));
        manager.load(&Artwork::new("a2", "Tall", "tall.png"));
        manager.poll();
        let wide = manager.object(&ArtworkId::new("a1")).unwrap();
        assert_eq!(wide.size, Vec2::new(2.0, 1.0));
        let tall = manager.object(&ArtworkId::new("a2")).unwrap();
        assert_eq!(tall.size, Vec2::new(2.0, 4.0));
    }

    #[test]
    fn stored_transform_is_applied_in_radians() {
        let mut artwork = Artwork::new("a1", "Wide", "wide.png");
        artwork.position = Some(Position::new(1.0, 2.0, -7.5));
        artwork.rotation = Some(RotationDegrees::new(0.0, 90.0, 0.0));
        artwork.scale = Some(Scale2::new(1.5, 1.5));

        let mut manager = manager(fetcher());
        manager.load(&artwork);
        manager.poll();
        let object = manager.object(&artwork.id).unwrap();
        assert_eq!(object.position, Vec3::new(1.0, 2.0, -7.5));
        assert!((object.rotation.0.y - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(object.scale, Vec2::splat(1.5));
        assert_eq!(manager.status(&artwork.id), Some(LoadStatus::Loaded));
    }

    #[test]
    fn missing_transform_uses_grid_layout() {
        let mut manager = manager(fetcher());
        let artworks: Vec<Artwork> = (0..5)
            .map(|i| Artwork::new(format!("a{}", i), "Wide", "wide.png"))
            .collect();
        manager.load_all(&artworks);
        manager.poll();
        let first = manager.object(&ArtworkId::new("a0")).unwrap();
        assert_eq!(first.position, Vec3::new(-4.5, 2.0, -7.9));
        assert_eq!(first.rotation, RotationRadians::ZERO);
        assert_eq!(first.scale, Vec2::ONE);
        let fourth = manager.object(&ArtworkId::new("a3")).unwrap();
        assert_eq!(fourth.position, Vec3::new(4.5, 2.0, -7.9));
        let fifth = manager.object(&ArtworkId::new("a4")).unwrap();
        assert_eq!(fifth.position, Vec3::new(-4.5, -0.5, -7.9));
    }

    #[test]
    fn failed_fetch_is_reported_and_counted() {
        let mut manager = manager(fetcher());
        manager.load_all(&[
            Artwork::new("ok", "Wide", "wide.png"),
            Artwork::new("bad", "Lost", "missing.png"),
        ]);
        let events = manager.poll();
        assert!(manager.object(&ArtworkId::new("bad")).is_none());
        assert_eq!(manager.status(&ArtworkId::new("bad")), Some(LoadStatus::Failed));
        assert!(events.iter().any(|event| matches!(
            event,
            LoadEvent::Failed { title, .. } if title == "Lost"
        )));
        let all: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, LoadEvent::AllAttempted(_)))
            .collect();
        assert_eq!(all.len(), 1);
        assert_eq!(manager.progress(), LoadProgress { attempted: 2, total: 2 });
    }

    #[test]
    fn degenerate_image_fails_the_load() {
        let fetcher = MemoryImageFetcher::new().with_image("empty.png", DecodedImage::solid(0, 0));
        let mut manager = manager(fetcher);
        manager.load(&Artwork::new("e", "Empty", "empty.png"));
        let events = manager.poll();
        assert!(matches!(
            events.first(),
            Some(LoadEvent::Failed {
                error: AssetError::EmptyImage { .. },
                ..
            })
        ));
    }

    #[test]
    fn removing_a_pending_load_discards_its_result() {
        let mut manager = manager(fetcher());
        let artwork = Artwork::new("a1", "Wide", "wide.png");
        manager.load(&artwork);
        assert!(manager.remove(&artwork.id));
        let events = manager.poll();
        assert!(manager.object(&artwork.id).is_none());
        assert!(manager.status(&artwork.id).is_none());
        assert!(events
            .iter()
            .all(|event| !matches!(event, LoadEvent::Loaded(_))));
        assert!(manager.progress().is_complete());
    }

    #[test]
    fn duplicate_load_is_ignored() {
        let mut manager = manager(fetcher());
        let artwork = Artwork::new("a1", "Wide", "wide.png");
        assert!(manager.load(&artwork));
        assert!(!manager.load(&artwork));
        manager.poll();
        assert!(!manager.load(&artwork));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn empty_batch_completes_immediately() {
        let mut manager = manager(fetcher());
        manager.load_all(&[]);
        let events = manager.poll();
        assert!(matches!(events.as_slice(), [LoadEvent::AllAttempted(_)]));
    }

    #[test]
    fn cleanup_disposes_everything() {
        let mut manager = manager(fetcher());
        manager.load(&Artwork::new("a1", "Wide", "wide.png"));
        manager.poll();
        manager.cleanup();
        assert!(manager.is_empty());
        assert!(manager.status(&ArtworkId::new("a1")).is_none());
    }

    struct PanickingFetcher;

    impl ImageFetcher for PanickingFetcher {
        fn fetch(&mut self, uri: &str) -> Result<DecodedImage, AssetError> {
            panic!("decoder crashed on {}", uri);
        }
    }

    #[test]
    fn panicking_fetcher_fails_only_that_artwork() {
        let mut manager =
            ArtworkManager::new(AssetConfig::default(), Box::new(PanickingFetcher), Execution::Inline)
                .unwrap();
        manager.load_all(&[Artwork::new("a1", "Wide", "wide.png")]);
        let events = manager.poll();
        assert!(matches!(
            events.first(),
            Some(LoadEvent::Failed {
                error: AssetError::FetcherPanicked { .. },
                ..
            })
        ));
        assert!(matches!(events.last(), Some(LoadEvent::AllAttempted(_))));
        assert_eq!(manager.status(&ArtworkId::new("a1")), Some(LoadStatus::Failed));
    }
}
