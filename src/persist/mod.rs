//! Dirty tracking and the save handshake with the artwork store.
//!
//! Edits mark an artwork dirty. A flush request queues ids; `pump` then takes
//! one snapshot per queued dirty id, clears it from the dirty set and hands the
//! save to the store on the save worker. An id whose previous save is still in
//! flight stays queued until that save reports back, so repeated releases
//! collapse into a single write of the latest transform. A failed save puts
//! the id back in the dirty set for the next flush to retry.

mod file_store;

pub use file_store::{JsonFileStore, MemoryStore};

use crate::assets::ArtworkManager;
use crate::scene::serialization::SerializationError;
use crate::scene::{ArtworkId, Position, SceneObject, Scale2, TransformRecord};
use crate::ui::Notices;
use crate::worker::{catch_panic, Execution, Worker};
use std::collections::HashSet;
use std::time::{Duration, Instant};

pub const SAVE_SUCCESS_MESSAGE: &str = "Artwork transformations saved";
pub const SAVE_FAILURE_MESSAGE: &str = "Failed to save artwork transformations";

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("artwork {0} is not in the gallery")]
    UnknownArtwork(ArtworkId),
    #[error("failed to write gallery: {0}")]
    Serialization(#[from] SerializationError),
    #[error("store rejected save: {0}")]
    Rejected(String),
    #[error("store panicked: {0}")]
    Panicked(String),
    #[error("save worker is not running")]
    WorkerUnavailable,
}

/// Persists the transform fields of one artwork.
pub trait ArtworkStore: Send {
    fn save(&mut self, id: &ArtworkId, record: &TransformRecord) -> Result<(), StoreError>;
}

/// Ids whose live transform differs from what was last persisted.
#[derive(Debug, Clone, Default)]
pub struct DirtySet {
    ids: HashSet<ArtworkId>,
}

impl DirtySet {
    pub fn mark(&mut self, id: &ArtworkId) {
        self.ids.insert(id.clone());
    }

    pub fn clear(&mut self, id: &ArtworkId) -> bool {
        self.ids.remove(id)
    }

    pub fn contains(&self, id: &ArtworkId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Sorted, so flush order is stable.
    pub fn ids(&self) -> Vec<ArtworkId> {
        let mut ids: Vec<_> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved {
        id: ArtworkId,
        record: TransformRecord,
    },
    Failed {
        id: ArtworkId,
        error: String,
    },
}

struct SaveJob {
    id: ArtworkId,
    record: TransformRecord,
}

struct SaveResult {
    id: ArtworkId,
    record: TransformRecord,
    result: Result<(), StoreError>,
}

/// Persisted form of a live transform: degrees, rounded.
pub fn snapshot(object: &SceneObject, decimals: u32) -> TransformRecord {
    let (position, rotation, scale) = object.live_transform();
    TransformRecord {
        position: Position::from_vec3(position),
        rotation: rotation.to_degrees(),
        scale: Scale2::new(scale.x, scale.y),
    }
    .rounded(decimals)
}

pub struct PersistenceBridge {
    dirty: DirtySet,
    queued: Vec<ArtworkId>,
    in_flight: HashSet<ArtworkId>,
    worker: Worker<SaveJob, SaveResult>,
    decimals: u32,
}

impl PersistenceBridge {
    pub fn new(
        mut store: Box<dyn ArtworkStore>,
        execution: Execution,
        decimals: u32,
    ) -> std::io::Result<Self> {
        let worker = Worker::start("artwork-saver", execution, move |job: SaveJob| {
            let result = catch_panic(|| store.save(&job.id, &job.record))
                .unwrap_or_else(|message| Err(StoreError::Panicked(message)));
            SaveResult {
                id: job.id,
                record: job.record,
                result,
            }
        })?;
        Ok(Self {
            dirty: DirtySet::default(),
            queued: Vec::new(),
            in_flight: HashSet::new(),
            worker,
            decimals,
        })
    }

    pub fn dirty(&self) -> &DirtySet {
        &self.dirty
    }

    pub fn mark_dirty(&mut self, id: &ArtworkId) {
        self.dirty.mark(id);
    }

    /// Forget an artwork entirely, e.g. after it was removed from the scene.
    pub fn forget(&mut self, id: &ArtworkId) {
        self.dirty.clear(id);
        self.queued.retain(|queued| queued != id);
    }

    pub fn is_saving(&self, id: &ArtworkId) -> bool {
        self.in_flight.contains(id)
    }

    pub fn has_pending_work(&self) -> bool {
        !self.queued.is_empty() || !self.in_flight.is_empty()
    }

    pub fn request_flush<'a>(&mut self, ids: impl IntoIterator<Item = &'a ArtworkId>) {
        for id in ids {
            if !self.queued.contains(id) {
                self.queued.push(id.clone());
            }
        }
    }

    /// Dispatch queued saves that can go now.
    pub fn pump(&mut self, assets: &ArtworkManager, notices: &mut Notices) {
        let queued = std::mem::take(&mut self.queued);
        for id in queued {
            if self.in_flight.contains(&id) {
                self.queued.push(id);
                continue;
            }
            if !self.dirty.contains(&id) {
                continue;
            }
            let Some(object) = assets.object(&id) else {
                log::debug!("Dropping save for {}, no longer in the scene", id);
                self.dirty.clear(&id);
                continue;
            };
            let record = snapshot(object, self.decimals);
            self.dirty.clear(&id);
            log::info!(
                "Saving {}: position {:?} rotation {:?} scale {:?}",
                id,
                record.position,
                record.rotation,
                record.scale
            );
            match self.worker.submit(SaveJob {
                id: id.clone(),
                record,
            }) {
                Ok(()) => {
                    self.in_flight.insert(id);
                }
                Err(job) => {
                    self.finish_save(
                        SaveResult {
                            id: job.id,
                            record: job.record,
                            result: Err(StoreError::WorkerUnavailable),
                        },
                        notices,
                    );
                }
            }
        }
    }

    /// Handle completed saves without blocking.
    pub fn drain(&mut self, notices: &mut Notices) -> Vec<SaveOutcome> {
        self.worker
            .drain()
            .into_iter()
            .map(|result| self.finish_save(result, notices))
            .collect()
    }

    /// Queue every dirty id and dispatch.
    pub fn flush_all(&mut self, assets: &ArtworkManager, notices: &mut Notices) {
        let ids = self.dirty.ids();
        if !ids.is_empty() {
            log::info!("Flushing {} modified artworks", ids.len());
        }
        self.request_flush(&ids);
        self.pump(assets, notices);
    }

    /// Flush, then wait for every save to report back.
    pub fn shutdown(&mut self, assets: &ArtworkManager, notices: &mut Notices) -> Vec<SaveOutcome> {
        self.flush_all(assets, notices);
        let mut outcomes = self.drain(notices);
        let deadline = Instant::now() + SHUTDOWN_TIMEOUT;
        while !self.in_flight.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Some(result) = self.worker.wait(remaining) else {
                log::warn!(
                    "Gave up waiting for {} saves at shutdown",
                    self.in_flight.len()
                );
                break;
            };
            outcomes.push(self.finish_save(result, notices));
            self.pump(assets, notices);
        }
        for result in self.worker.finish() {
            outcomes.push(self.finish_save(result, notices));
        }
        outcomes
    }

    fn finish_save(&mut self, result: SaveResult, notices: &mut Notices) -> SaveOutcome {
        self.in_flight.remove(&result.id);
        match result.result {
            Ok(()) => {
                log::info!("Saved {}", result.id);
                notices.success(SAVE_SUCCESS_MESSAGE);
                SaveOutcome::Saved {
                    id: result.id,
                    record: result.record,
                }
            }
            Err(error) => {
                log::warn!("Failed to save {}: {}", result.id, error);
                self.dirty.mark(&result.id);
                notices.error(SAVE_FAILURE_MESSAGE);
                SaveOutcome::Failed {
                    id: result.id,
                    error: error.to_string(),
                }
            }
        }
    }
}
