use crate::assets::ArtworkManager;
use crate::render::{PickHit, PickTarget, ResizeHandles};
use crate::scene::{ArtworkId, SceneObject};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    Selected(ArtworkId),
    Cleared,
    Unchanged,
}

/// At most one selected artwork, plus its resize handles.
#[derive(Debug, Clone)]
pub struct SelectionManager {
    selected: Option<ArtworkId>,
    handles: ResizeHandles,
}

impl SelectionManager {
    pub fn new(handle_size: f32) -> Self {
        Self {
            selected: None,
            handles: ResizeHandles::new(handle_size),
        }
    }

    pub fn selected(&self) -> Option<&ArtworkId> {
        self.selected.as_ref()
    }

    pub fn handles(&self) -> &ResizeHandles {
        &self.handles
    }

    /// Apply a click whose nearest hit is `hit`.
    ///
    /// Artwork: select it. Handle: keep the selection. Anything else: clear.
    pub fn select_at(&mut self, hit: Option<&PickHit>, assets: &ArtworkManager) -> SelectionChange {
        match hit.map(|hit| &hit.target) {
            Some(PickTarget::Artwork(id)) => match assets.object(id) {
                Some(object) => self.select(object),
                None => self.clear_change(),
            },
            Some(PickTarget::Handle { .. }) => SelectionChange::Unchanged,
            Some(PickTarget::Surface(_)) | None => self.clear_change(),
        }
    }

    pub fn select(&mut self, object: &SceneObject) -> SelectionChange {
        if self.selected.as_ref() == Some(&object.artwork_id) {
            return SelectionChange::Unchanged;
        }
        self.selected = Some(object.artwork_id.clone());
        self.handles.create(object);
        log::debug!("Selected {}", object.artwork_id);
        SelectionChange::Selected(object.artwork_id.clone())
    }

    /// Returns true if something was selected.
    pub fn clear(&mut self) -> bool {
        self.handles.clear();
        match self.selected.take() {
            Some(id) => {
                log::debug!("Deselected {}", id);
                true
            }
            None => false,
        }
    }

    pub fn refresh_handles(&mut self, object: &SceneObject) {
        self.handles.update(object);
    }

    /// Drop the selection if it points at an artwork that is going away.
    pub fn forget(&mut self, id: &ArtworkId) {
        if self.selected.as_ref() == Some(id) {
            self.clear();
        }
    }

    fn clear_change(&mut self) -> SelectionChange {
        if self.clear() {
            SelectionChange::Cleared
        } else {
            SelectionChange::Unchanged
        }
    }
}
