//! The host-facing surface: one `Gallery` owns the room, the camera, the
//! loaded artworks and the edit state, and is driven by `tick` plus input
//! events from a single thread.

use crate::assets::{ArtworkManager, ImageFetcher, LoadEvent, LoadProgress};
use crate::config::GalleryConfig;
use crate::input::Modifiers;
use crate::interact::{DragMode, SelectionChange, SelectionManager, TransformManager};
use crate::persist::{ArtworkStore, DirtySet, PersistenceBridge, SaveOutcome};
use crate::render::{pick, CameraNavigator, PickHit, ResizeHandles, Viewport};
use crate::scene::lighting::{self, Light};
use crate::scene::room::Room;
use crate::scene::{Artwork, ArtworkId, SceneObject};
use crate::ui::{Notice, Notices};
use crate::worker::Execution;
use glam::Vec2;
use winit::keyboard::PhysicalKey;

pub const LOAD_FAILURE_MESSAGE: &str = "Failed to load artwork image";

#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("failed to start {name} worker: {source}")]
    Worker {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Viewing,
    Editing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GalleryEvent {
    /// Every artwork in the last batch has loaded or failed.
    AllArtworksAttempted(LoadProgress),
    SelectionChanged(Option<ArtworkId>),
    EditModeChanged(EditMode),
    Saved(ArtworkId),
    SaveFailed(ArtworkId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Select and drag artworks.
    Primary,
    /// Hold to look around.
    Secondary,
}

pub struct Gallery {
    room: Room,
    lights: Vec<Light>,
    camera: CameraNavigator,
    viewport: Viewport,
    assets: ArtworkManager,
    selection: SelectionManager,
    transform: TransformManager,
    persist: PersistenceBridge,
    notices: Notices,
    events: Vec<GalleryEvent>,
    edit_mode: EditMode,
}

impl Gallery {
    pub fn new(
        config: &GalleryConfig,
        fetcher: Box<dyn ImageFetcher>,
        store: Box<dyn ArtworkStore>,
        execution: Execution,
    ) -> Result<Self, GalleryError> {
        config.validate()?;
        let room = Room::build(&config.room);
        let bounds = room.bounds();
        let assets = ArtworkManager::new(config.assets.clone(), fetcher, execution).map_err(
            |source| GalleryError::Worker {
                name: "artwork-loader",
                source,
            },
        )?;
        let persist = PersistenceBridge::new(store, execution, config.persist.decimals).map_err(
            |source| GalleryError::Worker {
                name: "artwork-saver",
                source,
            },
        )?;
        let lights = lighting::rig();

        Ok(Self {
            camera: CameraNavigator::new(&config.navigator, bounds),
            lights,
            viewport: Viewport::default(),
            assets,
            selection: SelectionManager::new(config.interaction.handle_size),
            transform: TransformManager::new(&config.interaction, bounds),
            persist,
            notices: Notices::default(),
            events: Vec::new(),
            edit_mode: EditMode::Viewing,
            room,
        })
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn camera(&self) -> &CameraNavigator {
        &self.camera
    }

    pub fn assets(&self) -> &ArtworkManager {
        &self.assets
    }

    pub fn object(&self, id: &ArtworkId) -> Option<&SceneObject> {
        self.assets.object(id)
    }

    pub fn selected(&self) -> Option<&ArtworkId> {
        self.selection.selected()
    }

    pub fn handles(&self) -> &ResizeHandles {
        self.selection.handles()
    }

    pub fn drag_mode(&self) -> DragMode {
        self.transform.mode()
    }

    pub fn dirty(&self) -> &DirtySet {
        self.persist.dirty()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
    }

    pub fn load_artworks(&mut self, artworks: &[Artwork]) {
        log::info!("Loading {} artworks", artworks.len());
        self.assets.load_all(artworks);
    }

    pub fn edit_mode(&self) -> EditMode {
        self.edit_mode
    }

    /// Leaving edit mode drops any drag, flushes every pending edit and
    /// clears the selection.
    pub fn set_edit_mode(&mut self, editing: bool) {
        let mode = if editing {
            EditMode::Editing
        } else {
            EditMode::Viewing
        };
        if mode == self.edit_mode {
            return;
        }
        self.edit_mode = mode;
        log::info!("Edit mode: {:?}", mode);

        if mode == EditMode::Viewing {
            if let Some(id) = self.transform.end_drag() {
                self.persist.request_flush([&id]);
            }
            self.persist.flush_all(&self.assets, &mut self.notices);
            if self.selection.clear() {
                self.events.push(GalleryEvent::SelectionChanged(None));
            }
        }
        self.events.push(GalleryEvent::EditModeChanged(mode));
    }

    /// True while a drag or a selection exists; camera look is suppressed.
    pub fn is_interacting(&self) -> bool {
        self.transform.is_dragging() || self.selection.selected().is_some()
    }

    /// Nearest thing under a point in normalized device coordinates.
    pub fn pick_at(&self, ndc: Vec2) -> Option<PickHit> {
        let ray = self.camera.view_ray(ndc, self.viewport.aspect());
        pick::pick(
            &ray,
            self.assets.objects(),
            self.selection.handles(),
            self.room.surfaces(),
        )
    }

    /// Select whatever is under `ndc`. Inert outside edit mode.
    pub fn click(&mut self, ndc: Vec2) -> SelectionChange {
        if self.edit_mode != EditMode::Editing {
            return SelectionChange::Unchanged;
        }
        let hit = self.pick_at(ndc);
        self.apply_selection(hit.as_ref())
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.camera.input_mut().modifiers = modifiers;
    }

    /// Feed a navigation key. Returns true if it was one.
    pub fn handle_key(&mut self, key: PhysicalKey, pressed: bool) -> bool {
        self.camera.input_mut().handle_key(key, pressed)
    }

    /// Window lost focus: nothing stays held.
    pub fn release_input(&mut self) {
        self.camera.input_mut().release_all();
    }

    /// Cursor left the window. The next move starts a fresh delta instead of
    /// jumping from the exit point.
    pub fn pointer_left(&mut self) {
        self.camera.input_mut().pointer = None;
    }

    /// `pixel` is in viewport pixels, top-left origin.
    pub fn pointer_pressed(&mut self, button: PointerButton, pixel: Vec2) {
        self.camera.input_mut().pointer = Some(pixel);
        match button {
            PointerButton::Secondary => self.camera.input_mut().look_button = true,
            PointerButton::Primary => {
                if self.edit_mode != EditMode::Editing {
                    return;
                }
                let hit = self.pick_at(self.viewport.to_ndc(pixel));
                let selected = self
                    .selection
                    .selected()
                    .and_then(|id| self.assets.object(id));
                let modifiers = self.camera.input().modifiers;
                if !self.transform.begin_drag(hit.as_ref(), modifiers, selected) {
                    self.apply_selection(hit.as_ref());
                }
            }
        }
    }

    pub fn pointer_moved(&mut self, pixel: Vec2) {
        let delta = self.camera.input_mut().pointer_moved(pixel);
        self.apply_pointer_delta(delta);
    }

    /// Relative motion, for hosts that report raw deltas.
    pub fn apply_pointer_delta(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        if self.transform.is_dragging() {
            self.drag_by(delta);
        } else if self.camera.input().look_button && !self.is_interacting() {
            self.camera.mouse_look(delta);
        }
    }

    pub fn pointer_released(&mut self, button: PointerButton) {
        match button {
            PointerButton::Secondary => self.camera.input_mut().look_button = false,
            PointerButton::Primary => {
                if let Some(id) = self.transform.end_drag() {
                    self.persist.request_flush([&id]);
                }
            }
        }
    }

    /// Queue every modified artwork for saving.
    pub fn save_now(&mut self) {
        self.persist.flush_all(&self.assets, &mut self.notices);
    }

    /// One frame: apply finished loads and saves, dispatch queued saves, move
    /// the camera. Returns true if the camera moved.
    pub fn tick(&mut self) -> bool {
        for event in self.assets.poll() {
            match event {
                LoadEvent::Loaded(_) => {}
                LoadEvent::Failed { title, .. } => {
                    self.notices
                        .error(format!("{}: {}", LOAD_FAILURE_MESSAGE, title));
                }
                LoadEvent::AllAttempted(progress) => {
                    self.events
                        .push(GalleryEvent::AllArtworksAttempted(progress));
                }
            }
        }

        for outcome in self.persist.drain(&mut self.notices) {
            self.events.push(match outcome {
                SaveOutcome::Saved { id, .. } => GalleryEvent::Saved(id),
                SaveOutcome::Failed { id, .. } => GalleryEvent::SaveFailed(id),
            });
        }
        self.persist.pump(&self.assets, &mut self.notices);

        self.camera.tick()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take()
    }

    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.latest()
    }

    pub fn take_events(&mut self) -> Vec<GalleryEvent> {
        std::mem::take(&mut self.events)
    }

    /// Take an artwork out of the scene. Unsaved edits to it are discarded.
    pub fn remove_artwork(&mut self, id: &ArtworkId) -> bool {
        if self.transform.target() == Some(id) {
            self.transform.cancel();
        }
        if self.selection.selected() == Some(id) {
            self.selection.forget(id);
            self.events.push(GalleryEvent::SelectionChanged(None));
        }
        self.persist.forget(id);
        let removed = self.assets.remove(id);
        if removed {
            log::info!("Removed artwork {}", id);
        }
        removed
    }

    /// Save what is left, wait for it, and release everything. Nothing may
    /// use the gallery afterwards.
    pub fn cleanup(mut self) -> Vec<SaveOutcome> {
        if let Some(id) = self.transform.end_drag() {
            self.persist.request_flush([&id]);
        }
        let outcomes = self.persist.shutdown(&self.assets, &mut self.notices);
        self.selection.clear();
        self.assets.cleanup();
        log::info!("Gallery closed after {} final saves", outcomes.len());
        outcomes
    }

    fn apply_selection(&mut self, hit: Option<&PickHit>) -> SelectionChange {
        let change = self.selection.select_at(hit, &self.assets);
        match &change {
            SelectionChange::Selected(id) => {
                self.events
                    .push(GalleryEvent::SelectionChanged(Some(id.clone())));
            }
            SelectionChange::Cleared => self.events.push(GalleryEvent::SelectionChanged(None)),
            SelectionChange::Unchanged => {}
        }
        change
    }

    fn drag_by(&mut self, delta: Vec2) {
        let Some(id) = self.transform.target().cloned() else {
            return;
        };
        let Some(object) = self.assets.object_mut(&id) else {
            self.transform.cancel();
            return;
        };
        if self.transform.update_drag(delta, object) {
            self.persist.mark_dirty(&id);
            self.selection.refresh_handles(object);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{DecodedImage, MemoryImageFetcher};
    use crate::persist::MemoryStore;
    use crate::scene::Position;
    use glam::Vec3;
    use winit::keyboard::KeyCode;

    fn gallery(store: &MemoryStore) -> Gallery {
        let fetcher = MemoryImageFetcher::new().with_image("a.png", DecodedImage::solid(2, 2));
        let mut gallery = Gallery::new(
            &GalleryConfig::default(),
            Box::new(fetcher),
            Box::new(store.clone()),
            Execution::Inline,
        )
        .unwrap();
        let mut artwork = Artwork::new("a1", "Dawn", "a.png");
        artwork.position = Some(Position::new(0.0, 0.0, -1.9));
        gallery.load_artworks(&[artwork]);
        gallery.tick();
        gallery
    }

    /// Pixel at the centre of the default viewport; the camera looks at a1.
    fn centre() -> Vec2 {
        Vec2::new(640.0, 360.0)
    }

    #[test]
    fn exposes_room_lights_and_loaded_images() {
        let store = MemoryStore::new();
        let gallery = gallery(&store);
        assert_eq!(gallery.room().surfaces().len(), 8);
        assert_eq!(gallery.lights().len(), 7);
        assert_eq!(gallery.camera().bounds(), gallery.room().bounds());
        let loaded = gallery.assets().loaded(&ArtworkId::new("a1")).unwrap();
        assert_eq!((loaded.texture.width, loaded.texture.height), (2, 2));
        assert_eq!(loaded.object.title, "Dawn");
    }

    #[test]
    fn viewing_mode_ignores_clicks() {
        let store = MemoryStore::new();
        let mut gallery = gallery(&store);
        assert_eq!(gallery.click(Vec2::ZERO), SelectionChange::Unchanged);
        gallery.pointer_pressed(PointerButton::Primary, centre());
        assert!(gallery.selected().is_none());
        assert!(!gallery.is_interacting());
    }

    #[test]
    fn click_then_drag_marks_dirty() {
        let store = MemoryStore::new();
        let mut gallery = gallery(&store);
        gallery.set_edit_mode(true);
        assert_eq!(
            gallery.click(Vec2::ZERO),
            SelectionChange::Selected(ArtworkId::new("a1"))
        );
        assert!(gallery.is_interacting());

        gallery.pointer_pressed(PointerButton::Primary, centre());
        assert_eq!(gallery.drag_mode(), DragMode::Translating);
        gallery.pointer_moved(centre() + Vec2::new(10.0, 0.0));
        assert!(gallery.dirty().contains(&ArtworkId::new("a1")));
        let handle = gallery.handles().handles()[0].center;
        let object = gallery.object(&ArtworkId::new("a1")).unwrap();
        assert_eq!(handle, object.corner(crate::scene::Corner::BottomLeft));
    }

    #[test]
    fn leaving_edit_mode_flushes_and_clears() {
        let store = MemoryStore::new();
        let mut gallery = gallery(&store);
        gallery.set_edit_mode(true);
        gallery.click(Vec2::ZERO);
        gallery.pointer_pressed(PointerButton::Primary, centre());
        gallery.pointer_moved(centre() + Vec2::new(0.0, -10.0));

        gallery.set_edit_mode(false);
        assert!(gallery.selected().is_none());
        assert_eq!(gallery.drag_mode(), DragMode::Idle);
        assert!(gallery.dirty().is_empty());
        gallery.tick();
        assert_eq!(store.saves().len(), 1);
        assert!(gallery
            .take_events()
            .contains(&GalleryEvent::Saved(ArtworkId::new("a1"))));
    }

    #[test]
    fn look_drag_is_suppressed_while_selected() {
        let store = MemoryStore::new();
        let mut gallery = gallery(&store);
        gallery.pointer_pressed(PointerButton::Secondary, Vec2::ZERO);
        gallery.pointer_moved(Vec2::new(100.0, 0.0));
        let yaw = gallery.camera().yaw();
        assert!((yaw - (-std::f32::consts::FRAC_PI_2 + 0.3)).abs() < 1e-5);

        gallery.set_edit_mode(true);
        gallery.click(gallery.camera_ndc_of(Vec3::new(0.0, 0.0, -1.9)));
        assert!(gallery.is_interacting());
        gallery.pointer_moved(Vec2::new(200.0, 0.0));
        assert_eq!(gallery.camera().yaw(), yaw);
        gallery.pointer_released(PointerButton::Secondary);
        assert!(!gallery.camera().input().look_button);
    }

    #[test]
    fn keys_drive_the_camera_on_tick() {
        let store = MemoryStore::new();
        let mut gallery = gallery(&store);
        assert!(gallery.handle_key(PhysicalKey::Code(KeyCode::KeyW), true));
        assert!(gallery.tick());
        assert!((gallery.camera().position().z - 4.9).abs() < 1e-5);
        gallery.release_input();
        assert!(!gallery.tick());
    }

    #[test]
    fn remove_artwork_clears_selection_and_dirty_state() {
        let store = MemoryStore::new();
        let mut gallery = gallery(&store);
        let id = ArtworkId::new("a1");
        gallery.set_edit_mode(true);
        gallery.click(Vec2::ZERO);
        gallery.pointer_pressed(PointerButton::Primary, centre());
        gallery.pointer_moved(centre() + Vec2::new(5.0, 5.0));

        assert!(gallery.remove_artwork(&id));
        assert!(gallery.selected().is_none());
        assert!(gallery.dirty().is_empty());
        assert_eq!(gallery.drag_mode(), DragMode::Idle);
        assert!(gallery.object(&id).is_none());
        assert!(!gallery.remove_artwork(&id));
        gallery.tick();
        assert!(store.saves().is_empty());
    }

    #[test]
    fn cleanup_saves_pending_edits() {
        let store = MemoryStore::new();
        let mut gallery = gallery(&store);
        gallery.set_edit_mode(true);
        gallery.click(Vec2::ZERO);
        gallery.pointer_pressed(PointerButton::Primary, centre());
        gallery.pointer_moved(centre() + Vec2::new(20.0, 0.0));
        let outcomes = gallery.cleanup();
        assert_eq!(outcomes.len(), 1);
        let saves = store.saves_for(&ArtworkId::new("a1"));
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].position.x, 0.2);
    }

    #[test]
    fn reentering_pointer_does_not_jump_the_drag() {
        let store = MemoryStore::new();
        let mut gallery = gallery(&store);
        let id = ArtworkId::new("a1");
        gallery.set_edit_mode(true);
        gallery.click(Vec2::ZERO);
        gallery.pointer_pressed(PointerButton::Primary, centre());
        gallery.pointer_moved(centre() + Vec2::new(10.0, 0.0));
        assert!((gallery.object(&id).unwrap().position.x - 0.1).abs() < 1e-5);

        gallery.pointer_left();
        assert!(gallery.camera().input().pointer.is_none());
        gallery.pointer_moved(Vec2::new(1200.0, 40.0));
        assert!((gallery.object(&id).unwrap().position.x - 0.1).abs() < 1e-5);

        gallery.pointer_moved(Vec2::new(1210.0, 40.0));
        assert!((gallery.object(&id).unwrap().position.x - 0.2).abs() < 1e-5);
    }

    impl Gallery {
        fn camera_ndc_of(&self, point: Vec3) -> Vec2 {
            let clip = self.camera.projection_matrix(self.viewport.aspect())
                * self.camera.view_matrix()
                * point.extend(1.0);
            Vec2::new(clip.x / clip.w, clip.y / clip.w)
        }
    }
}
