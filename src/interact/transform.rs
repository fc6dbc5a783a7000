use crate::config::InteractionConfig;
use crate::input::Modifiers;
use crate::render::{PickHit, PickTarget};
use crate::scene::{ArtworkId, Bounds, Corner, SceneObject};
use glam::Vec2;

/// What the active drag does to the selected artwork. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragMode {
    #[default]
    Idle,
    /// X/Y in the room plane.
    Translating,
    /// About the X and Y axes.
    Rotating,
    /// Along Z.
    DepthMoving,
    /// Uniform scale from vertical motion.
    Scaling,
    Resizing {
        corner: Corner,
        initial_scale: Vec2,
        accumulated_dx: f32,
    },
}

pub struct TransformManager {
    mode: DragMode,
    target: Option<ArtworkId>,
    sensitivity: f32,
    min_scale: f32,
    clamp_to: Option<Bounds>,
}

impl TransformManager {
    pub fn new(config: &InteractionConfig, bounds: Bounds) -> Self {
        Self {
            mode: DragMode::Idle,
            target: None,
            sensitivity: config.drag_sensitivity,
            min_scale: config.min_scale,
            clamp_to: config.clamp_artworks_to_bounds.then_some(bounds),
        }
    }

    pub fn mode(&self) -> DragMode {
        self.mode
    }

    pub fn is_dragging(&self) -> bool {
        self.mode != DragMode::Idle
    }

    pub fn target(&self) -> Option<&ArtworkId> {
        self.target.as_ref()
    }

    /// Start a drag if the press landed on the selection or one of its
    /// handles. Modifiers are read once here; Ctrl wins over Shift, Shift over
    /// Alt. Returns false and stays idle otherwise.
    pub fn begin_drag(
        &mut self,
        hit: Option<&PickHit>,
        modifiers: Modifiers,
        selected: Option<&SceneObject>,
    ) -> bool {
        let (Some(hit), Some(selected)) = (hit, selected) else {
            return false;
        };
        let mode = match &hit.target {
            PickTarget::Handle { artwork, corner } if *artwork == selected.artwork_id => {
                DragMode::Resizing {
                    corner: *corner,
                    initial_scale: selected.scale,
                    accumulated_dx: 0.0,
                }
            }
            PickTarget::Artwork(id) if *id == selected.artwork_id => {
                if modifiers.ctrl {
                    DragMode::Scaling
                } else if modifiers.shift {
                    DragMode::Rotating
                } else if modifiers.alt {
                    DragMode::DepthMoving
                } else {
                    DragMode::Translating
                }
            }
            _ => return false,
        };
        self.mode = mode;
        self.target = Some(selected.artwork_id.clone());
        log::debug!("Begin {:?} on {}", mode, selected.artwork_id);
        true
    }

    /// Apply a pointer delta in pixels to the dragged object. Returns true if
    /// the object changed.
    pub fn update_drag(&mut self, delta: Vec2, object: &mut SceneObject) -> bool {
        if self.target.as_ref() != Some(&object.artwork_id) {
            return false;
        }
        let k = self.sensitivity;
        let before = object.live_transform();

        match &mut self.mode {
            DragMode::Idle => return false,
            DragMode::Translating => {
                object.position.x += delta.x * k;
                object.position.y -= delta.y * k;
            }
            DragMode::Rotating => {
                object.rotation.0.y += delta.x * k;
                object.rotation.0.x += delta.y * k;
            }
            DragMode::DepthMoving => {
                object.position.z -= delta.y * k;
            }
            DragMode::Scaling => {
                let width = object.scale.x - delta.y * k;
                object.scale = aspect_locked_scale(object.scale, width, self.min_scale);
            }
            DragMode::Resizing {
                corner,
                initial_scale,
                accumulated_dx,
            } => {
                *accumulated_dx += delta.x;
                let width = initial_scale.x + corner.horizontal_sign() * *accumulated_dx * k;
                object.scale = aspect_locked_scale(*initial_scale, width, self.min_scale);
            }
        }

        if let Some(bounds) = self.clamp_to {
            object.position = bounds.clamp(object.position);
        }
        object.live_transform() != before
    }

    /// Finish the drag. Returns the artwork that was being dragged.
    pub fn end_drag(&mut self) -> Option<ArtworkId> {
        let target = self.target.take();
        if let Some(id) = &target {
            log::debug!("End {:?} on {}", self.mode, id);
        }
        self.mode = DragMode::Idle;
        target
    }

    /// Drop the drag without reporting a target, e.g. when edit mode ends.
    pub fn cancel(&mut self) {
        self.mode = DragMode::Idle;
        self.target = None;
    }
}

/// Scale with the given width, keeping the height/width ratio of `reference`
/// and both components at or above `min_scale`.
pub fn aspect_locked_scale(reference: Vec2, width: f32, min_scale: f32) -> Vec2 {
    let ratio = if reference.x > 0.0 && reference.y > 0.0 && reference.is_finite() {
        reference.y / reference.x
    } else {
        1.0
    };
    let floor = min_scale * (1.0 / ratio).max(1.0);
    let width = if width.is_finite() { width.max(floor) } else { floor };
    Vec2::new(width, width * ratio)
}
