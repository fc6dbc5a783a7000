use crate::scene::{ArtworkId, Corner, SceneObject};
use glam::{Mat4, Vec3};

/// One corner cube. View state only, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub corner: Corner,
    pub center: Vec3,
    pub size: f32,
}

impl Handle {
    pub fn transform_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.size),
            glam::Quat::IDENTITY,
            self.center,
        )
    }
}

/// The four resize handles of the selected artwork. Either empty or exactly
/// four, one per corner in `Corner::ALL` order.
#[derive(Debug, Clone)]
pub struct ResizeHandles {
    owner: Option<ArtworkId>,
    handles: Vec<Handle>,
    size: f32,
}

impl ResizeHandles {
    pub fn new(size: f32) -> Self {
        Self {
            owner: None,
            handles: Vec::with_capacity(4),
            size,
        }
    }

    pub fn owner(&self) -> Option<&ArtworkId> {
        self.owner.as_ref()
    }

    pub fn handles(&self) -> &[Handle] {
        &self.handles
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn create(&mut self, object: &SceneObject) {
        self.handles.clear();
        self.handles.extend(Corner::ALL.iter().map(|&corner| Handle {
            corner,
            center: object.corner(corner),
            size: self.size,
        }));
        self.owner = Some(object.artwork_id.clone());
        log::debug!("Created resize handles for {}", object.artwork_id);
    }

    /// Move existing handles onto the object's current corners.
    pub fn update(&mut self, object: &SceneObject) {
        if self.owner.as_ref() != Some(&object.artwork_id) {
            return;
        }
        for handle in &mut self.handles {
            handle.center = object.corner(handle.corner);
        }
    }

    pub fn clear(&mut self) {
        if let Some(owner) = self.owner.take() {
            log::debug!("Removed resize handles for {}", owner);
        }
        self.handles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::RotationRadians;
    use glam::Vec2;

    fn object() -> SceneObject {
        SceneObject {
            artwork_id: ArtworkId::new("a1"),
            title: "Dawn".to_string(),
            position: Vec3::new(0.0, 1.0, -7.9),
            rotation: RotationRadians::ZERO,
            scale: Vec2::ONE,
            size: Vec2::new(2.0, 1.0),
        }
    }

    #[test]
    fn create_places_one_handle_per_corner() {
        let mut handles = ResizeHandles::new(0.1);
        handles.create(&object());
        assert_eq!(handles.handles().len(), 4);
        let order: Vec<u8> = handles.handles().iter().map(|h| h.corner.index()).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(handles.handles()[0].center, Vec3::new(-1.0, 0.5, -7.9));
        assert_eq!(handles.handles()[3].center, Vec3::new(1.0, 1.5, -7.9));
    }

    #[test]
    fn update_tracks_scale_changes() {
        let mut object = object();
        let mut handles = ResizeHandles::new(0.1);
        handles.create(&object);
        object.scale = Vec2::splat(2.0);
        handles.update(&object);
        assert_eq!(handles.handles()[1].center, Vec3::new(2.0, 0.0, -7.9));
    }

    #[test]
    fn update_ignores_other_artworks() {
        let mut handles = ResizeHandles::new(0.1);
        handles.create(&object());
        let mut other = object();
        other.artwork_id = ArtworkId::new("a2");
        other.position = Vec3::ZERO;
        handles.update(&other);
        assert_eq!(handles.handles()[0].center, Vec3::new(-1.0, 0.5, -7.9));
    }

    #[test]
    fn clear_leaves_no_handles() {
        let mut handles = ResizeHandles::new(0.1);
        handles.create(&object());
        handles.clear();
        assert!(handles.is_empty());
        assert!(handles.owner().is_none());
    }
}
