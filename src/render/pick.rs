//! CPU ray picking.
//!
//! Casts a view ray against the three kinds of pickable things in the gallery:
//! artwork planes (oriented rectangles), resize handles (small axis-aligned
//! cubes) and the room's surfaces. The nearest hit in front of the camera wins,
//! so an artwork hung just off a wall is picked before the wall behind it.

use crate::render::handles::ResizeHandles;
use crate::scene::room::{Surface, SurfaceKind};
use crate::scene::{ArtworkId, Corner, SceneObject};
use glam::{Quat, Vec2, Vec3};

const EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickKind {
    Artwork,
    Handle,
    Surface,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PickTarget {
    Artwork(ArtworkId),
    Handle { artwork: ArtworkId, corner: Corner },
    Surface(SurfaceKind),
}

impl PickTarget {
    pub fn kind(&self) -> PickKind {
        match self {
            PickTarget::Artwork(_) => PickKind::Artwork,
            PickTarget::Handle { .. } => PickKind::Handle,
            PickTarget::Surface(_) => PickKind::Surface,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub target: PickTarget,
    pub distance: f32,
    pub point: Vec3,
}

/// Nearest hit along `ray`, or None if the ray escapes the room.
pub fn pick<'a>(
    ray: &Ray,
    artworks: impl IntoIterator<Item = &'a SceneObject>,
    handles: &ResizeHandles,
    surfaces: &[Surface],
) -> Option<PickHit> {
    let mut best: Option<(PickTarget, f32)> = None;
    let mut consider = |target: PickTarget, distance: f32| {
        if best.as_ref().map_or(true, |(_, d)| distance < *d) {
            best = Some((target, distance));
        }
    };

    if let Some(owner) = handles.owner() {
        for handle in handles.handles() {
            if let Some(t) = intersect_aabb(ray, handle.center, Vec3::splat(handle.size * 0.5)) {
                consider(
                    PickTarget::Handle {
                        artwork: owner.clone(),
                        corner: handle.corner,
                    },
                    t,
                );
            }
        }
    }

    for object in artworks {
        if let Some(t) = intersect_rect(
            ray,
            object.position,
            object.rotation.quat(),
            object.half_extents(),
        ) {
            consider(PickTarget::Artwork(object.artwork_id.clone()), t);
        }
    }

    for surface in surfaces {
        if let Some(t) = intersect_surface(ray, surface) {
            consider(PickTarget::Surface(surface.kind), t);
        }
    }

    best.map(|(target, distance)| PickHit {
        point: ray.at(distance),
        target,
        distance,
    })
}

/// Two-sided hit against a rectangle in its local XY plane.
pub fn intersect_rect(ray: &Ray, center: Vec3, rotation: Quat, half_extents: Vec2) -> Option<f32> {
    let inverse = rotation.inverse();
    let origin = inverse * (ray.origin - center);
    let direction = inverse * ray.direction;
    if direction.z.abs() < EPSILON {
        return None;
    }
    let t = -origin.z / direction.z;
    if t <= EPSILON {
        return None;
    }
    let local = origin + direction * t;
    (local.x.abs() <= half_extents.x && local.y.abs() <= half_extents.y).then_some(t)
}

/// Slab test. Returns the entry distance, or the exit distance when the ray
/// starts inside the box.
pub fn intersect_aabb(ray: &Ray, center: Vec3, half_extents: Vec3) -> Option<f32> {
    let min = center - half_extents;
    let max = center + half_extents;
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..3 {
        let origin = ray.origin[axis];
        let direction = ray.direction[axis];
        if direction.abs() < EPSILON {
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / direction;
        let mut t0 = (min[axis] - origin) * inv;
        let mut t1 = (max[axis] - origin) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_near = t_near.max(t0);
        t_far = t_far.min(t1);
        if t_near > t_far {
            return None;
        }
    }

    if t_far <= EPSILON {
        None
    } else if t_near > EPSILON {
        Some(t_near)
    } else {
        Some(t_far)
    }
}

fn intersect_surface(ray: &Ray, surface: &Surface) -> Option<f32> {
    let normal = surface.normal();
    let denom = normal.dot(ray.direction);
    if denom.abs() < EPSILON {
        return None;
    }
    let t = (surface.center - ray.origin).dot(normal) / denom;
    if t <= EPSILON {
        return None;
    }
    surface.contains_planar(ray.at(t)).then_some(t)
}
