//! Static room shell: walls, floor, ceiling and the navigable bounds.

use crate::config::RoomConfig;
use crate::scene::Bounds;
use glam::{Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    BackWall,
    LeftWall,
    RightWall,
    Floor,
    Ceiling,
    FrontWallLeft,
    FrontWallRight,
    FrontWallTop,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMaterial {
    pub color: [f32; 3],
    pub roughness: f32,
    pub metalness: f32,
}

const WALL_MATERIAL: SurfaceMaterial = SurfaceMaterial {
    color: [0.961, 0.961, 0.961],
    roughness: 0.5,
    metalness: 0.1,
};

const FLOOR_MATERIAL: SurfaceMaterial = SurfaceMaterial {
    color: [0.910, 0.910, 0.910],
    roughness: 0.3,
    metalness: 0.2,
};

const CEILING_MATERIAL: SurfaceMaterial = SurfaceMaterial {
    color: [0.980, 0.980, 0.980],
    roughness: 0.7,
    metalness: 0.1,
};

/// An axis-aligned rectangle. `u_axis` x `v_axis` points into the room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub kind: SurfaceKind,
    pub center: Vec3,
    pub u_axis: Vec3,
    pub v_axis: Vec3,
    pub half_size: Vec2,
    pub material: SurfaceMaterial,
}

impl Surface {
    pub fn normal(&self) -> Vec3 {
        self.u_axis.cross(self.v_axis).normalize_or_zero()
    }

    /// Whether a point on the surface plane lies inside the rectangle.
    pub fn contains_planar(&self, point: Vec3) -> bool {
        let offset = point - self.center;
        offset.dot(self.u_axis).abs() <= self.half_size.x
            && offset.dot(self.v_axis).abs() <= self.half_size.y
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    surfaces: Vec<Surface>,
    bounds: Bounds,
}

impl Room {
    pub fn build(config: &RoomConfig) -> Self {
        let half_w = config.width * 0.5;
        let half_h = config.height * 0.5;
        let half_d = config.depth * 0.5;

        let mut surfaces = vec![
            Surface {
                kind: SurfaceKind::BackWall,
                center: Vec3::new(0.0, 0.0, -half_d),
                u_axis: Vec3::X,
                v_axis: Vec3::Y,
                half_size: Vec2::new(half_w, half_h),
                material: WALL_MATERIAL,
            },
            Surface {
                kind: SurfaceKind::LeftWall,
                center: Vec3::new(-half_w, 0.0, 0.0),
                u_axis: Vec3::NEG_Z,
                v_axis: Vec3::Y,
                half_size: Vec2::new(half_d, half_h),
                material: WALL_MATERIAL,
            },
            Surface {
                kind: SurfaceKind::RightWall,
                center: Vec3::new(half_w, 0.0, 0.0),
                u_axis: Vec3::Z,
                v_axis: Vec3::Y,
                half_size: Vec2::new(half_d, half_h),
                material: WALL_MATERIAL,
            },
            Surface {
                kind: SurfaceKind::Floor,
                center: Vec3::new(0.0, -half_h, 0.0),
                u_axis: Vec3::X,
                v_axis: Vec3::NEG_Z,
                half_size: Vec2::new(half_w, half_d),
                material: FLOOR_MATERIAL,
            },
            Surface {
                kind: SurfaceKind::Ceiling,
                center: Vec3::new(0.0, half_h, 0.0),
                u_axis: Vec3::X,
                v_axis: Vec3::Z,
                half_size: Vec2::new(half_w, half_d),
                material: CEILING_MATERIAL,
            },
        ];
        surfaces.extend(front_wall(config, half_h, half_d));

        let margin = Vec3::splat(config.boundary_margin.max(0.0));
        let half = Vec3::new(half_w, half_h, half_d);
        let bounds = Bounds::new(-half + margin, half - margin);
        log::debug!(
            "Room built: {} surfaces, bounds {:?}..{:?}",
            surfaces.len(),
            bounds.min,
            bounds.max
        );

        Self { surfaces, bounds }
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

/// Front wall in three pieces leaving a doorway centred on the floor.
fn front_wall(config: &RoomConfig, half_h: f32, half_d: f32) -> Vec<Surface> {
    let entrance_w = config.entrance_width.clamp(0.0, config.width);
    let entrance_h = config.entrance_height.clamp(0.0, config.height);
    let side_w = (config.width - entrance_w) * 0.5;
    let top_h = config.height - entrance_h;
    let side_center_x = entrance_w * 0.5 + side_w * 0.5;

    let mut out = Vec::with_capacity(3);
    if side_w > 0.0 {
        for (kind, x) in [
            (SurfaceKind::FrontWallLeft, -side_center_x),
            (SurfaceKind::FrontWallRight, side_center_x),
        ] {
            out.push(Surface {
                kind,
                center: Vec3::new(x, 0.0, half_d),
                u_axis: Vec3::NEG_X,
                v_axis: Vec3::Y,
                half_size: Vec2::new(side_w * 0.5, half_h),
                material: WALL_MATERIAL,
            });
        }
    }
    if top_h > 0.0 && entrance_w > 0.0 {
        out.push(Surface {
            kind: SurfaceKind::FrontWallTop,
            center: Vec3::new(0.0, -half_h + entrance_h + top_h * 0.5, half_d),
            u_axis: Vec3::NEG_X,
            v_axis: Vec3::Y,
            half_size: Vec2::new(entrance_w * 0.5, top_h * 0.5),
            material: WALL_MATERIAL,
        });
    }
    out
}
