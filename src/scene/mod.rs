pub mod lighting;
pub mod room;
pub mod serialization;

use glam::{Mat4, Quat, Vec2, Vec3};
use std::fmt;

/// Opaque artwork identity as handed to us by the gallery service.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ArtworkId(String);

impl ArtworkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtworkId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ArtworkId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Persisted position, room-space units.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn from_vec3(value: Vec3) -> Self {
        Self::new(value.x, value.y, value.z)
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Persisted rotation. Always degrees; the live scene never sees this type.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct RotationDegrees {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationDegrees {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Load-side conversion. Only the asset loader calls this.
    pub fn to_radians(self) -> RotationRadians {
        RotationRadians(Vec3::new(
            finite_or_zero(self.x).to_radians(),
            finite_or_zero(self.y).to_radians(),
            finite_or_zero(self.z).to_radians(),
        ))
    }
}

/// Live rotation (Euler XYZ, radians). Deliberately not serializable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationRadians(pub Vec3);

impl RotationRadians {
    pub const ZERO: Self = Self(Vec3::ZERO);

    /// Save-side conversion. Only the persistence bridge calls this.
    pub fn to_degrees(self) -> RotationDegrees {
        RotationDegrees::new(
            self.0.x.to_degrees(),
            self.0.y.to_degrees(),
            self.0.z.to_degrees(),
        )
    }

    pub fn quat(&self) -> Quat {
        Quat::from_rotation_x(self.0.x)
            * Quat::from_rotation_y(self.0.y)
            * Quat::from_rotation_z(self.0.z)
    }
}

/// Persisted scale. Two components so non-uniform scale can be stored later.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scale2 {
    pub x: f32,
    pub y: f32,
}

impl Scale2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

impl Default for Scale2 {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

/// The transform fields written to storage for one artwork.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct TransformRecord {
    pub position: Position,
    pub rotation: RotationDegrees,
    pub scale: Scale2,
}

impl TransformRecord {
    /// Round every field to `decimals` places to keep float noise out of storage.
    pub fn rounded(self, decimals: u32) -> Self {
        let r = |value: f32| round_to(value, decimals);
        Self {
            position: Position::new(r(self.position.x), r(self.position.y), r(self.position.z)),
            rotation: RotationDegrees::new(
                r(self.rotation.x),
                r(self.rotation.y),
                r(self.rotation.z),
            ),
            scale: Scale2::new(r(self.scale.x), r(self.scale.y)),
        }
    }
}

/// Artwork record as loaded from the gallery service.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Artwork {
    pub id: ArtworkId,
    pub title: String,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub rotation: Option<RotationDegrees>,
    #[serde(default)]
    pub scale: Option<Scale2>,
}

impl Artwork {
    pub fn new(id: impl Into<ArtworkId>, title: &str, image_url: &str) -> Self {
        Self {
            id: id.into(),
            title: title.to_string(),
            image_url: image_url.to_string(),
            description: None,
            position: None,
            rotation: None,
            scale: None,
        }
    }

    /// Stored position, ignoring records with non-finite components.
    pub fn stored_position(&self) -> Option<Vec3> {
        self.position
            .filter(|position| position.is_finite())
            .map(Position::to_vec3)
    }

    pub fn stored_scale(&self) -> Option<Vec2> {
        self.scale
            .map(Scale2::to_vec2)
            .filter(|scale| scale.is_finite() && scale.x > 0.0 && scale.y > 0.0)
    }

    pub fn apply_record(&mut self, record: &TransformRecord) {
        self.position = Some(record.position);
        self.rotation = Some(record.rotation);
        self.scale = Some(record.scale);
    }
}

/// Renderable instance of an artwork: a textured plane in the room.
///
/// Carries the artwork id only as a lookup key; the asset loader's map owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub artwork_id: ArtworkId,
    pub title: String,
    pub position: Vec3,
    pub rotation: RotationRadians,
    pub scale: Vec2,
    /// Plane width/height at scale 1.
    pub size: Vec2,
}

/// Corner of an artwork plane, in handle index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    BottomLeft = 0,
    BottomRight = 1,
    TopLeft = 2,
    TopRight = 3,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::BottomLeft,
        Corner::BottomRight,
        Corner::TopLeft,
        Corner::TopRight,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    /// -1 for the left column, +1 for the right.
    pub fn horizontal_sign(self) -> f32 {
        match self {
            Corner::BottomLeft | Corner::TopLeft => -1.0,
            Corner::BottomRight | Corner::TopRight => 1.0,
        }
    }

    pub fn vertical_sign(self) -> f32 {
        match self {
            Corner::BottomLeft | Corner::BottomRight => -1.0,
            Corner::TopLeft | Corner::TopRight => 1.0,
        }
    }
}

impl SceneObject {
    pub fn half_extents(&self) -> Vec2 {
        self.size * self.scale * 0.5
    }

    pub fn transform_matrix(&self) -> Mat4 {
        compose_transform_matrix(self.position, self.rotation, self.scale)
    }

    /// Plane normal in room space (the plane faces +Z before rotation).
    pub fn normal(&self) -> Vec3 {
        self.rotation.quat() * Vec3::Z
    }

    pub fn corner(&self, corner: Corner) -> Vec3 {
        let half = self.half_extents();
        let local = Vec3::new(
            half.x * corner.horizontal_sign(),
            half.y * corner.vertical_sign(),
            0.0,
        );
        self.position + self.rotation.quat() * local
    }

    /// Snapshot of the live transform, still in live units.
    pub fn live_transform(&self) -> (Vec3, RotationRadians, Vec2) {
        (self.position, self.rotation, self.scale)
    }
}

/// Axis-aligned navigable box computed once from the room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn clamp(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

pub fn compose_transform_matrix(position: Vec3, rotation: RotationRadians, scale: Vec2) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale.extend(1.0), rotation.quat(), position)
}

pub fn round_to(value: f32, decimals: u32) -> f32 {
    let factor = 10f32.powi(decimals.min(i32::MAX as u32) as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane() -> SceneObject {
        SceneObject {
            artwork_id: ArtworkId::new("a"),
            title: "A".to_string(),
            position: Vec3::new(1.0, 2.0, -3.0),
            rotation: RotationRadians::ZERO,
            scale: Vec2::new(2.0, 2.0),
            size: Vec2::new(2.0, 1.0),
        }
    }

    #[test]
    fn degrees_radians_conversion_is_inverse() {
        let stored = RotationDegrees::new(90.0, -45.0, 180.0);
        let back = stored.to_radians().to_degrees();
        assert!((back.x - 90.0).abs() < 1e-4);
        assert!((back.y + 45.0).abs() < 1e-4);
        assert!((back.z - 180.0).abs() < 1e-4);
    }

    #[test]
    fn non_finite_rotation_loads_as_zero() {
        let live = RotationDegrees::new(f32::NAN, 30.0, f32::INFINITY).to_radians();
        assert_eq!(live.0.x, 0.0);
        assert_eq!(live.0.z, 0.0);
        assert!((live.0.y - 30f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn rounding_trims_float_noise() {
        let record = TransformRecord {
            position: Position::new(0.500_000_1, 0.199_999_9, -1.900_000_2),
            rotation: RotationDegrees::new(12.345_67, 0.0, -0.000_4),
            scale: Scale2::new(1.000_49, 0.999_51),
        };
        let rounded = record.rounded(3);
        assert_eq!(rounded.position, Position::new(0.5, 0.2, -1.9));
        assert_eq!(rounded.rotation.x, 12.346);
        assert_eq!(rounded.rotation.z, 0.0);
        assert_eq!(rounded.scale, Scale2::new(1.0, 1.0));
    }

    #[test]
    fn rounding_never_produces_nan() {
        assert_eq!(round_to(0.5, 40), 0.5);
        assert_eq!(round_to(-1.9, u32::MAX), -1.9);
    }

    #[test]
    fn corners_follow_scale_and_position() {
        let object = plane();
        let top_right = object.corner(Corner::TopRight);
        assert!((top_right - Vec3::new(3.0, 3.0, -3.0)).length() < 1e-5);
        let bottom_left = object.corner(Corner::BottomLeft);
        assert!((bottom_left - Vec3::new(-1.0, 1.0, -3.0)).length() < 1e-5);
    }

    #[test]
    fn corners_follow_rotation() {
        let mut object = plane();
        object.rotation = RotationRadians(Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0));
        // Rotating a quarter turn about Y swings +X onto -Z.
        let right = object.corner(Corner::BottomRight);
        assert!((right.x - 1.0).abs() < 1e-5);
        assert!((right.z - (-3.0 - 2.0)).abs() < 1e-5);
    }

    #[test]
    fn bounds_clamp_is_componentwise() {
        let bounds = Bounds::new(Vec3::splat(1.0), Vec3::splat(-1.0));
        assert_eq!(bounds.min, Vec3::splat(-1.0));
        let clamped = bounds.clamp(Vec3::new(5.0, 0.5, -7.0));
        assert_eq!(clamped, Vec3::new(1.0, 0.5, -1.0));
        assert!(bounds.contains(clamped));
    }

    #[test]
    fn invalid_stored_values_are_ignored() {
        let mut artwork = Artwork::new("x", "X", "x.png");
        artwork.position = Some(Position::new(f32::NAN, 0.0, 0.0));
        artwork.scale = Some(Scale2::new(0.0, 1.0));
        assert!(artwork.stored_position().is_none());
        assert!(artwork.stored_scale().is_none());
    }
}
