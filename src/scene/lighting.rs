//! Fixed lights for the gallery room. Initial scene state only.

use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightType {
    Ambient,
    Directional,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub light_type: LightType,
    pub color: [f32; 3],
    pub intensity: f32,
    /// Unused for ambient lights.
    pub position: Vec3,
    /// Falloff distance for point lights; 0 means unbounded.
    pub range: f32,
    pub cast_shadow: bool,
}

impl Light {
    fn ambient(color: u32, intensity: f32) -> Self {
        Self {
            light_type: LightType::Ambient,
            color: rgb(color),
            intensity,
            position: Vec3::ZERO,
            range: 0.0,
            cast_shadow: false,
        }
    }

    fn directional(color: u32, intensity: f32, position: Vec3, cast_shadow: bool) -> Self {
        Self {
            light_type: LightType::Directional,
            color: rgb(color),
            intensity,
            position,
            range: 0.0,
            cast_shadow,
        }
    }

    fn point(color: u32, intensity: f32, position: Vec3, range: f32) -> Self {
        Self {
            light_type: LightType::Point,
            color: rgb(color),
            intensity,
            position,
            range,
            cast_shadow: false,
        }
    }

    /// Direction a directional light shines in (towards the room origin).
    pub fn direction(&self) -> Option<Vec3> {
        match self.light_type {
            LightType::Directional => Some((-self.position).normalize_or_zero()),
            _ => None,
        }
    }
}

pub fn rig() -> Vec<Light> {
    vec![
        Light::ambient(0xffffff, 0.6),
        // Main overhead light and back fill
        Light::directional(0xffffff, 0.8, Vec3::new(0.0, 10.0, 5.0), true),
        Light::directional(0xffffff, 0.4, Vec3::new(0.0, 5.0, -10.0), false),
        // Side accents
        Light::point(0xffeedd, 1.0, Vec3::new(-15.0, 5.0, 0.0), 50.0),
        Light::point(0xffeedd, 1.0, Vec3::new(15.0, 5.0, 0.0), 50.0),
        // Corner fill
        Light::point(0xffeedd, 0.8, Vec3::new(-15.0, 5.0, -7.0), 40.0),
        Light::point(0xffeedd, 0.8, Vec3::new(15.0, 5.0, -7.0), 40.0),
    ]
}

fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rig_has_one_ambient_and_one_shadow_caster() {
        let lights = rig();
        assert_eq!(lights.len(), 7);
        let ambient = lights
            .iter()
            .filter(|l| l.light_type == LightType::Ambient)
            .count();
        assert_eq!(ambient, 1);
        let shadows = lights.iter().filter(|l| l.cast_shadow).count();
        assert_eq!(shadows, 1);
    }

    #[test]
    fn hex_colors_are_normalized() {
        assert_eq!(rgb(0xffffff), [1.0, 1.0, 1.0]);
        let warm = rgb(0xffeedd);
        assert!((warm[1] - 238.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn directional_lights_point_into_the_room() {
        for light in rig() {
            if let Some(direction) = light.direction() {
                assert!((direction.length() - 1.0).abs() < 1e-5);
            }
        }
    }
}
