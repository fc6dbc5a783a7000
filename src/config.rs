//! Tunables for the gallery. Every field has a default, so a config file only
//! needs to name what it changes.

use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub room: RoomConfig,
    pub navigator: NavigatorConfig,
    pub interaction: InteractionConfig,
    pub assets: AssetConfig,
    pub persist: PersistConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    /// Gap in the front wall, centred, starting at the floor.
    pub entrance_width: f32,
    pub entrance_height: f32,
    /// How far inside the walls the camera has to stay.
    pub boundary_margin: f32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            width: 30.0,
            height: 16.0,
            depth: 16.0,
            entrance_width: 10.0,
            entrance_height: 12.0,
            boundary_margin: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    pub start_position: [f32; 3],
    /// Room units per tick for each held movement key.
    pub move_speed: f32,
    /// Radians per tick for each held rotation key.
    pub rotation_speed: f32,
    /// Radians per pixel of pointer-drag look.
    pub mouse_sensitivity: f32,
    pub max_vertical_angle_deg: f32,
    pub fov_y_deg: f32,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            start_position: [0.0, 0.0, 5.0],
            move_speed: 0.1,
            rotation_speed: 0.02,
            mouse_sensitivity: 0.003,
            max_vertical_angle_deg: 60.0,
            fov_y_deg: 75.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Scene units per pixel of drag.
    pub drag_sensitivity: f32,
    pub min_scale: f32,
    /// Edge length of the cube handles shown on a selection's corners.
    pub handle_size: f32,
    pub clamp_artworks_to_bounds: bool,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            drag_sensitivity: 0.01,
            min_scale: 0.1,
            handle_size: 0.1,
            clamp_artworks_to_bounds: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Every artwork plane is this wide; height follows the image aspect.
    pub plane_width: f32,
    pub layout_columns: u32,
    pub layout_spacing: [f32; 2],
    /// Top-left slot of the default layout grid.
    pub layout_origin: [f32; 3],
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            plane_width: 2.0,
            layout_columns: 4,
            layout_spacing: [3.0, 2.5],
            layout_origin: [-4.5, 2.0, -7.9],
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    /// Decimal places kept for every persisted number.
    pub decimals: u32,
}

/// Beyond this f32 rounding stops being exact and then overflows.
const MAX_DECIMALS: u32 = 6;

impl Default for PersistConfig {
    fn default() -> Self {
        Self { decimals: 3 }
    }
}

impl GalleryConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: GalleryConfig =
            serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("room.width", self.room.width),
            ("room.height", self.room.height),
            ("room.depth", self.room.depth),
            ("navigator.move_speed", self.navigator.move_speed),
            ("navigator.rotation_speed", self.navigator.rotation_speed),
            ("navigator.mouse_sensitivity", self.navigator.mouse_sensitivity),
            ("navigator.fov_y_deg", self.navigator.fov_y_deg),
            ("interaction.drag_sensitivity", self.interaction.drag_sensitivity),
            ("interaction.min_scale", self.interaction.min_scale),
            ("interaction.handle_size", self.interaction.handle_size),
            ("assets.plane_width", self.assets.plane_width),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be a positive number",
                });
            }
        }
        let max_pitch = self.navigator.max_vertical_angle_deg;
        if !(max_pitch > 0.0 && max_pitch < 90.0) {
            return Err(ConfigError::Invalid {
                field: "navigator.max_vertical_angle_deg",
                reason: "must be between 0 and 90 degrees",
            });
        }
        if self.room.boundary_margin * 2.0 >= self.room.width.min(self.room.depth) {
            return Err(ConfigError::Invalid {
                field: "room.boundary_margin",
                reason: "leaves no navigable space",
            });
        }
        if self.persist.decimals > MAX_DECIMALS {
            return Err(ConfigError::Invalid {
                field: "persist.decimals",
                reason: "must be at most 6",
            });
        }
        if self.assets.layout_columns == 0 {
            return Err(ConfigError::Invalid {
                field: "assets.layout_columns",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}
