use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::camera::CameraRig;
use crate::centerline::CurveVariant;
use crate::lights::StreetLights;
use crate::track::TrackSpec;
use crate::vehicle::DrivingParams;

const BUILTIN_CONFIG: &str = include_str!("../assets/config.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid {field}: {reason}")]
    Invalid { field: String, reason: String },
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct GameConfig {
    #[serde(default)]
    pub simulation: DrivingParams,
    #[serde(default)]
    pub camera: CameraRig,
    #[serde(default)]
    pub lights: StreetLights,
    #[serde(default)]
    pub textures: TextureConfig,
    #[serde(default)]
    pub maps: MapTable,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TextureConfig {
    #[serde(default = "default_road_texture")]
    pub road: String,
    #[serde(default = "default_sidewalk_texture")]
    pub sidewalk: String,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            road: default_road_texture(),
            sidewalk: default_sidewalk_texture(),
        }
    }
}

fn default_road_texture() -> String {
    "textures/road.png".to_string()
}

fn default_sidewalk_texture() -> String {
    "textures/dirt.png".to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MapTable {
    #[serde(default = "MapConfig::gentle")]
    pub gentle: MapConfig,
    #[serde(default = "MapConfig::complex")]
    pub complex: MapConfig,
}

impl Default for MapTable {
    fn default() -> Self {
        Self {
            gentle: MapConfig::gentle(),
            complex: MapConfig::complex(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MapConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_road_width")]
    pub road_width: f32,
    #[serde(default = "default_sidewalk_width")]
    pub sidewalk_width: f32,
    #[serde(default = "default_curb_height")]
    pub curb_height: f32,
    #[serde(default)]
    pub surface_y: f32,
    #[serde(default = "default_step")]
    pub step: f32,
    #[serde(default = "default_start_z")]
    pub start_z: f32,
    #[serde(default = "default_end_z")]
    pub end_z: f32,
}

fn default_name() -> String {
    "Untitled".to_string()
}

fn default_road_width() -> f32 {
    5.0
}

fn default_sidewalk_width() -> f32 {
    1.5
}

fn default_curb_height() -> f32 {
    0.15
}

fn default_step() -> f32 {
    1.0
}

fn default_start_z() -> f32 {
    10.0
}

fn default_end_z() -> f32 {
    -1000.0
}

impl MapConfig {
    pub fn gentle() -> Self {
        Self {
            name: "Gentle Bends".to_string(),
            road_width: default_road_width(),
            sidewalk_width: default_sidewalk_width(),
            curb_height: default_curb_height(),
            surface_y: 0.0,
            step: default_step(),
            start_z: default_start_z(),
            end_z: default_end_z(),
        }
    }

    pub fn complex() -> Self {
        Self {
            name: "Winding Avenue".to_string(),
            road_width: 6.0,
            step: 0.5,
            ..Self::gentle()
        }
    }

    pub fn track_spec(&self, variant: CurveVariant) -> TrackSpec {
        TrackSpec {
            variant,
            road_width: self.road_width,
            sidewalk_width: self.sidewalk_width,
            curb_height: self.curb_height,
            surface_y: self.surface_y,
            step: self.step,
            start_z: self.start_z,
            end_z: self.end_z,
        }
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.into(),
    }
}

fn require_finite(field: &str, values: &[f32]) -> Result<(), ConfigError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(invalid(field, "must be a finite number"))
    }
}

fn require_positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive, got {value}")))
    }
}

impl GameConfig {
    /// Load and validate a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    /// The config shipped in `assets/config.toml`, embedded at build time.
    pub fn load_builtin() -> Result<Self, ConfigError> {
        Self::parse(BUILTIN_CONFIG, "built-in config")
    }

    pub fn parse(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn map(&self, variant: CurveVariant) -> &MapConfig {
        match variant {
            CurveVariant::Gentle => &self.maps.gentle,
            CurveVariant::Complex => &self.maps.complex,
        }
    }

    pub fn track_spec(&self, variant: CurveVariant) -> TrackSpec {
        self.map(variant).track_spec(variant)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        require_finite(
            "simulation",
            &[sim.speed, sim.rot_speed, sim.collision_radius],
        )?;
        if sim.tick_ms == 0 {
            return Err(invalid("simulation.tick_ms", "must be at least 1"));
        }
        require_positive("simulation.speed", sim.speed)?;
        require_positive("simulation.rot_speed", sim.rot_speed)?;
        if sim.collision_radius < 0.0 {
            return Err(invalid("simulation.collision_radius", "must not be negative"));
        }

        let cam = &self.camera;
        require_finite(
            "camera",
            &[cam.distance, cam.height, cam.fov_degrees, cam.near, cam.far],
        )?;
        require_positive("camera.near", cam.near)?;
        if cam.far <= cam.near {
            return Err(invalid("camera.far", "must be beyond camera.near"));
        }
        if !(cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0) {
            return Err(invalid("camera.fov_degrees", "must be between 0 and 180"));
        }

        let lights = &self.lights;
        require_finite(
            "lights",
            &[
                lights.spacing,
                lights.arm_offset,
                lights.bulb_height,
                lights.constant,
                lights.linear,
                lights.quadratic,
                lights.intensity,
            ],
        )?;
        require_finite("lights.color", &lights.color)?;
        require_positive("lights.spacing", lights.spacing)?;
        require_positive("lights.constant", lights.constant)?;
        if lights.linear < 0.0 || lights.quadratic < 0.0 {
            return Err(invalid("lights", "attenuation terms must not be negative"));
        }

        for variant in CurveVariant::ALL {
            let field = format!("maps.{}", variant.label());
            let map = self.map(variant);
            require_finite(
                &field,
                &[
                    map.road_width,
                    map.sidewalk_width,
                    map.curb_height,
                    map.surface_y,
                    map.step,
                    map.start_z,
                    map.end_z,
                ],
            )?;
            require_positive(&format!("{field}.step"), map.step)?;
            if map.start_z <= map.end_z {
                return Err(invalid(field, "start_z must be greater than end_z"));
            }
            if map.road_width <= 2.0 * sim.collision_radius {
                return Err(invalid(
                    field,
                    format!(
                        "road_width {} leaves no room for a car of radius {}",
                        map.road_width, sim.collision_radius
                    ),
                ));
            }
            if map.sidewalk_width < 0.0 || map.curb_height < 0.0 {
                return Err(invalid(field, "sidewalk_width and curb_height must not be negative"));
            }
        }

        Ok(())
    }
}
