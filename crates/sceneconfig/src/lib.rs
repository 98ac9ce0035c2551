use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Largest lattice accepted, in points. Keeps every flattened vertex index
/// (and its `+ amount_y` neighbour) inside `u32`.
pub const MAX_GRID_POINTS: u64 = 1 << 22;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialise configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Scene settings loaded from TOML. Every section and field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SceneConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub grid: GridSection,
    #[serde(default)]
    pub wave: WaveSection,
    #[serde(default)]
    pub camera: CameraSection,
    #[serde(default)]
    pub mesh: MeshSection,
    #[serde(default)]
    pub colors: ColorSection,
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub render: RenderSection,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            grid: GridSection::default(),
            wave: WaveSection::default(),
            camera: CameraSection::default(),
            mesh: MeshSection::default(),
            colors: ColorSection::default(),
            window: WindowSection::default(),
            render: RenderSection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GridSection {
    pub amount_x: u32,
    pub amount_y: u32,
    pub separation: f64,
}

impl Default for GridSection {
    fn default() -> Self {
        Self {
            amount_x: 40,
            amount_y: 40,
            separation: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WaveSection {
    pub amplitude: f64,
    pub frequency_x: f64,
    pub frequency_y: f64,
    pub phase_step: f64,
    pub time_step: f64,
}

impl Default for WaveSection {
    fn default() -> Self {
        Self {
            amplitude: 50.0,
            frequency_x: 0.2,
            frequency_y: 0.3,
            phase_step: 0.02,
            time_step: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraSection {
    pub fov_deg: f64,
    pub near: f64,
    pub far: f64,
    pub height: f64,
    pub distance: f64,
    pub smoothing: f64,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            fov_deg: 45.0,
            near: 1.0,
            far: 10_000.0,
            height: -100.0,
            distance: 1500.0,
            smoothing: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MeshSection {
    pub offset_y: f64,
    pub tilt: f64,
}

impl Default for MeshSection {
    fn default() -> Self {
        Self {
            offset_y: -400.0,
            tilt: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ColorSection {
    pub base: HexColor,
    pub background: HexColor,
}

impl Default for ColorSection {
    fn default() -> Self {
        Self {
            base: HexColor(0x7b2fff),
            background: HexColor(0x0a0014),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSection {
    pub width: u32,
    pub height: u32,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSection {
    /// Frame cap; absent or `0` renders at display cadence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    #[serde(
        deserialize_with = "deserialize_antialias_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub antialias: Option<AntialiasSetting>,
}

/// Packed `0xRRGGBB` color, written as `"#rrggbb"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(pub u32);

impl HexColor {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl FromStr for HexColor {
    type Err = String;

    /// Accepts `#rrggbb`, `0xrrggbb` or bare `rrggbb`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix('#')
            .or_else(|| trimmed.strip_prefix("0x"))
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.len() != 6 || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(format!(
                "invalid color '{raw}'; expected '#rrggbb' or '0xrrggbb'"
            ));
        }
        u32::from_str_radix(digits, 16)
            .map(HexColor)
            .map_err(|err| format!("invalid color '{raw}': {err}"))
    }
}

impl Serialize for HexColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Visitor;
        impl<'de> de::Visitor<'de> for Visitor {
            type Value = HexColor;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a color as '#rrggbb', '0xrrggbb' or an integer")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if !(0..=0xff_ffff).contains(&v) {
                    return Err(E::custom(format!("color {v:#x} is out of range")));
                }
                Ok(HexColor(v as u32))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if v > 0xff_ffff {
                    return Err(E::custom(format!("color {v:#x} is out of range")));
                }
                Ok(HexColor(v as u32))
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntialiasSetting {
    Auto,
    Off,
    Samples2,
    Samples4,
    Samples8,
    Samples16,
}

impl AntialiasSetting {
    pub fn from_samples(samples: u32) -> Option<Self> {
        match samples {
            0 | 1 => Some(Self::Off),
            2 => Some(Self::Samples2),
            4 => Some(Self::Samples4),
            8 => Some(Self::Samples8),
            16 => Some(Self::Samples16),
            _ => None,
        }
    }

    /// Requested MSAA sample count; `None` for automatic selection.
    pub fn samples(self) -> Option<u32> {
        match self {
            Self::Auto => None,
            Self::Off => Some(1),
            Self::Samples2 => Some(2),
            Self::Samples4 => Some(4),
            Self::Samples8 => Some(8),
            Self::Samples16 => Some(16),
        }
    }
}

impl fmt::Display for AntialiasSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Off => f.write_str("off"),
            other => write!(f, "{}", other.samples().unwrap_or(1)),
        }
    }
}

impl FromStr for AntialiasSetting {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        parse_antialias(raw)
    }
}

impl Serialize for AntialiasSetting {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

fn default_version() -> u32 {
    1
}

fn deserialize_antialias_opt<'de, D>(deserializer: D) -> Result<Option<AntialiasSetting>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Num(i64),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    let result = match helper {
        None => None,
        Some(Helper::Str(raw)) => Some(parse_antialias(&raw).map_err(de::Error::custom)?),
        Some(Helper::Num(value)) => {
            if value < 0 {
                return Err(de::Error::custom("antialias value must be non-negative"));
            }
            Some(parse_antialias(&value.to_string()).map_err(de::Error::custom)?)
        }
    };
    Ok(result)
}

fn parse_antialias(raw: &str) -> Result<AntialiasSetting, String> {
    let normalized = raw.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" | "max" | "default" => Ok(AntialiasSetting::Auto),
        "off" | "none" | "disable" | "disabled" | "0" | "1" => Ok(AntialiasSetting::Off),
        "2" => Ok(AntialiasSetting::Samples2),
        "4" => Ok(AntialiasSetting::Samples4),
        "8" => Ok(AntialiasSetting::Samples8),
        "16" => Ok(AntialiasSetting::Samples16),
        other => Err(format!("invalid antialias setting '{other}'")),
    }
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        let grid = &self.grid;
        if grid.amount_x < 2 || grid.amount_y < 2 {
            return Err(ConfigError::Invalid(format!(
                "grid must be at least 2x2 points, got {}x{}",
                grid.amount_x, grid.amount_y
            )));
        }
        let points = u64::from(grid.amount_x) * u64::from(grid.amount_y);
        if points > MAX_GRID_POINTS {
            return Err(ConfigError::Invalid(format!(
                "grid of {}x{} points exceeds the limit of {MAX_GRID_POINTS} points",
                grid.amount_x, grid.amount_y
            )));
        }
        if !is_positive(grid.separation) {
            return Err(ConfigError::Invalid(
                "grid.separation must be greater than zero".into(),
            ));
        }

        let wave = &self.wave;
        for (name, value) in [
            ("wave.amplitude", wave.amplitude),
            ("wave.frequency_x", wave.frequency_x),
            ("wave.frequency_y", wave.frequency_y),
            ("wave.phase_step", wave.phase_step),
            ("wave.time_step", wave.time_step),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be a finite number")));
            }
        }

        let camera = &self.camera;
        if !(camera.fov_deg > 0.0 && camera.fov_deg < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_deg must be between 0 and 180, got {}",
                camera.fov_deg
            )));
        }
        if !is_positive(camera.near) {
            return Err(ConfigError::Invalid(
                "camera.near must be greater than zero".into(),
            ));
        }
        if !(camera.far.is_finite() && camera.far > camera.near) {
            return Err(ConfigError::Invalid(format!(
                "camera.far ({}) must be greater than camera.near ({})",
                camera.far, camera.near
            )));
        }
        if !(camera.smoothing > 0.0 && camera.smoothing <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.smoothing must be in (0, 1], got {}",
                camera.smoothing
            )));
        }
        if !(camera.height.is_finite() && camera.distance.is_finite()) {
            return Err(ConfigError::Invalid(
                "camera.height and camera.distance must be finite".into(),
            ));
        }

        if !(self.mesh.offset_y.is_finite() && self.mesh.tilt.is_finite()) {
            return Err(ConfigError::Invalid(
                "mesh.offset_y and mesh.tilt must be finite".into(),
            ));
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }

        if let Some(fps) = self.render.fps {
            if !(fps.is_finite() && fps >= 0.0) {
                return Err(ConfigError::Invalid("render.fps must be >= 0".into()));
            }
        }

        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
