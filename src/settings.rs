//! Simulation settings
//!
//! Plain serializable data. Validation happens once, when the settings are
//! turned into a `SimContext` and a grid.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::consts::*;
use crate::error::{Result, SimError};
use crate::sim::brane::GridSpec;
use crate::sim::context::{Pbc, SimContext};
use crate::sim::tractor::BeamParams;
use crate::sim::wavelet::PulseParams;

/// Field grid resolution presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GridQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl GridQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridQuality::Low => "Low",
            GridQuality::Medium => "Medium",
            GridQuality::High => "High",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(GridQuality::Low),
            "medium" | "med" => Some(GridQuality::Medium),
            "high" => Some(GridQuality::High),
            _ => None,
        }
    }

    /// World units per grid cell
    pub fn cell_size(&self) -> f32 {
        match self {
            GridQuality::Low => 2.0 * GRID_CELL,
            GridQuality::Medium => GRID_CELL,
            GridQuality::High => 0.5 * GRID_CELL,
        }
    }
}

/// Boundary handling, without the size (that lives in `world_size`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BoundaryMode {
    None,
    #[default]
    Toroidal,
}

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pbc: BoundaryMode,
    /// Side length of the periodic cell
    pub world_size: Option<f32>,
    /// Per-step displacement cap as a fraction of the world size
    pub max_step_fraction: Option<f32>,

    // === Field grid ===
    pub grid_quality: GridQuality,
    /// Side length of the sampled region around the player
    pub grid_extent: f32,

    // === Gameplay ===
    /// RNG seed for hazard placement and spin
    pub seed: u64,
    /// Hazard count before any score bonus
    pub base_hazards: u32,

    // === Wavelet presets ===
    pub pulse: PulseParams,
    pub beam: BeamParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pbc: BoundaryMode::Toroidal,
            world_size: Some(WORLD_SIZE),
            max_step_fraction: None,

            grid_quality: GridQuality::Medium,
            grid_extent: WORLD_SIZE,

            seed: 0,
            base_hazards: BASE_HAZARDS,

            pulse: PulseParams::default(),
            beam: BeamParams::default(),
        }
    }
}

impl Settings {
    /// Create settings from a grid quality preset
    pub fn from_preset(preset: GridQuality) -> Self {
        Self {
            grid_quality: preset,
            ..Self::default()
        }
    }

    /// Open (non-periodic) boundaries
    pub fn open() -> Self {
        Self {
            pbc: BoundaryMode::None,
            world_size: None,
            ..Self::default()
        }
    }

    /// Validate into the immutable context every operation receives
    pub fn context(&self) -> Result<SimContext> {
        let pbc = match self.pbc {
            BoundaryMode::None => Pbc::None,
            BoundaryMode::Toroidal => Pbc::Toroidal {
                size: self.world_size.ok_or(SimError::MissingWorldSize)?,
            },
        };
        let ctx = SimContext::new(pbc)?;
        match self.max_step_fraction {
            Some(fraction) => ctx.with_max_step_fraction(fraction),
            None => Ok(ctx),
        }
    }

    /// Grid of the configured quality centred at `center`
    pub fn grid_spec(&self, center: Vec2) -> Result<GridSpec> {
        SimError::require_positive("grid_extent", self.grid_extent)?;
        let resolution = (self.grid_extent / self.grid_quality.cell_size()).ceil().max(1.0) as usize;
        GridSpec::new(resolution, self.grid_extent, center)
    }

    /// Check every field without building anything
    pub fn validate(&self) -> Result<()> {
        self.context()?;
        self.grid_spec(Vec2::ZERO)?;
        self.pulse.validate()?;
        self.beam.validate()
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_names() {
        for q in [GridQuality::Low, GridQuality::Medium, GridQuality::High] {
            assert_eq!(GridQuality::from_name(q.as_str()), Some(q));
        }
        assert_eq!(GridQuality::from_name("med"), Some(GridQuality::Medium));
        assert_eq!(GridQuality::from_name("ultra"), None);
    }

    #[test]
    fn test_default_context_is_toroidal() {
        let ctx = Settings::default().context().unwrap();
        assert_eq!(ctx.world_size(), Some(WORLD_SIZE));
        assert!(Settings::open().context().unwrap().world_size().is_none());
    }

    #[test]
    fn test_context_fails_fast() {
        let missing = Settings {
            world_size: None,
            ..Settings::default()
        };
        assert!(matches!(missing.context(), Err(SimError::MissingWorldSize)));

        let negative = Settings {
            world_size: Some(-5.0),
            ..Settings::default()
        };
        assert!(matches!(negative.context(), Err(SimError::InvalidWorldSize(_))));

        let bad_step = Settings {
            max_step_fraction: Some(0.0),
            ..Settings::default()
        };
        assert!(bad_step.context().is_err());
    }

    #[test]
    fn test_grid_spec_resolution() {
        let grid = Settings::from_preset(GridQuality::Low)
            .grid_spec(Vec2::splat(300.0))
            .unwrap();
        assert_eq!(grid.resolution, 75);
        assert_eq!(grid.center, Vec2::splat(300.0));

        let high = Settings::from_preset(GridQuality::High).grid_spec(Vec2::ZERO).unwrap();
        assert_eq!(high.resolution, 300);
    }

    #[test]
    fn test_json_roundtrip_through_file() {
        let path = std::env::temp_dir().join(format!("brane-space-settings-{}.json", std::process::id()));
        let settings = Settings {
            seed: 42,
            grid_quality: GridQuality::High,
            max_step_fraction: Some(0.25),
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "seed": 9 }"#).unwrap();
        assert_eq!(settings.seed, 9);
        assert_eq!(settings.base_hazards, BASE_HAZARDS);
        assert_eq!(settings.pbc, BoundaryMode::Toroidal);
    }
}
