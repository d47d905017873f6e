use serde::{Deserialize, Serialize};

/// Initial opacity of each layer category, applied once the first paint pass
/// is done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultOpacity {
    pub tracks: f32,
    pub vias: f32,
    pub pads: f32,
    pub holes: f32,
    pub zones: f32,
    pub grid: f32,
    pub page: f32,
}

impl Default for DefaultOpacity {
    fn default() -> Self {
        Self {
            tracks: 1.0,
            vias: 1.0,
            pads: 1.0,
            holes: 1.0,
            zones: 0.25,
            grid: 1.0,
            page: 1.0,
        }
    }
}

/// Viewer settings, passed in at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub default_opacity: DefaultOpacity,
    /// Grid pitch in mm. Non-positive disables the grid.
    pub grid_spacing: f64,
    /// Pick slop in screen pixels.
    pub pick_tolerance: f64,
    /// Fraction of the board extent added around it by `zoom_to_board`.
    pub fit_margin: f64,
    /// Padding around the selection box, in mm.
    pub selection_padding: f64,
    /// Stroke width of the selection outline, in mm.
    pub selection_stroke: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_opacity: DefaultOpacity::default(),
            grid_spacing: 2.54,
            pick_tolerance: 0.0,
            fit_margin: 0.1,
            selection_padding: 0.25,
            selection_stroke: 0.1,
        }
    }
}

impl ViewerConfig {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
