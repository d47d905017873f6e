use serde::{Deserialize, Serialize};

/// Canonical board layer names.
pub mod names {
    pub const F_CU: &str = "F.Cu";
    pub const B_CU: &str = "B.Cu";
    pub const F_ADHES: &str = "F.Adhes";
    pub const B_ADHES: &str = "B.Adhes";
    pub const F_PASTE: &str = "F.Paste";
    pub const B_PASTE: &str = "B.Paste";
    pub const F_SILKS: &str = "F.SilkS";
    pub const B_SILKS: &str = "B.SilkS";
    pub const F_MASK: &str = "F.Mask";
    pub const B_MASK: &str = "B.Mask";
    pub const F_CRTYD: &str = "F.CrtYd";
    pub const B_CRTYD: &str = "B.CrtYd";
    pub const F_FAB: &str = "F.Fab";
    pub const B_FAB: &str = "B.Fab";
    pub const DWGS_USER: &str = "Dwgs.User";
    pub const CMTS_USER: &str = "Cmts.User";
    pub const ECO1_USER: &str = "Eco1.User";
    pub const ECO2_USER: &str = "Eco2.User";
    pub const EDGE_CUTS: &str = "Edge.Cuts";
    pub const MARGIN: &str = "Margin";
}

/// The kind of a layer declared in the board's layer table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardLayerKind {
    #[default]
    Signal,
    Power,
    Mixed,
    Jumper,
    User,
}

/// An entry in the board's layer table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardLayer {
    pub ordinal: u32,
    pub canonical_name: String,
    #[serde(default)]
    pub kind: BoardLayerKind,
    #[serde(default)]
    pub user_name: Option<String>,
}

impl BoardLayer {
    pub fn new(ordinal: u32, canonical_name: &str, kind: BoardLayerKind) -> Self {
        Self {
            ordinal,
            canonical_name: canonical_name.to_string(),
            kind,
            user_name: None,
        }
    }

    pub fn is_copper(&self) -> bool {
        is_copper(&self.canonical_name)
    }
}

pub fn is_copper(name: &str) -> bool {
    name.ends_with(".Cu") && !name.starts_with('*')
}

/// Name of the inner copper layer `n` (1-based).
pub fn inner_copper_name(n: usize) -> String {
    format!("In{n}.Cu")
}

/// Name of the `n`th user layer (1-based).
pub fn user_layer_name(n: usize) -> String {
    format!("User.{n}")
}

/// Whether a (possibly wildcard) layer pattern selects `name`.
///
/// Supports `*.Cu`-style wildcards and the `F&B.Cu` shorthand used in pad
/// layer lists.
pub fn layer_matches(pattern: &str, name: &str) -> bool {
    if pattern == name {
        return true;
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        return name.ends_with(suffix) && !name.starts_with('*');
    }
    if let Some(suffix) = pattern.strip_prefix("F&B") {
        return name == format!("F{suffix}") || name == format!("B{suffix}");
    }
    false
}

/// Layers that count toward the printed outline of a board: copper or silk
/// on either face, excluding fabrication-only layers.
pub fn is_printed_face_layer(name: &str) -> bool {
    (name.starts_with("F.") || name.starts_with("B.")) && !name.ends_with("Fab")
}

/// Number of copper layers described by a layer table (at least two).
pub fn copper_layer_count(layers: &[BoardLayer]) -> usize {
    layers.iter().filter(|l| l.is_copper()).count().max(2)
}

/// Copper layer names front to back: `F.Cu`, `In1.Cu`, …, `B.Cu`.
pub fn copper_layer_names(count: usize) -> Vec<String> {
    let inner = count.saturating_sub(2);
    let mut names = Vec::with_capacity(inner + 2);
    names.push(names::F_CU.to_string());
    names.extend((1..=inner).map(inner_copper_name));
    names.push(names::B_CU.to_string());
    names
}
