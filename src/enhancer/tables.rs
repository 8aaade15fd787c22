//! Design knowledge tables
//! Static vocabularies for room types, styles, materials, colors and lighting

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

/// Canonical room and space categories
pub const ROOM_TYPES: &[&str] = &[
    "living room",
    "bedroom",
    "kitchen",
    "bathroom",
    "home office",
    "dining room",
    "entryway",
    "hallway",
    "library",
    "children's room",
    "nursery",
    "studio apartment",
    "loft",
    "master suite",
    "guest room",
    "walk-in closet",
    "laundry room",
    "sunroom",
    "conservatory",
];

/// Canonical design style descriptors
pub const DESIGN_STYLES: &[&str] = &[
    "modern",
    "minimalist",
    "Scandinavian",
    "industrial",
    "mid-century modern",
    "bohemian",
    "traditional",
    "rustic",
    "contemporary",
    "Art Deco",
    "farmhouse",
    "coastal",
    "Japanese",
    "Mediterranean",
    "eclectic",
    "Victorian",
    "transitional",
    "tropical",
    "neoclassical",
    "Georgian",
];

/// Canonical material descriptors
pub const MATERIALS: &[&str] = &[
    "marble",
    "hardwood",
    "exposed brick",
    "concrete",
    "glass",
    "leather",
    "velvet",
    "brass",
    "copper",
    "stainless steel",
    "ceramic tile",
    "terrazzo",
    "natural stone",
    "rattan",
    "bamboo",
    "quartz",
    "granite",
    "reclaimed wood",
    "porcelain",
    "travertine",
];

/// Color palettes (offered to clients, not used for enhancement)
pub const COLORS: &[&str] = &[
    "neutral tones",
    "monochromatic",
    "earth tones",
    "pastels",
    "bold and vibrant",
    "black and white",
    "navy and gold",
    "sage green",
    "terracotta",
    "blues and greens",
    "warm grays",
    "cool grays",
    "jewel tones",
    "muted colors",
    "high contrast",
    "complementary colors",
];

/// Canonical lighting descriptors
pub const LIGHTING_TYPES: &[&str] = &[
    "ambient lighting",
    "pendant lights",
    "recessed lighting",
    "natural light",
    "floor lamps",
    "table lamps",
    "chandelier",
    "sconces",
    "track lighting",
    "cove lighting",
    "LED strips",
    "under-cabinet lighting",
    "skylight",
    "task lighting",
    "statement lighting",
    "diffused lighting",
];

/// The five attribute vocabularies consulted by the enhancer.
///
/// Entries keep their display casing; matching lower-cases both sides.
/// Serializes to the shape returned by `GET /api/design-suggestions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeTables {
    #[serde(rename = "roomTypes")]
    pub room_types: Vec<String>,
    #[serde(rename = "designStyles")]
    pub styles: Vec<String>,
    pub materials: Vec<String>,
    pub colors: Vec<String>,
    pub lighting: Vec<String>,
}

impl KnowledgeTables {
    /// Build the built-in tables
    pub fn standard() -> Self {
        Self {
            room_types: to_owned_list(ROOM_TYPES),
            styles: to_owned_list(DESIGN_STYLES),
            materials: to_owned_list(MATERIALS),
            colors: to_owned_list(COLORS),
            lighting: to_owned_list(LIGHTING_TYPES),
        }
    }

    /// Process-wide shared copy of the built-in tables
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<KnowledgeTables>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(Self::standard())).clone()
    }
}

impl Default for KnowledgeTables {
    fn default() -> Self {
        Self::standard()
    }
}

fn to_owned_list(entries: &[&str]) -> Vec<String> {
    entries.iter().map(|e| e.to_string()).collect()
}

/// Case-insensitive check whether `lowered` contains any table entry.
/// `lowered` must already be lower-cased.
pub fn mentions_any(lowered: &str, entries: &[String]) -> bool {
    entries
        .iter()
        .any(|entry| lowered.contains(entry.to_lowercase().as_str()))
}
