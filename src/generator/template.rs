// src/generator/template.rs — Deterministic template object graphs
//
// The fallback arm of the provider chain. One fixed graph per building
// type, colored by style palette. Identical inputs always produce an
// identical graph.

use crate::model::{DesignObject, Dimensions};

/// Style → (primary, accent) colors. Unknown styles use the neutral palette.
const PALETTES: &[(&str, (&str, &str))] = &[
    ("modern", ("#2E2E2E", "#C0C0C0")),
    ("minimalist", ("#FAFAFA", "#D6D6D6")),
    ("industrial", ("#4A4A4A", "#8B5A2B")),
    ("scandinavian", ("#F5F0E8", "#A3B18A")),
    ("rustic", ("#8B5A2B", "#DEB887")),
    ("classic", ("#F8F4E3", "#7B3F00")),
    ("bohemian", ("#C06014", "#536162")),
];

const NEUTRAL: (&str, &str) = ("#EAEAEA", "#9E9E9E");

fn palette(style: Option<&str>) -> (&'static str, &'static str) {
    style
        .and_then(|s| {
            PALETTES
                .iter()
                .find(|(name, _)| *name == s.to_lowercase())
                .map(|(_, p)| *p)
        })
        .unwrap_or(NEUTRAL)
}

fn object(
    id: &str,
    kind: &str,
    material: &str,
    color: &str,
    dims: (f64, f64, f64),
) -> DesignObject {
    DesignObject {
        id: id.to_string(),
        kind: kind.to_string(),
        material: material.to_string(),
        color_hex: color.to_string(),
        texture: None,
        dimensions: Dimensions::new(dims.0, dims.1, dims.2),
        cost: 0.0,
    }
}

/// Instantiate the fixed template graph for a building type.
/// Unknown types get the generic room template.
pub fn objects_for(building_type: &str, style: Option<&str>) -> Vec<DesignObject> {
    let (primary, accent) = palette(style);

    match building_type.to_lowercase().as_str() {
        "living room" => vec![
            object("floor", "floor", "oak", primary, (0.0, 0.0, 0.02)),
            object("sofa", "sofa", "cotton", accent, (2.2, 0.9, 0.8)),
            object("coffee_table", "coffee_table", "oak", primary, (1.1, 0.6, 0.45)),
            object("rug", "rug", "wool", accent, (2.0, 1.4, 0.01)),
            object("lamp", "lamp", "steel", accent, (0.3, 0.3, 1.5)),
        ],
        "bedroom" => vec![
            object("floor", "floor", "laminate", primary, (0.0, 0.0, 0.02)),
            object("bed", "bed", "pine", accent, (2.0, 1.6, 0.5)),
            object("wardrobe", "wardrobe", "pine", primary, (2.0, 0.6, 2.2)),
            object("lamp", "lamp", "brass", accent, (0.25, 0.25, 0.5)),
        ],
        "kitchen" => vec![
            object("floor", "floor", "tile", primary, (0.0, 0.0, 0.02)),
            object("kitchen_island", "kitchen_island", "oak", accent, (2.4, 1.0, 0.9)),
            object("dining_table", "dining_table", "oak", primary, (1.8, 0.9, 0.75)),
        ],
        "bathroom" => vec![
            object("floor", "floor", "tile", primary, (0.0, 0.0, 0.02)),
            object("bathtub", "bathtub", "acrylic", accent, (1.7, 0.8, 0.6)),
        ],
        "office" | "studio" => vec![
            object("floor", "floor", "laminate", primary, (0.0, 0.0, 0.02)),
            object("desk", "desk", "oak", accent, (1.6, 0.8, 0.75)),
            object("bookshelf", "bookshelf", "pine", primary, (1.0, 0.35, 2.0)),
            object("lamp", "lamp", "steel", accent, (0.25, 0.25, 0.45)),
        ],
        // Whole-dwelling and unrecognized types share the generic template.
        _ => vec![
            object("floor", "floor", "oak", primary, (0.0, 0.0, 0.02)),
            object("sofa", "sofa", "cotton", accent, (2.2, 0.9, 0.8)),
            object("dining_table", "dining_table", "oak", primary, (1.8, 0.9, 0.75)),
            object("lamp", "lamp", "steel", accent, (0.3, 0.3, 1.5)),
        ],
    }
}
