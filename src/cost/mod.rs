// src/cost/mod.rs — Pure cost model
//
// total = area × stories × rate_per_sqm + Σ object premiums.
// No I/O, no side effects. The same model instance must be used across
// generate/iterate/switch so cost deltas stay meaningful.

use crate::model::{DesignObject, Footprint};

/// Object kinds that carry a premium on top of the base construction rate.
const KIND_PREMIUMS: &[(&str, f64)] = &[
    ("pool", 15_000.0),
    ("fireplace", 4_000.0),
    ("kitchen_island", 3_500.0),
    ("bathtub", 2_200.0),
    ("wardrobe", 1_200.0),
    ("sofa", 900.0),
    ("bed", 850.0),
    ("desk", 400.0),
    ("dining_table", 650.0),
    ("bookshelf", 350.0),
    ("armchair", 300.0),
    ("coffee_table", 250.0),
    ("lamp", 120.0),
    ("rug", 180.0),
];

/// Materials that carry a premium. Unlisted materials cost nothing extra.
const MATERIAL_PREMIUMS: &[(&str, f64)] = &[
    ("marble", 2_500.0),
    ("walnut", 900.0),
    ("oak", 600.0),
    ("leather", 500.0),
    ("brass", 450.0),
    ("glass", 400.0),
    ("velvet", 350.0),
    ("linen", 150.0),
    ("steel", 200.0),
];

#[derive(Debug, Clone)]
pub struct CostModel {
    pub rate_per_sqm: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self { rate_per_sqm: 850.0 }
    }
}

impl CostModel {
    pub fn new(rate_per_sqm: f64) -> Self {
        Self { rate_per_sqm }
    }

    /// Cost component of a single object: kind premium + material premium.
    pub fn object_cost(&self, object: &DesignObject) -> f64 {
        lookup(KIND_PREMIUMS, &object.kind) + lookup(MATERIAL_PREMIUMS, &object.material)
    }

    /// Total cost of a design. Recomputed on every mutation.
    pub fn total(&self, objects: &[DesignObject], footprint: &Footprint) -> f64 {
        let base = footprint.area_sqm() * footprint.stories as f64 * self.rate_per_sqm;
        let premiums: f64 = objects.iter().map(|o| self.object_cost(o)).sum();
        base + premiums
    }

    /// Stamp each object's cost component. Returns the repriced graph.
    pub fn reprice(&self, mut objects: Vec<DesignObject>) -> Vec<DesignObject> {
        for object in &mut objects {
            object.cost = self.object_cost(object);
        }
        objects
    }
}

fn lookup(table: &[(&str, f64)], key: &str) -> f64 {
    let key = key.to_lowercase();
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or(0.0)
}
