// src/budget/mod.rs — Budget → footprint resolution
//
// A fixed ascending tier table maps budgets to base footprints. Explicit
// dimensions from the prompt are honored unless they blow past the tier
// area, in which case they are scaled down to respect the budget.

use crate::infra::errors::AtelierError;
use crate::model::Footprint;
use crate::prompt::ExtractedFootprint;

/// (budget threshold, base footprint). Ascending by threshold; the last
/// tier also serves every budget above it, so resolution cannot fail.
const TIERS: &[(f64, Footprint)] = &[
    (
        25_000.0,
        Footprint {
            width_m: 6.0,
            length_m: 5.0,
            height_m: 2.6,
            stories: 1,
        },
    ),
    (
        75_000.0,
        Footprint {
            width_m: 9.0,
            length_m: 7.0,
            height_m: 2.8,
            stories: 1,
        },
    ),
    (
        200_000.0,
        Footprint {
            width_m: 14.0,
            length_m: 10.0,
            height_m: 3.0,
            stories: 1,
        },
    ),
    (
        600_000.0,
        Footprint {
            width_m: 20.0,
            length_m: 14.0,
            height_m: 3.2,
            stories: 2,
        },
    ),
];

/// How far an extracted footprint may exceed the tier area before it is
/// scaled back (50%).
const OVERSHOOT_RATIO: f64 = 1.5;

/// Resolve a budget and optional extracted dimensions into a concrete,
/// budget-bounded footprint. Always returns a defined footprint.
pub fn resolve(
    budget: Option<f64>,
    extracted: Option<ExtractedFootprint>,
) -> Result<Footprint, AtelierError> {
    let tier = select_tier(budget)?;

    let Some(ext) = extracted else {
        return Ok(tier);
    };

    let tier_area = tier.area_sqm();
    let ext_area = ext.width_m * ext.length_m;

    if ext_area <= 0.0 {
        // Degenerate extraction; fall back to the tier footprint.
        return Ok(tier);
    }

    let mut fp = Footprint {
        width_m: ext.width_m,
        length_m: ext.length_m,
        height_m: ext.height_m.unwrap_or(tier.height_m),
        stories: tier.stories,
    };

    if ext_area > tier_area * OVERSHOOT_RATIO {
        let scale = (tier_area / ext_area).sqrt();
        tracing::debug!(
            ext_area,
            tier_area,
            scale,
            "Extracted footprint exceeds budget tier, scaling down"
        );
        fp.width_m *= scale;
        fp.length_m *= scale;
    }

    Ok(fp)
}

/// Smallest tier whose threshold covers the budget; the largest tier for
/// anything above; the lowest tier when no budget was given.
fn select_tier(budget: Option<f64>) -> Result<Footprint, AtelierError> {
    let (_, lowest) = *TIERS.first().ok_or(AtelierError::BudgetTierUnresolved)?;

    let Some(budget) = budget else {
        return Ok(lowest);
    };

    for (threshold, footprint) in TIERS {
        if *threshold >= budget {
            return Ok(*footprint);
        }
    }

    let (_, largest) = *TIERS.last().ok_or(AtelierError::BudgetTierUnresolved)?;
    Ok(largest)
}
