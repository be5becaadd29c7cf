// src/iteration/mod.rs — Spec mutation: iterate strategies and switch
//
// Both operations go through the store's optimistic-concurrency gate and
// record an immutable Iteration with full before/after snapshots.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use crate::infra::errors::AtelierError;
use crate::model::{
    DesignObject, Iteration, IterationKind, SwitchTarget, SwitchUpdate,
};
use crate::store::VersionedSpecStore;

/// Material upgrade ladder used by `auto_optimize` (and walked backwards
/// by `cost_trim`). Materials off the ladder are left alone.
const UPGRADES: &[(&str, &str)] = &[
    ("cotton", "linen"),
    ("linen", "velvet"),
    ("pine", "oak"),
    ("oak", "walnut"),
    ("laminate", "oak"),
    ("steel", "brass"),
    ("tile", "marble"),
];

pub const STRATEGIES: &[&str] = &["auto_optimize", "cost_trim"];

pub struct IterationEngine {
    store: Arc<VersionedSpecStore>,
    log: Mutex<Vec<Iteration>>,
}

impl IterationEngine {
    pub fn new(store: Arc<VersionedSpecStore>) -> Self {
        Self {
            store,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Apply a named improvement strategy. Unknown names fail with a
    /// validation error before any mutation is attempted. `advisory` is
    /// appended to the recorded feedback text when present.
    pub fn iterate(
        &self,
        spec_id: Uuid,
        strategy: &str,
        expected_version: u32,
        advisory: Option<&str>,
    ) -> Result<Iteration, AtelierError> {
        if !STRATEGIES.contains(&strategy) {
            return Err(AtelierError::Validation(format!(
                "Unknown strategy '{strategy}' (available: {})",
                STRATEGIES.join(", ")
            )));
        }

        let mut touched = 0usize;
        let (before, after) = self.store.apply_mutation(spec_id, expected_version, |spec| {
            let mut objects = spec.objects.clone();
            for object in &mut objects {
                let next = match strategy {
                    "auto_optimize" => upgrade(&object.material),
                    "cost_trim" => downgrade(&object.material),
                    _ => unreachable!("strategy validated above"),
                };
                if let Some(next) = next {
                    object.material = next.to_string();
                    touched += 1;
                }
            }
            Ok(objects)
        })?;

        let mut feedback = format!(
            "Applied strategy '{strategy}': adjusted material on {touched} object(s), \
             cost {:+.2}",
            after.total_cost - before.total_cost
        );
        if let Some(advisory) = advisory {
            feedback.push_str("; advisory: ");
            feedback.push_str(advisory);
        }

        let iteration = self.record(
            IterationKind::Iterate,
            &before,
            &after,
            feedback,
            None,
            None,
        );
        Ok(iteration)
    }

    /// Replace fields on the targeted objects only. Target resolution:
    /// exact object id when given, otherwise substring match of the query
    /// against object kind or id, in object-list order.
    pub fn switch(
        &self,
        spec_id: Uuid,
        target: SwitchTarget,
        update: SwitchUpdate,
        expected_version: u32,
    ) -> Result<(Iteration, Vec<String>), AtelierError> {
        if update.is_empty() {
            return Err(AtelierError::Validation(
                "Switch update must set at least one of material, color, texture".into(),
            ));
        }
        if target.object_id.is_none() && target.object_query.is_none() {
            return Err(AtelierError::Validation(
                "Switch target must set object_id or object_query".into(),
            ));
        }

        let query = target
            .object_id
            .clone()
            .or_else(|| target.object_query.clone())
            .unwrap_or_default();

        let mut changed: Vec<String> = Vec::new();
        let (before, after) = self.store.apply_mutation(spec_id, expected_version, |spec| {
            let mut objects = spec.objects.clone();
            let matched = resolve_target(&objects, &target);
            if matched.is_empty() {
                return Err(AtelierError::ObjectNotFound {
                    query: query.clone(),
                });
            }

            for idx in &matched {
                let object = &mut objects[*idx];
                if let Some(ref material) = update.material {
                    object.material = material.clone();
                }
                if let Some(ref color) = update.color_hex {
                    object.color_hex = color.clone();
                }
                if let Some(ref texture) = update.texture {
                    object.texture = Some(texture.clone());
                }
                changed.push(object.id.clone());
            }
            Ok(objects)
        })?;

        let feedback = format!(
            "Switched {} object(s) matching '{}', cost {:+.2}",
            changed.len(),
            query,
            after.total_cost - before.total_cost
        );

        let iteration = self.record(
            IterationKind::Switch,
            &before,
            &after,
            feedback,
            Some(target),
            Some(update),
        );
        Ok((iteration, changed))
    }

    pub fn iterations_for(&self, spec_id: Uuid) -> Vec<Iteration> {
        let log = self.log.lock().expect("iteration log poisoned");
        log.iter().filter(|i| i.spec_id == spec_id).cloned().collect()
    }

    fn record(
        &self,
        kind: IterationKind,
        before: &crate::model::DesignSpecification,
        after: &crate::model::DesignSpecification,
        feedback: String,
        target: Option<SwitchTarget>,
        update: Option<SwitchUpdate>,
    ) -> Iteration {
        let iteration = Iteration {
            id: Uuid::new_v4(),
            spec_id: before.id,
            kind,
            base_version: before.version,
            resulting_version: after.version,
            before: before.objects.clone(),
            after: after.objects.clone(),
            cost_delta: after.total_cost - before.total_cost,
            feedback,
            target,
            update,
            created_at: Utc::now(),
        };

        let mut log = self.log.lock().expect("iteration log poisoned");
        log.push(iteration.clone());
        iteration
    }
}

fn upgrade(material: &str) -> Option<&'static str> {
    let material = material.to_lowercase();
    UPGRADES
        .iter()
        .find(|(from, _)| *from == material)
        .map(|(_, to)| *to)
}

fn downgrade(material: &str) -> Option<&'static str> {
    let material = material.to_lowercase();
    UPGRADES
        .iter()
        .find(|(_, to)| *to == material)
        .map(|(from, _)| *from)
}

/// Indices of objects the target selects, in object-list order.
fn resolve_target(objects: &[DesignObject], target: &SwitchTarget) -> Vec<usize> {
    if let Some(ref id) = target.object_id {
        return objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.id == *id)
            .map(|(i, _)| i)
            .collect();
    }

    let Some(ref query) = target.object_query else {
        return Vec::new();
    };
    let query = query.to_lowercase();
    objects
        .iter()
        .enumerate()
        .filter(|(_, o)| {
            o.kind.to_lowercase().contains(&query) || o.id.to_lowercase().contains(&query)
        })
        .map(|(i, _)| i)
        .collect()
}
