// src/store/mod.rs — Versioned spec store (optimistic concurrency)
//
// An arena keyed by spec id behind a single mutex. The version field is the
// sole admission control: a mutation carries the version its caller read,
// and loses if the stored version has moved. Retry is the caller's job.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use uuid::Uuid;

use crate::cost::CostModel;
use crate::infra::errors::AtelierError;
use crate::model::{DesignObject, DesignSpecification, SpecSummary};

pub struct VersionedSpecStore {
    specs: Mutex<HashMap<Uuid, DesignSpecification>>,
    cost: CostModel,
}

impl VersionedSpecStore {
    pub fn new(cost: CostModel) -> Self {
        Self {
            specs: Mutex::new(HashMap::new()),
            cost,
        }
    }

    /// Store a freshly generated or imported spec. Object ids must be unique
    /// within the spec; version is forced to 1 and the total cost restamped
    /// so the invariants hold no matter what the caller built.
    pub fn create(
        &self,
        mut spec: DesignSpecification,
    ) -> Result<DesignSpecification, AtelierError> {
        let mut ids: Vec<&str> = spec.objects.iter().map(|o| o.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.len() != spec.objects.len() {
            return Err(AtelierError::Validation(format!(
                "Duplicate object ids in spec {}",
                spec.id
            )));
        }

        spec.version = 1;
        spec.objects = self.cost.reprice(std::mem::take(&mut spec.objects));
        spec.total_cost = self.cost.total(&spec.objects, &spec.footprint);

        let mut specs = self.specs.lock().expect("spec store poisoned");
        specs.insert(spec.id, spec.clone());
        Ok(spec)
    }

    pub fn get(&self, id: Uuid) -> Result<DesignSpecification, AtelierError> {
        let specs = self.specs.lock().expect("spec store poisoned");
        specs
            .get(&id)
            .cloned()
            .ok_or(AtelierError::SpecNotFound { id })
    }

    /// All specs for an owner, newest update first.
    pub fn history(&self, owner_id: &str) -> Vec<SpecSummary> {
        let specs = self.specs.lock().expect("spec store poisoned");
        let mut summaries: Vec<SpecSummary> = specs
            .values()
            .filter(|s| s.owner_id == owner_id)
            .map(|s| s.summary())
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries
    }

    /// Apply a mutation under optimistic concurrency.
    ///
    /// `mutate` receives the current spec and returns the new object graph.
    /// On version match: objects are repriced, the total recomputed, version
    /// bumped by exactly 1. On mismatch: `VersionConflict`, nothing written.
    /// Returns (before, after) snapshots.
    pub fn apply_mutation<F>(
        &self,
        id: Uuid,
        expected_version: u32,
        mutate: F,
    ) -> Result<(DesignSpecification, DesignSpecification), AtelierError>
    where
        F: FnOnce(&DesignSpecification) -> Result<Vec<DesignObject>, AtelierError>,
    {
        let mut specs = self.specs.lock().expect("spec store poisoned");

        let current = specs
            .get(&id)
            .ok_or(AtelierError::SpecNotFound { id })?;

        if current.version != expected_version {
            return Err(AtelierError::VersionConflict {
                spec_id: id,
                expected: expected_version,
                actual: current.version,
            });
        }

        let new_objects = mutate(current)?;

        let before = current.clone();
        let mut after = before.clone();
        after.objects = self.cost.reprice(new_objects);
        after.total_cost = self.cost.total(&after.objects, &after.footprint);
        after.version = before.version + 1;
        after.updated_at = Utc::now();

        specs.insert(id, after.clone());

        tracing::debug!(
            spec_id = %id,
            from = before.version,
            to = after.version,
            "Mutation applied"
        );

        Ok((before, after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DesignParams, Dimensions, Footprint};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn sample_spec() -> DesignSpecification {
        DesignSpecification {
            id: Uuid::new_v4(),
            owner_id: "user-1".into(),
            project_id: "proj-1".into(),
            version: 1,
            prompt: "a bedroom".into(),
            params: DesignParams::default(),
            footprint: Footprint::new(6.0, 5.0, 2.6),
            objects: vec![DesignObject {
                id: "bed".into(),
                kind: "bed".into(),
                material: "pine".into(),
                color_hex: "#FFFFFF".into(),
                texture: None,
                dimensions: Dimensions::default(),
                cost: 0.0,
            }],
            total_cost: 0.0,
            generated_by: "deterministic".into(),
            parent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_stamps_version_and_cost() {
        let store = VersionedSpecStore::new(CostModel::default());
        let mut spec = sample_spec();
        spec.version = 7;
        spec.total_cost = -1.0;

        let stored = store.create(spec).unwrap();
        assert_eq!(stored.version, 1);
        let model = CostModel::default();
        assert_eq!(
            stored.total_cost,
            model.total(&stored.objects, &stored.footprint)
        );
    }

    #[test]
    fn test_create_rejects_duplicate_object_ids() {
        let store = VersionedSpecStore::new(CostModel::default());
        let mut spec = sample_spec();
        let dup = spec.objects[0].clone();
        spec.objects.push(dup);
        let id = spec.id;

        let err = store.create(spec).unwrap_err();
        assert!(matches!(err, AtelierError::Validation(_)));
        assert!(matches!(
            store.get(id),
            Err(AtelierError::SpecNotFound { .. })
        ));
    }

    #[test]
    fn test_get_missing_spec() {
        let store = VersionedSpecStore::new(CostModel::default());
        assert!(matches!(
            store.get(Uuid::new_v4()),
            Err(AtelierError::SpecNotFound { .. })
        ));
    }

    #[test]
    fn test_mutation_bumps_version_by_one() {
        let store = VersionedSpecStore::new(CostModel::default());
        let spec = store.create(sample_spec()).unwrap();

        let (before, after) = store
            .apply_mutation(spec.id, 1, |s| Ok(s.objects.clone()))
            .unwrap();

        assert_eq!(before.version, 1);
        assert_eq!(after.version, 2);
        assert_eq!(store.get(spec.id).unwrap().version, 2);
    }

    #[test]
    fn test_stale_version_rejected_without_write() {
        let store = VersionedSpecStore::new(CostModel::default());
        let spec = store.create(sample_spec()).unwrap();
        store
            .apply_mutation(spec.id, 1, |s| Ok(s.objects.clone()))
            .unwrap();

        let err = store
            .apply_mutation(spec.id, 1, |s| Ok(s.objects.clone()))
            .unwrap_err();
        assert!(matches!(
            err,
            AtelierError::VersionConflict {
                expected: 1,
                actual: 2,
                ..
            }
        ));
        assert_eq!(store.get(spec.id).unwrap().version, 2);
    }

    #[test]
    fn test_failing_mutate_fn_leaves_store_unchanged() {
        let store = VersionedSpecStore::new(CostModel::default());
        let spec = store.create(sample_spec()).unwrap();

        let err = store
            .apply_mutation(spec.id, 1, |_| {
                Err(AtelierError::Validation("bad strategy".into()))
            })
            .unwrap_err();
        assert!(matches!(err, AtelierError::Validation(_)));
        assert_eq!(store.get(spec.id).unwrap().version, 1);
    }

    #[test]
    fn test_cost_invariant_after_mutation() {
        let store = VersionedSpecStore::new(CostModel::default());
        let spec = store.create(sample_spec()).unwrap();

        let (_, after) = store
            .apply_mutation(spec.id, 1, |s| {
                let mut objects = s.objects.clone();
                objects[0].material = "walnut".into();
                Ok(objects)
            })
            .unwrap();

        let model = CostModel::default();
        assert_eq!(
            after.total_cost,
            model.total(&after.objects, &after.footprint)
        );
        // walnut premium over pine
        assert_eq!(after.objects[0].cost, 850.0 + 900.0);
    }

    #[test]
    fn test_concurrent_mutations_one_wins() {
        let store = Arc::new(VersionedSpecStore::new(CostModel::default()));
        let spec = store.create(sample_spec()).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let id = spec.id;
            handles.push(std::thread::spawn(move || {
                store.apply_mutation(id, 1, |s| Ok(s.objects.clone()))
            }));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        assert_eq!(store.get(spec.id).unwrap().version, 2);
    }

    #[test]
    fn test_history_ordering_and_filter() {
        let store = VersionedSpecStore::new(CostModel::default());
        let a = store.create(sample_spec()).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = store.create(sample_spec()).unwrap();
        let mut other = sample_spec();
        other.owner_id = "someone-else".into();
        store.create(other).unwrap();

        let history = store.history("user-1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, b.id);
        assert_eq!(history[1].id, a.id);
    }
}
