// src/model/mod.rs — Core domain types: specs, objects, iterations, evaluations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Physical envelope of a design: width/length/height in meters, plus
/// story count. Area is derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub width_m: f64,
    pub length_m: f64,
    pub height_m: f64,
    pub stories: u32,
}

impl Footprint {
    pub fn new(width_m: f64, length_m: f64, height_m: f64) -> Self {
        Self {
            width_m,
            length_m,
            height_m,
            stories: 1,
        }
    }

    pub fn area_sqm(&self) -> f64 {
        self.width_m * self.length_m
    }
}

/// Per-object physical dimensions in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width_m: f64,
    pub depth_m: f64,
    pub height_m: f64,
}

impl Dimensions {
    pub fn new(width_m: f64, depth_m: f64, height_m: f64) -> Self {
        Self {
            width_m,
            depth_m,
            height_m,
        }
    }
}

/// One element of the design: a floor, a sofa, a fireplace.
/// `id` is unique within its specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignObject {
    pub id: String,
    pub kind: String,
    pub material: String,
    pub color_hex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(default)]
    pub dimensions: Dimensions,
    /// Cost component stamped by the cost model on every write.
    #[serde(default)]
    pub cost: f64,
}

/// Structured request parameters, either supplied by the caller or
/// extracted from the prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignParams {
    pub city: Option<String>,
    pub budget: Option<f64>,
    pub style: Option<String>,
    pub building_type: Option<String>,
}

/// The authoritative, versioned design record.
///
/// `version` starts at 1 and increments by exactly 1 per accepted mutation;
/// it is the sole optimistic-concurrency key. `total_cost` always equals the
/// cost model applied to `objects` + `footprint`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignSpecification {
    pub id: Uuid,
    pub owner_id: String,
    pub project_id: String,
    pub version: u32,
    pub prompt: String,
    pub params: DesignParams,
    pub footprint: Footprint,
    pub objects: Vec<DesignObject>,
    pub total_cost: f64,
    /// Which generation path produced version 1: a provider name or
    /// "deterministic".
    pub generated_by: String,
    /// Spec this one was generated or iterated from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DesignSpecification {
    pub fn object(&self, id: &str) -> Option<&DesignObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn summary(&self) -> SpecSummary {
        SpecSummary {
            id: self.id,
            owner_id: self.owner_id.clone(),
            project_id: self.project_id.clone(),
            version: self.version,
            building_type: self.params.building_type.clone(),
            total_cost: self.total_cost,
            object_count: self.objects.len(),
            updated_at: self.updated_at,
        }
    }
}

/// Compact listing row for `history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecSummary {
    pub id: Uuid,
    pub owner_id: String,
    pub project_id: String,
    pub version: u32,
    pub building_type: Option<String>,
    pub total_cost: f64,
    pub object_count: usize,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IterationKind {
    Iterate,
    Switch,
}

/// Target selector for `switch`: exact object id wins over a query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwitchTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_query: Option<String>,
}

/// Field updates applied by `switch`. At least one must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwitchUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
}

impl SwitchUpdate {
    pub fn is_empty(&self) -> bool {
        self.material.is_none() && self.color_hex.is_none() && self.texture.is_none()
    }
}

/// One recorded mutation against a specification. Full before/after
/// snapshots are kept (not deltas) so the audit trail stands alone.
/// Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Iteration {
    pub id: Uuid,
    pub spec_id: Uuid,
    pub kind: IterationKind,
    pub base_version: u32,
    pub resulting_version: u32,
    pub before: Vec<DesignObject>,
    pub after: Vec<DesignObject>,
    pub cost_delta: f64,
    pub feedback: String,
    /// Populated for `switch` only: the original selector and payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<SwitchTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<SwitchUpdate>,
    pub created_at: DateTime<Utc>,
}

/// An immutable user rating of a specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: Uuid,
    pub spec_id: Uuid,
    pub user_id: String,
    pub rating: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    ThresholdCrossed,
    StrongNegativeSignal,
}

/// Produced when evaluation signals warrant retraining; consumed by an
/// external training collaborator. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingTrigger {
    pub id: Uuid,
    pub spec_id: Uuid,
    pub reason: TriggerReason,
    /// The evaluations that caused this trigger.
    pub evaluation_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_footprint_area() {
        let fp = Footprint::new(8.0, 6.0, 2.8);
        assert_eq!(fp.area_sqm(), 48.0);
        assert_eq!(fp.stories, 1);
    }

    #[test]
    fn test_switch_update_is_empty() {
        assert!(SwitchUpdate::default().is_empty());
        let upd = SwitchUpdate {
            material: Some("velvet".into()),
            ..Default::default()
        };
        assert!(!upd.is_empty());
    }

    #[test]
    fn test_spec_serialization_round_trip() {
        let spec = DesignSpecification {
            id: Uuid::new_v4(),
            owner_id: "user-1".into(),
            project_id: "proj-1".into(),
            version: 1,
            prompt: "Design a modern living room".into(),
            params: DesignParams {
                style: Some("modern".into()),
                ..Default::default()
            },
            footprint: Footprint::new(6.0, 5.0, 2.6),
            objects: vec![DesignObject {
                id: "sofa".into(),
                kind: "sofa".into(),
                material: "cotton".into(),
                color_hex: "#888888".into(),
                texture: None,
                dimensions: Dimensions::new(2.2, 0.9, 0.8),
                cost: 150.0,
            }],
            total_cost: 25_650.0,
            generated_by: "deterministic".into(),
            parent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&spec).unwrap();
        let parsed: DesignSpecification = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.objects.len(), 1);
        assert_eq!(parsed.objects[0].id, "sofa");
        // None fields stay off the wire
        assert!(!json.contains("parent_id"));
        assert!(!json.contains("texture"));
    }

    #[test]
    fn test_iteration_kind_wire_format() {
        let json = serde_json::to_string(&IterationKind::Switch).unwrap();
        assert_eq!(json, "\"switch\"");
    }
}
