// src/feedback/mod.rs — Evaluations, rolling aggregates, training triggers
//
// Evaluations are append-only. The per-spec aggregate and trigger decision
// happen in one critical section so concurrent submissions cannot lose
// updates or double-fire a trigger.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::infra::config::FeedbackConfig;
use crate::infra::errors::AtelierError;
use crate::model::{Evaluation, TrainingTrigger, TriggerReason};

/// Per-spec rolling aggregate.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RatingAggregate {
    pub count: u32,
    pub mean: f64,
}

impl RatingAggregate {
    fn absorb(&mut self, rating: f64) {
        self.count += 1;
        self.mean += (rating - self.mean) / self.count as f64;
    }
}

#[derive(Default)]
struct FeedbackState {
    evaluations: Vec<Evaluation>,
    aggregates: HashMap<Uuid, RatingAggregate>,
    triggers: Vec<TrainingTrigger>,
}

pub struct FeedbackController {
    state: Mutex<FeedbackState>,
    retrain_every: u32,
    negative_threshold: f64,
}

impl FeedbackController {
    pub fn new(config: &FeedbackConfig) -> Self {
        Self {
            state: Mutex::new(FeedbackState::default()),
            retrain_every: config.retrain_every.max(1),
            negative_threshold: config.negative_threshold,
        }
    }

    /// Record an evaluation and decide whether to emit a training trigger.
    /// Emission is fire-and-forget; the trigger is only stored for the
    /// external training collaborator to consume.
    pub fn submit(
        &self,
        spec_id: Uuid,
        user_id: &str,
        rating: f64,
        notes: Option<String>,
    ) -> Result<(Evaluation, Option<TrainingTrigger>), AtelierError> {
        if !(0.0..=5.0).contains(&rating) || !rating.is_finite() {
            return Err(AtelierError::Validation(format!(
                "Rating {rating} out of range 0.0–5.0"
            )));
        }

        let evaluation = Evaluation {
            id: Uuid::new_v4(),
            spec_id,
            user_id: user_id.to_string(),
            rating,
            notes,
            created_at: Utc::now(),
        };

        let mut state = self.state.lock().expect("feedback state poisoned");
        state.evaluations.push(evaluation.clone());
        let aggregate = state.aggregates.entry(spec_id).or_default();
        aggregate.absorb(rating);
        let count = aggregate.count;

        let trigger = if count % self.retrain_every == 0 {
            // Reference the window of evaluations that crossed the threshold.
            let window: Vec<Uuid> = state
                .evaluations
                .iter()
                .filter(|e| e.spec_id == spec_id)
                .rev()
                .take(self.retrain_every as usize)
                .map(|e| e.id)
                .collect();
            Some(self.emit(&mut state, spec_id, TriggerReason::ThresholdCrossed, window))
        } else if rating < self.negative_threshold {
            Some(self.emit(
                &mut state,
                spec_id,
                TriggerReason::StrongNegativeSignal,
                vec![evaluation.id],
            ))
        } else {
            None
        };

        Ok((evaluation, trigger))
    }

    pub fn aggregate(&self, spec_id: Uuid) -> RatingAggregate {
        let state = self.state.lock().expect("feedback state poisoned");
        state.aggregates.get(&spec_id).copied().unwrap_or_default()
    }

    pub fn triggers(&self) -> Vec<TrainingTrigger> {
        let state = self.state.lock().expect("feedback state poisoned");
        state.triggers.clone()
    }

    fn emit(
        &self,
        state: &mut FeedbackState,
        spec_id: Uuid,
        reason: TriggerReason,
        evaluation_ids: Vec<Uuid>,
    ) -> TrainingTrigger {
        let trigger = TrainingTrigger {
            id: Uuid::new_v4(),
            spec_id,
            reason,
            evaluation_ids,
            created_at: Utc::now(),
        };
        tracing::info!(
            spec_id = %spec_id,
            reason = ?reason,
            "Training trigger emitted"
        );
        state.triggers.push(trigger.clone());
        trigger
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn controller() -> FeedbackController {
        FeedbackController::new(&FeedbackConfig {
            retrain_every: 3,
            negative_threshold: 2.0,
        })
    }

    #[test]
    fn test_rating_out_of_range_rejected() {
        let fc = controller();
        assert!(fc.submit(Uuid::new_v4(), "u", 5.5, None).is_err());
        assert!(fc.submit(Uuid::new_v4(), "u", -0.1, None).is_err());
        assert!(fc.submit(Uuid::new_v4(), "u", f64::NAN, None).is_err());
    }

    #[test]
    fn test_aggregate_running_mean() {
        let fc = controller();
        let spec = Uuid::new_v4();
        fc.submit(spec, "u", 4.0, None).unwrap();
        fc.submit(spec, "u", 2.0, None).unwrap();
        let agg = fc.aggregate(spec);
        assert_eq!(agg.count, 2);
        assert!((agg.mean - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_trigger_fires_exactly_at_crossing() {
        let fc = controller();
        let spec = Uuid::new_v4();

        let (_, t1) = fc.submit(spec, "u", 4.0, None).unwrap();
        let (_, t2) = fc.submit(spec, "u", 4.5, None).unwrap();
        assert!(t1.is_none());
        assert!(t2.is_none());

        let (_, t3) = fc.submit(spec, "u", 3.5, None).unwrap();
        let t3 = t3.unwrap();
        assert_eq!(t3.reason, TriggerReason::ThresholdCrossed);
        assert_eq!(t3.evaluation_ids.len(), 3);

        // Not again until the next multiple
        let (_, t4) = fc.submit(spec, "u", 4.0, None).unwrap();
        assert!(t4.is_none());
        let (_, t5) = fc.submit(spec, "u", 4.0, None).unwrap();
        assert!(t5.is_none());
        let (_, t6) = fc.submit(spec, "u", 4.0, None).unwrap();
        assert!(t6.is_some());
        assert_eq!(fc.triggers().len(), 2);
    }

    #[test]
    fn test_negative_signal_fires_immediately() {
        let fc = controller();
        let spec = Uuid::new_v4();
        let (eval, trigger) = fc.submit(spec, "u", 1.0, Some("awful".into())).unwrap();
        let trigger = trigger.unwrap();
        assert_eq!(trigger.reason, TriggerReason::StrongNegativeSignal);
        assert_eq!(trigger.evaluation_ids, vec![eval.id]);
    }

    #[test]
    fn test_threshold_takes_precedence_over_negative() {
        let fc = controller();
        let spec = Uuid::new_v4();
        fc.submit(spec, "u", 4.0, None).unwrap();
        fc.submit(spec, "u", 4.0, None).unwrap();
        // Third submission is both a crossing and a negative rating;
        // exactly one trigger is emitted, reason = threshold.
        let (_, trigger) = fc.submit(spec, "u", 1.0, None).unwrap();
        assert_eq!(trigger.unwrap().reason, TriggerReason::ThresholdCrossed);
        assert_eq!(fc.triggers().len(), 1);
    }

    #[test]
    fn test_aggregates_isolated_per_spec() {
        let fc = controller();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        fc.submit(a, "u", 5.0, None).unwrap();
        fc.submit(b, "u", 3.0, None).unwrap();
        assert_eq!(fc.aggregate(a).count, 1);
        assert_eq!(fc.aggregate(b).count, 1);
        assert!((fc.aggregate(b).mean - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_concurrent_submissions_lose_nothing() {
        use std::sync::Arc;
        let fc = Arc::new(controller());
        let spec = Uuid::new_v4();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let fc = Arc::clone(&fc);
                std::thread::spawn(move || fc.submit(spec, "u", 4.0, None).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(fc.aggregate(spec).count, 16);
        // 16 submissions with retrain_every=3 → crossings at 3, 6, 9, 12, 15
        assert_eq!(fc.triggers().len(), 5);
    }
}
