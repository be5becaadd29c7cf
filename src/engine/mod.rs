// src/engine/mod.rs — The design engine facade
//
// Wires the generator, store, iteration engine, feedback controller, and
// service gateway into the transport-agnostic operations callers see.
// Generation-path failures are recovered internally; mutation-path errors
// (validation, version conflicts, missing objects) surface verbatim.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::cost::CostModel;
use crate::feedback::{FeedbackController, RatingAggregate};
use crate::gateway::transport::HttpServiceTransport;
use crate::gateway::{CallMode, Service, ServiceGateway, ServiceRequest, ServiceTransport};
use crate::generator::http::HttpSpecProvider;
use crate::generator::{GenerateRequest, SpecGenerator, SpecProvider};
use crate::infra::config::Config;
use crate::infra::errors::AtelierError;
use crate::iteration::IterationEngine;
use crate::model::{
    DesignParams, DesignSpecification, Iteration, SpecSummary, SwitchTarget, SwitchUpdate,
};
use crate::store::VersionedSpecStore;

#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutcome {
    pub spec: DesignSpecification,
    /// Compliance verdict for the new design. `mode: mock` means the live
    /// service was degraded; that is provenance, not an error.
    pub compliance: serde_json::Value,
    pub compliance_mode: CallMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationAck {
    pub evaluation_id: Uuid,
    pub spec_id: Uuid,
    pub aggregate: RatingAggregate,
    pub training_triggered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct IterationOutcome {
    pub iteration: Iteration,
    pub advisory_mode: CallMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchOutcome {
    pub iteration_id: Uuid,
    pub resulting_version: u32,
    pub changed_objects: Vec<String>,
    pub cost_impact: f64,
}

pub struct DesignEngine {
    generator: SpecGenerator,
    store: Arc<VersionedSpecStore>,
    iterations: IterationEngine,
    feedback: FeedbackController,
    gateway: Arc<ServiceGateway>,
}

impl DesignEngine {
    /// Assemble an engine from config: HTTP providers from the endpoint
    /// list, live service transport when both URLs are configured.
    pub fn from_config(config: &Config) -> Self {
        let providers: Vec<Arc<dyn SpecProvider>> = config
            .generation
            .providers
            .iter()
            .map(|ep| Arc::new(HttpSpecProvider::from_endpoint(ep)) as Arc<dyn SpecProvider>)
            .collect();

        let transport = HttpServiceTransport::from_config(&config.gateway)
            .map(|t| Arc::new(t) as Arc<dyn ServiceTransport>);

        Self::new(config, providers, transport)
    }

    pub fn new(
        config: &Config,
        providers: Vec<Arc<dyn SpecProvider>>,
        transport: Option<Arc<dyn ServiceTransport>>,
    ) -> Self {
        let cost = CostModel::new(config.cost.rate_per_sqm);
        let store = Arc::new(VersionedSpecStore::new(cost.clone()));

        Self {
            generator: SpecGenerator::with_config(providers, cost, &config.generation),
            iterations: IterationEngine::new(Arc::clone(&store)),
            feedback: FeedbackController::new(&config.feedback),
            gateway: Arc::new(ServiceGateway::new(transport, &config.gateway)),
            store,
        }
    }

    /// Generate, store, and compliance-check a new specification.
    pub async fn generate(
        &self,
        prompt: &str,
        owner_id: &str,
        project_id: &str,
        params: DesignParams,
    ) -> Result<GenerateOutcome, AtelierError> {
        let spec = self
            .generator
            .generate(GenerateRequest {
                prompt: prompt.to_string(),
                owner_id: owner_id.to_string(),
                project_id: project_id.to_string(),
                params,
            })
            .await?;
        let spec = self.store.create(spec)?;

        let compliance = self
            .gateway
            .call(
                Service::ComplianceCheck,
                &ServiceRequest {
                    city: spec.params.city.clone(),
                    params: json!({
                        "building_type": spec.params.building_type,
                        "area_sqm": spec.footprint.area_sqm(),
                        "stories": spec.footprint.stories,
                    }),
                },
            )
            .await;

        tracing::info!(
            spec_id = %spec.id,
            generated_by = %spec.generated_by,
            compliance_mode = ?compliance.mode,
            total_cost = spec.total_cost,
            "Spec generated"
        );

        Ok(GenerateOutcome {
            spec,
            compliance: compliance.body,
            compliance_mode: compliance.mode,
        })
    }

    pub fn get(&self, spec_id: Uuid) -> Result<DesignSpecification, AtelierError> {
        self.store.get(spec_id)
    }

    pub fn evaluate(
        &self,
        spec_id: Uuid,
        user_id: &str,
        rating: f64,
        notes: Option<String>,
    ) -> Result<EvaluationAck, AtelierError> {
        // The spec must exist before feedback is accepted against it.
        self.store.get(spec_id)?;

        let (evaluation, trigger) = self.feedback.submit(spec_id, user_id, rating, notes)?;
        Ok(EvaluationAck {
            evaluation_id: evaluation.id,
            spec_id,
            aggregate: self.feedback.aggregate(spec_id),
            training_triggered: trigger.is_some(),
        })
    }

    /// Apply a named strategy. When `expected_version` is omitted the
    /// current version is used, which makes the call race-prone but
    /// convenient for single-writer callers.
    pub async fn iterate(
        &self,
        spec_id: Uuid,
        user_id: &str,
        strategy: &str,
        expected_version: Option<u32>,
    ) -> Result<IterationOutcome, AtelierError> {
        let current = self.store.get(spec_id)?;
        let expected = expected_version.unwrap_or(current.version);

        let advisory = self
            .gateway
            .call(
                Service::Optimize,
                &ServiceRequest {
                    city: current.params.city.clone(),
                    params: json!({
                        "strategy": strategy,
                        "total_cost": current.total_cost,
                        "object_count": current.objects.len(),
                    }),
                },
            )
            .await;
        let hint = advisory.body["suggestions"][0].as_str().map(String::from);

        let iteration = self
            .iterations
            .iterate(spec_id, strategy, expected, hint.as_deref())?;

        tracing::info!(
            spec_id = %spec_id,
            user_id,
            strategy,
            version = iteration.resulting_version,
            "Iteration applied"
        );

        Ok(IterationOutcome {
            iteration,
            advisory_mode: advisory.mode,
        })
    }

    pub fn switch(
        &self,
        spec_id: Uuid,
        user_id: &str,
        target: SwitchTarget,
        update: SwitchUpdate,
        expected_version: Option<u32>,
    ) -> Result<SwitchOutcome, AtelierError> {
        let expected = match expected_version {
            Some(v) => v,
            None => self.store.get(spec_id)?.version,
        };

        let (iteration, changed) = self.iterations.switch(spec_id, target, update, expected)?;

        tracing::info!(
            spec_id = %spec_id,
            user_id,
            changed = changed.len(),
            "Switch applied"
        );

        Ok(SwitchOutcome {
            iteration_id: iteration.id,
            resulting_version: iteration.resulting_version,
            changed_objects: changed,
            cost_impact: iteration.cost_delta,
        })
    }

    pub fn history(&self, user_id: &str) -> Vec<SpecSummary> {
        self.store.history(user_id)
    }

    pub fn iterations_for(&self, spec_id: Uuid) -> Vec<Iteration> {
        self.iterations.iterations_for(spec_id)
    }

    pub fn gateway(&self) -> &ServiceGateway {
        &self.gateway
    }

    /// Seed a spec directly into the store (file-based front ends load
    /// previously exported specs this way). Duplicate object ids are
    /// rejected just like on the generation path.
    pub fn import(&self, spec: DesignSpecification) -> Result<DesignSpecification, AtelierError> {
        self.store.create(spec)
    }
}
