// src/generator/mod.rs — Spec generation: provider chain + deterministic fallback
//
// Providers are tried in priority order, each bounded by a per-provider
// timeout and all of them by a total deadline. A draft is accepted only if
// it validates. Exhaustion, deadline, or an empty chain all land on the
// deterministic template path, so generate() never fails for lack of AI.

pub mod http;
pub mod template;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::budget;
use crate::cost::CostModel;
use crate::infra::config::GenerationConfig;
use crate::infra::errors::AtelierError;
use crate::model::{DesignObject, DesignParams, DesignSpecification, Footprint};
use crate::prompt::{self, PromptHints};

/// The fallback path's provenance marker.
pub const DETERMINISTIC: &str = "deterministic";

/// Capability interface shared by all generation backends.
#[async_trait]
pub trait SpecProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn try_generate(
        &self,
        prompt: &str,
        hints: &PromptHints,
    ) -> Result<ProviderDraft, AtelierError>;
}

/// What a provider returns: an object graph plus optional envelope data.
/// Costs are ignored; the cost model restamps them on acceptance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDraft {
    pub building_type: Option<String>,
    pub footprint: Option<Footprint>,
    #[serde(default)]
    pub objects: Vec<DesignObject>,
}

/// Minimal schema a draft must satisfy before it is accepted.
pub fn validate_draft(draft: &ProviderDraft, provider: &str) -> Result<(), AtelierError> {
    let reject = |reason: &str| AtelierError::DraftRejected {
        provider: provider.to_string(),
        reason: reason.to_string(),
    };

    if draft.objects.is_empty() {
        return Err(reject("empty object list"));
    }
    if draft
        .building_type
        .as_deref()
        .map(str::trim)
        .unwrap_or("")
        .is_empty()
    {
        return Err(reject("no declared building type"));
    }
    if let Some(fp) = &draft.footprint {
        if fp.width_m <= 0.0 || fp.length_m <= 0.0 || fp.height_m <= 0.0 || fp.stories == 0 {
            return Err(reject("inconsistent footprint"));
        }
    }

    let mut ids: Vec<&str> = draft.objects.iter().map(|o| o.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.len() != draft.objects.len() {
        return Err(reject("duplicate object ids"));
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub owner_id: String,
    pub project_id: String,
    pub params: DesignParams,
}

pub struct SpecGenerator {
    providers: Vec<Arc<dyn SpecProvider>>,
    cost: CostModel,
    provider_timeout: Duration,
    total_deadline: Duration,
}

impl SpecGenerator {
    pub fn new(providers: Vec<Arc<dyn SpecProvider>>, cost: CostModel) -> Self {
        Self {
            providers,
            cost,
            provider_timeout: Duration::from_secs(20),
            total_deadline: Duration::from_secs(45),
        }
    }

    pub fn with_config(
        providers: Vec<Arc<dyn SpecProvider>>,
        cost: CostModel,
        config: &GenerationConfig,
    ) -> Self {
        Self {
            providers,
            cost,
            provider_timeout: Duration::from_secs(config.provider_timeout_secs),
            total_deadline: Duration::from_secs(config.total_deadline_secs),
        }
    }

    /// Generate a version-1 specification from a prompt. Never fails for
    /// "no AI available"; caller errors only surface from the budget path,
    /// which is itself open-ended. Dropping the returned future cancels any
    /// in-flight provider attempt without side effects.
    pub async fn generate(
        &self,
        request: GenerateRequest,
    ) -> Result<DesignSpecification, AtelierError> {
        let hints = prompt::interpret(&request.prompt);
        let params = merge_params(&request.params, &hints);

        let started = Instant::now();

        for provider in &self.providers {
            let elapsed = started.elapsed();
            if elapsed >= self.total_deadline {
                tracing::warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Generation deadline exceeded, abandoning remaining providers"
                );
                break;
            }

            let budget_left = self.total_deadline - elapsed;
            let per_call = self.provider_timeout.min(budget_left);

            let attempt =
                tokio::time::timeout(per_call, provider.try_generate(&request.prompt, &hints))
                    .await;

            let outcome = match attempt {
                Ok(Ok(draft)) => validate_draft(&draft, provider.name()).map(|_| draft),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(AtelierError::ProviderTimeout {
                    provider: provider.name().to_string(),
                    timeout_ms: per_call.as_millis() as u64,
                }),
            };

            match outcome {
                Ok(draft) => {
                    tracing::info!(provider = provider.name(), "Draft accepted");
                    return self.build_spec(&request, &params, &hints, draft, provider.name());
                }
                Err(e) if e.is_retriable() => {
                    tracing::warn!(
                        provider = provider.name(),
                        "Provider failed, trying next: {}",
                        e
                    );
                    continue;
                }
                Err(e) => {
                    // Terminal errors (bad credentials, client-side 4xx)
                    // won't improve further down the chain.
                    tracing::warn!(
                        provider = provider.name(),
                        "Provider failed terminally, abandoning chain: {}",
                        e
                    );
                    break;
                }
            }
        }

        tracing::info!("Falling back to deterministic generation");
        self.deterministic(&request, &params, &hints)
    }

    /// Materialize an accepted draft into a stored-shape specification.
    fn build_spec(
        &self,
        request: &GenerateRequest,
        params: &DesignParams,
        hints: &PromptHints,
        draft: ProviderDraft,
        produced_by: &str,
    ) -> Result<DesignSpecification, AtelierError> {
        let footprint = match draft.footprint {
            Some(fp) => fp,
            None => budget::resolve(params.budget, hints.footprint)?,
        };

        let mut params = params.clone();
        if params.building_type.is_none() {
            params.building_type = draft.building_type.clone();
        }

        Ok(self.assemble(request, params, footprint, draft.objects, produced_by))
    }

    /// The template path: always succeeds given the open-ended tier table.
    fn deterministic(
        &self,
        request: &GenerateRequest,
        params: &DesignParams,
        hints: &PromptHints,
    ) -> Result<DesignSpecification, AtelierError> {
        let footprint = budget::resolve(params.budget, hints.footprint)?;
        let building_type = params
            .building_type
            .clone()
            .unwrap_or_else(|| "living room".to_string());
        let objects = template::objects_for(&building_type, params.style.as_deref());

        let mut params = params.clone();
        params.building_type = Some(building_type);

        Ok(self.assemble(request, params, footprint, objects, DETERMINISTIC))
    }

    fn assemble(
        &self,
        request: &GenerateRequest,
        params: DesignParams,
        footprint: Footprint,
        objects: Vec<DesignObject>,
        produced_by: &str,
    ) -> DesignSpecification {
        let objects = self.cost.reprice(objects);
        let total_cost = self.cost.total(&objects, &footprint);
        let now = Utc::now();

        DesignSpecification {
            id: Uuid::new_v4(),
            owner_id: request.owner_id.clone(),
            project_id: request.project_id.clone(),
            version: 1,
            prompt: request.prompt.clone(),
            params,
            footprint,
            objects,
            total_cost,
            generated_by: produced_by.to_string(),
            parent_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Caller-supplied params win over extracted hints.
fn merge_params(explicit: &DesignParams, hints: &PromptHints) -> DesignParams {
    DesignParams {
        city: explicit.city.clone().or_else(|| hints.city.clone()),
        budget: explicit.budget.or(hints.budget),
        style: explicit.style.clone().or_else(|| hints.style.clone()),
        building_type: explicit
            .building_type
            .clone()
            .or_else(|| hints.building_type.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dimensions;
    use pretty_assertions::assert_eq;

    fn draft_object(id: &str) -> DesignObject {
        DesignObject {
            id: id.to_string(),
            kind: id.to_string(),
            material: "pine".into(),
            color_hex: "#FFFFFF".into(),
            texture: None,
            dimensions: Dimensions::default(),
            cost: 0.0,
        }
    }

    fn request(prompt: &str) -> GenerateRequest {
        GenerateRequest {
            prompt: prompt.to_string(),
            owner_id: "user-1".into(),
            project_id: "proj-1".into(),
            params: DesignParams::default(),
        }
    }

    struct FixedProvider {
        name: String,
        draft: Option<ProviderDraft>,
        retriable: bool,
    }

    #[async_trait]
    impl SpecProvider for FixedProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn try_generate(
            &self,
            _prompt: &str,
            _hints: &PromptHints,
        ) -> Result<ProviderDraft, AtelierError> {
            match &self.draft {
                Some(draft) => Ok(draft.clone()),
                None => Err(AtelierError::Provider {
                    provider: self.name.clone(),
                    message: if self.retriable { "HTTP 503" } else { "HTTP 401" }.into(),
                    retriable: self.retriable,
                }),
            }
        }
    }

    struct StalledProvider;

    #[async_trait]
    impl SpecProvider for StalledProvider {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn try_generate(
            &self,
            _prompt: &str,
            _hints: &PromptHints,
        ) -> Result<ProviderDraft, AtelierError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    #[test]
    fn test_validate_rejects_empty_objects() {
        let draft = ProviderDraft {
            building_type: Some("bedroom".into()),
            footprint: None,
            objects: vec![],
        };
        assert!(validate_draft(&draft, "p").is_err());
    }

    #[test]
    fn test_validate_rejects_missing_type() {
        let draft = ProviderDraft {
            building_type: Some("  ".into()),
            footprint: None,
            objects: vec![draft_object("floor")],
        };
        assert!(validate_draft(&draft, "p").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_footprint() {
        let draft = ProviderDraft {
            building_type: Some("bedroom".into()),
            footprint: Some(Footprint {
                width_m: -3.0,
                length_m: 5.0,
                height_m: 2.6,
                stories: 1,
            }),
            objects: vec![draft_object("floor")],
        };
        assert!(validate_draft(&draft, "p").is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let draft = ProviderDraft {
            building_type: Some("bedroom".into()),
            footprint: None,
            objects: vec![draft_object("floor"), draft_object("floor")],
        };
        assert!(validate_draft(&draft, "p").is_err());
    }

    #[test]
    fn test_merge_params_explicit_wins() {
        let explicit = DesignParams {
            budget: Some(90_000.0),
            ..Default::default()
        };
        let hints = PromptHints {
            budget: Some(10_000.0),
            city: Some("berlin".into()),
            ..Default::default()
        };
        let merged = merge_params(&explicit, &hints);
        assert_eq!(merged.budget, Some(90_000.0));
        assert_eq!(merged.city.as_deref(), Some("berlin"));
    }

    #[tokio::test]
    async fn test_no_providers_falls_back_deterministic() {
        let gen = SpecGenerator::new(vec![], CostModel::default());
        let spec = gen
            .generate(request("Design a modern living room"))
            .await
            .unwrap();

        assert_eq!(spec.version, 1);
        assert_eq!(spec.generated_by, DETERMINISTIC);
        // No budget → lowest tier
        assert_eq!(spec.footprint.width_m, 6.0);
        assert_eq!(
            spec.total_cost,
            CostModel::default().total(&spec.objects, &spec.footprint)
        );
    }

    #[tokio::test]
    async fn test_failing_provider_falls_through() {
        let failing = Arc::new(FixedProvider {
            name: "broken".into(),
            draft: None,
            retriable: true,
        });
        let gen = SpecGenerator::new(vec![failing], CostModel::default());
        let spec = gen.generate(request("a bedroom")).await.unwrap();
        assert_eq!(spec.generated_by, DETERMINISTIC);
    }

    #[tokio::test]
    async fn test_first_valid_provider_wins() {
        let failing = Arc::new(FixedProvider {
            name: "broken".into(),
            draft: None,
            retriable: true,
        });
        let working = Arc::new(FixedProvider {
            name: "studio".into(),
            draft: Some(ProviderDraft {
                building_type: Some("bedroom".into()),
                footprint: None,
                objects: vec![draft_object("floor"), draft_object("bed")],
            }),
            retriable: true,
        });
        let gen = SpecGenerator::new(vec![failing, working], CostModel::default());
        let spec = gen.generate(request("a bedroom")).await.unwrap();

        assert_eq!(spec.generated_by, "studio");
        assert_eq!(spec.version, 1);
        assert_eq!(spec.objects.len(), 2);
        assert_eq!(spec.params.building_type.as_deref(), Some("bedroom"));
    }

    #[tokio::test]
    async fn test_terminal_provider_error_abandons_chain() {
        // A non-retriable failure (bad credentials) must not fall through
        // to the next provider; the deterministic path answers instead.
        let unauthorized = Arc::new(FixedProvider {
            name: "locked".into(),
            draft: None,
            retriable: false,
        });
        let never_reached = Arc::new(FixedProvider {
            name: "studio".into(),
            draft: Some(ProviderDraft {
                building_type: Some("bedroom".into()),
                footprint: None,
                objects: vec![draft_object("floor"), draft_object("bed")],
            }),
            retriable: true,
        });
        let gen = SpecGenerator::new(vec![unauthorized, never_reached], CostModel::default());
        let spec = gen.generate(request("a bedroom")).await.unwrap();
        assert_eq!(spec.generated_by, DETERMINISTIC);
    }

    #[tokio::test]
    async fn test_invalid_draft_rejected_falls_through() {
        let invalid = Arc::new(FixedProvider {
            name: "sloppy".into(),
            draft: Some(ProviderDraft {
                building_type: None,
                footprint: None,
                objects: vec![draft_object("floor")],
            }),
            retriable: true,
        });
        let gen = SpecGenerator::new(vec![invalid], CostModel::default());
        let spec = gen.generate(request("an office")).await.unwrap();
        assert_eq!(spec.generated_by, DETERMINISTIC);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_provider_times_out_to_fallback() {
        let gen = SpecGenerator::new(vec![Arc::new(StalledProvider)], CostModel::default());
        let spec = gen.generate(request("a kitchen")).await.unwrap();
        assert_eq!(spec.generated_by, DETERMINISTIC);
    }
}
