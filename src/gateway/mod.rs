// src/gateway/mod.rs — External service gateway with circuit breakers
//
// Wraps the compliance-check and optimize services behind one call()
// contract that never fails: when the live path is down, timing out, or
// circuit-broken, the deterministic mock responder answers instead and the
// response is tagged with its mode.

pub mod mock;
pub mod transport;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::infra::config::GatewayConfig;
use crate::infra::errors::AtelierError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    ComplianceCheck,
    Optimize,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::ComplianceCheck => "compliance-check",
            Service::Optimize => "optimize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallMode {
    Live,
    Mock,
}

#[derive(Debug, Clone)]
pub struct ServiceRequest {
    pub city: Option<String>,
    pub params: Value,
}

#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub service: Service,
    pub mode: CallMode,
    pub body: Value,
}

/// Gateway-internal observability record; drives nothing but diagnostics.
#[derive(Debug, Clone)]
pub struct ServiceCallRecord {
    pub service: Service,
    pub mode: CallMode,
    pub success: bool,
    pub latency: Duration,
}

/// Transport over the live services. Split out as a trait so tests can
/// script failures without a network.
#[async_trait]
pub trait ServiceTransport: Send + Sync {
    async fn call(&self, service: Service, request: &ServiceRequest)
        -> Result<Value, AtelierError>;
}

// ─── Circuit breaker ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerStateKind {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
enum BreakerState {
    Closed { failures: u32 },
    Open { since: Instant },
    HalfOpen,
}

enum Admission {
    Live { probe: bool },
    Mock,
}

struct CircuitBreaker {
    state: Mutex<BreakerState>,
    threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            state: Mutex::new(BreakerState::Closed { failures: 0 }),
            threshold: threshold.max(1),
            cooldown,
        }
    }

    /// Decide whether the next call may go live. HALF_OPEN admits exactly
    /// one probe; everyone else gets the mock until it resolves.
    fn admit(&self) -> Admission {
        let mut state = self.state.lock().expect("breaker state poisoned");
        match *state {
            BreakerState::Closed { .. } => Admission::Live { probe: false },
            BreakerState::Open { since } => {
                if since.elapsed() >= self.cooldown {
                    *state = BreakerState::HalfOpen;
                    Admission::Live { probe: true }
                } else {
                    Admission::Mock
                }
            }
            BreakerState::HalfOpen => Admission::Mock,
        }
    }

    fn on_success(&self) {
        let mut state = self.state.lock().expect("breaker state poisoned");
        *state = BreakerState::Closed { failures: 0 };
    }

    fn on_failure(&self) {
        let mut state = self.state.lock().expect("breaker state poisoned");
        match *state {
            BreakerState::Closed { failures } => {
                let failures = failures + 1;
                if failures >= self.threshold {
                    *state = BreakerState::Open {
                        since: Instant::now(),
                    };
                } else {
                    *state = BreakerState::Closed { failures };
                }
            }
            // Probe failed (or the breaker opened out from under an
            // in-flight call): restart the cooldown.
            BreakerState::HalfOpen | BreakerState::Open { .. } => {
                *state = BreakerState::Open {
                    since: Instant::now(),
                };
            }
        }
    }

    fn kind(&self) -> BreakerStateKind {
        let state = self.state.lock().expect("breaker state poisoned");
        match *state {
            BreakerState::Closed { .. } => BreakerStateKind::Closed,
            BreakerState::Open { .. } => BreakerStateKind::Open,
            BreakerState::HalfOpen => BreakerStateKind::HalfOpen,
        }
    }
}

// ─── Gateway ────────────────────────────────────────────────

pub struct ServiceGateway {
    transport: Option<Arc<dyn ServiceTransport>>,
    compliance: CircuitBreaker,
    optimize: CircuitBreaker,
    call_timeout: Duration,
    records: Mutex<Vec<ServiceCallRecord>>,
}

impl ServiceGateway {
    pub fn new(transport: Option<Arc<dyn ServiceTransport>>, config: &GatewayConfig) -> Self {
        let cooldown = Duration::from_secs(config.cooldown_secs);
        Self {
            transport,
            compliance: CircuitBreaker::new(config.failure_threshold, cooldown),
            optimize: CircuitBreaker::new(config.failure_threshold, cooldown),
            call_timeout: Duration::from_secs(config.call_timeout_secs),
            records: Mutex::new(Vec::new()),
        }
    }

    /// A gateway with no live transport at all: every call is mock-served.
    pub fn mock_only(config: &GatewayConfig) -> Self {
        Self::new(None, config)
    }

    fn breaker(&self, service: Service) -> &CircuitBreaker {
        match service {
            Service::ComplianceCheck => &self.compliance,
            Service::Optimize => &self.optimize,
        }
    }

    /// Call a service. Infallible by contract: the live path is attempted
    /// when the breaker allows it, and every other outcome resolves to a
    /// deterministic mock response tagged `mode: mock`.
    pub async fn call(&self, service: Service, request: &ServiceRequest) -> GatewayResponse {
        let Some(transport) = self.transport.clone() else {
            return self.serve_mock(service, request, Duration::ZERO);
        };

        match self.breaker(service).admit() {
            Admission::Live { probe } => {
                if probe {
                    tracing::debug!(service = service.as_str(), "Half-open probe admitted");
                }
            }
            Admission::Mock => {
                tracing::debug!(service = service.as_str(), "Breaker open, serving mock");
                return self.serve_mock(service, request, Duration::ZERO);
            }
        }

        let started = Instant::now();
        let attempt = tokio::time::timeout(self.call_timeout, transport.call(service, request)).await;
        let latency = started.elapsed();

        match attempt {
            Ok(Ok(body)) => {
                self.breaker(service).on_success();
                self.record(service, CallMode::Live, true, latency);
                GatewayResponse {
                    service,
                    mode: CallMode::Live,
                    body,
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    service = service.as_str(),
                    "Live call failed, serving mock: {}",
                    e
                );
                self.breaker(service).on_failure();
                self.record(service, CallMode::Live, false, latency);
                self.serve_mock(service, request, latency)
            }
            Err(_) => {
                tracing::warn!(
                    service = service.as_str(),
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Live call timed out, serving mock"
                );
                self.breaker(service).on_failure();
                self.record(service, CallMode::Live, false, latency);
                self.serve_mock(service, request, latency)
            }
        }
    }

    pub fn breaker_state(&self, service: Service) -> BreakerStateKind {
        self.breaker(service).kind()
    }

    pub fn call_records(&self) -> Vec<ServiceCallRecord> {
        self.records.lock().expect("gateway records poisoned").clone()
    }

    fn serve_mock(
        &self,
        service: Service,
        request: &ServiceRequest,
        latency: Duration,
    ) -> GatewayResponse {
        let body = mock::respond(service, request);
        self.record(service, CallMode::Mock, true, latency);
        GatewayResponse {
            service,
            mode: CallMode::Mock,
            body,
        }
    }

    fn record(&self, service: Service, mode: CallMode, success: bool, latency: Duration) {
        let mut records = self.records.lock().expect("gateway records poisoned");
        records.push(ServiceCallRecord {
            service,
            mode,
            success,
            latency,
        });
    }
}
