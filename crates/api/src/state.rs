use std::sync::Arc;

use cep_gateway_domain::services::telemetry::TelemetryGuard;
use cep_gateway_resolver::FanOutResolver;

#[derive(Clone)]
pub struct AppState {
    resolver: Arc<FanOutResolver>,
    telemetry: TelemetryGuard,
}

impl AppState {
    pub fn new(resolver: Arc<FanOutResolver>, telemetry: TelemetryGuard) -> Self {
        Self {
            resolver,
            telemetry,
        }
    }

    pub fn resolver(&self) -> &FanOutResolver {
        self.resolver.as_ref()
    }

    pub fn telemetry(&self) -> &TelemetryGuard {
        &self.telemetry
    }
}
