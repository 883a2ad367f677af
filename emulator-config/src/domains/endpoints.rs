//! Validation of the endpoint table

use crate::error::ConfigResult;
use crate::validation::{
    validate_non_negative, validate_positive, validate_required_string, validate_unique,
    Validatable,
};
use emulator_core::{CalledServiceRef, CircuitBreakerSettings, EndpointDefinition};

/// Borrowed view over the configured endpoints
pub struct EndpointTable<'a>(pub &'a [EndpointDefinition]);

impl Validatable for EndpointTable<'_> {
    fn validate(&self) -> ConfigResult<()> {
        validate_unique(
            self.0.iter().map(|endpoint| endpoint.name.as_str()),
            "endpoint",
            self.domain_name(),
        )?;

        for endpoint in self.0 {
            validate_endpoint(endpoint, self.domain_name())?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "endpoints"
    }
}

fn validate_endpoint(endpoint: &EndpointDefinition, domain: &str) -> ConfigResult<()> {
    validate_required_string(&endpoint.name, "name", domain)?;

    if let Some(cpu) = &endpoint.cpu_complexity {
        let field = format!("{}.cpu_complexity.execution_time", endpoint.name);
        validate_non_negative(cpu.execution_time, &field, domain)?;

        let field = format!("{}.cpu_complexity.threads", endpoint.name);
        validate_positive(cpu.threads, &field, domain)?;
    }

    for called in endpoint.called_services() {
        validate_called_service(&endpoint.name, called, domain)?;
    }

    Ok(())
}

fn validate_called_service(source: &str, called: &CalledServiceRef, domain: &str) -> ConfigResult<()> {
    let prefix = format!("{} -> {}", source, called.route_label());

    validate_required_string(&called.service, &format!("{}: service", prefix), domain)?;
    validate_required_string(&called.endpoint, &format!("{}: endpoint", prefix), domain)?;
    validate_positive(
        called.traffic_forward_ratio,
        &format!("{}: traffic_forward_ratio", prefix),
        domain,
    )?;

    if let Some(CircuitBreakerSettings { timeout, retry_timer }) = called.circuit_breaker {
        validate_positive(
            timeout.as_secs_f64(),
            &format!("{}: circuit_breaker.timeout", prefix),
            domain,
        )?;
        validate_positive(
            retry_timer.as_secs_f64(),
            &format!("{}: circuit_breaker.retry_timer", prefix),
            domain,
        )?;
    }

    Ok(())
}
