use crate::config::ServiceDescriptor;

use super::outcome::ServiceHealthRow;
use super::readiness::{ProbeResponse, ReadinessProbe, response_indicates_ready};

/// Re-check every service's liveness without launching anything.
///
/// Uses the same probe and the same per-descriptor strictness as the
/// readiness poller, so `status` and `start` can never disagree about what
/// "ready" means.
pub fn collect_health(
    services: &[ServiceDescriptor],
    probe: &dyn ReadinessProbe,
) -> Vec<ServiceHealthRow> {
    services
        .iter()
        .map(|service| {
            let response = probe.check(service.readiness_port, &service.readiness_path);
            ServiceHealthRow {
                name: service.name.clone(),
                tier: service.tier,
                port: service.readiness_port,
                url: service.url(),
                reachable: response_indicates_ready(response, service.strictness),
                detail: describe_response(response),
            }
        })
        .collect()
}

fn describe_response(response: ProbeResponse) -> String {
    match response {
        ProbeResponse::Http { status } => format!("http {status}"),
        ProbeResponse::Down => "no response".to_string(),
    }
}
