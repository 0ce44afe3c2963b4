use std::path::Path;
use std::time::Duration;

use crate::config::{
    DEFAULT_TIMEOUT_SECS, LaunchSpec, ReadinessStrictness, ServiceDescriptor, Tier,
};

/// Built-in service table used when no `stevedore.toml` is present: the
/// workflow tools the toolkit ships compose files for, in declaration order.
///
/// n8n answers `/healthz` with a 200 once migrations finish; the other three
/// serve their UI (sometimes with a redirect or 404 on `/`) as soon as they
/// can accept work, so they stay on the default strictness.
pub fn builtin_services(root: &Path) -> Vec<ServiceDescriptor> {
    let compose = |name: &str| LaunchSpec::Compose {
        file: root.join("workflows").join(format!("docker-compose.{name}.yml")),
    };
    let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);

    vec![
        ServiceDescriptor {
            name: "n8n".to_string(),
            launch: compose("n8n"),
            readiness_port: 5678,
            readiness_path: "/healthz".to_string(),
            strictness: ReadinessStrictness::AnyHttpResponse,
            timeout,
            tier: Tier::Essential,
            extra_containers: Vec::new(),
        },
        ServiceDescriptor {
            name: "langflow".to_string(),
            launch: compose("langflow"),
            readiness_port: 7860,
            readiness_path: "/".to_string(),
            strictness: ReadinessStrictness::AnyHttpResponse,
            timeout,
            tier: Tier::Advanced,
            extra_containers: Vec::new(),
        },
        ServiceDescriptor {
            name: "tooljet".to_string(),
            launch: compose("tooljet"),
            readiness_port: 8082,
            readiness_path: "/".to_string(),
            strictness: ReadinessStrictness::AnyHttpResponse,
            timeout,
            tier: Tier::Advanced,
            extra_containers: Vec::new(),
        },
        ServiceDescriptor {
            name: "typebot".to_string(),
            launch: LaunchSpec::Container {
                image: "baptistearno/typebot-builder:latest".to_string(),
                container_name: "typebot-builder".to_string(),
                run_args: Vec::new(),
            },
            readiness_port: 3001,
            readiness_path: "/".to_string(),
            strictness: ReadinessStrictness::AnyHttpResponse,
            timeout,
            tier: Tier::Advanced,
            // The builder runs against a database container started outside
            // the launch unit; `stop` must reap it explicitly.
            extra_containers: vec!["typebot-db".to_string()],
        },
    ]
}

/// Select the services to operate on. `None` keeps the full registry in
/// declaration order; a tier keeps only that tier, order preserved.
pub fn select<'a>(
    services: &'a [ServiceDescriptor],
    tier: Option<Tier>,
) -> Vec<&'a ServiceDescriptor> {
    services
        .iter()
        .filter(|service| tier.is_none_or(|wanted| service.tier == wanted))
        .collect()
}
