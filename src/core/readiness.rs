use std::time::{Duration, Instant};

use crate::config::{ReadinessStrictness, ServiceDescriptor};

/// Interval between readiness poll attempts.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What one poll attempt observed at the service's endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResponse {
    /// An HTTP response arrived with this status code.
    Http { status: u16 },
    /// No HTTP response: connection refused, reset, or timed out.
    Down,
}

/// One readiness check against `http://localhost:<port><path>`.
///
/// Both the poller and the status reporter issue their checks through this
/// trait, so "ready" means the same thing on every code path.
pub trait ReadinessProbe: Sync {
    fn check(&self, port: u16, path: &str) -> ProbeResponse;
}

/// Time source for the poll loop. Injected so tests never sleep.
pub trait Clock: Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall-clock [`Clock`] used outside of tests.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Production probe: a lightweight HTTP GET via `ureq` with short per-call
/// timeouts. Cold-starting services routinely accept the TCP connection and
/// then stall, so the call timeout doubles as the per-attempt bound.
pub struct HttpProbe {
    agent: ureq::Agent,
}

impl HttpProbe {
    pub fn new() -> Self {
        let agent = ureq::builder()
            .timeout_connect(Duration::from_secs(2))
            .timeout(Duration::from_secs(4))
            .build();
        Self { agent }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadinessProbe for HttpProbe {
    fn check(&self, port: u16, path: &str) -> ProbeResponse {
        let url = format!("http://localhost:{port}{path}");
        match self.agent.get(&url).call() {
            Ok(response) => ProbeResponse::Http {
                status: response.status(),
            },
            Err(ureq::Error::Status(status, _)) => ProbeResponse::Http { status },
            Err(ureq::Error::Transport(_)) => ProbeResponse::Down,
        }
    }
}

/// Whether a probe response satisfies the descriptor's strictness knob.
pub fn response_indicates_ready(
    response: ProbeResponse,
    strictness: ReadinessStrictness,
) -> bool {
    match (strictness, response) {
        (_, ProbeResponse::Down) => false,
        (ReadinessStrictness::AnyHttpResponse, ProbeResponse::Http { .. }) => true,
        (ReadinessStrictness::RequireSuccess, ProbeResponse::Http { status }) => {
            (200..400).contains(&status)
        }
    }
}

/// Single readiness check for a descriptor, already resolved against its
/// strictness setting.
pub fn check_service(probe: &dyn ReadinessProbe, service: &ServiceDescriptor) -> bool {
    let response = probe.check(service.readiness_port, &service.readiness_path);
    response_indicates_ready(response, service.strictness)
}

/// Terminal result of one readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessOutcome {
    Ready { elapsed: Duration },
    TimedOut { waited: Duration },
}

/// Poll a service's endpoint at a fixed interval until it answers acceptably
/// or its readiness window elapses.
///
/// The wait never ends before `service.timeout`; the final attempt lands
/// within one poll interval past it.
pub fn wait_ready(
    service: &ServiceDescriptor,
    probe: &dyn ReadinessProbe,
    clock: &dyn Clock,
) -> ReadinessOutcome {
    let started = clock.now();

    loop {
        if check_service(probe, service) {
            return ReadinessOutcome::Ready {
                elapsed: clock.now().duration_since(started),
            };
        }

        let waited = clock.now().duration_since(started);
        if waited >= service.timeout {
            return ReadinessOutcome::TimedOut { waited };
        }

        clock.sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LaunchSpec, Tier};
    use std::sync::Mutex;

    fn descriptor(timeout_secs: u64, strictness: ReadinessStrictness) -> ServiceDescriptor {
        ServiceDescriptor {
            name: "svc-a".to_string(),
            launch: LaunchSpec::Compose {
                file: "docker-compose.svc-a.yml".into(),
            },
            readiness_port: 11000,
            readiness_path: "/".to_string(),
            strictness,
            timeout: Duration::from_secs(timeout_secs),
            tier: Tier::Essential,
            extra_containers: Vec::new(),
        }
    }

    /// Clock whose `sleep` simply advances a fake now.
    struct FakeClock {
        now: Mutex<Instant>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                now: Mutex::new(Instant::now()),
            }
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }

        fn sleep(&self, duration: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += duration;
        }
    }

    /// Probe scripted with a sequence of responses; repeats the last one.
    struct ScriptedProbe {
        responses: Mutex<Vec<ProbeResponse>>,
    }

    impl ScriptedProbe {
        fn new(mut responses: Vec<ProbeResponse>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    impl ReadinessProbe for ScriptedProbe {
        fn check(&self, _port: u16, _path: &str) -> ProbeResponse {
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.pop().unwrap()
            } else {
                *responses.last().unwrap()
            }
        }
    }

    #[test]
    fn default_strictness_accepts_any_http_status() {
        assert!(response_indicates_ready(
            ProbeResponse::Http { status: 404 },
            ReadinessStrictness::AnyHttpResponse
        ));
        assert!(!response_indicates_ready(
            ProbeResponse::Down,
            ReadinessStrictness::AnyHttpResponse
        ));
    }

    #[test]
    fn strict_mode_rejects_error_statuses() {
        assert!(!response_indicates_ready(
            ProbeResponse::Http { status: 500 },
            ReadinessStrictness::RequireSuccess
        ));
        assert!(response_indicates_ready(
            ProbeResponse::Http { status: 302 },
            ReadinessStrictness::RequireSuccess
        ));
    }

    #[test]
    fn ready_after_a_few_attempts_reports_elapsed() {
        let clock = FakeClock::new();
        let probe = ScriptedProbe::new(vec![
            ProbeResponse::Down,
            ProbeResponse::Down,
            ProbeResponse::Http { status: 200 },
        ]);

        let outcome = wait_ready(&descriptor(120, ReadinessStrictness::AnyHttpResponse), &probe, &clock);
        let ReadinessOutcome::Ready { elapsed } = outcome else {
            panic!("expected ready, got {outcome:?}");
        };
        assert_eq!(elapsed, Duration::from_secs(2));
    }

    #[test]
    fn unresponsive_endpoint_times_out_at_the_window_boundary() {
        let clock = FakeClock::new();
        let probe = ScriptedProbe::new(vec![ProbeResponse::Down]);

        let outcome = wait_ready(&descriptor(5, ReadinessStrictness::AnyHttpResponse), &probe, &clock);
        let ReadinessOutcome::TimedOut { waited } = outcome else {
            panic!("expected timeout, got {outcome:?}");
        };
        assert!(waited >= Duration::from_secs(5));
        assert!(waited <= Duration::from_secs(5) + POLL_INTERVAL);
    }

    #[test]
    fn error_status_keeps_polling_under_strict_mode() {
        let clock = FakeClock::new();
        let probe = ScriptedProbe::new(vec![
            ProbeResponse::Http { status: 503 },
            ProbeResponse::Http { status: 503 },
            ProbeResponse::Http { status: 200 },
        ]);

        let outcome = wait_ready(&descriptor(120, ReadinessStrictness::RequireSuccess), &probe, &clock);
        assert!(matches!(outcome, ReadinessOutcome::Ready { .. }));
    }
}
