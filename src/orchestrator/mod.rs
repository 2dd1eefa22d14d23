pub mod routes;
pub mod session;

use crate::{
    config::RetryPolicy,
    error::AvatarError,
    logger::Timer,
    models::{GenerationRequest, GenerationResult, StyleDescriptor, STYLE_CATALOG},
};
use std::sync::Arc;

pub use routes::{DirectRoute, GenerationRoute, ProxyRoute, RouteKind};
pub use session::{BatchReport, BatchSession, ImageSource, StyleOutcome};

/// Per-style progress:
/// `Pending -> Relay(n) -> [Direct(n)] -> Succeeded | Failed`.
enum StylePhase<'a> {
    Pending,
    Relay {
        route: &'a dyn GenerationRoute,
        attempt: u32,
    },
    Direct {
        attempt: u32,
    },
    Succeeded {
        image: String,
        route: RouteKind,
    },
    Failed {
        error: AvatarError,
        route: RouteKind,
    },
}

/// Runs the style catalog against the relay first and the upstream API as a
/// fallback, one style at a time.
pub struct Orchestrator {
    proxy: Option<Arc<dyn GenerationRoute>>,
    direct: Arc<dyn GenerationRoute>,
    retry: RetryPolicy,
    styles: &'static [StyleDescriptor],
}

impl Orchestrator {
    pub fn new(direct: Arc<dyn GenerationRoute>) -> Self {
        Self {
            proxy: None,
            direct,
            retry: RetryPolicy::default(),
            styles: &STYLE_CATALOG,
        }
    }

    pub fn with_proxy(mut self, proxy: Arc<dyn GenerationRoute>) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn styles(&self) -> &'static [StyleDescriptor] {
        self.styles
    }

    /// Produces exactly one outcome per style; a failed style never stops
    /// the ones after it.
    pub async fn run_batch(&self, session: &mut BatchSession) -> BatchReport {
        let timer = Timer::new(&format!("batch {}", session.id()));
        session.begin(self.styles.len());

        for style in self.styles {
            session.set_status(format!("Generating {}...", style.label));
            let outcome = self.generate_style(style, session).await;
            if let GenerationResult::Failed { reason } = &outcome.result {
                log::error!("{} failed: {}", style.label, reason);
            }
            session.record(outcome);
        }

        let report = session.report(timer.elapsed().as_millis() as u64);
        session.set_status(report.status_line());
        report
    }

    pub async fn generate_style(
        &self,
        style: &'static StyleDescriptor,
        session: &mut BatchSession,
    ) -> StyleOutcome {
        let request = GenerationRequest::new(
            style.prompt,
            session.image_reference(),
            session.credentials().clone(),
        );

        let mut attempts = 0;
        let mut phase = StylePhase::Pending;

        loop {
            phase = match phase {
                StylePhase::Pending => match self.proxy.as_deref() {
                    Some(route) => StylePhase::Relay { route, attempt: 1 },
                    None => StylePhase::Direct { attempt: 1 },
                },
                StylePhase::Relay { route, attempt } => {
                    attempts += 1;
                    match route.generate(&request).await {
                        Ok(image) => StylePhase::Succeeded {
                            image,
                            route: RouteKind::Proxy,
                        },
                        Err(error) if error.is_endpoint_unavailable() => {
                            log::warn!(
                                "Relay unavailable for {} ({}), calling upstream directly",
                                style.label,
                                error
                            );
                            StylePhase::Direct { attempt: 1 }
                        }
                        Err(error) => {
                            if self.backoff(style, attempt, &error, session).await {
                                StylePhase::Relay {
                                    route,
                                    attempt: attempt + 1,
                                }
                            } else {
                                StylePhase::Failed {
                                    error,
                                    route: RouteKind::Proxy,
                                }
                            }
                        }
                    }
                }
                StylePhase::Direct { attempt } => {
                    attempts += 1;
                    match self.direct.generate(&request).await {
                        Ok(image) => StylePhase::Succeeded {
                            image,
                            route: RouteKind::Direct,
                        },
                        Err(error) => {
                            if self.backoff(style, attempt, &error, session).await {
                                StylePhase::Direct {
                                    attempt: attempt + 1,
                                }
                            } else {
                                StylePhase::Failed {
                                    error,
                                    route: RouteKind::Direct,
                                }
                            }
                        }
                    }
                }
                StylePhase::Succeeded { image, route } => {
                    return StyleOutcome {
                        style,
                        result: GenerationResult::Succeeded { image },
                        route,
                        attempts,
                    };
                }
                StylePhase::Failed { error, route } => {
                    return StyleOutcome {
                        style,
                        result: GenerationResult::Failed {
                            reason: error.to_string(),
                        },
                        route,
                        attempts,
                    };
                }
            };
        }
    }

    /// Sleeps and returns `true` when `error` earns another attempt.
    async fn backoff(
        &self,
        style: &StyleDescriptor,
        attempt: u32,
        error: &AvatarError,
        session: &mut BatchSession,
    ) -> bool {
        if !error.is_transient() || !self.retry.allows_retry_after(attempt) {
            return false;
        }
        let delay = self.retry.delay_for(attempt);
        log::warn!(
            "{} attempt {} failed ({}), retrying in {}ms",
            style.label,
            attempt,
            error,
            delay.as_millis()
        );
        session.set_status(format!(
            "{} retrying ({}/{})...",
            style.label,
            attempt,
            self.retry.max_attempts - 1
        ));
        tokio::time::sleep(delay).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::error::Result;
    use crate::models::GenerationRequest;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Replays a fixed script of results and records what it was asked.
    struct ScriptedRoute {
        kind: RouteKind,
        script: Mutex<VecDeque<Result<String>>>,
        fallback: fn(&GenerationRequest) -> Result<String>,
        calls: Mutex<Vec<(GenerationRequest, Instant)>>,
    }

    impl ScriptedRoute {
        fn new(kind: RouteKind, script: Vec<Result<String>>) -> Arc<Self> {
            Self::with_fallback(kind, script, |request| {
                Ok(format!("data:image/png;base64,{}", request.prompt.len()))
            })
        }

        fn with_fallback(
            kind: RouteKind,
            script: Vec<Result<String>>,
            fallback: fn(&GenerationRequest) -> Result<String>,
        ) -> Arc<Self> {
            Arc::new(Self {
                kind,
                script: Mutex::new(script.into()),
                fallback,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(GenerationRequest, Instant)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationRoute for ScriptedRoute {
        fn kind(&self) -> RouteKind {
            self.kind
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((request.clone(), Instant::now()));
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| (self.fallback)(request))
        }
    }

    fn client_creds() -> Credentials {
        Credentials::new()
            .with_api_key("client-key")
            .with_api_base("https://api.minimax.io/v1")
    }

    fn session() -> BatchSession {
        BatchSession::new("data:image/jpeg;base64,/9g=", client_creds())
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_batch_yields_one_image_per_style() {
        let proxy = ScriptedRoute::new(RouteKind::Proxy, vec![]);
        let direct = ScriptedRoute::new(RouteKind::Direct, vec![]);
        let orchestrator = Orchestrator::new(direct.clone()).with_proxy(proxy.clone());

        let mut session = session();
        let report = orchestrator.run_batch(&mut session).await;

        assert_eq!(report.outcomes.len(), 4);
        let keys: Vec<_> = report.outcomes.iter().map(|o| o.style.key).collect();
        assert_eq!(keys, vec!["corporate", "linkedin", "resume", "creative"]);
        assert!(report.outcomes.iter().all(|o| o.result.is_success()));
        assert!(report.outcomes.iter().all(|o| o.route == RouteKind::Proxy));
        assert!(direct.calls().is_empty());
        assert_eq!(report.status_line(), "Done. Compare and download your AI avatars.");
        assert_eq!(session.percent(), 100);

        let prompts: Vec<_> = proxy.calls().into_iter().map(|(r, _)| r.prompt).collect();
        let expected: Vec<_> = STYLE_CATALOG.iter().map(|s| s.prompt.to_string()).collect();
        assert_eq!(prompts, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_back_off_linearly() {
        let proxy = ScriptedRoute::new(
            RouteKind::Proxy,
            vec![
                Err(AvatarError::upstream(429, "rate limit")),
                Err(AvatarError::upstream(503, "busy")),
                Ok("data:image/png;base64,AAA".into()),
            ],
        );
        let direct = ScriptedRoute::new(RouteKind::Direct, vec![]);
        let orchestrator = Orchestrator::new(direct).with_proxy(proxy.clone());

        let mut session = session();
        let outcome = orchestrator.generate_style(&STYLE_CATALOG[0], &mut session).await;

        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.result.image(), Some("data:image/png;base64,AAA"));

        let times: Vec<_> = proxy.calls().into_iter().map(|(_, at)| at).collect();
        assert_eq!(times[1] - times[0], Duration::from_millis(2500));
        assert_eq!(times[2] - times[1], Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_transient_failure_is_final() {
        let proxy = ScriptedRoute::new(
            RouteKind::Proxy,
            vec![
                Err(AvatarError::Timeout("slow".into())),
                Err(AvatarError::Timeout("slow".into())),
                Err(AvatarError::upstream(500, "server busy")),
                Ok("never".into()),
            ],
        );
        let direct = ScriptedRoute::new(RouteKind::Direct, vec![]);
        let orchestrator = Orchestrator::new(direct.clone()).with_proxy(proxy.clone());

        let mut session = session();
        let outcome = orchestrator.generate_style(&STYLE_CATALOG[2], &mut session).await;

        assert_eq!(proxy.calls().len(), 3);
        assert!(direct.calls().is_empty());
        assert_eq!(
            outcome.result,
            GenerationResult::Failed {
                reason: "server busy".into()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_failure_never_retries() {
        let proxy = ScriptedRoute::new(
            RouteKind::Proxy,
            vec![Err(AvatarError::Validation("Missing required fields.".into()))],
        );
        let direct = ScriptedRoute::new(RouteKind::Direct, vec![]);
        let orchestrator = Orchestrator::new(direct.clone()).with_proxy(proxy.clone());

        let start = Instant::now();
        let mut session = session();
        let outcome = orchestrator.generate_style(&STYLE_CATALOG[0], &mut session).await;

        assert_eq!(outcome.attempts, 1);
        assert!(!outcome.result.is_success());
        assert_eq!(Instant::now(), start);
        assert!(direct.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_relay_falls_back_with_client_credentials() {
        let proxy = ScriptedRoute::new(
            RouteKind::Proxy,
            vec![Err(AvatarError::NotFound("HTTP 404".into()))],
        );
        let direct = ScriptedRoute::new(RouteKind::Direct, vec![Ok("https://cdn.example/a.png".into())]);
        let orchestrator = Orchestrator::new(direct.clone()).with_proxy(proxy.clone());

        let mut session = session();
        let outcome = orchestrator.generate_style(&STYLE_CATALOG[1], &mut session).await;

        assert_eq!(outcome.route, RouteKind::Direct);
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.result.image(), Some("https://cdn.example/a.png"));

        let calls = direct.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, proxy.calls()[0].0);
        assert_eq!(calls[0].0.credentials, client_creds());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_stage_has_its_own_retry_budget() {
        let proxy = ScriptedRoute::new(
            RouteKind::Proxy,
            vec![Err(AvatarError::Network("connection refused".into()))],
        );
        let direct = ScriptedRoute::new(
            RouteKind::Direct,
            vec![
                Err(AvatarError::Network("reset".into())),
                Err(AvatarError::upstream(429, "rate limit")),
                Ok("data:image/png;base64,CCC".into()),
            ],
        );
        let orchestrator = Orchestrator::new(direct.clone()).with_proxy(proxy.clone());

        let mut session = session();
        let outcome = orchestrator.generate_style(&STYLE_CATALOG[3], &mut session).await;

        assert_eq!(proxy.calls().len(), 1);
        assert_eq!(direct.calls().len(), 3);
        assert_eq!(outcome.attempts, 4);
        assert!(outcome.result.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_without_relay_goes_straight_to_upstream() {
        let direct = ScriptedRoute::new(RouteKind::Direct, vec![]);
        let orchestrator = Orchestrator::new(direct.clone());

        let mut session = session();
        let report = orchestrator.run_batch(&mut session).await;

        assert_eq!(direct.calls().len(), 4);
        assert!(report.outcomes.iter().all(|o| o.route == RouteKind::Direct));
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failures_are_collected() {
        let direct = ScriptedRoute::with_fallback(RouteKind::Direct, vec![], |request| {
            if request.prompt.starts_with("Modern LinkedIn") || request.prompt.starts_with("Creative") {
                Err(AvatarError::upstream(401, "invalid api key"))
            } else {
                Ok("data:image/png;base64,OK".into())
            }
        });
        let orchestrator = Orchestrator::new(direct.clone())
            .with_retry_policy(RetryPolicy::new().with_backoff_unit(Duration::from_millis(10)));

        let mut session = session();
        let report = orchestrator.run_batch(&mut session).await;

        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(
            report.failures(),
            vec![
                "Modern LinkedIn: invalid api key",
                "Creative Professional: invalid api key"
            ]
        );
        assert_eq!(session.status(), "Completed with 2 failed style(s).");
        assert_eq!(report.succeeded().count(), 2);
    }
}
