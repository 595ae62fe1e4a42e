//! Scenario execution: one session per scenario, steps dispatched in
//! declared order, teardown on every exit path.
//!
//! A failed step aborts the remaining steps of its scenario and is
//! reported with the underlying error kind; other scenarios are
//! unaffected and each gets an independently lifecycled session.

use crate::driver::Driver;
use crate::page::PageSet;
use crate::result::{PasosError, PasosResult};
use crate::session::{Session, SessionManager};
use crate::steps::{StepContext, StepRegistry};
use crate::sync::Interactor;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// A declarative test scenario, in the shape the case generator emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Case identifier (e.g. `TC-001`)
    #[serde(default)]
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// URL to open before the first step, if any
    #[serde(default)]
    pub url: Option<String>,
    /// Tags (e.g. `@smoke`)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Step phrases, executed in order
    #[serde(default)]
    pub steps: Vec<String>,
}

impl Scenario {
    /// Create a scenario with a title and no steps.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            url: None,
            tags: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Set the case identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the URL opened before the first step.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Append a step phrase.
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Parse a scenario from YAML.
    pub fn from_yaml(src: &str) -> PasosResult<Self> {
        Ok(serde_yaml_ng::from_str(src)?)
    }

    /// Parse a scenario from JSON.
    pub fn from_json(src: &str) -> PasosResult<Self> {
        Ok(serde_json::from_str(src)?)
    }
}

/// Result of one executed step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// The step text as dispatched
    pub text: String,
    /// Whether the step passed
    pub passed: bool,
    /// Error message if the step failed
    pub error: Option<String>,
    /// Error kind name if the step failed
    pub error_kind: Option<&'static str>,
    /// Step duration
    pub elapsed: Duration,
}

impl StepOutcome {
    fn pass(text: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            text: text.into(),
            passed: true,
            error: None,
            error_kind: None,
            elapsed,
        }
    }

    fn fail(text: impl Into<String>, error: &PasosError, elapsed: Duration) -> Self {
        Self {
            text: text.into(),
            passed: false,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            elapsed,
        }
    }
}

/// Per-scenario execution report.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    /// Case identifier
    pub id: String,
    /// Scenario title
    pub title: String,
    /// Outcomes of executed steps, in order; execution stops at the
    /// first failure, so a failed scenario's last outcome is the failure
    pub outcomes: Vec<StepOutcome>,
    /// Total scenario duration, teardown included
    pub elapsed: Duration,
}

impl ScenarioReport {
    /// Whether every executed step passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    /// The failing step, if any: its index and outcome.
    #[must_use]
    pub fn failed_step(&self) -> Option<(usize, &StepOutcome)> {
        self.outcomes
            .iter()
            .enumerate()
            .find(|(_, o)| !o.passed)
    }
}

/// Runs scenarios against a step registry and page set, managing the
/// session lifecycle around each one.
pub struct ScenarioRunner<'r> {
    registry: &'r StepRegistry,
    pages: &'r PageSet,
    interactor: Interactor,
}

impl std::fmt::Debug for ScenarioRunner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("bindings", &self.registry.len())
            .field("pages", &self.pages.len())
            .finish_non_exhaustive()
    }
}

impl<'r> ScenarioRunner<'r> {
    /// Create a runner with a default interactor.
    #[must_use]
    pub fn new(registry: &'r StepRegistry, pages: &'r PageSet) -> Self {
        Self {
            registry,
            pages,
            interactor: Interactor::new(),
        }
    }

    /// Use a custom interaction layer (e.g. shorter wait budget).
    #[must_use]
    pub fn with_interactor(mut self, interactor: Interactor) -> Self {
        self.interactor = interactor;
        self
    }

    /// Run one scenario: start a session, navigate if a URL is declared,
    /// dispatch steps in order until the first failure, then close the
    /// session unconditionally.
    ///
    /// Step failures are recorded in the report, not propagated; an `Err`
    /// here means the session itself could not be lifecycled.
    pub fn run<L>(
        &self,
        manager: &mut SessionManager,
        launch: L,
        scenario: &Scenario,
    ) -> PasosResult<ScenarioReport>
    where
        L: FnOnce() -> PasosResult<Box<dyn Driver>>,
    {
        let started = Instant::now();
        let _ = manager.start(launch)?;
        let outcomes = match manager.active() {
            Ok(session) => self.execute(session, scenario),
            Err(e) => {
                let _ = manager.close();
                return Err(e);
            }
        };
        if let Err(e) = manager.close() {
            warn!(scenario = %scenario.title, error = %e, "session teardown reported an error");
        }

        let report = ScenarioReport {
            id: scenario.id.clone(),
            title: scenario.title.clone(),
            outcomes,
            elapsed: started.elapsed(),
        };
        if let Some((index, outcome)) = report.failed_step() {
            info!(
                scenario = %report.title,
                step = index,
                kind = outcome.error_kind.unwrap_or("unknown"),
                "scenario failed"
            );
        } else {
            info!(scenario = %report.title, steps = report.outcomes.len(), "scenario passed");
        }
        Ok(report)
    }

    /// Run several scenarios, each with its own session. A failed
    /// scenario never aborts the others.
    pub fn run_all<L>(
        &self,
        manager: &mut SessionManager,
        launch: L,
        scenarios: &[Scenario],
    ) -> PasosResult<Vec<ScenarioReport>>
    where
        L: Fn() -> PasosResult<Box<dyn Driver>>,
    {
        let mut reports = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            reports.push(self.run(manager, &launch, scenario)?);
        }
        Ok(reports)
    }

    fn execute(&self, session: &Session, scenario: &Scenario) -> Vec<StepOutcome> {
        let mut outcomes = Vec::new();

        if let Some(url) = &scenario.url {
            let started = Instant::now();
            match session.driver().navigate(url) {
                Ok(()) => {
                    outcomes.push(StepOutcome::pass(format!("navegar a {url}"), started.elapsed()));
                }
                Err(e) => {
                    outcomes.push(StepOutcome::fail(
                        format!("navegar a {url}"),
                        &e,
                        started.elapsed(),
                    ));
                    return outcomes;
                }
            }
        }

        let mut ctx = StepContext::new(session, self.pages, self.interactor.clone());
        for step in &scenario.steps {
            let started = Instant::now();
            match self.registry.dispatch(step, &mut ctx) {
                Ok(()) => outcomes.push(StepOutcome::pass(step.clone(), started.elapsed())),
                Err(e) => {
                    warn!(step = %step, error = %e, "step failed, aborting remaining steps");
                    outcomes.push(StepOutcome::fail(step.clone(), &e, started.elapsed()));
                    break;
                }
            }
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{FakeDriver, FakeNode};
    use crate::locator::Locator;
    use crate::page::PageDefinition;
    use crate::session::SessionState;
    use crate::sync::WaitOptions;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn fast_interactor() -> Interactor {
        Interactor::with_options(WaitOptions::new().with_timeout(200).with_poll_interval(10))
    }

    fn login_pages() -> PageSet {
        let mut pages = PageSet::new();
        pages
            .insert(
                PageDefinition::builder("login")
                    .field("usuario", Locator::id("username"))
                    .field("password", Locator::id("password"))
                    .field("ingresar", Locator::test_id("step-3"))
                    .field("dashboard", Locator::css("div[data-test='resultado-4']"))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        pages
    }

    fn login_registry() -> StepRegistry {
        let mut registry = StepRegistry::new();
        registry
            .register("Ingresar usuario \"{word}\"", |ctx, args| {
                let user = args[0].expect_text()?.to_string();
                ctx.page("login")?.type_text("usuario", &user)
            })
            .unwrap();
        registry
            .register("Ingresar password \"{word}\"", |ctx, args| {
                let password = args[0].expect_text()?.to_string();
                ctx.page("login")?.type_text("password", &password)
            })
            .unwrap();
        registry
            .register("Presionar Ingresar", |ctx, _| ctx.page("login")?.click("ingresar"))
            .unwrap();
        registry
            .register("Validar dashboard principal", |ctx, _| {
                let visible = ctx.page("login")?.wait_visible_best_effort("dashboard")?;
                ctx.assert_that(visible, "dashboard principal no visible")
            })
            .unwrap();
        registry
    }

    fn login_dom() -> FakeDriver {
        let driver = FakeDriver::new();
        driver.add_element(&Locator::id("username"), FakeNode::new());
        driver.add_element(&Locator::id("password"), FakeNode::new());
        driver.add_element(&Locator::test_id("step-3"), FakeNode::new());
        driver.add_element(
            &Locator::css("div[data-test='resultado-4']"),
            FakeNode::new(),
        );
        driver
    }

    fn login_scenario() -> Scenario {
        Scenario::new("Login positivo")
            .with_id("TC-001")
            .with_url("https://example.com/login")
            .with_step("Ingresar usuario \"qa_user\"")
            .with_step("Ingresar password \"1234\"")
            .with_step("Presionar Ingresar")
            .with_step("Validar dashboard principal")
    }

    #[test]
    fn test_scenario_from_yaml() {
        let scenario = Scenario::from_yaml(
            r#"
id: TC-010
title: Busqueda Mercado Libre
url: https://www.mercadolibre.com.ar
tags: ["@smoke"]
steps:
  - Buscar "camisetas" en el sitio
  - Seleccionar 50 registros
"#,
        )
        .unwrap();
        assert_eq!(scenario.id, "TC-010");
        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(scenario.tags, vec!["@smoke"]);
    }

    #[test]
    fn test_passing_scenario_end_to_end() {
        init_tracing();
        let pages = login_pages();
        let registry = login_registry();
        let runner = ScenarioRunner::new(&registry, &pages).with_interactor(fast_interactor());

        let driver = login_dom();
        let probe = driver.clone();
        let mut manager = SessionManager::new();
        let report = runner
            .run(
                &mut manager,
                move || Ok(Box::new(driver) as Box<dyn Driver>),
                &login_scenario(),
            )
            .unwrap();

        assert!(report.passed());
        // Navigation is reported as the implicit first outcome.
        assert_eq!(report.outcomes.len(), 5);
        assert_eq!(probe.text_of(&Locator::id("username")).as_deref(), Some("qa_user"));
        assert_eq!(probe.clicks_of(&Locator::test_id("step-3")), 1);
        assert!(probe.was_called("navigate:https://example.com/login"));
        // Teardown ran.
        assert!(probe.was_called("quit"));
        assert_eq!(manager.state(), SessionState::Closed);
    }

    #[test]
    fn test_failing_step_aborts_remaining_and_reports_kind() {
        init_tracing();
        let pages = login_pages();
        let registry = login_registry();
        let runner = ScenarioRunner::new(&registry, &pages).with_interactor(fast_interactor());

        // Dashboard never appears: the final assertion fails; the click
        // before it still ran.
        let driver = login_dom();
        driver.remove_element(&Locator::css("div[data-test='resultado-4']"));
        let probe = driver.clone();

        let scenario = login_scenario().with_step("Presionar Ingresar");
        let mut manager = SessionManager::new();
        let report = runner
            .run(
                &mut manager,
                move || Ok(Box::new(driver) as Box<dyn Driver>),
                &scenario,
            )
            .unwrap();

        assert!(!report.passed());
        let (index, outcome) = report.failed_step().unwrap();
        // nav + 3 passing steps, then the failed assertion; the extra
        // trailing step never ran.
        assert_eq!(index, 4);
        assert_eq!(outcome.error_kind, Some("AssertionFailed"));
        assert_eq!(report.outcomes.len(), 5);
        assert_eq!(probe.clicks_of(&Locator::test_id("step-3")), 1);
        // Teardown still ran.
        assert!(probe.was_called("quit"));
        assert_eq!(manager.state(), SessionState::Closed);
    }

    #[test]
    fn test_unknown_step_fails_scenario() {
        init_tracing();
        let pages = login_pages();
        let registry = login_registry();
        let runner = ScenarioRunner::new(&registry, &pages).with_interactor(fast_interactor());

        let scenario = Scenario::new("Paso sin binding").with_step("Paso inventado");
        let mut manager = SessionManager::new();
        let report = runner
            .run(
                &mut manager,
                || Ok(Box::new(FakeDriver::new()) as Box<dyn Driver>),
                &scenario,
            )
            .unwrap();

        assert!(!report.passed());
        let (_, outcome) = report.failed_step().unwrap();
        assert_eq!(outcome.error_kind, Some("NoMatchingStep"));
    }

    #[test]
    fn test_failed_scenario_does_not_abort_others() {
        init_tracing();
        let pages = login_pages();
        let registry = login_registry();
        let runner = ScenarioRunner::new(&registry, &pages).with_interactor(fast_interactor());

        let failing = Scenario::new("Sin pasos registrados").with_step("Paso inventado");
        let passing = login_scenario();
        let mut manager = SessionManager::new();

        let reports = runner
            .run_all(
                &mut manager,
                || Ok(Box::new(login_dom()) as Box<dyn Driver>),
                &[failing, passing],
            )
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert!(!reports[0].passed());
        assert!(reports[1].passed());
    }
}
