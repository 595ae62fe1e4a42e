//! Pasos: Browser-Driven Acceptance Testing Harness
//!
//! Pasos (Spanish: "steps") binds natural-language step phrases to
//! synchronized browser interactions over declarative page objects,
//! with a per-scenario session lifecycle.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     PASOS Architecture                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Step       │    │ Browser    │            │
//! │   │ (steps)    │───►│ Registry + │───►│ Session    │            │
//! │   │            │    │ Page Set   │    │ (Driver)   │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every interaction goes through the synchronized layer in [`sync`]:
//! wait for the element to be visible (polled, bounded by a timeout),
//! then act. Step handlers never touch raw selectors; they address page
//! fields by name.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod result;

mod locator;

/// Driver abstraction over a live browser, plus an in-memory fake for
/// tests.
pub mod driver;

mod handle;

/// Synchronized interaction layer: polled waits, retried actions,
/// visibility probes.
pub mod sync;

mod session;

/// Declarative page objects: named fields over locators, loadable from
/// JSON or YAML.
pub mod page;

/// Step binding registry: phrase patterns with typed placeholders
/// dispatched to handlers.
pub mod steps;

mod scenario;

pub use driver::{Driver, ElementRef, FakeDriver, FakeNode};
pub use handle::ElementHandle;
pub use locator::{Locator, Strategy};
pub use page::{FieldDef, Page, PageBuilder, PageDefinition, PageSet};
pub use result::{PasosError, PasosResult};
pub use scenario::{Scenario, ScenarioReport, ScenarioRunner, StepOutcome};
pub use session::{Session, SessionManager, SessionState};
pub use steps::{ParamType, StepArg, StepContext, StepHandler, StepPattern, StepRegistry};
pub use sync::{Interactor, WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};
