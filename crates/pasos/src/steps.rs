//! Step binding registry: declarative phrase patterns with typed
//! parameters, mapped onto page-object actions.
//!
//! Patterns use `{word}`, `{string}` and `{int}` placeholders compiled to
//! anchored regexes with typed capture groups. Registering literally the
//! same pattern twice is rejected up-front: a collision is an authoring
//! bug, not something dispatch should paper over. Distinct patterns that
//! happen to overlap are legal and resolve first-registered-wins, which
//! keeps dispatch deterministic.
//!
//! Handlers run synchronously in scenario order; a handler failure aborts
//! the remaining steps of that scenario only.

use crate::driver::Driver;
use crate::page::{Page, PageSet};
use crate::result::{PasosError, PasosResult};
use crate::session::Session;
use crate::sync::Interactor;
use regex::Regex;
use tracing::debug;

/// Typed parameter slot in a step pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// `{word}`: one whitespace-free token
    Word,
    /// `{string}`: a double-quoted string, captured without the quotes
    QuotedString,
    /// `{int}`: a signed integer
    Int,
}

/// A parsed, typed argument extracted from matched step text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArg {
    /// Captured `{word}` token
    Word(String),
    /// Captured `{string}` content
    Str(String),
    /// Captured `{int}` value
    Int(i64),
}

impl StepArg {
    /// Text content of a word or string argument.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Word(s) | Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    /// Value of an integer argument.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Text content, or a definition error naming the slot.
    pub fn expect_text(&self) -> PasosResult<&str> {
        self.as_text().ok_or_else(|| PasosError::DefinitionError {
            message: format!("expected a text argument, got {self:?}"),
        })
    }

    /// Integer value, or a definition error naming the slot.
    pub fn expect_int(&self) -> PasosResult<i64> {
        self.as_int().ok_or_else(|| PasosError::DefinitionError {
            message: format!("expected an integer argument, got {self:?}"),
        })
    }
}

/// A compiled step phrase pattern.
#[derive(Debug, Clone)]
pub struct StepPattern {
    source: String,
    regex: Regex,
    params: Vec<ParamType>,
}

impl StepPattern {
    /// Compile a pattern with `{word}`/`{string}`/`{int}` placeholders.
    ///
    /// # Errors
    ///
    /// [`PasosError::DefinitionError`] on unknown or unclosed
    /// placeholders.
    pub fn compile(source: &str) -> PasosResult<Self> {
        let mut pattern = String::from("^");
        let mut params = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find('{') {
            let (literal, tail) = rest.split_at(start);
            pattern.push_str(&regex::escape(literal));
            let end = tail.find('}').ok_or_else(|| PasosError::DefinitionError {
                message: format!("unclosed placeholder in pattern '{source}'"),
            })?;
            match &tail[1..end] {
                "word" => {
                    pattern.push_str(r"(\S+)");
                    params.push(ParamType::Word);
                }
                "string" => {
                    pattern.push_str(r#""([^"]*)""#);
                    params.push(ParamType::QuotedString);
                }
                "int" => {
                    pattern.push_str(r"(-?\d+)");
                    params.push(ParamType::Int);
                }
                other => {
                    return Err(PasosError::DefinitionError {
                        message: format!("unknown placeholder '{{{other}}}' in pattern '{source}'"),
                    });
                }
            }
            rest = &tail[end + 1..];
        }
        pattern.push_str(&regex::escape(rest));
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| PasosError::DefinitionError {
            message: format!("pattern '{source}' compiled to invalid regex: {e}"),
        })?;
        Ok(Self {
            source: source.to_string(),
            regex,
            params,
        })
    }

    /// The pattern as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of parameter slots.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Match step text, extracting typed arguments on success.
    #[must_use]
    pub fn matches(&self, text: &str) -> Option<Vec<StepArg>> {
        let captures = self.regex.captures(text)?;
        let mut args = Vec::with_capacity(self.params.len());
        for (i, param) in self.params.iter().enumerate() {
            let raw = captures.get(i + 1)?.as_str();
            let arg = match param {
                ParamType::Word => StepArg::Word(raw.to_string()),
                ParamType::QuotedString => StepArg::Str(raw.to_string()),
                ParamType::Int => StepArg::Int(raw.parse().ok()?),
            };
            args.push(arg);
        }
        Some(args)
    }
}

/// Execution context handed to step handlers: the scenario's session, the
/// registered pages, and the interaction layer.
pub struct StepContext<'s> {
    session: &'s Session,
    pages: &'s PageSet,
    interactor: Interactor,
    current: Option<Page<'s>>,
}

impl std::fmt::Debug for StepContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepContext")
            .field("session", &self.session.id())
            .field("current_page", &self.current.as_ref().map(Page::name))
            .finish_non_exhaustive()
    }
}

impl<'s> StepContext<'s> {
    /// Build a context bound to an active session.
    #[must_use]
    pub fn new(session: &'s Session, pages: &'s PageSet, interactor: Interactor) -> Self {
        Self {
            session,
            pages,
            interactor,
            current: None,
        }
    }

    /// The session's driver handle.
    #[must_use]
    pub fn driver(&self) -> &dyn Driver {
        self.session.driver()
    }

    /// The interaction layer.
    #[must_use]
    pub const fn interactor(&self) -> &Interactor {
        &self.interactor
    }

    /// The named page, bound to the current session. Instantiated on
    /// first use and kept while consecutive steps target the same page.
    pub fn page(&mut self, name: &str) -> PasosResult<&Page<'s>> {
        let cached = matches!(self.current.as_ref(), Some(p) if p.name() == name);
        if !cached {
            let page = self
                .pages
                .instantiate(name, self.session.driver(), self.interactor.clone())?;
            self.current = Some(page);
        }
        self.current.as_ref().ok_or_else(|| PasosError::InvalidState {
            message: "no current page".to_string(),
        })
    }

    /// Fail the step with [`PasosError::AssertionFailed`] unless the
    /// condition holds. Absence checks stay boolean queries; this is
    /// where a step turns a boolean into a verdict.
    pub fn assert_that(&self, condition: bool, message: impl Into<String>) -> PasosResult<()> {
        if condition {
            Ok(())
        } else {
            Err(PasosError::AssertionFailed {
                message: message.into(),
            })
        }
    }
}

/// Handler invoked with the scenario context and the parsed arguments.
pub type StepHandler =
    Box<dyn Fn(&mut StepContext<'_>, &[StepArg]) -> PasosResult<()> + Send + Sync>;

struct Binding {
    pattern: StepPattern,
    handler: StepHandler,
}

/// Registry mapping phrase patterns to handlers.
#[derive(Default)]
pub struct StepRegistry {
    bindings: Vec<Binding>,
}

impl std::fmt::Debug for StepRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRegistry")
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl StepRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pattern with its handler.
    ///
    /// # Errors
    ///
    /// [`PasosError::DefinitionError`] if the pattern is malformed or if
    /// an identical pattern (same source, same arity) is already
    /// registered.
    pub fn register<H>(&mut self, pattern: &str, handler: H) -> PasosResult<()>
    where
        H: Fn(&mut StepContext<'_>, &[StepArg]) -> PasosResult<()> + Send + Sync + 'static,
    {
        let compiled = StepPattern::compile(pattern)?;
        let duplicate = self.bindings.iter().any(|b| {
            b.pattern.source() == compiled.source() && b.pattern.arity() == compiled.arity()
        });
        if duplicate {
            return Err(PasosError::DefinitionError {
                message: format!("step pattern '{pattern}' registered twice"),
            });
        }
        self.bindings.push(Binding {
            pattern: compiled,
            handler: Box::new(handler),
        });
        Ok(())
    }

    /// Number of registered bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Dispatch step text to the first matching binding, in registration
    /// order, with parsed typed arguments.
    ///
    /// # Errors
    ///
    /// [`PasosError::NoMatchingStep`] when nothing matches; otherwise
    /// whatever the handler returns.
    pub fn dispatch(&self, text: &str, ctx: &mut StepContext<'_>) -> PasosResult<()> {
        for binding in &self.bindings {
            if let Some(args) = binding.pattern.matches(text) {
                debug!(pattern = binding.pattern.source(), step = text, "dispatching step");
                return (binding.handler)(ctx, &args);
            }
        }
        Err(PasosError::NoMatchingStep {
            text: text.to_string(),
        })
    }
}
