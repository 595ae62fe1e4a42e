//! Page objects driven by declarative field lists.
//!
//! A [`PageDefinition`] is the data a page-object generator produces: a
//! page name plus `(field name, locator)` pairs, loadable from YAML or
//! JSON. One generic [`Page`] type executes every screen; there is no
//! per-screen class. Construction binds the definition against the current
//! session's driver and performs no waiting; the first interaction
//! triggers the wait.
//!
//! Every action targets exactly one named field. Cross-page composition
//! happens in step bindings, never by reaching into another page's
//! locators.

use crate::driver::Driver;
use crate::handle::ElementHandle;
use crate::locator::Locator;
use crate::result::{PasosError, PasosResult};
use crate::sync::Interactor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// One named locator inside a page definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name, referenced by page actions and step bindings
    pub name: String,
    /// How to find the element
    #[serde(flatten)]
    pub locator: Locator,
}

/// Declarative description of one screen: a name plus its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDefinition {
    /// Page name
    pub name: String,
    /// Ordered field list
    pub fields: Vec<FieldDef>,
}

impl PageDefinition {
    /// Start building a definition in code.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PageBuilder {
        PageBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Parse a definition from JSON.
    pub fn from_json(src: &str) -> PasosResult<Self> {
        let def: Self = serde_json::from_str(src)?;
        def.validate()?;
        Ok(def)
    }

    /// Parse a definition from YAML.
    pub fn from_yaml(src: &str) -> PasosResult<Self> {
        let def: Self = serde_yaml_ng::from_str(src)?;
        def.validate()?;
        Ok(def)
    }

    /// Load a definition file; the format is chosen by extension
    /// (`.json`, `.yaml`, `.yml`).
    pub fn from_file(path: impl AsRef<Path>) -> PasosResult<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&src),
            Some("yaml" | "yml") => Self::from_yaml(&src),
            other => Err(PasosError::DefinitionError {
                message: format!(
                    "unsupported page definition extension {other:?} for {}",
                    path.display()
                ),
            }),
        }
    }

    /// Locator of a named field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Locator> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.locator)
    }

    /// Names of all fields, in declaration order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    fn validate(&self) -> PasosResult<()> {
        if self.name.is_empty() {
            return Err(PasosError::DefinitionError {
                message: "page name must not be empty".to_string(),
            });
        }
        let mut seen = std::collections::HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(PasosError::DefinitionError {
                    message: format!(
                        "duplicate field '{}' in page '{}'",
                        field.name, self.name
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Builder for assembling a [`PageDefinition`] in code.
#[derive(Debug, Clone)]
pub struct PageBuilder {
    name: String,
    fields: Vec<FieldDef>,
}

impl PageBuilder {
    /// Add a named field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, locator: Locator) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            locator,
        });
        self
    }

    /// Finish, validating the field list.
    pub fn build(self) -> PasosResult<PageDefinition> {
        let def = PageDefinition {
            name: self.name,
            fields: self.fields,
        };
        def.validate()?;
        Ok(def)
    }
}

/// A page definition bound to a live session.
///
/// Holds a non-owning reference to the session's driver; it never creates
/// or closes the driver.
pub struct Page<'d> {
    definition: PageDefinition,
    driver: &'d dyn Driver,
    interactor: Interactor,
}

impl std::fmt::Debug for Page<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("name", &self.definition.name)
            .field("fields", &self.definition.fields.len())
            .finish_non_exhaustive()
    }
}

impl<'d> Page<'d> {
    /// Bind a definition to a session driver. Performs no waiting.
    #[must_use]
    pub fn new(definition: PageDefinition, driver: &'d dyn Driver, interactor: Interactor) -> Self {
        Self {
            definition,
            driver,
            interactor,
        }
    }

    /// Page name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// The page's definition.
    #[must_use]
    pub const fn definition(&self) -> &PageDefinition {
        &self.definition
    }

    fn handle(&self, field: &str) -> PasosResult<ElementHandle<'_>> {
        let locator = self
            .definition
            .field(field)
            .ok_or_else(|| PasosError::DefinitionError {
                message: format!("page '{}' has no field '{field}'", self.definition.name),
            })?;
        Ok(ElementHandle::new(self.driver, locator))
    }

    /// Wait for the field's element to be displayed.
    pub fn wait_visible(&self, field: &str) -> PasosResult<()> {
        self.interactor.wait_visible(&self.handle(field)?)
    }

    /// Non-throwing visibility wait on the field's element.
    pub fn wait_visible_best_effort(&self, field: &str) -> PasosResult<bool> {
        self.interactor.wait_visible_best_effort(&self.handle(field)?)
    }

    /// Click the field's element (waits visible and clickable first).
    pub fn click(&self, field: &str) -> PasosResult<()> {
        debug!(page = %self.definition.name, field, "click");
        self.interactor.click(&self.handle(field)?)
    }

    /// Type into the field's element (waits visible, clears, sends keys).
    pub fn type_text(&self, field: &str, text: &str) -> PasosResult<()> {
        debug!(page = %self.definition.name, field, "type_text");
        self.interactor.type_text(&self.handle(field)?, text)
    }

    /// Read the field's rendered text (waits visible first).
    pub fn read_text(&self, field: &str) -> PasosResult<String> {
        self.interactor.read_text(&self.handle(field)?)
    }

    /// Instant non-throwing visibility probe of the field's element.
    pub fn is_visible(&self, field: &str) -> PasosResult<bool> {
        Ok(self.interactor.is_visible(&self.handle(field)?))
    }

    /// Instant non-throwing invisibility probe of the field's element.
    pub fn is_invisible(&self, field: &str) -> PasosResult<bool> {
        Ok(self.interactor.is_invisible(&self.handle(field)?))
    }

    /// Hover the field's element. No implicit wait.
    pub fn hover(&self, field: &str) -> PasosResult<()> {
        self.interactor.hover(&self.handle(field)?)
    }

    /// Double-click the field's element. No implicit wait.
    pub fn double_click(&self, field: &str) -> PasosResult<()> {
        self.interactor.double_click(&self.handle(field)?)
    }

    /// Scroll the field's element into view. No implicit wait.
    pub fn scroll_into_view(&self, field: &str) -> PasosResult<()> {
        self.interactor.scroll_into_view(&self.handle(field)?)
    }
}

/// Registry of page definitions, instantiating pages on demand.
#[derive(Debug, Default)]
pub struct PageSet {
    definitions: HashMap<String, PageDefinition>,
}

impl PageSet {
    /// Create an empty page set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition.
    ///
    /// # Errors
    ///
    /// [`PasosError::DefinitionError`] if a page with the same name is
    /// already registered.
    pub fn insert(&mut self, definition: PageDefinition) -> PasosResult<()> {
        if self.definitions.contains_key(&definition.name) {
            return Err(PasosError::DefinitionError {
                message: format!("page '{}' registered twice", definition.name),
            });
        }
        let _ = self
            .definitions
            .insert(definition.name.clone(), definition);
        Ok(())
    }

    /// Look up a definition by page name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PageDefinition> {
        self.definitions.get(name)
    }

    /// Registered page names.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.definitions.keys().map(String::as_str).collect()
    }

    /// Number of registered pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Bind a registered definition to a session driver.
    pub fn instantiate<'d>(
        &self,
        name: &str,
        driver: &'d dyn Driver,
        interactor: Interactor,
    ) -> PasosResult<Page<'d>> {
        let definition = self
            .get(name)
            .cloned()
            .ok_or_else(|| PasosError::DefinitionError {
                message: format!("unknown page '{name}'"),
            })?;
        Ok(Page::new(definition, driver, interactor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{FakeDriver, FakeNode};
    use crate::sync::WaitOptions;

    fn login_definition() -> PageDefinition {
        PageDefinition::builder("login")
            .field("usuario", Locator::id("username"))
            .field("password", Locator::id("password"))
            .field("ingresar", Locator::test_id("step-3"))
            .field("dashboard", Locator::css("div[data-test='resultado-4']"))
            .build()
            .unwrap()
    }

    fn fast_interactor() -> Interactor {
        Interactor::with_options(WaitOptions::new().with_timeout(200).with_poll_interval(10))
    }

    mod definition_tests {
        use super::*;

        #[test]
        fn test_builder() {
            let def = login_definition();
            assert_eq!(def.name, "login");
            assert_eq!(def.field_names(), vec!["usuario", "password", "ingresar", "dashboard"]);
            assert_eq!(def.field("usuario"), Some(&Locator::id("username")));
            assert!(def.field("nope").is_none());
        }

        #[test]
        fn test_duplicate_field_rejected() {
            let err = PageDefinition::builder("login")
                .field("usuario", Locator::id("a"))
                .field("usuario", Locator::id("b"))
                .build()
                .unwrap_err();
            assert_eq!(err.kind(), "DefinitionError");
        }

        #[test]
        fn test_empty_name_rejected() {
            let err = PageDefinition::builder("").build().unwrap_err();
            assert_eq!(err.kind(), "DefinitionError");
        }

        #[test]
        fn test_from_yaml() {
            let def = PageDefinition::from_yaml(
                r#"
name: login
fields:
  - name: usuario
    strategy: id
    value: username
  - name: ingresar
    strategy: css
    value: "[data-test='step-3']"
"#,
            )
            .unwrap();
            assert_eq!(def.name, "login");
            assert_eq!(def.field("usuario"), Some(&Locator::id("username")));
        }

        #[test]
        fn test_from_json() {
            let def = PageDefinition::from_json(
                r#"{"name": "busqueda", "fields": [
                    {"name": "caja", "strategy": "css", "value": "input.nav-search-input"}
                ]}"#,
            )
            .unwrap();
            assert_eq!(def.name, "busqueda");
            assert_eq!(
                def.field("caja"),
                Some(&Locator::css("input.nav-search-input"))
            );
        }

        #[test]
        fn test_from_file_by_extension() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("login.yaml");
            std::fs::write(
                &path,
                "name: login\nfields:\n  - name: usuario\n    strategy: id\n    value: username\n",
            )
            .unwrap();
            let def = PageDefinition::from_file(&path).unwrap();
            assert_eq!(def.name, "login");

            let bad = dir.path().join("login.txt");
            std::fs::write(&bad, "x").unwrap();
            assert_eq!(
                PageDefinition::from_file(&bad).unwrap_err().kind(),
                "DefinitionError"
            );
        }
    }

    mod page_tests {
        use super::*;

        #[test]
        fn test_actions_target_named_fields() {
            let driver = FakeDriver::new();
            driver.add_element(&Locator::id("username"), FakeNode::new());
            driver.add_element(&Locator::test_id("step-3"), FakeNode::new());
            let page = Page::new(login_definition(), &driver, fast_interactor());

            page.type_text("usuario", "qa_user").unwrap();
            page.click("ingresar").unwrap();

            assert_eq!(page.read_text("usuario").unwrap(), "qa_user");
            assert_eq!(driver.clicks_of(&Locator::test_id("step-3")), 1);
        }

        #[test]
        fn test_unknown_field_is_definition_error() {
            let driver = FakeDriver::new();
            let page = Page::new(login_definition(), &driver, fast_interactor());
            let err = page.click("no_such_field").unwrap_err();
            assert_eq!(err.kind(), "DefinitionError");
        }

        #[test]
        fn test_construction_performs_no_waiting() {
            // None of the page's elements exist; binding must still be
            // instant and only the first interaction waits.
            let driver = FakeDriver::new();
            let started = std::time::Instant::now();
            let page = Page::new(login_definition(), &driver, fast_interactor());
            assert!(started.elapsed() < std::time::Duration::from_millis(20));
            assert!(!page.is_visible("usuario").unwrap());
        }

        #[test]
        fn test_visibility_probes() {
            let driver = FakeDriver::new();
            driver.add_element(&Locator::css("div[data-test='resultado-4']"), FakeNode::new());
            let page = Page::new(login_definition(), &driver, fast_interactor());

            assert!(page.is_visible("dashboard").unwrap());
            assert!(!page.is_invisible("dashboard").unwrap());
            assert!(page.is_invisible("usuario").unwrap());
        }
    }

    mod page_set_tests {
        use super::*;

        #[test]
        fn test_insert_and_instantiate() {
            let mut set = PageSet::new();
            set.insert(login_definition()).unwrap();
            assert_eq!(set.len(), 1);
            assert!(set.get("login").is_some());

            let driver = FakeDriver::new();
            let page = set.instantiate("login", &driver, fast_interactor()).unwrap();
            assert_eq!(page.name(), "login");
        }

        #[test]
        fn test_duplicate_page_rejected() {
            let mut set = PageSet::new();
            set.insert(login_definition()).unwrap();
            let err = set.insert(login_definition()).unwrap_err();
            assert_eq!(err.kind(), "DefinitionError");
        }

        #[test]
        fn test_unknown_page() {
            let set = PageSet::new();
            let driver = FakeDriver::new();
            let err = set
                .instantiate("carrito", &driver, fast_interactor())
                .unwrap_err();
            assert_eq!(err.kind(), "DefinitionError");
        }
    }
}
