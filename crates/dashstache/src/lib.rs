//! Dashstache - a mustache-style template engine for live data dashboards
//!
//! Dashstache renders a template against a hierarchical data store:
//! - Variables resolve relative to the sections around them
//! - Sections repeat over lists and hide on falsy values
//! - Missing data renders a placeholder instead of failing
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//!
//! let result = dashstache::render(
//!     "{{#hosts}}{{name}}={{temp}} {{/hosts}}",
//!     json!({"hosts": [{"name": "kitchen", "temp": "21"}, {"name": "attic"}]}),
//! ).unwrap();
//!
//! assert_eq!(result, "kitchen=21 attic=(XXXX) ");
//! ```

pub mod error;
pub mod html_escape;
pub mod learn;
pub mod live;
pub mod options;
pub mod renderer;
pub mod resolver;
pub mod store;
pub mod template_loader;
pub mod value;

pub use dashstache_ast::{Diagnostic, ParseError, ParseOptions, Position, TagKind, Template};
pub use error::{DashstacheError, Result};
pub use learn::{learn_requests, LearnRequest};
pub use live::{LiveView, RenderSink};
pub use options::RenderOptions;
pub use renderer::{Rendered, Renderer};
pub use resolver::{resolve, Resolution, ResolveError};
pub use store::{DataStore, PathStep, ResolvedPath};
pub use template_loader::{DirectorySource, TemplateCache, TemplateSource};
pub use value::Value;

use std::sync::Arc;

/// Main template struct for parsing once and rendering many times
#[derive(Debug, Clone)]
pub struct Dashstache {
    template: Arc<Template>,
    options: RenderOptions,
}

impl Dashstache {
    /// Parse a template source string with default options
    ///
    /// # Example
    ///
    /// ```rust
    /// use serde_json::json;
    ///
    /// let tmpl = dashstache::Dashstache::parse("Hello {{name}}!");
    /// let result = tmpl.render_json(json!({"name": "Alice"})).unwrap();
    /// assert_eq!(result, "Hello Alice!");
    /// ```
    pub fn parse(source: &str) -> Self {
        Self {
            template: Arc::new(Template::parse(source)),
            options: RenderOptions::default(),
        }
    }

    /// Parse with explicit options. Fails only in strict mode, on
    /// unbalanced sections.
    pub fn parse_with_options(source: &str, options: RenderOptions) -> Result<Self> {
        let template = Template::parse_with_options(source, options.parse_options())?;
        Ok(Self {
            template: Arc::new(template),
            options,
        })
    }

    /// Wrap an already parsed template, e.g. one from a [`TemplateCache`]
    pub fn from_template(template: Arc<Template>, options: RenderOptions) -> Self {
        Self { template, options }
    }

    /// Render against a data store snapshot
    pub fn render(&self, store: &DataStore) -> Rendered {
        renderer::render(&self.template, store, &self.options)
    }

    /// Render with JSON data. The top level must be an object.
    pub fn render_json(&self, data: serde_json::Value) -> Result<String> {
        let store = DataStore::from_json(data)?;
        Ok(self.render(&store).text())
    }

    /// Paths this template displays, addressed to the configured subject
    pub fn learn_requests(&self) -> Vec<LearnRequest> {
        learn::learn_requests(&self.template, &self.options.learn_subject)
    }

    /// Bind this template to a sink for re-rendering on data changes
    pub fn live_view<S: RenderSink>(&self, sink: S) -> LiveView<S> {
        LiveView::new(Arc::clone(&self.template), self.options.clone(), sink)
    }

    /// Get a reference to the parsed template
    pub fn template(&self) -> &Arc<Template> {
        &self.template
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }
}

/// Convenience function: parse and render in one call
///
/// # Example
///
/// ```rust
/// use serde_json::json;
///
/// let result = dashstache::render(
///     "{{^alarm}}all quiet{{/alarm}}",
///     json!({"alarm": "0"}),
/// ).unwrap();
///
/// assert_eq!(result, "all quiet");
/// ```
pub fn render(source: &str, data: serde_json::Value) -> Result<String> {
    Dashstache::parse(source).render_json(data)
}
