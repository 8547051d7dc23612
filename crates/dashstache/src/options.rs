//! Render configuration.
//!
//! Options are plain serde data so a dashboard can keep them next to its
//! templates as JSON:
//!
//! ```json
//! { "placeholder": "--", "escape_html": true, "learn_subject": "hosts/_all" }
//! ```
//!
//! Missing fields take their defaults.

use std::fs;
use std::path::Path;

use dashstache_ast::ParseOptions;
use serde::{Deserialize, Serialize};

use crate::error::{DashstacheError, Result};

/// Text substituted for a variable whose path does not resolve.
pub const DEFAULT_PLACEHOLDER: &str = "(XXXX)";

/// Subject that learn requests are addressed to by default.
pub const DEFAULT_LEARN_SUBJECT: &str = "hosts/_all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    pub placeholder: String,
    /// HTML-escape values of `{{name}}` tags. `{{{name}}}` is never escaped.
    pub escape_html: bool,
    /// Prefix every output line with `"<source line> | "`.
    pub line_numbers: bool,
    /// Reject templates with unbalanced sections.
    pub strict: bool,
    pub learn_subject: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            escape_html: false,
            line_numbers: false,
            strict: false,
            learn_subject: DEFAULT_LEARN_SUBJECT.to_string(),
        }
    }
}

impl RenderOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DashstacheError::Config {
            message: format!("Invalid render options: {e}"),
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| DashstacheError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_json_str(&text)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            strict: self.strict,
        }
    }
}
