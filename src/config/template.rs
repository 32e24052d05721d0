//! Command templates
//!
//! A template is a shell-style command line whose words may reference
//! `{{ version }}`. The version is shell-quoted before substitution, so after
//! word splitting it always arrives as exactly one argument, byte for byte.

use std::fmt;

use minijinja::{Environment, UndefinedBehavior, context};
use serde::{Deserialize, Serialize};

/// Version used when checking that a template expands at all
const CHECK_VERSION: &str = "0.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandTemplate(String);

/// Why a template could not be turned into a command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Template syntax error, or a variable other than `version`
    Render(String),
    /// Unbalanced quotes after substitution
    Quoting,
    /// Expanded to nothing
    Empty,
    /// The version contains a NUL byte and can't be passed as an argument
    UnquotableVersion,
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Render(msg) => write!(f, "template error: {msg}"),
            TemplateError::Quoting => f.write_str("unbalanced quotes in command"),
            TemplateError::Empty => f.write_str("command is empty"),
            TemplateError::UnquotableVersion => f.write_str("version contains a NUL byte"),
        }
    }
}

impl std::error::Error for TemplateError {}

impl CommandTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Expand into argv words: program first, then its arguments.
    pub fn expand(&self, version: &str) -> Result<Vec<String>, TemplateError> {
        let quoted = shlex::try_quote(version).map_err(|_| TemplateError::UnquotableVersion)?;

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        let rendered = env
            .render_str(&self.0, context! { version => quoted.to_string() })
            .map_err(|e| TemplateError::Render(e.to_string()))?;

        let words = shlex::split(&rendered).ok_or(TemplateError::Quoting)?;
        if words.is_empty() {
            return Err(TemplateError::Empty);
        }
        Ok(words)
    }

    /// Check the template expands for a plain version.
    pub fn check(&self) -> Result<(), TemplateError> {
        self.expand(CHECK_VERSION).map(|_| ())
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
