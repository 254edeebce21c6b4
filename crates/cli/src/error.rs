// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.

use baton_core::ConfigError;
use std::fmt;
use std::path::Path;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct BatonError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    /// Original error if any
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BatonError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            source: None,
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// No identity from the flag, the environment, or the config file
    pub fn missing_identity() -> Self {
        BatonError::new("no candidate identity")
            .with_context("every candidate needs a unique, stable identity")
            .with_suggestion("pass --identity <id>")
            .with_suggestion("or set the POD_NAME environment variable")
    }

    /// Timing or identity rejected before the election starts
    pub fn invalid_config(err: ConfigError) -> Self {
        BatonError::new(format!("invalid election settings: {}", err))
            .with_context("timings must satisfy retry period < renew deadline < lease duration")
            .with_suggestion("defaults are --lease-duration 15s --renew-deadline 10s --retry-period 2s")
            .with_source(err)
    }

    /// Config file could not be read or parsed
    pub fn unreadable_config<E>(path: &Path, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BatonError::new(format!("cannot load config file {}", path.display()))
            .with_context(err.to_string())
            .with_suggestion("check the file exists and is valid TOML")
            .with_source(err)
    }
}

impl fmt::Display for BatonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                write!(f, "\n  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            write!(f, "\nsuggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                write!(f, "\n  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for BatonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn display_lists_context_and_numbered_suggestions() {
        let err = BatonError::new("Something went wrong")
            .with_context("First context")
            .with_context("Second context")
            .with_suggestion("Try this")
            .with_suggestion("Or this");

        let output = format!("{}", err);
        assert!(output.starts_with("Something went wrong"));
        assert!(output.contains("-> First context"));
        assert!(output.contains("-> Second context"));
        assert!(output.contains("1. Try this"));
        assert!(output.contains("2. Or this"));
    }

    #[test]
    fn missing_identity_points_at_flag_and_env() {
        let output = BatonError::missing_identity().to_string();
        assert!(output.contains("--identity"));
        assert!(output.contains("POD_NAME"));
    }

    #[test]
    fn invalid_config_keeps_the_source() {
        let err = BatonError::invalid_config(ConfigError::RetryNotBeforeDeadline {
            retry_period: Duration::from_secs(10),
            renew_deadline: Duration::from_secs(10),
        });

        assert!(err.to_string().contains("retry period"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
