//! Structured error types shared across lag-field crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`LagError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (paths, mesh sizes, ranks, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the lag-field engine.
///
/// A run is a single deterministic pass: every variant is fatal to the run
/// that raised it, and there are no retry semantics anywhere in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum LagError {
    /// A required input field or table file is absent or unreadable.
    #[error("input error: {0}")]
    Input(ErrorInfo),
    /// Two components disagree on slab boundaries for the same mesh.
    #[error("decomposition error: {0}")]
    Decomposition(ErrorInfo),
    /// Grid or mesh shape mismatch at an API boundary.
    #[error("shape error: {0}")]
    Shape(ErrorInfo),
    /// Configuration parsing or validation errors.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Field container persistence errors.
    #[error("store error: {0}")]
    Store(ErrorInfo),
    /// Worker group and collective operation errors.
    #[error("comm error: {0}")]
    Comm(ErrorInfo),
    /// Growth solver and transfer table errors.
    #[error("growth error: {0}")]
    Growth(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl LagError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            LagError::Input(info)
            | LagError::Decomposition(info)
            | LagError::Shape(info)
            | LagError::Config(info)
            | LagError::Store(info)
            | LagError::Comm(info)
            | LagError::Growth(info) => info,
        }
    }

    /// Builds the canonical missing-input error naming the absent resource.
    pub fn missing_input(resource: impl Into<String>) -> Self {
        let resource = resource.into();
        LagError::Input(
            ErrorInfo::new("missing-input", format!("required input not found: {resource}"))
                .with_context("resource", resource),
        )
    }
}
