//! Error types for parameter file parsing.
//!
//! Every fallible operation returns its own [`ParamError`]; there is no shared
//! "last error" slot. Errors raised while walking a document carry the 1-based
//! source line of the event that triggered them.

use std::path::PathBuf;

use strum::{Display, EnumDiscriminants, EnumString};

pub type Result<T> = std::result::Result<T, ParamError>;

/// Resource ceiling that a document ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Limit {
    #[strum(to_string = "string size")]
    StringSize,
    #[strum(to_string = "parameter count")]
    Parameters,
    #[strum(to_string = "array size")]
    ArrayElements,
    #[strum(to_string = "node count")]
    Nodes,
    #[strum(to_string = "nesting depth")]
    Depth,
}

#[derive(Debug, thiserror::Error, EnumDiscriminants)]
#[strum_discriminants(name(ParamErrorKind), derive(Hash, Display, EnumString))]
pub enum ParamError {
    #[error("malformed structure{}: {message}", at_line(.line))]
    MalformedStructure { message: String, line: Option<usize> },

    #[error("anchors and aliases are not supported{}", at_line(.line))]
    AliasNotSupported { line: Option<usize> },

    #[error("unsupported structure{}: {message}", at_line(.line))]
    UnsupportedStructure { message: String, line: Option<usize> },

    #[error("no enclosing node{}: {message}", at_line(.line))]
    MissingNode { message: String, line: Option<usize> },

    #[error("no value for '{key}'{}", at_line(.line))]
    MissingValue { key: String, line: Option<usize> },

    #[error("node '{0}' does not exist")]
    UnknownNode(String),

    #[error("{limit} exceeds the maximum of {max}{}", at_line(.line))]
    ResourceLimitExceeded {
        limit: Limit,
        max: usize,
        line: Option<usize>,
    },

    #[error("memory allocation failed")]
    OutOfMemory,

    #[error("invalid parser limits: {0}")]
    InvalidLimits(String),

    #[error("failed to read parameter file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn at_line(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" at line {line}"),
        None => String::new(),
    }
}

impl ParamError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedStructure {
            message: message.into(),
            line: None,
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedStructure {
            message: message.into(),
            line: None,
        }
    }

    pub(crate) fn missing_node(message: impl Into<String>) -> Self {
        Self::MissingNode {
            message: message.into(),
            line: None,
        }
    }

    pub(crate) fn missing_value(key: impl Into<String>) -> Self {
        Self::MissingValue {
            key: key.into(),
            line: None,
        }
    }

    pub(crate) fn alias() -> Self {
        Self::AliasNotSupported { line: None }
    }

    pub(crate) fn limit(limit: Limit, max: usize) -> Self {
        Self::ResourceLimitExceeded {
            limit,
            max,
            line: None,
        }
    }

    /// The fieldless kind of this error, for matching without destructuring.
    pub fn kind(&self) -> ParamErrorKind {
        self.into()
    }

    /// Source line the error was detected on, when it came from a document.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MalformedStructure { line, .. }
            | Self::AliasNotSupported { line }
            | Self::UnsupportedStructure { line, .. }
            | Self::MissingNode { line, .. }
            | Self::MissingValue { line, .. }
            | Self::ResourceLimitExceeded { line, .. } => *line,
            Self::UnknownNode(_) | Self::OutOfMemory | Self::InvalidLimits(_) | Self::Io { .. } => {
                None
            }
        }
    }

    /// Attach a source line unless one is already recorded.
    pub(crate) fn at_line(mut self, at: usize) -> Self {
        let slot = match &mut self {
            Self::MalformedStructure { line, .. }
            | Self::AliasNotSupported { line }
            | Self::UnsupportedStructure { line, .. }
            | Self::MissingNode { line, .. }
            | Self::MissingValue { line, .. }
            | Self::ResourceLimitExceeded { line, .. } => line,
            _ => return self,
        };
        if slot.is_none() {
            *slot = Some(at);
        }
        self
    }
}

impl From<std::collections::TryReserveError> for ParamError {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

impl From<indexmap::TryReserveError> for ParamError {
    fn from(_: indexmap::TryReserveError) -> Self {
        Self::OutOfMemory
    }
}
