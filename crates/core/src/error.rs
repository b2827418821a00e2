use std::fmt;
use std::io;

/// Which attachment rule rejected a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyErrorKind {
    /// The task type is already attached and does not allow multiple instances.
    Duplicate,
    /// The new task declares a conflict with an attached task type.
    Conflict,
    /// A declared dependency has no attached task of that type or a subtype.
    Unmet,
    /// An auxiliary task depends on a task that is not auxiliary.
    AuxiliaryWithRegularDependency,
}

impl fmt::Display for DependencyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Duplicate => "duplicate",
            Self::Conflict => "conflict",
            Self::Unmet => "unmet dependency",
            Self::AuxiliaryWithRegularDependency => "auxiliary with regular dependency",
        };
        f.write_str(s)
    }
}

/// Errors that can occur while building or generating wrappers
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{procedure}: {message}")]
    Dependency {
        procedure: String,
        kind: DependencyErrorKind,
        message: String,
    },

    #[error("{procedure}: local variable '{name}' of task {task} is already declared by {owner}")]
    LocalCollision {
        procedure: String,
        task: String,
        name: String,
        owner: String,
    },

    #[error("No entry named '{0}' in scope")]
    Lookup(String),

    #[error("Parameter resolution failed: {0}")]
    ParameterResolution(String),

    #[error(
        "Task {task} attached to '{procedure}': attribute '{attribute}' is missing and does not have a default"
    )]
    MissingAttribute {
        task: String,
        procedure: String,
        attribute: String,
    },

    #[error(
        "Attribute '{attribute}' of task {task} attached to '{procedure}': could not convert '{value}' to {expected}"
    )]
    AttributeConversion {
        task: String,
        procedure: String,
        attribute: String,
        value: String,
        expected: String,
    },

    #[error("Unknown task type '{name}' in the {layer} layer")]
    UnknownTask { layer: String, name: String },

    #[error("Unknown procedure '{0}'")]
    UnknownProcedure(String),

    #[error("Procedure '{procedure}' is not expressible in the {layer} layer")]
    NotExpressible { procedure: String, layer: String },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Procedure '{0}' was already generated in this run")]
    AlreadyGenerated(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn dependency(
        procedure: impl Into<String>,
        kind: DependencyErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Dependency {
            procedure: procedure.into(),
            kind,
            message: message.into(),
        }
    }

    /// The rejected attachment rule, if this is a dependency error.
    pub fn dependency_kind(&self) -> Option<DependencyErrorKind> {
        match self {
            Self::Dependency { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Result type alias for wrapgen operations
pub type Result<T> = std::result::Result<T, Error>;
