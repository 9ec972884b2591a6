//! Error types for the intake wizard.

use uuid::Uuid;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("No registration flow is configured. {hint}")]
    NoFlows { hint: String },
}

/// Programmer/config errors raised by the wizard controller.
///
/// Business-rule failures (empty required fields) are never errors; they
/// are reported through the error map and navigation outcomes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("Unknown field: {key}")]
    UnknownField { key: String },

    #[error("Field {key} expects a {expected} value, got {actual}")]
    FieldShape {
        key: String,
        expected: String,
        actual: String,
    },

    #[error("Step {index} is out of range (wizard has {count} sections)")]
    StepOutOfRange { index: usize, count: usize },

    #[error("Section {section} requires undeclared field {key}")]
    UndeclaredRequirement { section: String, key: String },

    #[error("Flow {flow} has no sections")]
    EmptyFlow { flow: String },
}

/// Submission gateway errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("Intake endpoint rejected the submission with status {status}")]
    Rejected {
        status: u16,
        /// Human-readable message supplied by the endpoint, if any.
        message: Option<String>,
    },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Invalid response from intake endpoint: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// The message the endpoint supplied for the visitor, if any.
    pub fn visitor_message(&self) -> Option<&str> {
        match self {
            Self::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Session registry errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Session {id} not found")]
    NotFound { id: Uuid },

    #[error("Flow {flow} is not available")]
    UnknownFlow { flow: String },
}

/// Result type alias for the intake wizard.
pub type Result<T> = std::result::Result<T, Error>;
