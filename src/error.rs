use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "voice.speed", "plan.Unit 1[2]")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected range, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "export")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Failure of a single synthesis call.
///
/// Transport, backend and decode failures are all reported through this one
/// type: the assembler cannot recover from any of them, it only needs to know
/// which text failed and why.
#[derive(Debug, Clone, Error)]
pub enum SynthesisError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("backend rejected request{}: {message}", .code.map(|c| format!(" (code {})", c)).unwrap_or_default())]
    Backend { code: Option<i64>, message: String },

    #[error("could not decode synthesized audio: {0}")]
    Decode(String),
}

impl SynthesisError {
    pub fn backend(message: impl Into<String>) -> Self {
        SynthesisError::Backend {
            code: None,
            message: message.into(),
        }
    }
}

/// Unified error type for lesson assembly
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Synthesis failed for {}: {source}", describe_item(.unit, .phrase.as_deref()))]
    Synthesis {
        unit: String,
        phrase: Option<String>,
        #[source]
        source: SynthesisError,
    },

    #[error("Audio error: {message}{}", format_context(.context))]
    Audio {
        message: String,
        context: ErrorContext,
    },

    #[error("Export error: {message}{}", format_context(.context))]
    Export {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn describe_item(unit: &str, phrase: Option<&str>) -> String {
    match phrase {
        Some(phrase) => format!("phrase '{}' in unit '{}'", phrase, unit),
        None => format!("unit name '{}'", unit),
    }
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub fn audio_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Audio {
            message: msg.into(),
            context,
        }
    }

    /// Create a new export error with structured context
    pub fn export_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Export {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. }
            | Error::Validation { context, .. }
            | Error::Audio { context, .. }
            | Error::Export { context, .. } => Some(context),
            _ => None,
        }
    }

    /// The unit and phrase a synthesis failure belongs to.
    pub fn failed_item(&self) -> Option<(&str, Option<&str>)> {
        match self {
            Error::Synthesis { unit, phrase, .. } => Some((unit.as_str(), phrase.as_deref())),
            _ => None,
        }
    }
}
