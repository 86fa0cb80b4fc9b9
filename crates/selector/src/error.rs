use thiserror::Error;

/// Result type for selector operations
pub type Result<T> = std::result::Result<T, SelectorError>;

/// Errors that can occur while selecting lines or locating functions
#[derive(Error, Debug)]
pub enum SelectorError {
    /// No template registered for the language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The template names an end-detection strategy that is not implemented
    #[error("Unsupported end detection method '{method}' for language {language}")]
    UnsupportedEndDetection { language: String, method: String },

    /// No line matched the start anchor of the function
    #[error("Function {name} not found")]
    FunctionNotFound { name: String },

    /// The start anchor of a template did not compile
    #[error("Invalid start template for {language}: {source}")]
    InvalidTemplate {
        language: String,
        #[source]
        source: regex::Error,
    },

    /// Template file could not be parsed
    #[error("Invalid template file: {0}")]
    TemplateFile(#[from] toml::de::Error),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl SelectorError {
    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create a function-not-found error
    pub fn function_not_found(name: impl Into<String>) -> Self {
        Self::FunctionNotFound { name: name.into() }
    }

    /// Whether this error means "nothing to show" rather than a broken setup
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::FunctionNotFound { .. })
    }
}
