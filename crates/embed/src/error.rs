use code_embed_selector::SelectorError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbedError>;

/// Failure of one embed instance. Never aborts the surrounding document.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("invalid embed configuration: {0}")]
    Config(String),

    #[error("embed configuration has no PATH")]
    MissingPath,

    #[error("unsupported source scheme: {0}")]
    InvalidScheme(String),

    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error("fetch of {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Template whose `end` tag names no known strategy
    #[error("language {language} has unsupported end detection {method}")]
    UnsupportedEndDetection { language: String, method: String },

    #[error("function {name} not found in {path}")]
    FunctionNotFound { name: String, path: String },

    #[error("remote source {0} cannot be edited")]
    RemoteNotEditable(String),

    #[error("no embed with id {0}")]
    UnknownEmbed(u64),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EmbedError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Map a selector failure for the function `name` of the source at `path`
    pub fn from_selector(err: SelectorError, name: &str, path: &str) -> Self {
        match err {
            SelectorError::UnsupportedLanguage(lang) => Self::UnsupportedLanguage(lang),
            SelectorError::UnsupportedEndDetection { language, method } => {
                Self::UnsupportedEndDetection { language, method }
            }
            SelectorError::FunctionNotFound { .. } => Self::FunctionNotFound {
                name: name.to_string(),
                path: path.to_string(),
            },
            other => Self::Config(other.to_string()),
        }
    }

    /// Message shown in place of the embed
    #[must_use]
    pub fn inline_message(&self) -> String {
        match self {
            Self::Config(_) => "ERROR: invalid embedding (invalid YAML)".to_string(),
            Self::MissingPath => "ERROR: invalid source path".to_string(),
            Self::InvalidScheme(_) => {
                "ERROR: invalid source path, use 'vault://...' or 'http[s]://...'".to_string()
            }
            Self::SourceNotFound(path) => format!("ERROR: couldn't read file '{path}'"),
            Self::Fetch { url, .. } => format!("ERROR: couldn't fetch '{url}'"),
            Self::UnsupportedLanguage(lang) => format!("ERROR: unsupported language '{lang}'"),
            Self::UnsupportedEndDetection { language, method } => {
                format!("ERROR: unsupported end detection {method} for language '{language}'")
            }
            Self::FunctionNotFound { name, path } => {
                format!("ERROR: function '{name}' not found in '{path}'")
            }
            Self::RemoteNotEditable(_) => {
                "ERROR: cannot directly edit website loaded files (consider saving locally)"
                    .to_string()
            }
            Self::UnknownEmbed(id) => format!("ERROR: unknown embed {id}"),
            Self::IoError(err) => format!("ERROR: {err}"),
        }
    }

    /// Inline-code markdown line for the renderer
    #[must_use]
    pub fn inline_markdown(&self) -> String {
        format!("`{}`", self.inline_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_messages() {
        assert_eq!(
            EmbedError::config("bad").inline_markdown(),
            "`ERROR: invalid embedding (invalid YAML)`"
        );
        assert_eq!(
            EmbedError::MissingPath.inline_markdown(),
            "`ERROR: invalid source path`"
        );
        assert_eq!(
            EmbedError::InvalidScheme("ftp://x".into()).inline_message(),
            "ERROR: invalid source path, use 'vault://...' or 'http[s]://...'"
        );
        assert_eq!(
            EmbedError::fetch("https://a/b", "timeout").inline_message(),
            "ERROR: couldn't fetch 'https://a/b'"
        );
    }

    #[test]
    fn test_from_selector() {
        let err = EmbedError::from_selector(
            SelectorError::function_not_found("foo"),
            "foo",
            "src/a.py",
        );
        assert_eq!(
            err.inline_message(),
            "ERROR: function 'foo' not found in 'src/a.py'"
        );

        let err = EmbedError::from_selector(
            SelectorError::unsupported_language("cobol"),
            "foo",
            "a.cob",
        );
        assert!(matches!(err, EmbedError::UnsupportedLanguage(lang) if lang == "cobol"));
    }

    #[test]
    fn test_unknown_end_detection_message() {
        let err = EmbedError::from_selector(
            SelectorError::UnsupportedEndDetection {
                language: "lisp".into(),
                method: "parens".into(),
            },
            "square",
            "a.lisp",
        );
        assert_eq!(
            err.inline_message(),
            "ERROR: unsupported end detection parens for language 'lisp'"
        );
    }
}
