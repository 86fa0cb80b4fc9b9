use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use crate::source::{ContentSource, ResolvedSource, SourceDescriptor, SourceKind};
use code_embed_selector::{extract, merge_spans, FunctionLocator, LanguageRegistry, RangeSpec};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One embed block as the host hands it over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// Language identifier from the block tag (`embed-python` -> `python`)
    pub language: String,

    /// Raw body of the block
    pub config_source: String,

    /// Vault path of the document containing the block
    pub document_path: String,
}

impl EmbedRequest {
    pub fn new(
        language: impl Into<String>,
        config_source: impl Into<String>,
        document_path: impl Into<String>,
    ) -> Self {
        Self {
            language: language.into(),
            config_source: config_source.into(),
            document_path: document_path.into(),
        }
    }
}

/// Final text of an embed, ready for the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEmbed {
    pub language: String,
    pub title: String,
    pub body: String,
    pub source_path: String,
    pub source_kind: SourceKind,
}

impl ResolvedEmbed {
    /// Fenced code block handed to the markdown renderer
    #[must_use]
    pub fn fenced(&self) -> String {
        format!("```{}\n{}\n```", self.language, self.body)
    }
}

/// Outcome of one resolution pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EmbedOutput {
    Code(ResolvedEmbed),
    Error { message: String },
}

impl EmbedOutput {
    /// Markdown for the renderer: the fenced block, or the inline error line
    #[must_use]
    pub fn markdown(&self) -> String {
        match self {
            Self::Code(embed) => embed.fenced(),
            Self::Error { message } => format!("`{message}`"),
        }
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Vault path the embed was read from, if it came from the vault
    #[must_use]
    pub fn vault_path(&self) -> Option<&str> {
        match self {
            Self::Code(embed) if embed.source_kind == SourceKind::Vault => {
                Some(embed.source_path.as_str())
            }
            _ => None,
        }
    }
}

impl From<Result<ResolvedEmbed>> for EmbedOutput {
    fn from(result: Result<ResolvedEmbed>) -> Self {
        match result {
            Ok(embed) => Self::Code(embed),
            Err(err) => Self::Error {
                message: err.inline_message(),
            },
        }
    }
}

/// Config -> source -> selection -> extraction, once per embed instance.
///
/// Holds no state between runs; running it again re-reads the source.
#[derive(Clone)]
pub struct EmbedPipeline {
    source: ContentSource,
    registry: Arc<LanguageRegistry>,
}

impl EmbedPipeline {
    pub fn new(source: ContentSource, registry: Arc<LanguageRegistry>) -> Self {
        Self { source, registry }
    }

    pub async fn resolve(&self, request: &EmbedRequest) -> Result<ResolvedEmbed> {
        let config = EmbedConfig::parse(&request.config_source)?;
        let raw_path = config.path.as_deref().ok_or(EmbedError::MissingPath)?;
        let descriptor = SourceDescriptor::parse(raw_path)?;

        let source = match self
            .source
            .resolve(&descriptor, &request.document_path)
            .await
        {
            Ok(source) => source,
            Err(err) => {
                log::warn!("embed in {} failed: {err}", request.document_path);
                return Err(err);
            }
        };

        self.finish(&request.language, &config, source)
    }

    /// Never fails: errors become the inline message of this one embed
    pub async fn render(&self, request: &EmbedRequest) -> EmbedOutput {
        self.resolve(request).await.into()
    }

    /// Selection and extraction on an already resolved source
    pub fn finish(
        &self,
        language: &str,
        config: &EmbedConfig,
        source: ResolvedSource,
    ) -> Result<ResolvedEmbed> {
        let selection = self.selection(language, config, &source)?;
        let body = extract(&source.text, &selection);

        let title = config
            .title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map_or_else(|| source.file_name().to_string(), str::to_string);

        Ok(ResolvedEmbed {
            language: language.to_string(),
            title,
            body,
            source_path: source.path,
            source_kind: source.kind,
        })
    }

    /// Explicit lines win over function names; neither means the full text
    pub fn selection(
        &self,
        language: &str,
        config: &EmbedConfig,
        source: &ResolvedSource,
    ) -> Result<RangeSpec> {
        if let Some(expr) = config.line_expression() {
            return Ok(RangeSpec::parse(expr));
        }

        if !config.has_functions() {
            return Ok(RangeSpec::default());
        }

        let locator = FunctionLocator::new(&self.registry);
        let mut spans = Vec::with_capacity(config.functions.len());
        for name in &config.functions {
            let span = locator
                .locate(language, name, &source.text)
                .map_err(|e| EmbedError::from_selector(e, name, &source.path))?;
            log::debug!("{name} spans lines {span} of {}", source.path);
            spans.push(span);
        }

        Ok(merge_spans(&spans))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Fetcher, Vault};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct NoVault;

    #[async_trait]
    impl Vault for NoVault {
        async fn is_file(&self, _path: &str) -> bool {
            false
        }

        async fn read(&self, path: &str) -> std::io::Result<String> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
        }
    }

    struct NoNetwork;

    #[async_trait]
    impl Fetcher for NoNetwork {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            Err(EmbedError::fetch(url, "offline"))
        }
    }

    fn pipeline() -> EmbedPipeline {
        let source = ContentSource::new(Arc::new(NoVault), Arc::new(NoNetwork));
        EmbedPipeline::new(source, Arc::new(LanguageRegistry::builtin()))
    }

    fn vault_source(path: &str, text: &str) -> ResolvedSource {
        ResolvedSource {
            text: text.to_string(),
            path: path.to_string(),
            kind: SourceKind::Vault,
        }
    }

    #[test]
    fn test_finish_defaults_title_to_file_name() {
        let config = EmbedConfig::parse("PATH: vault://src/a.py\nTITLE: '  '").unwrap();
        let embed = pipeline()
            .finish("python", &config, vault_source("src/a.py", "x = 1"))
            .unwrap();
        assert_eq!(embed.title, "a.py");
        assert_eq!(embed.fenced(), "```python\nx = 1\n```");
    }

    #[test]
    fn test_lines_skip_function_lookup() {
        let config = EmbedConfig::parse("PATH: vault://a.py\nLINES: '2'\nFUNCTION: ghost").unwrap();
        let source = vault_source("a.py", "a\nb\nc");
        let selection = pipeline().selection("python", &config, &source).unwrap();
        assert_eq!(selection.to_numbers(), vec![2, 0]);
    }

    #[test]
    fn test_unsupported_language_fails_whole_embed() {
        let config = EmbedConfig::parse("PATH: vault://a.cob\nFUNCTION: main").unwrap();
        let err = pipeline()
            .finish("cobol", &config, vault_source("a.cob", "main."))
            .unwrap_err();
        assert_eq!(err.inline_message(), "ERROR: unsupported language 'cobol'");
    }

    #[tokio::test]
    async fn test_render_never_fails() {
        let request = EmbedRequest::new("python", "PATH: vault://a.py", "notes/n.md");
        let output = pipeline().render(&request).await;
        assert_eq!(
            output.markdown(),
            "`ERROR: couldn't read file 'notes/a.py'`"
        );
        assert_eq!(output.vault_path(), None);
    }

    #[test]
    fn test_output_json_is_tagged() {
        let output = EmbedOutput::Code(ResolvedEmbed {
            language: "c".to_string(),
            title: "main.c".to_string(),
            body: "int x;".to_string(),
            source_path: "example.com/main.c".to_string(),
            source_kind: SourceKind::Web,
        });
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["status"], "code");
        assert_eq!(json["source_kind"], "web");

        let error: EmbedOutput = Result::<ResolvedEmbed>::Err(EmbedError::MissingPath).into();
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "error", "message": "ERROR: invalid source path"})
        );
    }
}
