use anyhow::{bail, Context as AnyhowContext, Result};
use code_embed::{
    find_embed_blocks, ContentSource, EmbedId, EmbedOutput, EmbedPipeline, EmbedRequest,
    EmbedView, FsVault, HttpFetcher, RefreshConfig, Renderer, Workspace,
};
use code_embed_selector::LanguageRegistry;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Markdown produced by the CLI for each embed: a bold title line over the
/// fenced code, or the inline error
#[derive(Default)]
struct MarkdownRenderer {
    rendered: Mutex<BTreeMap<EmbedId, String>>,
}

impl MarkdownRenderer {
    fn take(&self, id: EmbedId) -> Option<String> {
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, id: EmbedId, output: &EmbedOutput) {
        let markdown = match output {
            EmbedOutput::Code(embed) => format!("**{}**\n{}", embed.title, embed.fenced()),
            EmbedOutput::Error { .. } => output.markdown(),
        };
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, markdown);
    }
}

/// One-shot host: the rendered document is the only open file
struct DocumentWorkspace {
    document: String,
}

impl Workspace for DocumentWorkspace {
    fn active_file(&self) -> Option<String> {
        Some(self.document.clone())
    }

    fn open_file(&self, path: &str) {
        log::info!("edit {path} in your editor, then render again");
    }
}

#[derive(Debug, Serialize)]
pub struct RenderedDocument {
    /// Vault path of the document
    pub document: String,
    pub markdown: String,
    pub embeds: Vec<EmbedOutput>,
}

impl RenderedDocument {
    pub fn error_count(&self) -> usize {
        self.embeds.iter().filter(|output| output.is_error()).count()
    }
}

/// Expand every `embed-<lang>` block of `document`, which must live inside `vault_root`.
pub async fn render_document(
    vault_root: &Path,
    document: &Path,
    registry: Arc<LanguageRegistry>,
    fetch_timeout: Duration,
) -> Result<RenderedDocument> {
    let vault_root = vault_root
        .canonicalize()
        .with_context(|| format!("Invalid vault path {}", vault_root.display()))?;
    let document = document
        .canonicalize()
        .with_context(|| format!("Invalid document path {}", document.display()))?;

    let vault = FsVault::new(&vault_root);
    let Some(document_path) = vault.vault_path(&document) else {
        bail!(
            "{} is not inside the vault {}",
            document.display(),
            vault_root.display()
        );
    };

    let markdown = tokio::fs::read_to_string(&document)
        .await
        .with_context(|| format!("Failed to read {}", document.display()))?;
    let blocks = find_embed_blocks(&markdown);
    log::debug!("{} embed block(s) in {document_path}", blocks.len());

    let refresh = RefreshConfig::from_env();
    if let Err(msg) = refresh.validate() {
        bail!("Invalid refresh settings: {msg}");
    }

    let fetcher = HttpFetcher::new(fetch_timeout).context("Failed to build HTTP client")?;
    let source = ContentSource::new(Arc::new(vault), Arc::new(fetcher));
    let renderer = Arc::new(MarkdownRenderer::default());
    let workspace = Arc::new(DocumentWorkspace {
        document: document_path.clone(),
    });
    let view = EmbedView::new(
        EmbedPipeline::new(source, registry),
        renderer.clone(),
        workspace,
        refresh,
    );

    let mut out = String::with_capacity(markdown.len());
    let mut embeds = Vec::with_capacity(blocks.len());
    let mut cursor = 0;
    for block in &blocks {
        let request = EmbedRequest::new(&block.language, &block.body, &document_path);
        let id = view.add(request).await;

        out.push_str(&markdown[cursor..block.span.start]);
        out.push_str(&renderer.take(id).unwrap_or_default());
        cursor = block.span.end;

        if let Some(output) = view.output(id) {
            embeds.push(output);
        }
    }
    out.push_str(&markdown[cursor..]);

    Ok(RenderedDocument {
        document: document_path,
        markdown: out,
        embeds,
    })
}
