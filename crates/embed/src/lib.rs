//! # Code Embed
//!
//! Live embeds of source-file regions inside markdown documents.
//!
//! ## Pipeline
//!
//! ```text
//! embed-<lang> block
//!     │
//!     ├──> EmbedConfig (YAML: PATH / TITLE / LINES / FUNCTION)
//!     │
//!     ├──> ContentSource
//!     │      ├─> vault://  (vault root, then next to the document)
//!     │      └─> http[s]:// (HttpFetcher)
//!     │
//!     ├──> Selection (LINES, else merged FUNCTION spans)
//!     │
//!     └──> Extraction -> fenced block | inline error
//! ```
//!
//! [`EmbedView`] keeps the rendered instances of one document and owns the
//! [`RefreshScheduler`] that re-renders them after their source was edited.
//!
//! ## Example
//!
//! ```no_run
//! use code_embed::{
//!     ContentSource, EmbedPipeline, EmbedRequest, FsVault, HttpFetcher, DEFAULT_FETCH_TIMEOUT,
//! };
//! use code_embed_selector::LanguageRegistry;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> code_embed::Result<()> {
//!     let source = ContentSource::new(
//!         Arc::new(FsVault::new("/path/to/vault")),
//!         Arc::new(HttpFetcher::new(DEFAULT_FETCH_TIMEOUT)?),
//!     );
//!     let pipeline = EmbedPipeline::new(source, Arc::new(LanguageRegistry::builtin()));
//!
//!     let config = "PATH: vault://src/app.py\nFUNCTION: main";
//!     let request = EmbedRequest::new("python", config, "notes/app.md");
//!     println!("{}", pipeline.render(&request).await.markdown());
//!     Ok(())
//! }
//! ```

mod blocks;
mod config;
mod error;
mod host;
mod http;
mod pipeline;
mod refresh;
mod settings;
mod source;
mod vault;
mod view;

pub use blocks::{embed_language, find_embed_blocks, EmbedBlock, EMBED_BLOCK_PREFIX};
pub use config::{EmbedConfig, KEY_FUNCTION, KEY_LINES, KEY_PATH, KEY_TITLE};
pub use error::{EmbedError, Result};
pub use host::{EmbedId, Renderer, Workspace};
pub use http::{HttpFetcher, DEFAULT_FETCH_TIMEOUT};
pub use pipeline::{EmbedOutput, EmbedPipeline, EmbedRequest, ResolvedEmbed};
pub use refresh::{RefreshScheduler, RefreshTarget, WatchHandle, WatchOutcome};
pub use settings::{RefreshConfig, ENV_REFRESH_INTERVAL_MS, ENV_REFRESH_TIMEOUT_MS};
pub use source::{
    file_name, join_vault_path, parent_dir, ContentSource, Fetcher, ResolvedSource,
    SourceDescriptor, SourceKind, Vault, VAULT_SCHEME,
};
pub use vault::FsVault;
pub use view::{EmbedInstance, EmbedView};
