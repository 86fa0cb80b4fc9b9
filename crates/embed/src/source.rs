use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const VAULT_SCHEME: &str = "vault://";
const HTTP_SCHEMES: [&str; 2] = ["https://", "http://"];

/// Host file store, addressed by vault-relative paths with `/` separators
#[async_trait]
pub trait Vault: Send + Sync {
    /// Whether `path` names an existing file (not a folder)
    async fn is_file(&self, path: &str) -> bool;

    async fn read(&self, path: &str) -> std::io::Result<String>;
}

/// Remote text transfer
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Where the full text of an embed comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceDescriptor {
    /// Path inside the vault (scheme stripped), possibly relative to the embedding document
    Vault(String),
    /// Full `http[s]://` URL
    Remote(String),
}

impl SourceDescriptor {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(EmbedError::MissingPath);
        }
        if HTTP_SCHEMES.iter().any(|scheme| raw.starts_with(scheme)) {
            return Ok(Self::Remote(raw.to_string()));
        }
        if let Some(path) = raw.strip_prefix(VAULT_SCHEME) {
            return Ok(Self::Vault(path.to_string()));
        }
        Err(EmbedError::InvalidScheme(raw.to_string()))
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vault(path) => write!(f, "{VAULT_SCHEME}{path}"),
            Self::Remote(url) => f.write_str(url),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Vault,
    Web,
}

/// Text of a resolved source plus the path shown for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSource {
    pub text: String,

    /// Vault path of the file, or the URL without its scheme
    pub path: String,

    pub kind: SourceKind,
}

impl ResolvedSource {
    /// Base name of the resolved path
    #[must_use]
    pub fn file_name(&self) -> &str {
        file_name(&self.path)
    }
}

/// Resolves descriptors against the host vault and the network
#[derive(Clone)]
pub struct ContentSource {
    vault: Arc<dyn Vault>,
    fetcher: Arc<dyn Fetcher>,
}

impl ContentSource {
    pub fn new(vault: Arc<dyn Vault>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { vault, fetcher }
    }

    /// Fetch the full text for `descriptor`.
    ///
    /// Vault paths are tried from the vault root first, then relative to the folder
    /// of `document_path` (the document doing the embedding).
    pub async fn resolve(
        &self,
        descriptor: &SourceDescriptor,
        document_path: &str,
    ) -> Result<ResolvedSource> {
        match descriptor {
            SourceDescriptor::Remote(url) => {
                let text = self.fetcher.fetch_text(url).await?;
                Ok(ResolvedSource {
                    text,
                    path: strip_http_scheme(url).to_string(),
                    kind: SourceKind::Web,
                })
            }
            SourceDescriptor::Vault(raw) => {
                let rooted = join_vault_path("", raw);
                if self.vault.is_file(&rooted).await {
                    return self.read_vault(rooted).await;
                }

                let relative = join_vault_path(parent_dir(document_path), raw);
                if self.vault.is_file(&relative).await {
                    return self.read_vault(relative).await;
                }

                log::debug!("{raw} not found from vault root nor next to {document_path}");
                Err(EmbedError::SourceNotFound(relative))
            }
        }
    }

    async fn read_vault(&self, path: String) -> Result<ResolvedSource> {
        let text = self
            .vault
            .read(&path)
            .await
            .map_err(|_| EmbedError::SourceNotFound(path.clone()))?;
        Ok(ResolvedSource {
            text,
            path,
            kind: SourceKind::Vault,
        })
    }
}

fn strip_http_scheme(url: &str) -> &str {
    HTTP_SCHEMES
        .iter()
        .find_map(|scheme| url.strip_prefix(scheme))
        .unwrap_or(url)
}

/// Join two vault paths, resolving `.` and `..`; the result always uses `/`
#[must_use]
pub fn join_vault_path(dir: &str, sub: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let components = dir.split(['/', '\\']).chain(sub.split(['/', '\\']));

    for component in components {
        match component {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            name => parts.push(name),
        }
    }

    parts.join("/")
}

/// Folder part of a vault path (`""` at the root)
#[must_use]
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Last component of a path or URL
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}
