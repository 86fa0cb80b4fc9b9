use crate::source::Vault;
use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Vault backed by a directory on disk
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// On-disk location of a vault path; `None` when it would leave the vault
    #[must_use]
    pub fn locate(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        (!escapes).then(|| self.root.join(relative))
    }

    /// Vault path (with `/` separators) of a file below the root
    #[must_use]
    pub fn vault_path(&self, file: &Path) -> Option<String> {
        let relative = file.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Some(parts.join("/"))
    }
}

#[async_trait]
impl Vault for FsVault {
    async fn is_file(&self, path: &str) -> bool {
        let Some(full) = self.locate(path) else {
            return false;
        };
        tokio::fs::metadata(&full)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn read(&self, path: &str) -> io::Result<String> {
        let full = self.locate(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::PermissionDenied, format!("{path} is outside the vault"))
        })?;
        tokio::fs::read_to_string(full).await
    }
}
