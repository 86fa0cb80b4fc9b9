use crate::pipeline::EmbedOutput;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a live embed inside one view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmbedId(pub u64);

impl fmt::Display for EmbedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Editor state of the host application
pub trait Workspace: Send + Sync {
    /// Vault path of the file currently focused, if any
    fn active_file(&self) -> Option<String>;

    /// Focus `path` for editing, reusing an open tab when there is one
    fn open_file(&self, path: &str);
}

/// Host markdown renderer; receives every (re-)rendered embed
pub trait Renderer: Send + Sync {
    fn render(&self, id: EmbedId, output: &EmbedOutput);
}
