use crate::config::EmbedConfig;
use crate::error::{EmbedError, Result};
use crate::host::{EmbedId, Renderer, Workspace};
use crate::pipeline::{EmbedOutput, EmbedPipeline, EmbedRequest};
use crate::refresh::{RefreshScheduler, RefreshTarget, WatchHandle};
use crate::settings::RefreshConfig;
use crate::source::SourceKind;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Live, rendered occurrence of one embed block
#[derive(Debug, Clone)]
pub struct EmbedInstance {
    pub id: EmbedId,
    pub request: EmbedRequest,
    pub output: EmbedOutput,

    /// Vault path this instance was last rendered from. Kept when a later pass fails so
    /// the instance still refreshes once its source is fixed.
    pub source_path: Option<String>,
}

impl EmbedInstance {
    fn update(&mut self, output: EmbedOutput) {
        if let Some(path) = output.vault_path() {
            self.source_path = Some(path.to_string());
        }
        self.output = output;
    }
}

/// The embeds of one rendered document.
///
/// Owns the [`RefreshScheduler`]; dropping the view cancels its pending watches.
pub struct EmbedView {
    pipeline: EmbedPipeline,
    renderer: Arc<dyn Renderer>,
    workspace: Arc<dyn Workspace>,
    scheduler: RefreshScheduler,
    instances: Mutex<BTreeMap<EmbedId, EmbedInstance>>,
    next_id: AtomicU64,
    me: Weak<EmbedView>,
}

impl EmbedView {
    pub fn new(
        pipeline: EmbedPipeline,
        renderer: Arc<dyn Renderer>,
        workspace: Arc<dyn Workspace>,
        refresh: RefreshConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            pipeline,
            renderer,
            scheduler: RefreshScheduler::new(workspace.clone(), refresh),
            workspace,
            instances: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            me: me.clone(),
        })
    }

    /// Resolve and render a new embed block
    pub async fn add(&self, request: EmbedRequest) -> EmbedId {
        let id = EmbedId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let output = self.pipeline.render(&request).await;
        self.renderer.render(id, &output);

        let instance = EmbedInstance {
            id,
            request,
            source_path: output.vault_path().map(str::to_string),
            output,
        };
        self.lock().insert(id, instance);
        id
    }

    /// Forget an instance; in-flight refreshes of it are discarded
    pub fn remove(&self, id: EmbedId) -> Option<EmbedInstance> {
        self.lock().remove(&id)
    }

    #[must_use]
    pub fn output(&self, id: EmbedId) -> Option<EmbedOutput> {
        self.lock().get(&id).map(|instance| instance.output.clone())
    }

    #[must_use]
    pub fn instance(&self, id: EmbedId) -> Option<EmbedInstance> {
        self.lock().get(&id).cloned()
    }

    /// Ids of the live instances rendered from the vault file `path`
    #[must_use]
    pub fn instances_of(&self, path: &str) -> Vec<EmbedId> {
        self.lock()
            .values()
            .filter(|instance| instance.source_path.as_deref() == Some(path))
            .map(|instance| instance.id)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Manual refresh of one instance
    pub async fn refresh(&self, id: EmbedId) -> Result<EmbedOutput> {
        let request = self
            .lock()
            .get(&id)
            .map(|instance| instance.request.clone())
            .ok_or(EmbedError::UnknownEmbed(id.0))?;

        let output = self.pipeline.render(&request).await;
        self.store(id, &output);
        Ok(output)
    }

    /// Open the source of an embed for editing and watch for the end of the session.
    ///
    /// Remote sources cannot be edited.
    pub fn edit(&self, id: EmbedId) -> Result<WatchHandle> {
        let instance = self.instance(id).ok_or(EmbedError::UnknownEmbed(id.0))?;

        if let EmbedOutput::Code(embed) = &instance.output {
            if embed.source_kind == SourceKind::Web {
                return Err(EmbedError::RemoteNotEditable(embed.source_path.clone()));
            }
        }

        let Some(path) = instance.source_path else {
            let raw = EmbedConfig::parse(&instance.request.config_source)
                .ok()
                .and_then(|config| config.path)
                .unwrap_or_default();
            return Err(EmbedError::SourceNotFound(raw));
        };

        log::debug!("opening {path} for embed {id}");
        self.workspace.open_file(&path);
        Ok(self.scheduler.watch(path, self.target()))
    }

    /// Host signal: the active file changed away from `previous`.
    ///
    /// Starts a watch when some live embed was rendered from `previous`.
    pub fn active_file_changed(&self, previous: &str) -> Option<WatchHandle> {
        if self.instances_of(previous).is_empty() {
            return None;
        }
        Some(self.scheduler.watch(previous, self.target()))
    }

    /// Cancel every pending watch
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    fn target(&self) -> Weak<dyn RefreshTarget> {
        self.me.clone()
    }

    fn store(&self, id: EmbedId, output: &EmbedOutput) {
        let mut instances = self.lock();
        let Some(instance) = instances.get_mut(&id) else {
            log::debug!("embed {id} removed during refresh");
            return;
        };
        instance.update(output.clone());
        drop(instances);
        self.renderer.render(id, output);
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<EmbedId, EmbedInstance>> {
        self.instances
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RefreshTarget for EmbedView {
    async fn refresh_source(&self, path: &str) -> usize {
        let pending: Vec<(EmbedId, EmbedRequest)> = self
            .lock()
            .values()
            .filter(|instance| instance.source_path.as_deref() == Some(path))
            .map(|instance| (instance.id, instance.request.clone()))
            .collect();

        for (id, request) in &pending {
            let output = self.pipeline.render(request).await;
            self.store(*id, &output);
        }
        pending.len()
    }
}
