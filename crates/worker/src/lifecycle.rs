//! Install/activate/update state machine.
//!
//! One controller instance per process owns which store generation is
//! current; state transitions are the only mutation path for that fact.
//!
//! A failed install leaves the previously active generation fully intact
//! and serving. A failed stale-generation deletion during activation is
//! logged and retried on the next activation cycle; leftover generations
//! are a storage-quota leak, never a correctness bug, since lookups only
//! ever address the current tag.

use async_trait::async_trait;
use shellkeep_client::{Destination, Network, ResourceRequest, canonicalize};
use shellkeep_core::{AppConfig, Error, StoreDb, StoredResponse, VersionStore};
use std::sync::Arc;
use tokio::sync::mpsc;
use url::Url;

/// Lifecycle states, in the order a version moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    Waiting,
    Activating,
    Active,
}

/// Messages from the registration/update channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Force a waiting version to take over immediately instead of waiting
    /// for clients of the old version to close.
    PromoteNow,
}

/// Seam to the runtime-owned set of open application instances.
///
/// The controller only requests that all current clients be brought under
/// its control; it never tracks them itself.
#[async_trait]
pub trait ClientRegistry: Send + Sync {
    async fn claim(&self) -> Result<(), Error>;
}

/// Production registry: claiming is delegated to the surrounding runtime,
/// so this only records the request.
pub struct LoggedClients;

#[async_trait]
impl ClientRegistry for LoggedClients {
    async fn claim(&self) -> Result<(), Error> {
        tracing::info!("claiming open clients");
        Ok(())
    }
}

/// Owns the install/activate/update state machine for one worker version.
pub struct LifecycleController {
    db: StoreDb,
    network: Arc<dyn Network>,
    clients: Arc<dyn ClientRegistry>,
    version: String,
    origin: Url,
    manifest: Vec<String>,
    skip_waiting: bool,
    state: WorkerState,
    store: Option<VersionStore>,
}

impl LifecycleController {
    pub fn new(
        db: StoreDb,
        network: Arc<dyn Network>,
        clients: Arc<dyn ClientRegistry>,
        config: &AppConfig,
    ) -> Result<Self, Error> {
        let origin = canonicalize(&config.origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self {
            db,
            network,
            clients,
            version: config.cache_version.clone(),
            origin,
            manifest: config.shell_manifest.clone(),
            skip_waiting: config.skip_waiting,
            state: WorkerState::Installing,
            store: None,
        })
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The store generation this version serves from. None before install.
    pub fn store(&self) -> Option<&VersionStore> {
        self.store.as_ref()
    }

    /// Run the Installing phase: seed the app shell into this version's
    /// store generation, all-or-nothing.
    ///
    /// Every manifest path is fetched into memory before anything is
    /// written, so a fetch failure aborts the install without creating a
    /// half-populated generation. Re-running after a crash is idempotent:
    /// the version row is insert-or-ignore and the writes are overwrites.
    pub async fn install(&mut self) -> Result<(), Error> {
        if self.state != WorkerState::Installing {
            return Err(Error::InvalidState(format!("install from {:?}", self.state)));
        }

        let mut shell: Vec<(String, StoredResponse)> = Vec::with_capacity(self.manifest.len());
        for path in &self.manifest {
            let url = self
                .origin
                .join(path)
                .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
            let destination = if path == "/" || path.ends_with(".html") {
                Destination::Document
            } else {
                Destination::Other
            };
            let req = ResourceRequest::get(url, destination);

            let response = self
                .network
                .fetch(&req)
                .await
                .map_err(|e| Error::ManifestFetch(format!("{path}: {e}")))?;
            if !response.status.is_success() {
                return Err(Error::ManifestFetch(format!("{path}: status {}", response.status.as_u16())));
            }

            shell.push((req.store_key(), response.to_stored(&req)));
        }

        let store = self.db.open_version(&self.version).await?;
        for (key, snapshot) in &shell {
            store.put(key, snapshot).await?;
        }

        tracing::info!(version = %self.version, entries = shell.len(), "app shell installed");

        self.store = Some(store);
        self.state = WorkerState::Waiting;

        if self.skip_waiting {
            self.promote().await?;
        }

        Ok(())
    }

    /// Move a waiting version into activation.
    pub async fn promote(&mut self) -> Result<(), Error> {
        if self.state != WorkerState::Waiting {
            return Err(Error::InvalidState(format!("promote from {:?}", self.state)));
        }
        self.activate().await
    }

    /// Handle a message from the registration/update channel.
    pub async fn handle_message(&mut self, msg: ControlMessage) -> Result<(), Error> {
        match msg {
            ControlMessage::PromoteNow => {
                if self.state == WorkerState::Waiting {
                    self.promote().await
                } else {
                    tracing::debug!(state = ?self.state, "promote-now ignored outside Waiting");
                    Ok(())
                }
            }
        }
    }

    /// Block in the Waiting state until a promote-now message arrives.
    pub async fn wait_for_promotion(&mut self, rx: &mut mpsc::Receiver<ControlMessage>) -> Result<(), Error> {
        while self.state == WorkerState::Waiting {
            match rx.recv().await {
                Some(msg) => self.handle_message(msg).await?,
                None => {
                    return Err(Error::InvalidState("control channel closed while waiting".to_string()));
                }
            }
        }
        Ok(())
    }

    /// Run the Activating phase: claim clients, then sweep every store
    /// generation whose tag differs from the current one.
    ///
    /// The sweep only ever targets non-current tags, so it is safe to run
    /// while in-flight requests read and write the current generation.
    async fn activate(&mut self) -> Result<(), Error> {
        self.state = WorkerState::Activating;

        if let Err(e) = self.clients.claim().await {
            tracing::warn!(error = %e, "client claim failed");
        }

        for tag in self.db.list_versions().await? {
            if tag == self.version {
                continue;
            }
            match self.db.delete_version(&tag).await {
                Ok(entries) => {
                    tracing::info!(stale = %tag, entries, "deleted stale store generation");
                }
                Err(e) => {
                    tracing::warn!(stale = %tag, error = %e, "stale generation deletion failed, will retry on next activation");
                }
            }
        }

        self.state = WorkerState::Active;
        tracing::info!(version = %self.version, "active");
        Ok(())
    }
}
