//! Application state shared across REST API handlers.

use crate::config::RestConfig;
use api_shared::ApiKey;
use resq_core::constants::STORAGE_BUS_CAPACITY;
use resq_core::{
    AdmissionDesk, BroadcastStore, Directory, FileStore, KeyValueStore, Notification,
    NotificationRelay, StorageBus, Subscription,
};
use resq_llm::{GeminiGateway, GoogleSpeechClient, LlmGateway, SpeechToText};
use std::sync::Arc;
use tokio::sync::broadcast;

const STREAM_CAPACITY: usize = 64;

/// The services a server is built from.
pub struct Services {
    pub relay: Arc<NotificationRelay>,
    pub desk: AdmissionDesk,
    pub directory: Directory,
    pub llm: Option<Arc<dyn LlmGateway>>,
    pub speech: Option<Arc<dyn SpeechToText>>,
    pub api_key: Option<ApiKey>,
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    relay: Arc<NotificationRelay>,
    desk: AdmissionDesk,
    directory: Directory,
    llm: Option<Arc<dyn LlmGateway>>,
    speech: Option<Arc<dyn SpeechToText>>,
    api_key: Option<ApiKey>,
    stream: broadcast::Sender<Notification>,
    forward: Subscription,
}

impl Drop for AppStateInner {
    fn drop(&mut self) {
        self.forward.unsubscribe();
    }
}

impl AppState {
    /// Wires the services together and starts forwarding relay notifications to WebSocket
    /// clients.
    pub fn new(services: Services) -> Self {
        let (stream, _) = broadcast::channel(STREAM_CAPACITY);
        let tx = stream.clone();
        let forward = services.relay.subscribe(move |n| {
            // No connected clients is fine.
            let _ = tx.send(n.clone());
        });

        Self {
            inner: Arc::new(AppStateInner {
                relay: services.relay,
                desk: services.desk,
                directory: services.directory,
                llm: services.llm,
                speech: services.speech,
                api_key: services.api_key,
                stream,
                forward,
            }),
        }
    }

    /// Builds the production services from `cfg`.
    ///
    /// The whole server is one storage context: the relay and the admission desk share a
    /// single [`BroadcastStore`] over the file store, so the server never receives its own
    /// writes as remote events. The watcher only delivers writes from other relays attached
    /// to the same [`StorageBus`] in this process; a standalone server has none. Must be
    /// called from within a Tokio runtime.
    pub fn from_config(cfg: &RestConfig) -> anyhow::Result<Self> {
        let backing: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(cfg.core.store_dir())?);
        let context = BroadcastStore::attach(backing, StorageBus::new(STORAGE_BUS_CAPACITY));
        let store: Arc<dyn KeyValueStore> = Arc::new(context.clone());

        let relay = Arc::new(NotificationRelay::attached(
            context,
            cfg.core.notification_capacity(),
        ));
        relay.watch();
        let desk = AdmissionDesk::new(store, relay.clone());

        let directory = match cfg.core.directory_file() {
            Some(path) => Directory::load(path)?,
            None => {
                tracing::warn!("RESQ_DIRECTORY_FILE not set, hospital directory is empty");
                Directory::empty()
            }
        };

        let llm: Option<Arc<dyn LlmGateway>> = match &cfg.llm {
            Some(llm_cfg) => {
                tracing::info!(model = llm_cfg.model(), "language model enabled");
                Some(Arc::new(GeminiGateway::new(llm_cfg.clone())?))
            }
            None => {
                tracing::warn!("RESQ_LLM_API_KEY not set, assessment endpoints are disabled");
                None
            }
        };
        let speech: Option<Arc<dyn SpeechToText>> = match &cfg.speech {
            Some(speech_cfg) => Some(Arc::new(GoogleSpeechClient::new(speech_cfg.clone())?)),
            None => {
                tracing::warn!("no speech-to-text key set, voice analysis is disabled");
                None
            }
        };

        Ok(Self::new(Services {
            relay,
            desk,
            directory,
            llm,
            speech,
            api_key: cfg.api_key.clone(),
        }))
    }

    pub fn relay(&self) -> &NotificationRelay {
        &self.inner.relay
    }

    pub fn desk(&self) -> &AdmissionDesk {
        &self.inner.desk
    }

    pub fn directory(&self) -> &Directory {
        &self.inner.directory
    }

    pub fn llm(&self) -> Option<&dyn LlmGateway> {
        self.inner.llm.as_deref()
    }

    pub fn speech(&self) -> Option<&dyn SpeechToText> {
        self.inner.speech.as_deref()
    }

    pub fn api_key(&self) -> Option<&ApiKey> {
        self.inner.api_key.as_ref()
    }

    /// A receiver for every notification delivered to this server's relay.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.inner.stream.subscribe()
    }
}
