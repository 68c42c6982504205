use std::{
    any::Any,
    panic::AssertUnwindSafe,
    sync::{Arc, Weak},
};

use futures::FutureExt;

use shared::{
    domain::{Story, StoryId},
    error::LoadFailure,
    protocol::{ControllerSnapshot, LoadPhase},
};
use storage::KeyValueStore;
use tokio::{
    sync::{broadcast, watch, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    collection::CollectionStore,
    loader::{AsyncCollectionLoader, CollectionSource},
    persistent_cell::{PersistentCell, DEFAULT_SEARCH_TERM, SEARCH_TERM_KEY},
    view::filter,
};

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    SearchTermChanged(String),
    PhaseChanged(LoadPhase),
    ViewChanged(ControllerSnapshot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Progress {
    phase: LoadPhase,
    torn_down: bool,
}

struct ControllerState {
    loader: AsyncCollectionLoader<Story>,
    stories: CollectionStore<Story>,
    torn_down: bool,
}

/// Owns the persisted search term, the one-shot story load and the loaded
/// stories, and hands the presentation layer snapshots of the filtered view.
pub struct StoriesController {
    search: PersistentCell<String>,
    inner: Mutex<ControllerState>,
    load_task: Mutex<Option<JoinHandle<()>>>,
    progress: watch::Sender<Progress>,
    events: broadcast::Sender<ControllerEvent>,
}

impl StoriesController {
    /// Opens the search term and starts the load. The controller is already
    /// `Loading` when this returns; the fetch runs on a spawned task.
    pub async fn start(
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn CollectionSource<Story>>,
    ) -> Arc<Self> {
        let search =
            PersistentCell::open(store, SEARCH_TERM_KEY, DEFAULT_SEARCH_TERM.to_string()).await;
        let (events, _) = broadcast::channel(256);
        let (progress, _) = watch::channel(Progress {
            phase: LoadPhase::Idle,
            torn_down: false,
        });

        let controller = Arc::new(Self {
            search,
            inner: Mutex::new(ControllerState {
                loader: AsyncCollectionLoader::new(source),
                stories: CollectionStore::new(),
                torn_down: false,
            }),
            load_task: Mutex::new(None),
            progress,
            events,
        });
        controller.begin_load().await;
        controller
    }

    async fn begin_load(self: &Arc<Self>) {
        let source = {
            let mut guard = self.inner.lock().await;
            if let Err(err) = guard.loader.start() {
                warn!("controller: load not started: {err}");
                return;
            }
            guard.loader.source()
        };
        self.publish_phase(LoadPhase::Loading);

        let controller: Weak<Self> = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(source.fetch()).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(panic) => Err(LoadFailure::new(format!(
                    "collection source panicked: {}",
                    panic_message(panic.as_ref())
                ))),
            };
            match controller.upgrade() {
                Some(controller) => controller.apply_load_result(outcome).await,
                None => debug!("controller: dropped before load settled; result discarded"),
            }
        });
        *self.load_task.lock().await = Some(task);
    }

    async fn apply_load_result(&self, outcome: Result<Vec<Story>, LoadFailure>) {
        let snapshot = {
            let mut guard = self.inner.lock().await;
            if guard.torn_down {
                info!("controller: load settled after shutdown; result discarded");
                return;
            }

            let items = outcome.as_ref().ok().cloned();
            if let Err(err) = guard.loader.settle(outcome) {
                warn!("controller: ignoring load result: {err}");
                return;
            }
            if let Some(items) = items {
                guard.stories.replace_all(items);
            }
            self.snapshot_locked(&guard)
        };

        self.publish_phase(snapshot.phase);
        let _ = self.events.send(ControllerEvent::ViewChanged(snapshot));
    }

    /// A failed write is logged; the term still changes for this session.
    pub async fn on_search_changed(&self, term: impl Into<String>) -> ControllerSnapshot {
        let term = term.into();
        let guard = self.inner.lock().await;
        if let Err(err) = self.search.set(term.clone()).await {
            warn!(key = SEARCH_TERM_KEY, "controller: search term not persisted: {err:#}");
        }
        let snapshot = self.snapshot_locked(&guard);
        drop(guard);

        let _ = self.events.send(ControllerEvent::SearchTermChanged(term));
        let _ = self.events.send(ControllerEvent::ViewChanged(snapshot.clone()));
        snapshot
    }

    pub async fn on_remove_item(&self, id: StoryId) -> ControllerSnapshot {
        let mut guard = self.inner.lock().await;
        let removed = guard.stories.remove_by_id(id);
        let snapshot = self.snapshot_locked(&guard);
        drop(guard);

        if removed {
            debug!(story_id = id.0, "controller: story removed");
            let _ = self.events.send(ControllerEvent::ViewChanged(snapshot.clone()));
        }
        snapshot
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        let guard = self.inner.lock().await;
        self.snapshot_locked(&guard)
    }

    pub async fn phase(&self) -> LoadPhase {
        self.inner.lock().await.loader.phase()
    }

    pub async fn stories(&self) -> Vec<Story> {
        self.inner.lock().await.stories.items().to_vec()
    }

    pub fn search_term(&self) -> String {
        self.search.get()
    }

    pub fn subscribe_search_term(&self) -> watch::Receiver<String> {
        self.search.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// Waits for the load to reach `Success` or `Error`. Returns the phase
    /// at that point, or the current one if the controller was shut down
    /// first.
    pub async fn wait_until_settled(&self) -> LoadPhase {
        let mut progress = self.progress.subscribe();
        let settled = progress
            .wait_for(|p| p.phase.is_terminal() || p.torn_down)
            .await
            .map(|p| p.phase);
        match settled {
            Ok(phase) => phase,
            Err(_) => self.phase().await,
        }
    }

    /// Stops the pending load. Whatever it would have produced is discarded;
    /// the phase is left where it was.
    pub async fn shutdown(&self) {
        {
            let mut guard = self.inner.lock().await;
            if guard.torn_down {
                return;
            }
            guard.torn_down = true;
        }
        if let Some(task) = self.load_task.lock().await.take() {
            task.abort();
        }
        self.progress.send_modify(|p| p.torn_down = true);
        info!("controller: shut down");
    }

    fn snapshot_locked(&self, state: &ControllerState) -> ControllerSnapshot {
        let search_term = self.search.get();
        ControllerSnapshot {
            visible: filter(state.stories.items(), &search_term),
            search_term,
            phase: state.loader.phase(),
        }
    }

    fn publish_phase(&self, phase: LoadPhase) {
        self.progress.send_modify(|p| p.phase = phase);
        let _ = self.events.send(ControllerEvent::PhaseChanged(phase));
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

impl Drop for StoriesController {
    fn drop(&mut self) {
        if let Some(task) = self.load_task.get_mut().take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
