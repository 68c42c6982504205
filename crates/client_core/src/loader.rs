use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{
    domain::{initial_stories, Story},
    error::{LoadFailure, LoadTransition, TransitionError},
    protocol::LoadPhase,
};
use tracing::{info, warn};

/// Simulated network latency of [`SimulatedStorySource`].
pub const SIMULATED_LATENCY: Duration = Duration::from_millis(2000);

#[async_trait]
pub trait CollectionSource<T>: Send + Sync {
    async fn fetch(&self) -> Result<Vec<T>, LoadFailure>;
}

/// Serves a fixed dataset after a fixed delay; no transport involved.
#[derive(Debug, Clone)]
pub struct SimulatedStorySource {
    delay: Duration,
    stories: Vec<Story>,
    failure: Option<LoadFailure>,
}

impl Default for SimulatedStorySource {
    fn default() -> Self {
        Self {
            delay: SIMULATED_LATENCY,
            stories: initial_stories(),
            failure: None,
        }
    }
}

impl SimulatedStorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source that rejects after the delay instead of resolving.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(LoadFailure::new(message)),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_stories(mut self, stories: Vec<Story>) -> Self {
        self.stories = stories;
        self
    }
}

#[async_trait]
impl CollectionSource<Story> for SimulatedStorySource {
    async fn fetch(&self) -> Result<Vec<Story>, LoadFailure> {
        tokio::time::sleep(self.delay).await;
        match &self.failure {
            Some(failure) => Err(failure.clone()),
            None => Ok(self.stories.clone()),
        }
    }
}

/// Lifecycle of a single fetch. `Success` and `Error` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Success(Vec<T>),
    Error(LoadFailure),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> LoadState<T> {
    pub fn phase(&self) -> LoadPhase {
        match self {
            Self::Idle => LoadPhase::Idle,
            Self::Loading => LoadPhase::Loading,
            Self::Success(_) => LoadPhase::Success,
            Self::Error(_) => LoadPhase::Error,
        }
    }

    pub fn items(&self) -> Option<&[T]> {
        match self {
            Self::Success(items) => Some(items),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&LoadFailure> {
        match self {
            Self::Error(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.expect_phase(LoadPhase::Idle, LoadTransition::Start)?;
        *self = Self::Loading;
        Ok(())
    }

    pub fn resolve(&mut self, items: Vec<T>) -> Result<(), TransitionError> {
        self.expect_phase(LoadPhase::Loading, LoadTransition::Resolve)?;
        *self = Self::Success(items);
        Ok(())
    }

    pub fn reject(&mut self, failure: LoadFailure) -> Result<(), TransitionError> {
        self.expect_phase(LoadPhase::Loading, LoadTransition::Reject)?;
        *self = Self::Error(failure);
        Ok(())
    }

    fn expect_phase(
        &self,
        expected: LoadPhase,
        transition: LoadTransition,
    ) -> Result<(), TransitionError> {
        let from = self.phase();
        if from != expected {
            return Err(TransitionError { transition, from });
        }
        Ok(())
    }
}

/// A collection source paired with the state of its one permitted fetch.
pub struct AsyncCollectionLoader<T> {
    source: Arc<dyn CollectionSource<T>>,
    state: LoadState<T>,
}

impl<T: Clone> AsyncCollectionLoader<T> {
    pub fn new(source: Arc<dyn CollectionSource<T>>) -> Self {
        Self {
            source,
            state: LoadState::Idle,
        }
    }

    pub fn source(&self) -> Arc<dyn CollectionSource<T>> {
        Arc::clone(&self.source)
    }

    pub fn state(&self) -> &LoadState<T> {
        &self.state
    }

    pub fn phase(&self) -> LoadPhase {
        self.state.phase()
    }

    /// Marks the fetch as in flight. Callers that drive the fetch themselves
    /// pair this with [`AsyncCollectionLoader::settle`].
    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.state.start()?;
        info!("loader: fetch started");
        Ok(())
    }

    pub fn settle(&mut self, outcome: Result<Vec<T>, LoadFailure>) -> Result<(), TransitionError> {
        match outcome {
            Ok(items) => {
                let count = items.len();
                self.state.resolve(items)?;
                info!(count, "loader: fetch resolved");
            }
            Err(failure) => {
                self.state.reject(failure.clone())?;
                warn!("loader: fetch rejected: {failure}");
            }
        }
        Ok(())
    }

    /// A loader only ever loads once; a second call reports the transition
    /// error as a [`LoadFailure`] and leaves the settled state untouched.
    pub async fn load(&mut self) -> Result<Vec<T>, LoadFailure> {
        self.start().map_err(|err| LoadFailure::new(err.to_string()))?;
        let outcome = self.source.fetch().await;
        self.settle(outcome.clone())
            .map_err(|err| LoadFailure::new(err.to_string()))?;
        outcome
    }
}

#[cfg(test)]
#[path = "tests/loader_tests.rs"]
mod tests;
