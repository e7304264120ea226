//! Recipe roulette: spin, wait for the wheel to settle, land on a recipe.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::celebration::{Celebration, CelebrationSink};
use crate::random::{RandomSource, pick_one};
use crate::types::Recipe;

pub const DEFAULT_SETTLE: Duration = Duration::from_millis(2000);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinError {
    #[error("The wheel is already spinning")]
    AlreadySpinning,
    #[error("There are no recipes to spin for")]
    EmptyCatalog,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpinState {
    Idle,
    Spinning,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct SpinningGuard<'a> {
    state: &'a Mutex<SpinState>,
}

impl Drop for SpinningGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = SpinState::Idle;
    }
}

pub struct Roulette {
    settle: Duration,
    rng: Mutex<Box<dyn RandomSource>>,
    state: Mutex<SpinState>,
    spins: AtomicU64,
    last_pick: Mutex<Option<String>>,
    celebration: Option<Arc<dyn CelebrationSink>>,
}

impl Roulette {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self {
            settle: DEFAULT_SETTLE,
            rng: Mutex::new(rng),
            state: Mutex::new(SpinState::Idle),
            spins: AtomicU64::new(0),
            last_pick: Mutex::new(None),
            celebration: None,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_celebration(mut self, sink: Arc<dyn CelebrationSink>) -> Self {
        self.celebration = Some(sink);
        self
    }

    pub fn state(&self) -> SpinState {
        *lock(&self.state)
    }

    /// Completed spins only; a spin that was dropped mid-way is not counted.
    pub fn spin_count(&self) -> u64 {
        self.spins.load(Ordering::Relaxed)
    }

    pub fn last_pick(&self) -> Option<String> {
        lock(&self.last_pick).clone()
    }

    /// Spins the wheel over `catalog`. The pick is made once the wheel has
    /// settled, so it reflects the catalog at landing time.
    pub async fn spin<'c>(&self, catalog: &'c Catalog) -> Result<&'c Recipe, SpinError> {
        if catalog.is_empty() {
            return Err(SpinError::EmptyCatalog);
        }

        {
            let mut state = lock(&self.state);
            if *state == SpinState::Spinning {
                return Err(SpinError::AlreadySpinning);
            }
            *state = SpinState::Spinning;
        }
        let _spinning = SpinningGuard { state: &self.state };
        tracing::debug!(settle_ms = self.settle.as_millis() as u64, "spinning");

        tokio::time::sleep(self.settle).await;

        let recipe = {
            let mut rng = lock(&self.rng);
            pick_one(catalog.recipes(), rng.as_mut()).ok_or(SpinError::EmptyCatalog)?
        };

        self.spins.fetch_add(1, Ordering::Relaxed);
        *lock(&self.last_pick) = Some(recipe.id.clone());
        tracing::info!(recipe_id = %recipe.id, "roulette landed");

        if let Some(sink) = &self.celebration {
            sink.celebrate(&Celebration::RouletteLanded {
                recipe_id: recipe.id.clone(),
            });
        }
        Ok(recipe)
    }
}
