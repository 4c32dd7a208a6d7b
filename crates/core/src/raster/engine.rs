//! Background-loaded raster engine.
//!
//! Loading the font database can take a while on hosts with many fonts, so
//! it happens on a blocking task at startup. Until it finishes, exports fail
//! fast with [`ExportError::EngineNotReady`] instead of stalling.

use super::text::TextEngine;
use crate::config::FontConfig;
use crate::error::{ExportError, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{error, info};

/// A loaded engine. Rasterizations take turns on the text engine.
#[derive(Debug)]
pub struct Engine {
    text: Mutex<TextEngine>,
}

impl Engine {
    /// Load synchronously.
    pub fn load(fonts: &FontConfig) -> Result<Self> {
        Ok(Self {
            text: Mutex::new(TextEngine::load(fonts)?),
        })
    }

    /// Exclusive access to the text engine.
    pub(crate) fn text(&self) -> MutexGuard<'_, TextEngine> {
        self.text.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Load progress published by the loader task.
#[derive(Debug, Clone)]
pub enum EngineState {
    Loading,
    Ready(Arc<Engine>),
    Failed(String),
}

/// Cheap, cloneable view of the engine's load state.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    state: watch::Receiver<EngineState>,
}

impl EngineHandle {
    /// Start loading on the blocking pool. Must be called inside a Tokio
    /// runtime.
    pub fn spawn(fonts: FontConfig) -> Self {
        let (tx, rx) = watch::channel(EngineState::Loading);
        tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let state = match Engine::load(&fonts) {
                Ok(engine) => {
                    info!("Raster engine ready in {:?}", start.elapsed());
                    EngineState::Ready(Arc::new(engine))
                }
                Err(e) => {
                    error!("Raster engine failed to load: {}", e);
                    EngineState::Failed(e.to_string())
                }
            };
            tx.send_replace(state);
        });
        Self { state: rx }
    }

    /// Wrap an engine that is already loaded.
    pub fn ready(engine: Engine) -> Self {
        Self::with_state(EngineState::Ready(Arc::new(engine)))
    }

    /// A handle whose state never changes.
    pub fn with_state(state: EngineState) -> Self {
        let (_tx, rx) = watch::channel(state);
        Self { state: rx }
    }

    /// Current state snapshot.
    pub fn state(&self) -> EngineState {
        self.state.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.borrow(), EngineState::Ready(_))
    }

    /// The engine, if loaded. Never waits.
    pub fn get(&self) -> Result<Arc<Engine>> {
        resolve(&self.state.borrow())
    }

    /// Wait for loading to finish, then return the engine.
    pub async fn wait_ready(&self) -> Result<Arc<Engine>> {
        let mut rx = self.state.clone();
        // An error here means the loader is gone; its last value is final.
        let _ = rx
            .wait_for(|state| !matches!(state, EngineState::Loading))
            .await;
        let state = rx.borrow().clone();
        match resolve(&state) {
            Err(ExportError::EngineNotReady) => Err(ExportError::EngineFailed(
                "engine loader exited without publishing a result".to_string(),
            )),
            other => other,
        }
    }
}

fn resolve(state: &EngineState) -> Result<Arc<Engine>> {
    match state {
        EngineState::Loading => Err(ExportError::EngineNotReady),
        EngineState::Ready(engine) => Ok(Arc::clone(engine)),
        EngineState::Failed(reason) => Err(ExportError::EngineFailed(reason.clone())),
    }
}
