//! # Application State
//!
//! Shared state for the Axum application: the batch lifecycle engine.
//!
//! Engine calls take parking_lot locks and may sync the audit file, so
//! handlers run them through [`AppState::run`] on the blocking pool.

use std::sync::Arc;

use lotgate_engine::BatchLifecycle;

use crate::error::AppError;

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The lifecycle engine.
    pub engine: Arc<BatchLifecycle>,
}

impl AppState {
    /// Wrap an engine.
    pub fn new(engine: BatchLifecycle) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Run `f` against the engine on the blocking thread pool.
    pub async fn run<T, F>(&self, f: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: FnOnce(&BatchLifecycle) -> Result<T, AppError> + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || f(&engine))
            .await
            .map_err(|e| AppError::Internal(format!("engine task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotgate_engine::{PlantConfig, SystemClock};

    fn state() -> AppState {
        let engine = PlantConfig::from_yaml_str("supervisor: sup")
            .unwrap()
            .build_engine(Arc::new(SystemClock))
            .unwrap();
        AppState::new(engine)
    }

    #[tokio::test]
    async fn run_leaves_the_async_thread() {
        let caller = std::thread::current().id();
        let worker = state()
            .run(|_| Ok(std::thread::current().id()))
            .await
            .unwrap();
        assert_ne!(worker, caller);
    }

    #[tokio::test]
    async fn run_propagates_handler_errors() {
        let result: Result<(), AppError> = state()
            .run(|_| Err(AppError::NotFound("batch B9 not found".into())))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
