//! Lazily loaded, process-lifetime enhancement model handle.

use std::path::PathBuf;
use std::sync::Mutex;

use tracing::info;

use super::onnx::OnnxEnhancer;
use super::SpeechEnhancer;
use crate::error::{MediaError, MediaResult};

type Loader = Box<dyn Fn() -> MediaResult<Box<dyn SpeechEnhancer>> + Send + Sync>;

/// Shared owner of the enhancement model.
///
/// The model is loaded on the first call to [`EnhancerHandle::with_enhancer`]
/// and kept until the handle is dropped. Calls are serialized by a mutex.
/// A failed load is not cached: the next call tries again.
pub struct EnhancerHandle {
    loader: Loader,
    slot: Mutex<Option<Box<dyn SpeechEnhancer>>>,
}

impl EnhancerHandle {
    /// Create a handle that builds its model with `loader` on first use.
    pub fn lazy<F>(loader: F) -> Self
    where
        F: Fn() -> MediaResult<Box<dyn SpeechEnhancer>> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            slot: Mutex::new(None),
        }
    }

    /// Create a handle for an ONNX model file.
    pub fn onnx(model_path: impl Into<PathBuf>, sample_rate: u32) -> Self {
        let model_path = model_path.into();
        Self::lazy(move || {
            let enhancer = OnnxEnhancer::load(&model_path, sample_rate)?;
            Ok(Box::new(enhancer) as Box<dyn SpeechEnhancer>)
        })
    }

    /// Create a handle around an already constructed enhancer.
    pub fn preloaded(enhancer: Box<dyn SpeechEnhancer>) -> Self {
        Self {
            loader: Box::new(|| Err(MediaError::internal("preloaded enhancer was taken"))),
            slot: Mutex::new(Some(enhancer)),
        }
    }

    /// Whether the model has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Run `f` with exclusive access to the model, loading it if needed.
    pub fn with_enhancer<R>(
        &self,
        f: impl FnOnce(&mut dyn SpeechEnhancer) -> R,
    ) -> MediaResult<R> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| MediaError::internal("enhancer mutex poisoned"))?;

        if slot.is_none() {
            let enhancer = (self.loader)()?;
            info!(
                sample_rate = enhancer.sample_rate(),
                "Loaded speech enhancement model"
            );
            *slot = Some(enhancer);
        }

        match slot.as_mut() {
            Some(enhancer) => Ok(f(enhancer.as_mut())),
            None => Err(MediaError::internal("enhancer slot empty after load")),
        }
    }
}

impl std::fmt::Debug for EnhancerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnhancerHandle")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Identity;

    impl SpeechEnhancer for Identity {
        fn sample_rate(&self) -> u32 {
            16000
        }

        fn enhance(&mut self, chunk: &[f32]) -> MediaResult<Vec<f32>> {
            Ok(chunk.to_vec())
        }
    }

    #[test]
    fn test_loads_once_and_reuses() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let handle = EnhancerHandle::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Identity) as Box<dyn SpeechEnhancer>)
        });

        assert!(!handle.is_loaded());
        let rate = handle.with_enhancer(|e| e.sample_rate()).unwrap();
        assert_eq!(rate, 16000);
        handle.with_enhancer(|e| e.enhance(&[0.1]).unwrap()).unwrap();

        assert!(handle.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_is_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let handle = EnhancerHandle::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(MediaError::ModelNotFound("missing.onnx".into()))
        });

        assert!(handle.with_enhancer(|_| ()).is_err());
        assert!(handle.with_enhancer(|_| ()).is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(!handle.is_loaded());
    }

    #[test]
    fn test_missing_onnx_model() {
        let handle = EnhancerHandle::onnx("/nonexistent/voxclip/model.onnx", 48000);
        let err = handle.with_enhancer(|_| ()).unwrap_err();
        assert!(matches!(err, MediaError::ModelNotFound(_)));
    }
}
