//! ONNX Runtime backed waveform enhancer.

use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::debug;

use super::SpeechEnhancer;
use crate::error::{MediaError, MediaResult};

/// Runs a single-input, single-output enhancement graph.
///
/// The graph takes `[1, N]` float samples and returns `[1, N]` or `[N]`.
pub struct OnnxEnhancer {
    session: Session,
    output_name: String,
    sample_rate: u32,
}

impl OnnxEnhancer {
    pub fn load(model_path: &Path, sample_rate: u32) -> MediaResult<Self> {
        if !model_path.exists() {
            return Err(MediaError::ModelNotFound(model_path.display().to_string()));
        }

        let model_bytes = std::fs::read(model_path)
            .map_err(|e| MediaError::enhancement(format!("ORT read model file: {e}")))?;

        let session = build_session(&model_bytes)?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| MediaError::enhancement("model declares no outputs"))?;

        debug!(
            model = %model_path.display(),
            output = %output_name,
            sample_rate,
            "Built ONNX enhancement session"
        );

        Ok(Self {
            session,
            output_name,
            sample_rate,
        })
    }
}

/// Build a session, preferring CUDA when the feature is enabled.
fn build_session(model_bytes: &[u8]) -> MediaResult<Session> {
    let builder = Session::builder()
        .map_err(|e| MediaError::enhancement(format!("ORT session builder: {e}")))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| MediaError::enhancement(format!("ORT opt level: {e}")))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(model_bytes) {
                tracing::info!("Using CUDA execution provider for speech enhancement");
                return Ok(session);
            }
        }
        debug!("CUDA execution provider not available, using CPU");
    }

    builder
        .commit_from_memory(model_bytes)
        .map_err(|e| MediaError::enhancement(format!("ORT load model: {e}")))
}

impl SpeechEnhancer for OnnxEnhancer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn enhance(&mut self, chunk: &[f32]) -> MediaResult<Vec<f32>> {
        let shape = vec![1usize, chunk.len()];
        let tensor: Value = Tensor::from_array((shape, chunk.to_vec().into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| MediaError::enhancement(format!("ORT tensor: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| MediaError::enhancement(format!("ORT run failed: {e}")))?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| MediaError::enhancement("ORT returned no outputs"))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| MediaError::enhancement(format!("ORT extract: {e}")))?;

        // Accept [1, N] or [N]
        match shape.len() {
            1 => {}
            2 if shape[0] == 1 => {}
            _ => {
                return Err(MediaError::enhancement(format!(
                    "Unexpected enhancement output shape: {:?}",
                    shape
                )))
            }
        }

        Ok(data.to_vec())
    }
}
