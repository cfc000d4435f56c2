use thiserror::Error;

/// Why a chart did not render. Each kind ends only its own pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetching {path}: {cause:#}")]
    Fetch { path: String, cause: anyhow::Error },

    #[error("decoding {path}: {cause:#}")]
    Decode { path: String, cause: anyhow::Error },

    #[error("rendering into #{target}: {cause:#}")]
    Render { target: String, cause: anyhow::Error },

    #[error("pipeline task for #{target} did not finish: {message}")]
    Task { target: String, message: String },
}

impl PipelineError {
    pub fn kind(&self) -> &str {
        match self {
            PipelineError::Fetch { .. } => "fetch",
            PipelineError::Decode { .. } => "decode",
            PipelineError::Render { .. } => "render",
            PipelineError::Task { .. } => "task",
        }
    }
}
