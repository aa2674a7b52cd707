//! Pipeline and step errors.
//!
//! A failure reads outward from the detail: the `ComposeError` or I/O error,
//! wrapped in the `StepError` of the step that hit it, wrapped in the
//! `PipelineError` naming the job.

use std::io;

use thiserror::Error;

use crate::error::ComposeError;

/// A composition run that did not produce an output.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Job '{job_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        job_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Settings rejected before any engine ran.
    #[error("Job '{job_name}' has invalid settings: {message}")]
    ValidationFailed { job_name: String, message: String },

    #[error("Job '{job_name}' was cancelled")]
    Cancelled { job_name: String },

    /// Logger or artifact directory could not be created.
    #[error("Job '{job_name}' could not start: {message}")]
    SetupFailed { job_name: String, message: String },
}

impl PipelineError {
    pub fn step_failed(
        job_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            job_name: job_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    pub fn validation_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    pub fn setup_failed(job_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SetupFailed {
            job_name: job_name.into(),
            message: message.into(),
        }
    }

    pub fn cancelled(job_name: impl Into<String>) -> Self {
        Self::Cancelled {
            job_name: job_name.into(),
        }
    }

    /// Name of the step that failed, for step failures.
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::StepFailed { step_name, .. } => Some(step_name),
            _ => None,
        }
    }

    /// The composition error behind a step failure.
    pub fn compose_error(&self) -> Option<&ComposeError> {
        match self {
            Self::StepFailed {
                source: StepError::Compose(e),
                ..
            } => Some(e),
            _ => None,
        }
    }
}

/// Failure inside one step.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("Invalid step input: {0}")]
    InvalidInput(String),

    #[error("Invalid step output: {0}")]
    InvalidOutput(String),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error("I/O error while {operation}: {source}")]
    IoError {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// An earlier step left its slot in `JobState` empty.
    #[error("Missing earlier result: {0}")]
    PreconditionFailed(String),
}

impl StepError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn io_error(operation: impl Into<String>, source: io::Error) -> Self {
        Self::IoError {
            operation: operation.into(),
            source,
        }
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }
}

pub type StepResult<T> = Result<T, StepError>;

pub type PipelineResult<T> = Result<T, PipelineError>;
