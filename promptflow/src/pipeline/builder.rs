//! Pipeline builder with validation.

use super::{Pipeline, PipelineConfig};
use crate::errors::PipelineValidationError;
use crate::stages::Stage;
use std::sync::Arc;

/// Builder for creating validated sequential pipelines.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    /// The pipeline name.
    name: String,
    /// Stages in execution order.
    stages: Vec<Arc<dyn Stage>>,
    /// Execution settings.
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            config: PipelineConfig::default(),
        }
    }

    /// Appends a stage to the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage name is blank or already used.
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Result<Self, PipelineValidationError> {
        self.add_stage(stage)?;
        Ok(self)
    }

    /// Appends a stage in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage name is blank or already used.
    pub fn add_stage(&mut self, stage: Arc<dyn Stage>) -> Result<(), PipelineValidationError> {
        let name = stage.name();
        if name.trim().is_empty() {
            return Err(PipelineValidationError::BlankStageName);
        }
        if self.stages.iter().any(|s| s.name() == name) {
            return Err(PipelineValidationError::DuplicateStage {
                stage: name.to_string(),
                pipeline: self.name.clone(),
            });
        }

        self.stages.push(stage);
        Ok(())
    }

    /// Sets the execution settings.
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder has no stages.
    pub fn build(self) -> Result<Pipeline, PipelineValidationError> {
        if self.stages.is_empty() {
            return Err(PipelineValidationError::Empty);
        }

        Ok(Pipeline::from_parts(self.name, self.stages, self.config))
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}
