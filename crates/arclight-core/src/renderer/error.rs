// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::renderer::api::pipeline::RenderPipelineId;
use crate::renderer::api::shader::ShaderModuleId;
use thiserror::Error;

/// An error related to the compilation or lookup of a shader module.
#[derive(Debug, Error)]
pub enum ShaderError {
    /// The shader source failed to compile into a backend-specific module.
    #[error("Shader compilation failed for '{label}': {details}")]
    CompilationError {
        /// The name the shader was loaded under.
        label: String,
        /// Detailed error messages from the shader compiler.
        details: String,
    },
    /// No shader is registered under the requested name.
    #[error("Shader '{name}' is not loaded")]
    NotFound {
        /// The requested shader name.
        name: String,
    },
    /// The shader module id is unknown to the device.
    #[error("Shader module not found for ID: {id:?}")]
    InvalidModule {
        /// The id that was not found.
        id: ShaderModuleId,
    },
}

/// An error related to the creation of a pipeline state object or its bindings.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The graphics backend failed to compile the full pipeline state object.
    #[error("Pipeline compilation failed for '{}': {details}", label.as_deref().unwrap_or("Unknown"))]
    CompilationFailed {
        /// A descriptive label for the pipeline, if available.
        label: Option<String>,
        /// Detailed error messages from the backend.
        details: String,
    },
    /// The specified render pipeline ID is not valid.
    #[error("Invalid render pipeline ID: {id:?}")]
    InvalidRenderPipeline {
        /// The ID of the invalid render pipeline.
        id: RenderPipelineId,
    },
    /// A variable name is not declared by the pipeline.
    #[error("Pipeline {pipeline:?} declares no variable named '{name}'")]
    UnknownVariable {
        /// The pipeline that was queried.
        pipeline: RenderPipelineId,
        /// The unknown variable name.
        name: String,
    },
    /// The resource kind does not match what the variable declares.
    #[error("Variable '{name}' cannot be bound to the supplied resource")]
    VariableTypeMismatch {
        /// The variable name.
        name: String,
    },
    /// A binding was created or committed while a variable was still unset.
    #[error("Variable '{name}' has no resource bound")]
    UnboundVariable {
        /// The variable name.
        name: String,
    },
}

/// An error related to the management of GPU resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// An error originating from a shader operation.
    #[error("Shader error: {0}")]
    Shader(#[from] ShaderError),
    /// An error originating from a pipeline operation.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    /// The requested resource could not be found.
    #[error("The requested resource could not be found")]
    NotFound,
    /// The handle used to reference a resource is invalid or stale.
    #[error("The resource handle is invalid or stale")]
    InvalidHandle,
    /// A generic error reported by the graphics backend.
    #[error("Backend error: {0}")]
    BackendError(String),
    /// The write would land outside the resource.
    #[error("Access out of bounds")]
    OutOfBounds,
}

/// A high-level error that can occur within the rendering service.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A fatal start-up failure: no backend, no device, or no placeholder texture.
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),
    /// The native window handle was null.
    #[error("Cannot create a render surface for a null window handle")]
    NullWindowHandle,
    /// The swapchain could not be created or its next frame acquired.
    #[error("Failed to acquire surface: {0}")]
    SurfaceAcquisitionFailed(String),
    /// An error occurred while recording or submitting a frame.
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),
    /// A resource-level error.
    #[error("Resource error: {0}")]
    ResourceError(#[from] ResourceError),
    /// A collaborator failed to supply or decode an asset.
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
    /// The graphics device was lost.
    #[error("The graphics device was lost")]
    DeviceLost,
}

/// An error raised at the asset collaborator boundary.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The resource provider has no bytes for the name.
    #[error("Resource '{0}' not found")]
    NotFound(String),
    /// The resource exists but is empty.
    #[error("Resource '{0}' is empty")]
    Empty(String),
    /// The bytes could not be decoded.
    #[error("Failed to decode '{name}': {details}")]
    Decode {
        /// The resource name.
        name: String,
        /// Decoder output.
        details: String,
    },
    /// A model could not be parsed or is structurally invalid.
    #[error("Invalid model '{name}': {details}")]
    InvalidModel {
        /// The model name.
        name: String,
        /// What is wrong.
        details: String,
    },
    /// The model defines no animation with that name.
    #[error("Model '{model}' has no animation '{animation}'")]
    UnknownAnimation {
        /// The model name.
        model: String,
        /// The requested animation.
        animation: String,
    },
}

impl From<ShaderError> for RenderError {
    fn from(err: ShaderError) -> Self {
        RenderError::ResourceError(ResourceError::Shader(err))
    }
}

impl From<PipelineError> for RenderError {
    fn from(err: PipelineError) -> Self {
        RenderError::ResourceError(ResourceError::Pipeline(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_errors_lift_into_render_error() {
        fn fails() -> Result<(), RenderError> {
            Err(ShaderError::NotFound {
                name: "vs_rigid".into(),
            })?
        }
        let err = fails().unwrap_err();
        assert!(matches!(
            err,
            RenderError::ResourceError(ResourceError::Shader(ShaderError::NotFound { .. }))
        ));
        assert!(err.to_string().contains("vs_rigid"));
    }
}
