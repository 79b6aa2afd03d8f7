//! The single place where settings become components.
//!
//! Backends are chosen here from [`AawgaSettings`] and handed to the stages
//! as explicit constructor arguments. Nothing below this point reads the
//! environment or the settings file.

use std::sync::Arc;

use aawga_embeddings::{
    ChunkingConfig, EmbeddingService, HttpEmbeddingConfig, HttpEmbeddingService,
    RetrievalConfig, RetrievalService, StubEmbeddingService,
};
use aawga_llm::{OpenAiConfig, OpenAiProvider};
use aawga_settings::{AawgaSettings, BackendKind};
use tracing::info;

use crate::backend::GenerationBackend;
use crate::errors::BuildError;
use crate::router::WorkflowRouter;
use crate::stages::{Grounding, RequirementStage, TestCaseStage, TraceabilityStage};

/// Embedding backend selected by `embedding.backend`.
pub fn build_embedder(settings: &AawgaSettings) -> Result<Arc<dyn EmbeddingService>, BuildError> {
    Ok(match settings.embedding.backend {
        BackendKind::Stub => Arc::new(StubEmbeddingService::new()),
        BackendKind::Live => {
            let config = HttpEmbeddingConfig::from_settings(
                &settings.embedding,
                settings.generation.api_key.clone(),
            );
            Arc::new(HttpEmbeddingService::new(config)?)
        }
    })
}

/// Retrieval service over the configured embedder.
pub fn build_retrieval(settings: &AawgaSettings) -> Result<Arc<RetrievalService>, BuildError> {
    let embedder = build_embedder(settings)?;
    let config = RetrievalConfig::from_settings(&settings.retrieval)?;
    Ok(Arc::new(RetrievalService::new(embedder, config)))
}

/// Generation backend selected by `generation.backend`.
pub fn build_generation_backend(settings: &AawgaSettings) -> Result<GenerationBackend, BuildError> {
    match settings.generation.backend {
        BackendKind::Stub => Ok(GenerationBackend::Stub),
        BackendKind::Live => {
            let config = OpenAiConfig::from_settings(&settings.generation, None);
            let options = config.defaults.clone();
            let provider = OpenAiProvider::new(config)?;
            Ok(GenerationBackend::Live {
                provider: Arc::new(provider),
                options,
            })
        }
    }
}

/// Requirement-stage grounding over `retrieval`.
///
/// The query window comes from the document chunking settings; the number
/// of chunks is the retrieval service's own `top_k`.
pub fn grounding_for(
    settings: &AawgaSettings,
    retrieval: Arc<RetrievalService>,
) -> Result<Grounding, BuildError> {
    Ok(Grounding {
        document: ChunkingConfig::document_from_settings(&settings.retrieval)?,
        ..Grounding::new(retrieval)
    })
}

/// Wire a router from settings.
///
/// With retrieval enabled the requirement stage is grounded through
/// `retrieval`; pass the same service used for ingest so both see one index.
pub fn build_workflow_with(
    settings: &AawgaSettings,
    retrieval: Option<Arc<RetrievalService>>,
) -> Result<WorkflowRouter, BuildError> {
    let backend = build_generation_backend(settings)?;

    let mut requirements = RequirementStage::new(backend.clone());
    if let Some(retrieval) = retrieval.filter(|_| settings.retrieval.enabled) {
        requirements = requirements.with_grounding(grounding_for(settings, retrieval)?);
    }

    info!(
        generation = %backend.kind(),
        embedding = %settings.embedding.backend,
        retrieval = settings.retrieval.enabled,
        "workflow assembled"
    );
    Ok(WorkflowRouter::new(
        requirements,
        TestCaseStage::new(backend.clone()),
        TraceabilityStage::new(backend),
    ))
}

/// Wire a router, building its own retrieval service when enabled.
pub fn build_workflow(settings: &AawgaSettings) -> Result<WorkflowRouter, BuildError> {
    let retrieval = if settings.retrieval.enabled {
        Some(build_retrieval(settings)?)
    } else {
        None
    };
    build_workflow_with(settings, retrieval)
}
