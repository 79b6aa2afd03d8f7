//! The three generation stages.
//!
//! Each stage renders one prompt, makes one backend call and parses the
//! reply. With [`GenerationBackend::Stub`] they return placeholders one-to-one
//! with their inputs and make no calls at all, retrieval included.

use std::sync::Arc;

use aawga_core::logging::preview;
use aawga_embeddings::{ChunkingConfig, RetrievalService};
use tracing::{debug, instrument, warn};

use crate::backend::GenerationBackend;
use crate::errors::StageError;
use crate::parse::{ParseFailure, parse_list, parse_traceability};
use crate::prompts::{requirement_prompt, testcase_prompt, traceability_prompt};
use crate::result::TraceabilityEntry;
use crate::stage::StageKind;

/// Placeholder prefix for stub requirements.
pub const DUMMY_REQUIREMENT_PREFIX: &str = "[DUMMY] 요구사항 예시: ";

/// Placeholder prefix for stub test cases.
pub const DUMMY_TESTCASE_PREFIX: &str = "[DUMMY] 테스트케이스 예시: ";

/// Grounding source for the requirement stage.
#[derive(Clone)]
pub struct Grounding {
    /// Service answering similarity queries.
    pub retrieval: Arc<RetrievalService>,
    /// Policy bounding the query to the document's first section.
    pub document: ChunkingConfig,
    /// Chunks to retrieve.
    pub top_k: usize,
}

impl Grounding {
    /// Grounding with the document policy and the service's own `top_k`.
    pub fn new(retrieval: Arc<RetrievalService>) -> Self {
        let top_k = retrieval.config().top_k;
        Self {
            retrieval,
            document: ChunkingConfig::DOCUMENT,
            top_k,
        }
    }

    async fn context_for(&self, content: &str) -> Result<String, StageError> {
        let query = self
            .document
            .first_chunk(content)
            .unwrap_or_else(|| content.to_string());
        Ok(self.retrieval.query(&query, self.top_k).await?)
    }
}

/// Content → requirement list.
#[derive(Clone)]
pub struct RequirementStage {
    backend: GenerationBackend,
    grounding: Option<Grounding>,
}

impl RequirementStage {
    /// Stage without retrieval.
    pub fn new(backend: GenerationBackend) -> Self {
        Self {
            backend,
            grounding: None,
        }
    }

    /// Ground live generation in retrieved context.
    #[must_use]
    pub fn with_grounding(mut self, grounding: Grounding) -> Self {
        self.grounding = Some(grounding);
        self
    }

    /// Generate requirements for `content`.
    #[instrument(skip_all, fields(stage = "requirements", backend = %self.backend.kind()))]
    pub async fn generate(&self, content: &str) -> Result<Vec<String>, StageError> {
        let (provider, options) = match &self.backend {
            GenerationBackend::Stub => {
                return Ok(vec![format!("{DUMMY_REQUIREMENT_PREFIX}{content}")]);
            }
            GenerationBackend::Live { provider, options } => (provider, options),
        };

        let context = match &self.grounding {
            Some(grounding) => grounding.context_for(content).await?,
            None => String::new(),
        };
        debug!(context_chars = context.chars().count(), "grounding context ready");

        let raw = provider
            .complete(&requirement_prompt(&context, content), options)
            .await?;
        Ok(absorb(StageKind::Requirements, &raw, parse_list(&raw)))
    }
}

/// Requirement list → test case list.
#[derive(Clone)]
pub struct TestCaseStage {
    backend: GenerationBackend,
}

impl TestCaseStage {
    /// Create the stage.
    pub fn new(backend: GenerationBackend) -> Self {
        Self { backend }
    }

    /// Generate test cases covering `requirements`.
    #[instrument(skip_all, fields(stage = "testcases", backend = %self.backend.kind(), inputs = requirements.len()))]
    pub async fn generate(&self, requirements: &[String]) -> Result<Vec<String>, StageError> {
        match &self.backend {
            GenerationBackend::Stub => Ok(requirements
                .iter()
                .map(|req| format!("{DUMMY_TESTCASE_PREFIX}{req}"))
                .collect()),
            GenerationBackend::Live { provider, options } => {
                let raw = provider
                    .complete(&testcase_prompt(requirements), options)
                    .await?;
                Ok(absorb(StageKind::TestCases, &raw, parse_list(&raw)))
            }
        }
    }
}

/// (requirements, test cases) → traceability matrix.
#[derive(Clone)]
pub struct TraceabilityStage {
    backend: GenerationBackend,
}

impl TraceabilityStage {
    /// Create the stage.
    pub fn new(backend: GenerationBackend) -> Self {
        Self { backend }
    }

    /// Map requirements to test cases.
    #[instrument(skip_all, fields(
        stage = "traceability",
        backend = %self.backend.kind(),
        requirements = requirements.len(),
        testcases = testcases.len(),
    ))]
    pub async fn generate(
        &self,
        requirements: &[String],
        testcases: &[String],
    ) -> Result<Vec<TraceabilityEntry>, StageError> {
        match &self.backend {
            GenerationBackend::Stub => Ok(requirements
                .iter()
                .map(TraceabilityEntry::unlinked)
                .collect()),
            GenerationBackend::Live { provider, options } => {
                let raw = provider
                    .complete(&traceability_prompt(requirements, testcases), options)
                    .await?;
                Ok(absorb(StageKind::Traceability, &raw, parse_traceability(&raw)))
            }
        }
    }
}

/// Turn a parse failure into an empty result, leaving a diagnostic behind.
fn absorb<T>(stage: StageKind, raw: &str, parsed: Result<Vec<T>, ParseFailure>) -> Vec<T> {
    parsed.unwrap_or_else(|failure| {
        warn!(
            stage = %stage,
            error = %failure,
            raw = %preview(raw),
            "model output could not be parsed; using empty result"
        );
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aawga_core::logging::capture_logs;
    use aawga_embeddings::{RetrievalConfig, StubEmbeddingService};
    use aawga_llm::{CompletionOptions, Provider, ProviderError, ProviderResult};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tracing::Level;

    /// Returns a fixed reply and records prompts.
    struct Canned {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl Canned {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for Canned {
        fn model(&self) -> &str {
            "canned"
        }

        async fn complete(&self, prompt: &str, _: &CompletionOptions) -> ProviderResult<String> {
            self.prompts.lock().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct Down;

    #[async_trait]
    impl Provider for Down {
        fn model(&self) -> &str {
            "down"
        }

        async fn complete(&self, _: &str, _: &CompletionOptions) -> ProviderResult<String> {
            Err(ProviderError::Api {
                status: 503,
                message: "unavailable".into(),
                code: None,
                retryable: true,
            })
        }
    }

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn stub_requirements_are_deterministic() {
        let stage = RequirementStage::new(GenerationBackend::Stub);
        let first = stage.generate("샘플 텍스트").await.unwrap();
        let second = stage.generate("샘플 텍스트").await.unwrap();
        assert_eq!(first, vec!["[DUMMY] 요구사항 예시: 샘플 텍스트"]);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn stub_testcases_one_per_requirement() {
        let stage = TestCaseStage::new(GenerationBackend::Stub);
        let out = stage.generate(&list(&["A", "B"])).await.unwrap();
        assert_eq!(
            out,
            vec!["[DUMMY] 테스트케이스 예시: A", "[DUMMY] 테스트케이스 예시: B"]
        );
        assert!(stage.generate(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stub_traceability_unlinked_rows() {
        let stage = TraceabilityStage::new(GenerationBackend::Stub);
        let out = stage.generate(&list(&["A", "B"]), &list(&["T"])).await.unwrap();
        assert_eq!(
            out,
            vec![TraceabilityEntry::unlinked("A"), TraceabilityEntry::unlinked("B")]
        );
    }

    #[tokio::test]
    async fn live_requirements_parse_lines_without_grounding() {
        let provider = Canned::new("1. 로그인\n2. 로그아웃\n");
        let stage = RequirementStage::new(GenerationBackend::live(provider.clone()));
        let out = stage.generate("회원 관리").await.unwrap();
        assert_eq!(out, vec!["로그인", "로그아웃"]);

        let prompts = provider.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("[문맥 정보]\n\n"));
        assert!(prompts[0].contains("[사용자 입력]\n회원 관리"));
    }

    #[tokio::test]
    async fn live_testcases_prompt_enumerates_requirements() {
        let provider = Canned::new("- TC1");
        let stage = TestCaseStage::new(GenerationBackend::live(provider.clone()));
        let out = stage.generate(&list(&["로그인"])).await.unwrap();
        assert_eq!(out, vec!["TC1"]);
        assert!(provider.prompts.lock()[0].ends_with(":\n1. 로그인"));
    }

    #[tokio::test]
    async fn unparseable_traceability_is_empty_and_logged() {
        let (logs, _guard) = capture_logs();
        let provider = Canned::new("매핑할 수 없습니다");
        let stage = TraceabilityStage::new(GenerationBackend::live(provider));
        let out = stage.generate(&list(&["R"]), &list(&["T"])).await.unwrap();
        assert!(out.is_empty());

        let event = logs
            .find(Level::WARN, "could not be parsed")
            .expect("parse failure must be logged");
        assert_eq!(event.field("stage"), Some("traceability"));
        assert!(event.field("error").unwrap().contains("invalid JSON"));
        assert_eq!(event.field("raw"), Some("매핑할 수 없습니다"));
    }

    #[tokio::test]
    async fn blank_list_reply_is_empty_and_logged() {
        let (logs, _guard) = capture_logs();
        let stage = TestCaseStage::new(GenerationBackend::live(Canned::new("\n \n")));
        assert!(stage.generate(&list(&["R"])).await.unwrap().is_empty());
        let event = logs.find(Level::WARN, "could not be parsed").unwrap();
        assert_eq!(event.field("stage"), Some("testcases"));
    }

    #[test]
    fn grounding_takes_top_k_from_retrieval() {
        let mut config = RetrievalConfig::with_root("/tmp/aawga-unused");
        config.top_k = 5;
        let retrieval = RetrievalService::new(Arc::new(StubEmbeddingService::new()), config);
        let grounding = Grounding::new(Arc::new(retrieval));
        assert_eq!(grounding.top_k, 5);
        assert_eq!(grounding.document, ChunkingConfig::DOCUMENT);
    }

    #[tokio::test]
    async fn backend_failure_propagates() {
        let stage = RequirementStage::new(GenerationBackend::live(Arc::new(Down)));
        let err = stage.generate("x").await.unwrap_err();
        assert!(matches!(err, StageError::Generation(ProviderError::Api { status: 503, .. })));
    }
}
