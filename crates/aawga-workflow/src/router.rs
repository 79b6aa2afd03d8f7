//! Workflow router: runs the planned stages in order and threads their
//! outputs forward.
//!
//! Phases always execute as requirements → test cases → traceability.
//! Test cases consume the requirements generated in this invocation, or an
//! empty list when requirements were not requested. Traceability consumes
//! both lists, generating test cases it was not given. The router keeps no
//! state between invocations.

use tracing::{error, info, instrument};

use crate::backend::GenerationBackend;
use crate::errors::{StageError, WorkflowError};
use crate::result::WorkflowResult;
use crate::stage::{ExecutionPlan, StageKind};
use crate::stages::{RequirementStage, TestCaseStage, TraceabilityStage};

/// Runs generation stages selected by an instruction.
#[derive(Clone)]
pub struct WorkflowRouter {
    requirements: RequirementStage,
    testcases: TestCaseStage,
    traceability: TraceabilityStage,
}

impl WorkflowRouter {
    /// Router over explicitly constructed stages.
    pub fn new(
        requirements: RequirementStage,
        testcases: TestCaseStage,
        traceability: TraceabilityStage,
    ) -> Self {
        Self {
            requirements,
            testcases,
            traceability,
        }
    }

    /// All three stages on one backend, without retrieval.
    pub fn with_backend(backend: &GenerationBackend) -> Self {
        Self::new(
            RequirementStage::new(backend.clone()),
            TestCaseStage::new(backend.clone()),
            TraceabilityStage::new(backend.clone()),
        )
    }

    /// Stub stages throughout.
    pub fn stub() -> Self {
        Self::with_backend(&GenerationBackend::Stub)
    }

    /// Route `instruction` and run the selected stages over `content`.
    ///
    /// An instruction that names no stage yields an empty result.
    #[instrument(skip_all, fields(instruction_chars = instruction.chars().count()))]
    pub async fn invoke(
        &self,
        instruction: &str,
        content: &str,
    ) -> Result<WorkflowResult, WorkflowError> {
        let plan = ExecutionPlan::from_instruction(instruction);
        info!(selection = ?plan.selection(), runs = ?plan.runs(), "workflow planned");
        self.execute(&plan, content).await
    }

    /// Run an already computed plan.
    pub async fn execute(
        &self,
        plan: &ExecutionPlan,
        content: &str,
    ) -> Result<WorkflowResult, WorkflowError> {
        let mut result = WorkflowResult::default();
        let mut completed = Vec::new();

        let requirements = if plan.step(StageKind::Requirements).run {
            enter(StageKind::Requirements);
            let out = self
                .requirements
                .generate(content)
                .await
                .map_err(failed(StageKind::Requirements, &completed))?;
            finish(StageKind::Requirements, out.len(), &mut completed);
            out
        } else {
            Vec::new()
        };

        let testcases = if plan.step(StageKind::TestCases).run {
            enter(StageKind::TestCases);
            let out = self
                .testcases
                .generate(&requirements)
                .await
                .map_err(failed(StageKind::TestCases, &completed))?;
            finish(StageKind::TestCases, out.len(), &mut completed);
            out
        } else {
            Vec::new()
        };

        if plan.step(StageKind::Traceability).run {
            enter(StageKind::Traceability);
            let out = self
                .traceability
                .generate(&requirements, &testcases)
                .await
                .map_err(failed(StageKind::Traceability, &completed))?;
            finish(StageKind::Traceability, out.len(), &mut completed);
            result.traceability = Some(out);
        }

        if plan.step(StageKind::Requirements).emit {
            result.requirements = Some(requirements);
        }
        if plan.step(StageKind::TestCases).emit {
            result.testcases = Some(testcases);
        }

        info!(keys = ?result.keys(), "workflow finished");
        Ok(result)
    }
}

fn enter(stage: StageKind) {
    info!(phase = %stage, "phase started");
}

fn finish(stage: StageKind, items: usize, completed: &mut Vec<StageKind>) {
    info!(phase = %stage, items, "phase finished");
    completed.push(stage);
}

fn failed(stage: StageKind, completed: &[StageKind]) -> impl FnOnce(StageError) -> WorkflowError {
    let completed = completed.to_vec();
    move |source| {
        error!(
            phase = %stage,
            category = source.category(),
            error = %source,
            "phase failed"
        );
        WorkflowError {
            stage,
            completed,
            source,
        }
    }
}
