//! Workflow output types.

use serde::{Deserialize, Serialize};

use crate::stage::StageKind;

/// One row of the traceability matrix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceabilityEntry {
    /// Requirement text or identifier.
    #[serde(alias = "requirement_id")]
    pub requirement: String,
    /// Test cases covering the requirement.
    #[serde(alias = "testcase_ids", alias = "test_cases", default)]
    pub testcases: Vec<String>,
}

impl TraceabilityEntry {
    /// Entry for `requirement` with no linked test cases.
    pub fn unlinked(requirement: impl Into<String>) -> Self {
        Self {
            requirement: requirement.into(),
            testcases: Vec::new(),
        }
    }
}

/// Outputs of one invocation. Only requested stages are present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResult {
    /// Requirement list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    /// Test case list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testcases: Option<Vec<String>>,
    /// Traceability matrix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceability: Option<Vec<TraceabilityEntry>>,
}

impl WorkflowResult {
    /// Keys present, in stage order.
    pub fn keys(&self) -> Vec<&'static str> {
        self.stages().into_iter().map(StageKind::key).collect()
    }

    /// Stages present, in order.
    pub fn stages(&self) -> Vec<StageKind> {
        let mut out = Vec::new();
        if self.requirements.is_some() {
            out.push(StageKind::Requirements);
        }
        if self.testcases.is_some() {
            out.push(StageKind::TestCases);
        }
        if self.traceability.is_some() {
            out.push(StageKind::Traceability);
        }
        out
    }

    /// Whether no stage output is present.
    pub fn is_empty(&self) -> bool {
        self.stages().is_empty()
    }
}
