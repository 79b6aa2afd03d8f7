//! Stage identity, instruction parsing and the execution plan.
//!
//! An instruction selects stages by plain substring containment, one
//! trigger per stage. Selection is computed once into a [`StageSelection`]
//! and turned into an [`ExecutionPlan`], the single place that decides which
//! stages run and which of them appear in the result.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three generation stages, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// Requirement list from document content.
    Requirements,
    /// Test cases from a requirement list.
    TestCases,
    /// Requirement-to-test-case mapping.
    Traceability,
}

impl StageKind {
    /// All stages in execution order.
    pub const ALL: [Self; 3] = [Self::Requirements, Self::TestCases, Self::Traceability];

    /// Key under which the stage's output appears in a result.
    pub fn key(self) -> &'static str {
        match self {
            Self::Requirements => "requirements",
            Self::TestCases => "testcases",
            Self::Traceability => "traceability",
        }
    }

    /// Substring that selects this stage when present in an instruction.
    pub fn trigger(self) -> &'static str {
        match self {
            Self::Requirements => "요구사항",
            Self::TestCases => "테스트케이스",
            Self::Traceability => "추적성",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which stages an instruction explicitly asked for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSelection {
    /// Requirements requested.
    pub requirements: bool,
    /// Test cases requested.
    pub testcases: bool,
    /// Traceability requested.
    pub traceability: bool,
}

impl StageSelection {
    /// Test `instruction` once for each trigger substring.
    pub fn from_instruction(instruction: &str) -> Self {
        let has = |kind: StageKind| instruction.contains(kind.trigger());
        Self {
            requirements: has(StageKind::Requirements),
            testcases: has(StageKind::TestCases),
            traceability: has(StageKind::Traceability),
        }
    }

    /// Select exactly the given stages.
    pub fn only(stages: &[StageKind]) -> Self {
        let mut selection = Self::default();
        for stage in stages {
            match stage {
                StageKind::Requirements => selection.requirements = true,
                StageKind::TestCases => selection.testcases = true,
                StageKind::Traceability => selection.traceability = true,
            }
        }
        selection
    }

    /// Whether `stage` was requested.
    pub fn contains(self, stage: StageKind) -> bool {
        match stage {
            StageKind::Requirements => self.requirements,
            StageKind::TestCases => self.testcases,
            StageKind::Traceability => self.traceability,
        }
    }

    /// Whether no stage was requested.
    pub fn is_empty(self) -> bool {
        !(self.requirements || self.testcases || self.traceability)
    }
}

/// What the router does for one stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepPlan {
    /// The stage executes.
    pub run: bool,
    /// Its output is placed in the result.
    pub emit: bool,
}

/// Branch table for one invocation.
///
/// - requirements run only when requested; they are never generated
///   implicitly, so downstream stages see an empty list otherwise
/// - test cases run when requested, or silently when traceability needs them
/// - traceability runs when requested
///
/// A stage is emitted exactly when it was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionPlan {
    selection: StageSelection,
    steps: [StepPlan; 3],
}

impl ExecutionPlan {
    /// Derive the plan from a selection.
    pub fn from_selection(selection: StageSelection) -> Self {
        let steps = [
            StepPlan {
                run: selection.requirements,
                emit: selection.requirements,
            },
            StepPlan {
                run: selection.testcases || selection.traceability,
                emit: selection.testcases,
            },
            StepPlan {
                run: selection.traceability,
                emit: selection.traceability,
            },
        ];
        Self { selection, steps }
    }

    /// Shorthand for `from_selection(StageSelection::from_instruction(..))`.
    pub fn from_instruction(instruction: &str) -> Self {
        Self::from_selection(StageSelection::from_instruction(instruction))
    }

    /// The selection this plan was derived from.
    pub fn selection(&self) -> StageSelection {
        self.selection
    }

    /// Plan for one stage.
    pub fn step(&self, stage: StageKind) -> StepPlan {
        self.steps[stage as usize]
    }

    /// Stages that execute, in order.
    pub fn runs(&self) -> Vec<StageKind> {
        StageKind::ALL
            .into_iter()
            .filter(|stage| self.step(*stage).run)
            .collect()
    }

    /// Stages that appear in the result, in order.
    pub fn emits(&self) -> Vec<StageKind> {
        StageKind::ALL
            .into_iter()
            .filter(|stage| self.step(*stage).emit)
            .collect()
    }
}
