//! # aawga-workflow
//!
//! Turns a free-text instruction and a document into requirement, test case
//! and traceability artifacts.
//!
//! - [`stage`]: trigger detection and the execution plan
//! - [`stages`]: the three generation stages, stub or live
//! - [`router`]: runs a plan in order and assembles a [`WorkflowResult`]
//! - [`parse`]: lenient parsing of model replies
//! - [`factory`]: builds a router from [`aawga_settings::AawgaSettings`]
//!
//! ```text
//! instruction ──► ExecutionPlan ──► requirements ──► testcases ──► traceability
//!                                        ▲
//!                         RetrievalService (grounding)
//! ```

#![deny(unsafe_code)]

pub mod backend;
pub mod errors;
pub mod factory;
pub mod parse;
pub mod prompts;
pub mod result;
pub mod router;
pub mod stage;
pub mod stages;

pub use backend::GenerationBackend;
pub use errors::{BuildError, StageError, WorkflowError};
pub use factory::{
    build_embedder, build_generation_backend, build_retrieval, build_workflow,
    build_workflow_with, grounding_for,
};
pub use parse::ParseFailure;
pub use result::{TraceabilityEntry, WorkflowResult};
pub use router::WorkflowRouter;
pub use stage::{ExecutionPlan, StageKind, StageSelection, StepPlan};
pub use stages::{
    DUMMY_REQUIREMENT_PREFIX, DUMMY_TESTCASE_PREFIX, Grounding, RequirementStage, TestCaseStage,
    TraceabilityStage,
};
