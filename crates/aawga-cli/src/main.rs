//! # aawga
//!
//! Command-line entry point: builds the index, queries it, and runs the
//! artifact workflow.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use aawga_embeddings::index_status;
use aawga_settings::{AawgaSettings, BackendKind};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

/// Requirement, test case and traceability generation.
#[derive(Parser, Debug)]
#[command(name = "aawga", about = "Requirement, test case and traceability generation")]
struct Cli {
    /// Settings file (defaults to `~/.aawga/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log filter, overriding the settings file.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as newline-delimited JSON.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild the vector index from a UTF-8 text file.
    Ingest {
        /// Document to index.
        file: PathBuf,
    },
    /// Print grounding context retrieved for a query.
    Query {
        /// Query text.
        text: String,
        /// Chunks to retrieve (settings value when omitted).
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Route an instruction and print the generated artifacts.
    Run(RunArgs),
    /// Show index state for both embedding backends.
    Status,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Free-text instruction; trigger words select the stages.
    #[arg(long)]
    instruction: String,

    /// Document text.
    #[arg(long, conflicts_with = "content_file", required_unless_present = "content_file")]
    content: Option<String>,

    /// Read the document from a file instead.
    #[arg(long)]
    content_file: Option<PathBuf>,

    /// Use the stub generation backend.
    #[arg(long)]
    dummy: bool,
}

impl RunArgs {
    fn content(&self) -> Result<String> {
        match (&self.content, &self.content_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => read_text(path),
            (None, None) => anyhow::bail!("either --content or --content-file is required"),
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_settings(cli: &Cli) -> Result<AawgaSettings> {
    let mut settings = match &cli.settings {
        Some(path) => aawga_settings::load_settings_from_path(path),
        None => aawga_settings::load_settings(),
    }
    .context("Failed to load settings")?;

    if let Some(level) = &cli.log_level {
        settings.logging.level.clone_from(level);
    }
    if cli.json_logs {
        settings.logging.json = true;
    }
    Ok(settings)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(&cli)?;

    if settings.logging.json {
        aawga_core::logging::init_json_subscriber(&settings.logging.level);
    } else {
        aawga_core::logging::init_subscriber(&settings.logging.level);
    }

    match cli.command {
        Command::Ingest { file } => {
            let text = read_text(&file)?;
            let retrieval = aawga_workflow::build_retrieval(&settings)?;
            let report = retrieval.ingest(&text).await.context("Ingest failed")?;
            print_json(&report)?;
        }
        Command::Query { text, k } => {
            let retrieval = aawga_workflow::build_retrieval(&settings)?;
            let k = k.unwrap_or(retrieval.config().top_k);
            let context = retrieval.query(&text, k).await.context("Query failed")?;
            println!("{context}");
        }
        Command::Run(args) => {
            let content = args.content()?;
            if args.dummy {
                settings.generation.backend = BackendKind::Stub;
            }
            let router = aawga_workflow::build_workflow(&settings)?;
            match router.invoke(&args.instruction, &content).await {
                Ok(result) => print_json(&result)?,
                Err(err) => {
                    tracing::error!(
                        stage = %err.stage,
                        completed = ?err.completed,
                        retryable = err.source.is_retryable(),
                        "workflow failed"
                    );
                    return Err(err.into());
                }
            }
        }
        Command::Status => {
            let root = Path::new(&settings.retrieval.index_root);
            let statuses: Vec<_> = [BackendKind::Stub, BackendKind::Live]
                .into_iter()
                .map(|kind| index_status(root, kind))
                .collect();
            print_json(&statuses)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_with_inline_content() {
        let cli = Cli::parse_from([
            "aawga",
            "run",
            "--instruction",
            "요구사항 생성",
            "--content",
            "샘플 텍스트",
            "--dummy",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.dummy);
        assert_eq!(args.content().unwrap(), "샘플 텍스트");
    }

    #[test]
    fn run_reads_content_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.txt");
        std::fs::write(&file, "파일 본문").unwrap();

        let cli = Cli::parse_from([
            "aawga",
            "run",
            "--instruction",
            "테스트케이스",
            "--content-file",
            file.to_str().unwrap(),
        ]);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(!args.dummy);
        assert_eq!(args.content().unwrap(), "파일 본문");
    }

    #[test]
    fn run_requires_some_content() {
        let parsed = Cli::try_parse_from(["aawga", "run", "--instruction", "요구사항"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn run_rejects_both_content_sources() {
        let parsed = Cli::try_parse_from([
            "aawga",
            "run",
            "--instruction",
            "요구사항",
            "--content",
            "a",
            "--content-file",
            "b.txt",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn query_k_is_optional() {
        let cli = Cli::parse_from(["aawga", "query", "비밀번호"]);
        assert!(matches!(cli.command, Command::Query { k: None, .. }));
        let cli = Cli::parse_from(["aawga", "query", "비밀번호", "-k", "5"]);
        assert!(matches!(cli.command, Command::Query { k: Some(5), .. }));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["aawga", "status", "--log-level", "debug", "--json-logs"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn settings_file_and_flag_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"retrieval": {"topK": 4}, "logging": {"level": "warn"}}"#)
            .unwrap();

        let cli = Cli::parse_from([
            "aawga",
            "--settings",
            path.to_str().unwrap(),
            "--log-level",
            "trace",
            "status",
        ]);
        let settings = load_settings(&cli).unwrap();
        assert_eq!(settings.retrieval.top_k, 4);
        assert_eq!(settings.logging.level, "trace");
    }
}
