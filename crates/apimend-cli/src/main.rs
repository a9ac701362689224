//! `apimend` command-line interface
//!
//! `apimend improve <SPEC>` runs the full convergence loop against a spec
//! file and writes the improved document back (original kept as a backup).
//! `apimend audit <SPEC>` runs a single audit and prints the report.

use anyhow::Context;
use apimend_audit::{AuditReport, Auditor, CommandAuditor, Finding};
use apimend_document::{DocFormat, Document};
use apimend_engine::{ConvergenceEngine, EngineConfig, RunOutcome};
use apimend_propose::{LlmConfig, LlmProposer, PatchProposer, ProposeError};
use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const API_KEY_ENV: &str = "LLM_API_KEY";
const DEFAULT_LLM_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

fn build_cli() -> Command {
    Command::new("apimend")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Iterative OpenAPI security improvement")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("improve")
                .about("Audit, patch and re-audit a spec until it meets the target score")
                .arg(
                    Arg::new("spec")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("OpenAPI specification file (YAML or JSON)"),
                )
                .arg(
                    Arg::new("target-score")
                        .long("target-score")
                        .default_value("90")
                        .value_parser(value_parser!(u8))
                        .help("Stop once the audit score reaches this value"),
                )
                .arg(
                    Arg::new("max-iterations")
                        .long("max-iterations")
                        .default_value("10")
                        .value_parser(value_parser!(usize))
                        .help("Hard cap on improvement rounds"),
                )
                .arg(
                    Arg::new("findings-cap")
                        .long("findings-cap")
                        .default_value("3")
                        .value_parser(value_parser!(usize))
                        .help("Findings acted on per round, highest severity first"),
                )
                .arg(
                    Arg::new("audit-cmd")
                        .long("audit-cmd")
                        .help("External audit command line (spec on stdin, JSON report on stdout); \
                               a built-in mock report is used when omitted"),
                )
                .arg(
                    Arg::new("audit-timeout")
                        .long("audit-timeout")
                        .default_value("120")
                        .value_parser(value_parser!(u64))
                        .help("Per-audit timeout in seconds"),
                )
                .arg(
                    Arg::new("llm-url")
                        .long("llm-url")
                        .default_value(DEFAULT_LLM_URL)
                        .help("Chat-completions endpoint for patch proposals"),
                )
                .arg(
                    Arg::new("model")
                        .long("model")
                        .default_value(DEFAULT_MODEL)
                        .help("Model identifier to request patches from"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the improved spec here instead of overwriting the input"),
                )
                .arg(
                    Arg::new("summary")
                        .long("summary")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the per-round run summary to this file on exit"),
                ),
        )
        .subcommand(
            Command::new("audit")
                .about("Run a single audit and print the JSON report")
                .arg(
                    Arg::new("spec")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("OpenAPI specification file (YAML or JSON)"),
                )
                .arg(
                    Arg::new("audit-cmd")
                        .long("audit-cmd")
                        .help("External audit command line; mock report when omitted"),
                )
                .arg(
                    Arg::new("audit-timeout")
                        .long("audit-timeout")
                        .default_value("120")
                        .value_parser(value_parser!(u64))
                        .help("Audit timeout in seconds"),
                ),
        )
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = build_cli().get_matches();
    let result = match matches.subcommand() {
        Some(("improve", args)) => run_improve(args).await,
        Some(("audit", args)) => run_audit(args).await,
        _ => unreachable!("arg_required_else_help"),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run_improve(args: &ArgMatches) -> anyhow::Result<i32> {
    let spec_path = args.get_one::<PathBuf>("spec").unwrap();
    let document = load_document(spec_path)?;

    let config = EngineConfig::new()
        .with_target_score(*args.get_one::<u8>("target-score").unwrap())
        .with_max_iterations(*args.get_one::<usize>("max-iterations").unwrap())
        .with_findings_cap(*args.get_one::<usize>("findings-cap").unwrap());

    let auditor = make_auditor(args)?;
    let proposer = make_proposer(args)?;
    let engine = ConvergenceEngine::new(auditor, proposer, config);

    // finish the in-flight iteration, then stop cleanly
    let abort = engine.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping after the current iteration");
            abort.abort();
        }
    });

    let outcome = engine.run(document).await;

    println!("status: {}", outcome.status);
    if let Some(score) = outcome.final_score {
        println!("final score: {score}");
    }

    // the summary is persisted once, after the loop has reached a terminal
    // state, whatever that state is
    if let Some(summary_path) = args.get_one::<PathBuf>("summary") {
        write_summary(summary_path, &outcome)?;
        println!("run summary written to {}", summary_path.display());
    }

    if outcome.trail.is_empty() {
        println!("document unchanged");
    } else {
        let output = args
            .get_one::<PathBuf>("output")
            .cloned()
            .unwrap_or_else(|| spec_path.clone());
        save_with_backup(&outcome.document, &output, spec_path)?;
        println!("improved spec written to {}", output.display());
    }

    Ok(if outcome.status.is_success() { 0 } else { 2 })
}

async fn run_audit(args: &ArgMatches) -> anyhow::Result<i32> {
    let spec_path = args.get_one::<PathBuf>("spec").unwrap();
    let document = load_document(spec_path)?;

    let auditor = make_auditor(args)?;
    let report = auditor
        .audit(&document)
        .await
        .context("audit call failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(0)
}

fn load_document(path: &Path) -> anyhow::Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(DocFormat::from_extension)
        .unwrap_or_else(|| DocFormat::detect(&text));
    Document::parse(&text, format)
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn make_auditor(args: &ArgMatches) -> anyhow::Result<Arc<dyn Auditor>> {
    let timeout = Duration::from_secs(*args.get_one::<u64>("audit-timeout").unwrap());
    match args.get_one::<String>("audit-cmd") {
        Some(line) => {
            let auditor = CommandAuditor::from_command_line(line)
                .context("--audit-cmd is empty")?
                .with_timeout(timeout);
            Ok(Arc::new(auditor))
        }
        None => {
            tracing::warn!("no --audit-cmd given; using the built-in mock report");
            Ok(Arc::new(MockAuditor))
        }
    }
}

fn make_proposer(args: &ArgMatches) -> anyhow::Result<Arc<dyn PatchProposer>> {
    let api_key = std::env::var(API_KEY_ENV).map_err(|_| ProposeError::MissingApiKey {
        env_var: API_KEY_ENV.to_string(),
    })?;
    let config = LlmConfig::new(
        args.get_one::<String>("llm-url").unwrap(),
        args.get_one::<String>("model").unwrap(),
        api_key,
    );
    Ok(Arc::new(LlmProposer::new(config)?))
}

/// Persist the run summary: terminal status, final score, one line per round
fn write_summary(path: &Path, outcome: &RunOutcome) -> anyhow::Result<()> {
    let mut text = format!("status: {}\n", outcome.status);
    if let Some(score) = outcome.final_score {
        text.push_str(&format!("final score: {score}\n"));
    }
    text.push_str(&outcome.trail.render_summary());
    std::fs::write(path, text)
        .with_context(|| format!("failed to write summary to {}", path.display()))
}

/// Write the document to `output`, backing up whatever is there first
///
/// The backup keeps the original file readable after an in-place overwrite
/// (`petstore.yaml` becomes `petstore.yaml.backup`).
fn save_with_backup(document: &Document, output: &Path, original: &Path) -> anyhow::Result<()> {
    if output.exists() {
        let mut backup = output.as_os_str().to_owned();
        backup.push(".backup");
        std::fs::copy(output, &backup)
            .with_context(|| format!("failed to back up {}", output.display()))?;
        tracing::info!(backup = %PathBuf::from(&backup).display(), "original backed up");
    }

    let format = output
        .extension()
        .and_then(|e| e.to_str())
        .and_then(DocFormat::from_extension)
        .unwrap_or_else(|| document.format());
    let text = document
        .serialize_as(format)
        .with_context(|| format!("failed to render {}", original.display()))?;
    std::fs::write(output, text)
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(())
}

/// Stand-in auditor for running the loop without the external tool installed
///
/// Always reports the same mid-range score and findings, so `improve` runs
/// demonstrate the full pipeline but end by exhausting the budget.
struct MockAuditor;

#[async_trait::async_trait]
impl Auditor for MockAuditor {
    async fn audit(&self, _document: &Document) -> Result<AuditReport, apimend_audit::AuditError> {
        Ok(AuditReport::new(
            65,
            vec![
                Finding::new("Missing security schemes", 5)
                    .with_description("API does not define any security schemes")
                    .with_pointer("/security"),
                Finding::new("Missing parameter validation", 4)
                    .with_description("Path parameters lack schema constraints")
                    .with_pointer("/paths"),
                Finding::new("Insufficient error responses", 3)
                    .with_description("Operations only document success responses")
                    .with_pointer("/paths"),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apimend_document::DocNode;
    use apimend_engine::{IterationRecord, IterationTrail, RunStatus};

    #[test]
    fn cli_parses_improve_flags() {
        let matches = build_cli()
            .try_get_matches_from([
                "apimend",
                "improve",
                "petstore.yaml",
                "--target-score",
                "80",
                "--max-iterations",
                "5",
                "--audit-cmd",
                "42c-audit --output json -",
                "--summary",
                "run.summary",
            ])
            .unwrap();

        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "improve");
        assert_eq!(*args.get_one::<u8>("target-score").unwrap(), 80);
        assert_eq!(*args.get_one::<usize>("max-iterations").unwrap(), 5);
        assert_eq!(
            args.get_one::<PathBuf>("summary").unwrap(),
            &PathBuf::from("run.summary")
        );
    }

    #[test]
    fn cli_rejects_missing_spec() {
        assert!(build_cli()
            .try_get_matches_from(["apimend", "improve"])
            .is_err());
    }

    #[test]
    fn summary_file_carries_status_score_and_rounds() {
        let mut trail = IterationTrail::new();
        trail.push(IterationRecord {
            iteration: 1,
            score_before: 65,
            score_after: Some(65),
            findings_count: 3,
            operations_applied: 2,
            operations_skipped: 1,
        });
        let outcome = RunOutcome {
            status: RunStatus::BudgetExhausted,
            document: Document::new(DocNode::mapping(), DocFormat::Yaml),
            final_score: Some(65),
            trail,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.summary");
        write_summary(&path, &outcome).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("status: budget exhausted\n"));
        assert!(text.contains("final score: 65\n"));
        assert!(text.contains("iteration 1: score 65 -> 65, findings 3, ops applied 2, skipped 1"));
    }

    #[test]
    fn summary_file_written_even_without_completed_rounds() {
        let outcome = RunOutcome {
            status: RunStatus::Cancelled,
            document: Document::new(DocNode::mapping(), DocFormat::Yaml),
            final_score: None,
            trail: IterationTrail::new(),
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.summary");
        write_summary(&path, &outcome).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "status: cancelled\nno iterations completed\n");
    }

    #[test]
    fn save_creates_backup_of_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spec.yaml");
        std::fs::write(&path, "openapi: 3.0.0\n").unwrap();

        let doc = Document::new(DocNode::from("improved"), DocFormat::Yaml);
        save_with_backup(&doc, &path, &path).unwrap();

        let backup = dir.path().join("spec.yaml.backup");
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "openapi: 3.0.0\n");
        assert!(std::fs::read_to_string(&path).unwrap().contains("improved"));
    }

    #[test]
    fn save_to_new_path_needs_no_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        let doc = Document::new(DocNode::from("spec"), DocFormat::Yaml);
        save_with_backup(&doc, &path, &path).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("out.json.backup").exists());
        // extension picked the output format
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "\"spec\"");
    }
}
