// HeadDoWell CLI entry point
// Reads a message (or conversation) and prints the triage report as JSON.

use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{bail, Context};
use headdowell_core::error::{AppError, AppResult};
use headdowell_core::translation::translator_from_config;
use headdowell_core::{TriageConfig, TriageEngine};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const USAGE: &str = "Usage:
  headdowell analyze [--lang <code>] [TEXT...]    analyze one message (stdin if TEXT is omitted)
  headdowell conversation [RESPONSE...]           analyze several responses (stdin lines if omitted)";

#[derive(Debug)]
enum Command {
    Analyze { text: String, lang: Option<String> },
    Conversation { responses: Vec<String> },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_logs = std::env::var("HEADDOWELL_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // Logs go to stderr so stdout stays pure JSON.
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn read_stdin() -> anyhow::Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read stdin")?;
    Ok(buffer)
}

fn parse_args(args: Vec<String>) -> anyhow::Result<Command> {
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        bail!("missing command");
    };

    match command.as_str() {
        "analyze" => {
            let mut lang = None;
            let mut words = Vec::new();
            while let Some(arg) = args.next() {
                if arg == "--lang" {
                    lang = Some(args.next().context("--lang needs a language code")?);
                } else {
                    words.push(arg);
                }
            }
            let text = if words.is_empty() {
                read_stdin()?
            } else {
                words.join(" ")
            };
            Ok(Command::Analyze { text, lang })
        }
        "conversation" => {
            let mut responses: Vec<String> = args.collect();
            if responses.is_empty() {
                responses = read_stdin()?.lines().map(str::to_string).collect();
            }
            Ok(Command::Conversation { responses })
        }
        other => bail!("unknown command '{}'", other),
    }
}

/// Error payload and exit status for a failed run. Only the public shape of
/// the error is printed; details go to the log.
fn failure_payload(err: &AppError) -> (serde_json::Value, u8) {
    let status = if err.is_client_error() { 2 } else { 1 };
    (json!({ "error": err.to_public() }), status)
}

fn print_failure(err: &AppError) -> ExitCode {
    let (payload, status) = failure_payload(err);
    eprintln!("{}", payload);
    ExitCode::from(status)
}

async fn run(command: Command, config: &TriageConfig) -> AppResult<String> {
    info!(embedder = ?config.embedder, "Starting HeadDoWell triage");
    // Model loading is blocking work.
    let engine_config = config.clone();
    let engine = tokio::task::spawn_blocking(move || TriageEngine::from_config(&engine_config))
        .await
        .map_err(|e| AppError::Internal(format!("Engine initialization task failed: {}", e)))??;

    match command {
        Command::Analyze { text, lang } => {
            let report = engine.analyze(&text)?;
            let mut output = serde_json::to_value(&report)?;

            if let (Some(lang), Some(severity)) = (lang, report.severity_assessment.as_ref()) {
                let translator = translator_from_config(config)?;
                let localized = severity.description_in(&lang, translator.as_ref()).await;
                output["severity_assessment"]["localized_description"] = json!({
                    "language": lang,
                    "text": localized,
                });
            }
            Ok(serde_json::to_string_pretty(&output)?)
        }
        Command::Conversation { responses } => {
            let report = engine.analyze_conversation(&responses)?;
            Ok(serde_json::to_string_pretty(&report)?)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = TriageConfig::load();
    init_tracing();
    let config = match config {
        Ok(config) => config,
        Err(e) => return print_failure(&e),
    };

    let command = match parse_args(std::env::args().skip(1).collect()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return ExitCode::from(64);
        }
    };

    match run(command, &config).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => print_failure(&e),
    }
}
