use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::warn;
use tokio::io::AsyncBufReadExt;

use pagescribe::detect::{DetectionOptions, LabelDetectionEngine};
use pagescribe::dom::{parse_document_file, Document};
use pagescribe::export::{write_steps, ExportFormat};
use pagescribe::recorder::{
    ConsoleHighlighter, DomEvent, DomEventKind, PathLocatorBuilder, Recorder, RecorderConfig,
};
use pagescribe::trace::{self, TraceEvent};
use pagescribe::Step;

#[derive(Parser)]
#[command(name = "pagescribe")]
#[command(version = "0.1.0")]
#[command(about = "Browser macro recorder with heuristic label detection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an event trace through a recording session and export steps
    Record {
        /// Path to the DOM fixture (XML)
        #[arg(short, long)]
        dom: PathBuf,

        /// JSON event trace to replay (omit when using --follow)
        #[arg(short, long)]
        events: Option<PathBuf>,

        /// Read NDJSON events from stdin until EOF or Ctrl+C
        #[arg(long, default_value = "false")]
        follow: bool,

        /// Page URL when the fixture does not carry one
        #[arg(long, default_value = "https://localhost/")]
        url: String,

        /// Output file path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (json, yaml, csv)
        #[arg(short, long, default_value = "yaml")]
        format: String,

        /// Input debounce in milliseconds
        #[arg(long)]
        debounce: Option<u64>,

        /// Extra ignored selectors (comma-separated)
        #[arg(long, value_delimiter = ',')]
        ignore: Vec<String>,

        /// Restrict capture to the subtree matching this selector
        #[arg(long)]
        scope: Option<String>,

        /// Label acceptance threshold
        #[arg(long)]
        min_confidence: Option<f32>,

        /// Project ID stamped on the session
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Run label detection against one element and print the result
    Detect {
        /// Path to the DOM fixture (XML)
        #[arg(short, long)]
        dom: PathBuf,

        /// Target element selector
        #[arg(short, long)]
        target: String,

        /// Label acceptance threshold
        #[arg(long, default_value = "0.5")]
        min_confidence: f32,

        /// Page URL when the fixture does not carry one
        #[arg(long, default_value = "https://localhost/")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Record {
            dom,
            events,
            follow,
            url,
            output,
            format,
            debounce,
            ignore,
            scope,
            min_confidence,
            project,
        } => {
            let format: ExportFormat = format.parse()?;
            let document = Arc::new(parse_document_file(&dom, &url)?);

            let mut config = RecorderConfig::default();
            if let Some(ms) = debounce {
                config.input_debounce_ms = ms;
            }
            config.ignored_selectors.extend(ignore);
            config.scope_selector = scope;
            config.project_id = project;
            if let Some(threshold) = min_confidence {
                config.min_confidence = threshold;
            }

            let recorder = Recorder::with_collaborators(
                config,
                Arc::new(PathLocatorBuilder),
                Arc::new(ConsoleHighlighter::new()),
                Arc::new(LabelDetectionEngine::new()),
            );
            let doc_id = recorder
                .attach_document(document.clone())
                .await
                .ok_or_else(|| anyhow::anyhow!("document could not be attached"))?;
            recorder.start(&document.url).await?;

            println!(
                "{} Recording against {}",
                "▶".green().bold(),
                document.url.cyan()
            );

            if follow {
                follow_stdin(&recorder, doc_id, &document).await?;
            } else {
                let path = events.ok_or_else(|| {
                    anyhow::anyhow!("either --events <trace.json> or --follow is required")
                })?;
                replay_trace(&recorder, doc_id, &document, &trace::load_trace(&path)?).await?;
            }

            let steps = recorder.stop().await;
            emit_steps(&steps, format, output.as_deref())?;

            println!(
                "\n{} Recorded {} step(s)",
                "■".blue().bold(),
                steps.len().to_string().white().bold()
            );
        }

        Commands::Detect {
            dom,
            target,
            min_confidence,
            url,
        } => {
            let document = parse_document_file(&dom, &url)?;
            let node = document
                .query_selector(&target)
                .ok_or_else(|| anyhow::anyhow!("no element matches selector '{target}'"))?;

            let engine = LabelDetectionEngine::new();
            let options = DetectionOptions { min_confidence };
            match engine.detect(&document, node, &options) {
                Some(hit) => {
                    println!("{} {}", "✓".green(), hit.label.white().bold());
                    println!("  strategy:   {}", hit.strategy.cyan());
                    println!("  confidence: {:.2}", hit.confidence);
                    for (key, value) in &hit.metadata {
                        println!("  {key}: {}", value.dimmed());
                    }
                }
                None => {
                    println!(
                        "{} no label cleared the {:.2} confidence threshold",
                        "○".yellow(),
                        min_confidence
                    );
                }
            }
        }
    }

    Ok(())
}

/// Batch replay. Traces rarely carry explicit blur events, so when focus
/// moves off a text field a synthetic blur is dispatched first — the way
/// a browser commits the field before the next interaction.
async fn replay_trace(
    recorder: &Recorder,
    doc_id: uuid::Uuid,
    document: &Arc<Document>,
    entries: &[TraceEvent],
) -> anyhow::Result<()> {
    let mut last_text_target: Option<String> = None;

    for entry in entries {
        if let Some(prev) = last_text_target.take() {
            if prev != entry.target {
                if let Some(node) = document.query_selector(&prev) {
                    recorder
                        .dispatch(doc_id, DomEvent::new(DomEventKind::Blur, node))
                        .await?;
                }
            } else {
                last_text_target = Some(prev);
            }
        }
        match trace::resolve(document, entry) {
            Ok(event) => {
                if entry.event == DomEventKind::Input {
                    last_text_target = Some(entry.target.clone());
                }
                recorder.dispatch(doc_id, event).await?;
            }
            Err(e) => warn!("skipping trace event: {e}"),
        }
    }
    Ok(())
}

/// Follow mode: NDJSON events on stdin, live debounce timers, stopped by
/// EOF or Ctrl+C.
async fn follow_stdin(
    recorder: &Recorder,
    doc_id: uuid::Uuid,
    document: &Arc<Document>,
) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = tokio::io::BufReader::new(stdin).lines();

    println!("  Reading NDJSON events from stdin (Ctrl+C to stop)...\n");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match parse_and_resolve(document, &line) {
                        Ok(event) => recorder.dispatch(doc_id, event).await?,
                        Err(e) => warn!("skipping event: {e}"),
                    },
                    None => break, // EOF
                }
            }
        }
    }
    Ok(())
}

fn parse_and_resolve(document: &Document, line: &str) -> anyhow::Result<DomEvent> {
    let entry = trace::parse_line(line)?;
    Ok(trace::resolve(document, &entry)?)
}

fn emit_steps(
    steps: &[Step],
    format: ExportFormat,
    output: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            write_steps(steps, format, file)?;
            println!("  Steps written to {}", path.display().to_string().cyan());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write_steps(steps, format, &mut lock)?;
            lock.flush()?;
        }
    }
    Ok(())
}
