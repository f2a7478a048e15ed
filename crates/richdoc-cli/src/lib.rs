//! `richdoc`: outline, edit and reconcile structured documents from the shell.
//!
//! Documents are JSON files in the native model format, or markdown when the
//! path ends in `.md`. Commands that change a document write it back
//! atomically, keeping a `.bak` copy unless told otherwise.

pub mod error;
pub mod files;
pub mod logging;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use regex::Regex;
use richdoc_config::{Config, LoadOptions, OutputFormat};
use richdoc_engine::{preview_diff, DocOp, History, OpSource, SkippedOp};
use richdoc_format::{ApplySummary, Renderer};
use richdoc_markdown::MarkdownConverter;
use richdoc_model::{DocumentAst, DocumentConverter};
use richdoc_outline::{build_heading_regex, section_context, Section, SectionSource};
use richdoc_reconcile::{
    adapt_section_ops, build_section_doc_ops_diff, build_section_doc_ops_diff_from_value, repair,
    repair_with_details, DiffMode, DiffOptions, DirectKeys, IntentKind,
};
use serde_json::Value;
use tracing::{info, warn};

pub use error::{CliError, CliResult, ExitCode};
use files::DocumentFormat;

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    match execute(cli) {
        Ok(code) => Ok(code.code()),
        Err(err) => match err.downcast_ref::<CliError>() {
            Some(cli_err) => {
                eprintln!("{cli_err}");
                Ok(cli_err.exit_code().code())
            }
            None => Err(err),
        },
    }
}

struct Session {
    config: Config,
    renderer: Renderer,
    quiet: bool,
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let Cli { global, command } = cli;

    let mut options = LoadOptions::default();
    if let Some(path) = &global.config {
        options = options.with_override_path(path);
    }
    let config = Config::load(options).map_err(|err| CliError::InvalidArguments(err.to_string()))?;

    logging::init(logging::effective_level(
        global.verbose,
        global.quiet,
        config.logging.level,
    ));

    let format = global
        .format
        .map(OutputFormat::from)
        .unwrap_or(config.output.format);
    let session = Session {
        renderer: Renderer::new(format),
        config,
        quiet: global.quiet,
    };

    match command {
        Command::Outline(args) => handle_outline(&session, args),
        Command::Section(args) => handle_section(&session, args),
        Command::Apply(args) => handle_apply(&session, args),
        Command::Reconcile(args) => handle_reconcile(&session, args),
        Command::Repair(args) => handle_repair(&session, args),
        Command::Import(args) => handle_import(&session, args),
        Command::Export(args) => handle_export(&session, args),
    }
}

fn handle_outline(session: &Session, args: OutlineArgs) -> Result<ExitCode> {
    let document = files::read_document(&args.document)?;
    emit(&session.renderer.outline(&document.outline())?)?;
    Ok(ExitCode::Success)
}

fn handle_section(session: &Session, args: SectionArgs) -> Result<ExitCode> {
    let document = files::read_document(&args.document)?;
    let pattern = compile_pattern(&args.heading)?;
    let sections = document.find_sections(&pattern);
    if sections.is_empty() {
        return Err(not_found(&document, &args.heading.pattern).into());
    }

    let paragraphs = document.paragraphs();
    let rendered: Vec<_> = sections
        .into_iter()
        .map(|section| {
            let context = section_context(&paragraphs, &section);
            (section.heading, context)
        })
        .collect();
    emit(&session.renderer.sections(&rendered)?)?;
    Ok(ExitCode::Success)
}

fn handle_apply(session: &Session, args: ApplyArgs) -> Result<ExitCode> {
    let document = files::read_document(&args.document)?;
    let raw = files::read_payload(&args.ops)?;
    let ops: Vec<DocOp> = serde_json::from_str(&raw).map_err(|err| {
        CliError::InvalidContent(format!("ops in {} are malformed: {err}", args.ops.display()))
    })?;

    let applied = apply_and_write(session, &args.document, &args.write, document, &ops)?;
    if !session.quiet {
        emit(&session.renderer.apply(&applied.summary())?)?;
    }
    Ok(ExitCode::Success)
}

fn handle_reconcile(session: &Session, args: ReconcileArgs) -> Result<ExitCode> {
    let document = files::read_document(&args.document)?;
    let section = select_section(&document, &args.heading)?;
    let context = section_context(&document.paragraphs(), &section);
    let raw = files::read_json_payload(&args.with)?;

    let settings = session.config.reconcile;
    let mode = args
        .intent
        .map(IntentKind::diff_mode)
        .or(args.mode)
        .unwrap_or(settings.default_mode);
    let strict = args.strict || settings.strict;
    let options = DiffOptions { mode, strict };

    let computed = if settings.repair && !args.no_repair && mode == DiffMode::Rewrite {
        let repaired = repair(&context, Some(&raw));
        build_section_doc_ops_diff(&context, &repaired, options)
    } else {
        build_section_doc_ops_diff_from_value(&context, &raw, options)
    };
    let section_ops = computed.map_err(|err| CliError::Validation(err.to_string()))?;
    info!(
        section = %section.heading.text,
        %mode,
        ops = section_ops.len(),
        "computed section edits"
    );

    let applied = if args.apply || args.write.dry_run {
        let adapted = adapt_section_ops(&section_ops, &DirectKeys, OpSource::Ai);
        let ops = if strict {
            adapted
                .require_resolved()
                .map_err(|err| CliError::Validation(err.to_string()))?
        } else {
            adapted.ops
        };
        Some(apply_and_write(
            session,
            &args.document,
            &args.write,
            document,
            &ops,
        )?)
    } else {
        None
    };

    if !session.quiet {
        let summary = applied.as_ref().map(Applied::summary);
        emit(&session.renderer.reconcile(
            &section.heading,
            mode,
            &section_ops,
            summary.as_ref(),
        )?)?;
    }
    Ok(ExitCode::Success)
}

fn handle_repair(session: &Session, args: RepairArgs) -> Result<ExitCode> {
    let document = files::read_document(&args.document)?;
    let section = select_section(&document, &args.heading)?;
    let context = section_context(&document.paragraphs(), &section);

    let payload = files::read_payload(&args.with)?;
    let raw = serde_json::from_str::<Value>(&payload).unwrap_or_else(|err| {
        warn!(error = %err, "payload is not JSON; treating it as a bare string");
        Value::String(payload.clone())
    });

    let (paragraphs, report) = repair_with_details(&context, Some(&raw));
    emit(&session.renderer.repair(&report, &paragraphs)?)?;
    Ok(ExitCode::Success)
}

fn handle_import(session: &Session, args: ConvertArgs) -> Result<ExitCode> {
    let bytes = std::fs::read(&args.input).map_err(|err| CliError::io(&args.input, err))?;
    let document = MarkdownConverter
        .import(&bytes)
        .map_err(|err| CliError::InvalidContent(format!("{}: {err}", args.input.display())))?;
    let encoded = files::encode_document(&document, DocumentFormat::Json)?;
    write_or_print(session, args.output.as_deref(), &encoded)
}

fn handle_export(session: &Session, args: ConvertArgs) -> Result<ExitCode> {
    let document = files::read_document(&args.input)?;
    let encoded = files::encode_document(&document, DocumentFormat::Markdown)?;
    write_or_print(session, args.output.as_deref(), &encoded)
}

/// Outcome of applying ops to a document file, owned so it can outlive the
/// history it came from.
struct Applied {
    ops: usize,
    changed: bool,
    version: u64,
    skipped: Vec<SkippedOp>,
    diff: Option<String>,
    written: Option<PathBuf>,
}

impl Applied {
    fn summary(&self) -> ApplySummary<'_> {
        ApplySummary {
            ops: self.ops,
            changed: self.changed,
            version: self.version,
            skipped: &self.skipped,
            diff: self.diff.as_deref(),
            written: self.written.as_deref(),
        }
    }
}

fn apply_and_write(
    session: &Session,
    source: &Path,
    write: &WriteArgs,
    document: DocumentAst,
    ops: &[DocOp],
) -> Result<Applied> {
    let mut history = History::with_max_levels(document, session.config.history.max_levels);
    let before = Arc::clone(history.current());
    let outcome = history.apply(ops);
    let target = write.output.as_deref().unwrap_or(source);

    let mut applied = Applied {
        ops: ops.len(),
        changed: outcome.changed,
        version: outcome.next.version(),
        skipped: outcome.skipped,
        diff: None,
        written: None,
    };

    if write.dry_run {
        applied.diff = preview_diff(&before, &outcome.next, &target.display().to_string());
        return Ok(applied);
    }

    if outcome.changed || write.output.is_some() {
        files::write_document(target, &outcome.next, !write.no_backup)?;
        info!(path = %target.display(), version = applied.version, "wrote document");
        applied.written = Some(target.to_path_buf());
    }
    Ok(applied)
}

fn write_or_print(session: &Session, output: Option<&Path>, bytes: &[u8]) -> Result<ExitCode> {
    match output {
        Some(path) => {
            files::write_atomic(path, bytes, false)?;
            if !session.quiet {
                println!("Wrote {}", path.display());
            }
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(bytes).context("failed to write output")?;
            stdout.flush().context("failed to flush output")?;
        }
    }
    Ok(ExitCode::Success)
}

fn compile_pattern(heading: &HeadingArgs) -> CliResult<Regex> {
    build_heading_regex(&heading.pattern, heading.case_sensitive).map_err(|err| {
        CliError::InvalidArguments(format!(
            "Failed to compile pattern '{}': {err}",
            heading.pattern
        ))
    })
}

/// The single section whose heading matches; more than one is an error.
fn select_section(document: &DocumentAst, heading: &HeadingArgs) -> CliResult<Section> {
    let pattern = compile_pattern(heading)?;
    let mut sections = document.find_sections(&pattern);
    match sections.len() {
        0 => Err(not_found(document, &heading.pattern)),
        1 => Ok(sections.remove(0)),
        count => Err(CliError::InvalidArguments(format!(
            "pattern '{}' matched {count} sections; narrow it to one",
            heading.pattern
        ))),
    }
}

fn not_found(document: &DocumentAst, pattern: &str) -> CliError {
    let outline = document.outline();
    if !outline.is_empty() {
        eprintln!("Candidate headings:");
        for item in outline.iter().take(20) {
            eprintln!("  - {}", item.text);
        }
    }
    CliError::NotFound(format!("No matching sections found for pattern '{pattern}'."))
}

fn emit(content: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(content.as_bytes())
        .context("failed to write output")?;
    if !content.ends_with('\n') {
        writeln!(stdout).context("failed to write output")?;
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Structured document outline, edit and reconcile toolkit",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct GlobalArgs {
    /// Use this config file on top of the discovered ones
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Output format (overrides [output] format)
    #[arg(long, value_enum, global = true)]
    format: Option<FormatValue>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress informational output and log only errors
    #[arg(short = 'q', long = "quiet", global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the heading outline of a document
    Outline(OutlineArgs),
    /// Print the paragraphs of every section whose heading matches
    Section(SectionArgs),
    /// Apply a JSON array of document operations
    Apply(ApplyArgs),
    /// Turn model paragraph output into section edits
    Reconcile(ReconcileArgs),
    /// Normalise model output to the section's paragraph count
    Repair(RepairArgs),
    /// Convert markdown into the native JSON document format
    Import(ConvertArgs),
    /// Convert a document to markdown
    Export(ConvertArgs),
}

#[derive(Args)]
struct OutlineArgs {
    /// Document path (.json, or .md for markdown)
    #[arg(value_name = "DOC")]
    document: PathBuf,
}

#[derive(Args)]
struct HeadingArgs {
    /// Regex pattern to match headings (case-insensitive by default)
    #[arg(value_name = "PATTERN")]
    pattern: String,

    /// Treat pattern as case sensitive
    #[arg(short = 's', long = "case-sensitive")]
    case_sensitive: bool,
}

#[derive(Args)]
struct SectionArgs {
    #[arg(value_name = "DOC")]
    document: PathBuf,

    #[command(flatten)]
    heading: HeadingArgs,
}

#[derive(Args)]
struct WriteArgs {
    /// Print a diff of the document text without writing
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Disable .bak backups of the document
    #[arg(long = "no-backup")]
    no_backup: bool,

    /// Write the result here instead of over DOC
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ApplyArgs {
    #[arg(value_name = "DOC")]
    document: PathBuf,

    /// JSON array of operations (use '-' for stdin)
    #[arg(long = "ops", value_name = "PATH", allow_hyphen_values = true)]
    ops: PathBuf,

    #[command(flatten)]
    write: WriteArgs,
}

#[derive(Args)]
struct ReconcileArgs {
    #[arg(value_name = "DOC")]
    document: PathBuf,

    #[command(flatten)]
    heading: HeadingArgs,

    /// Model output: JSON array of {index, text} (use '-' for stdin)
    #[arg(long = "with", value_name = "PATH", allow_hyphen_values = true)]
    with: PathBuf,

    /// Paragraph-count contract (defaults to [reconcile] default_mode)
    #[arg(long, value_name = "MODE", value_parser = parse_mode, conflicts_with = "intent")]
    mode: Option<DiffMode>,

    /// Derive the mode from a section intent such as summarize_section
    #[arg(long, value_name = "INTENT", value_parser = parse_intent)]
    intent: Option<IntentKind>,

    /// Reject malformed model output instead of degrading
    #[arg(long)]
    strict: bool,

    /// Skip the repair pass before rewrite diffs
    #[arg(long = "no-repair")]
    no_repair: bool,

    /// Apply the computed edits to the document
    #[arg(long)]
    apply: bool,

    #[command(flatten)]
    write: WriteArgs,
}

#[derive(Args)]
struct RepairArgs {
    #[arg(value_name = "DOC")]
    document: PathBuf,

    #[command(flatten)]
    heading: HeadingArgs,

    /// Raw model output (use '-' for stdin)
    #[arg(long = "with", value_name = "PATH", allow_hyphen_values = true)]
    with: PathBuf,
}

#[derive(Args)]
struct ConvertArgs {
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Write here instead of stdout
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatValue {
    Plain,
    Json,
}

impl From<FormatValue> for OutputFormat {
    fn from(value: FormatValue) -> Self {
        match value {
            FormatValue::Plain => OutputFormat::Plain,
            FormatValue::Json => OutputFormat::Json,
        }
    }
}

fn parse_mode(value: &str) -> Result<DiffMode, String> {
    value.parse().map_err(|err| format!("{err}"))
}

fn parse_intent(value: &str) -> Result<IntentKind, String> {
    value.parse().map_err(|err| format!("{err}"))
}
