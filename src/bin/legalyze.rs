//! CLI binary for legal-analyzer.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalyzerConfig`, runs one action and prints the result.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use legal_analyzer::pipeline::llm::resolve_generator;
use legal_analyzer::pipeline::render;
use legal_analyzer::store::DEFAULT_DB_PATH;
use legal_analyzer::{
    analyze_input, analyze_text, explain_law, export_to_file, laws, AnalysisOutput,
    AnalysisProgressCallback, AnalysisSections, AnalyzerConfig, CredentialStore, HeadingMatcher,
    Language, MediaType, ProgressCallback, Section, SectionEntry, EXPORT_FILE_NAME,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Busy indicator shown while the model is working.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Reading");
        bar.set_message("document…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_text_ready(&self, chars: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{chars} characters of text ready"))
        ));
    }

    fn on_generation_start(&self, purpose: &str) {
        self.bar.set_prefix("Waiting");
        self.bar.set_message(format!("for {purpose}…"));
    }

    fn on_generation_retry(&self, attempt: u32, max_retries: u32, error: &str) {
        let msg = if error.len() > 80 {
            let cut = error
                .char_indices()
                .map(|(i, _)| i)
                .take_while(|&i| i <= 79)
                .last()
                .unwrap_or(0);
            format!("{}\u{2026}", &error[..cut])
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} retry {}/{}  {}",
            red("✗"),
            attempt,
            max_retries,
            dim(&msg)
        ));
    }

    fn on_generation_complete(&self, purpose: &str, response_len: usize) {
        self.bar.println(format!(
            "  {} {:<16} {}",
            green("✓"),
            purpose,
            dim(&format!("{response_len:>6} chars"))
        ));
    }

    fn on_sections_ready(&self, sections: &AnalysisSections) {
        let filled = sections.iter().filter(|(_, t)| !t.trim().is_empty()).count();
        self.bar.println(format!(
            "  {} {}/6 sections filled",
            if filled == 0 { red("✗") } else { green("✓") },
            filled
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse a contract and print all six sections
  legalyze analyze lease.pdf

  # Paste text instead of a file
  legalyze analyze --text "This Agreement is made between ..."

  # Only the risks, as Markdown
  legalyze analyze nda.docx --section risks --format markdown

  # Summary in German, export the PDF report
  legalyze analyze contract.txt --language german --pdf Legal_Document_Analysis.pdf

  # Law explorer
  legalyze laws list
  legalyze laws show "Criminal Law" Murder --explain

  # Accounts (local SQLite store)
  legalyze account register --username alice
  legalyze account login --username alice

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  LEGALYZE_DB             Credential database path (default users.db)
  LEGALYZE_PASSWORD       Account password (otherwise read from stdin)
"#;

/// Explain legal documents in plain language using LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "legalyze",
    version,
    about = "Explain legal documents in plain language using LLMs",
    long_about = "Analyse a legal document (PDF, DOCX or text, local or URL) with a hosted LLM. \
The answer is split into entities, key parties, important dates, clauses, risks and a summary; \
the summary can be translated and the whole analysis exported as PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    llm: LlmArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "LEGALYZE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, global = true, env = "LEGALYZE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse a document or pasted text.
    Analyze(AnalyzeArgs),
    /// Browse the law catalog.
    #[command(subcommand)]
    Laws(LawsCommand),
    /// Register or log in against the local credential store.
    #[command(subcommand)]
    Account(AccountCommand),
}

/// Model settings shared by every command that calls the LLM.
#[derive(Args, Debug)]
struct LlmArgs {
    /// LLM model ID (default: gemini-2.5-flash).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "LEGALYZE_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, global = true, env = "LEGALYZE_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Retries on LLM failure.
    #[arg(long, global = true, env = "LEGALYZE_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, global = true, env = "LEGALYZE_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, global = true, env = "LEGALYZE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Local file, `-` for stdin, or HTTP/HTTPS URL.
    #[arg(required_unless_present = "text", conflicts_with = "text")]
    input: Option<String>,

    /// Analyse this text instead of a document.
    #[arg(long)]
    text: Option<String>,

    /// Declared media type: pdf, docx, txt or a MIME type.
    #[arg(long, value_parser = parse_media_type)]
    media_type: Option<MediaType>,

    /// Translate the summary: English, Hindi, Marathi, German, Japanese.
    #[arg(short, long, env = "LEGALYZE_LANGUAGE", default_value = "English")]
    language: Language,

    /// Only accept lines that consist solely of a heading.
    #[arg(long, env = "LEGALYZE_STRICT_HEADINGS")]
    strict_headings: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Print only these sections (repeatable).
    #[arg(short, long)]
    section: Vec<Section>,

    /// Also write the PDF report to this path.
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = EXPORT_FILE_NAME)]
    pdf: Option<PathBuf>,

    /// Text file containing a custom analysis prompt with a {text} placeholder.
    #[arg(long, env = "LEGALYZE_PROMPT_FILE")]
    prompt_file: Option<PathBuf>,

    /// Disable the progress spinner.
    #[arg(long, env = "LEGALYZE_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Markdown,
    Html,
    Json,
}

#[derive(Subcommand, Debug)]
enum LawsCommand {
    /// List categories and their issues.
    List,
    /// Show one entry, optionally with an AI explanation.
    Show {
        category: String,
        issue: String,
        /// Ask the model for a plain-language explanation.
        #[arg(long)]
        explain: bool,
    },
}

#[derive(Args, Debug)]
struct CredentialArgs {
    #[arg(short, long)]
    username: String,

    /// Password; read from the first stdin line when omitted.
    #[arg(long, env = "LEGALYZE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// SQLite database path.
    #[arg(long, env = "LEGALYZE_DB", default_value = DEFAULT_DB_PATH)]
    db: PathBuf,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Create an account.
    Register(CredentialArgs),
    /// Check a username and password.
    Login(CredentialArgs),
}

fn parse_media_type(s: &str) -> Result<MediaType, String> {
    match MediaType::parse(s) {
        MediaType::Unsupported(other) => Err(format!(
            "unsupported media type '{other}' (expected pdf, docx, txt or a MIME type)"
        )),
        media_type => Ok(media_type),
    }
}

/// Log level used when `RUST_LOG` is unset.
fn default_log_filter(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = default_log_filter(cli.verbose, cli.quiet);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Command::Analyze(args) => run_analyze(&cli, args).await,
        Command::Laws(cmd) => run_laws(&cli, cmd).await,
        Command::Account(cmd) => run_account(&cli, cmd),
    }
}

// ── analyze ──────────────────────────────────────────────────────────────────

async fn run_analyze(cli: &Cli, args: &AnalyzeArgs) -> Result<()> {
    let show_progress = !cli.quiet && !args.no_progress && !cli.verbose;
    let spinner = show_progress.then(CliProgressCallback::new);
    let progress = spinner
        .clone()
        .map(|cb| cb as Arc<dyn AnalysisProgressCallback>);

    let config = build_config(cli, args, progress).await?;

    let result = match (&args.text, &args.input) {
        (Some(text), _) => analyze_text(text, &config).await,
        (None, Some(input)) => analyze_input(input, args.media_type.clone(), &config).await,
        (None, None) => bail!("Please upload a file or enter text"),
    };
    if let Some(ref s) = spinner {
        s.finish();
    }
    let output = result.context("Analysis failed")?;

    if let Some(ref t) = output.translation {
        if let Some(ref err) = t.error {
            eprintln!(
                "{} Translation to {} failed, showing the English summary: {}",
                cyan("⚠"),
                t.language,
                err
            );
        }
    }

    let selected: Vec<Section> = if args.section.is_empty() {
        Section::ALL.to_vec()
    } else {
        args.section.clone()
    };
    print_output(&output, &selected, args.format)?;

    if let Some(ref path) = args.pdf {
        if output.sections.summary.trim().is_empty() {
            bail!("Nothing to export: the analysis has no summary");
        }
        let written = export_to_file(&output.sections, path)
            .await
            .context("PDF export failed")?;
        if !cli.quiet {
            eprintln!(
                "{} PDF report  {}  →  {}",
                green("✔"),
                dim(&format!("{written} bytes")),
                bold(&path.display().to_string())
            );
        }
    }

    if !cli.quiet && args.format != OutputFormat::Json {
        let g = &output.stats.generation;
        eprintln!(
            "   {} tokens in  /  {} tokens out  /  {} attempt(s)  /  {}ms total",
            dim(&g.prompt_tokens.to_string()),
            dim(&g.completion_tokens.to_string()),
            g.attempts,
            output.stats.total_duration_ms,
        );
    }
    Ok(())
}

/// Map CLI args to `AnalyzerConfig`.
async fn build_config(
    cli: &Cli,
    args: &AnalyzeArgs,
    progress: Option<ProgressCallback>,
) -> Result<AnalyzerConfig> {
    let mut builder = base_builder(&cli.llm)
        .language(args.language)
        .heading_matcher(if args.strict_headings {
            HeadingMatcher::LineAnchored
        } else {
            HeadingMatcher::Substring
        });

    if let Some(ref path) = args.prompt_file {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read analysis prompt from {:?}", path))?;
        builder = builder.analysis_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn base_builder(llm: &LlmArgs) -> legal_analyzer::AnalyzerConfigBuilder {
    let mut builder = AnalyzerConfig::builder()
        .temperature(llm.temperature)
        .max_tokens(llm.max_tokens)
        .max_retries(llm.max_retries)
        .api_timeout_secs(llm.api_timeout)
        .download_timeout_secs(llm.download_timeout);
    if let Some(ref model) = llm.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = llm.provider {
        builder = builder.provider_name(provider.clone());
    }
    builder
}

fn print_output(output: &AnalysisOutput, selected: &[Section], format: OutputFormat) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
            writeln!(out, "{json}")?;
        }
        OutputFormat::Text => {
            for &section in selected {
                writeln!(out, "{}", bold(section.marker()))?;
                let entries = output.entries(section);
                if entries.is_empty() {
                    writeln!(out, "  {}", dim("(nothing found)"))?;
                }
                for entry in entries {
                    match entry {
                        SectionEntry::Labeled { label, value } => {
                            writeln!(out, "  {}: {}", bold(&label), value)?
                        }
                        SectionEntry::Plain { text } => writeln!(out, "  {text}")?,
                    }
                }
                writeln!(out)?;
            }
        }
        OutputFormat::Markdown => {
            for &section in selected {
                writeln!(out, "## {}\n", section.label())?;
                write!(out, "{}", render::to_markdown(section_text(output, section)))?;
                writeln!(out)?;
            }
        }
        OutputFormat::Html => {
            for &section in selected {
                writeln!(out, "<section id=\"{}\">", section.key())?;
                writeln!(out, "<h2>{}</h2>", section.label())?;
                write!(out, "{}", render::to_html(section_text(output, section)))?;
                writeln!(out, "</section>")?;
            }
        }
    }
    out.flush().context("Failed to write to stdout")
}

fn section_text(output: &AnalysisOutput, section: Section) -> &str {
    match section {
        Section::Summary => output.display_summary(),
        other => output.sections.get(other),
    }
}

// ── laws ─────────────────────────────────────────────────────────────────────

async fn run_laws(cli: &Cli, cmd: &LawsCommand) -> Result<()> {
    match cmd {
        LawsCommand::List => {
            for category in laws::CATALOG {
                println!("{}", bold(category.name));
                for entry in category.entries {
                    println!("  {:<20} {}", entry.issue, dim(entry.section));
                }
            }
            Ok(())
        }
        LawsCommand::Show {
            category,
            issue,
            explain,
        } => {
            let (cat, entry) = laws::lookup(category, issue)?;
            println!("{}  {}", bold(cat.name), cyan(entry.issue));
            println!("  {:<12} {}", bold("Section"), entry.section);
            println!("  {:<12} {}", bold("Punishment"), entry.punishment);
            println!("  {:<12} {}", bold("Jail"), entry.jail);
            println!("  {:<12} {}", bold("Notes"), entry.notes);

            if *explain {
                let config = base_builder(&cli.llm)
                    .build()
                    .context("Invalid configuration")?;
                let generator = resolve_generator(&config)?;
                let spinner = (!cli.quiet).then(CliProgressCallback::new);
                if let Some(ref s) = spinner {
                    s.on_generation_start("explanation");
                }
                let result = explain_law(generator.as_ref(), cat.name, entry.issue, &config).await;
                if let Some(ref s) = spinner {
                    s.finish();
                }
                let explanation = result.context("Explanation failed")?;
                println!("\n{}", explanation.explanation.trim_end());
            }
            Ok(())
        }
    }
}

// ── account ──────────────────────────────────────────────────────────────────

fn run_account(cli: &Cli, cmd: &AccountCommand) -> Result<()> {
    match cmd {
        AccountCommand::Register(args) => {
            let store = CredentialStore::open(&args.db)
                .with_context(|| format!("Failed to open {}", args.db.display()))?;
            let password = password_from(args)?;
            let user = store.register(&args.username, &password)?;
            if !cli.quiet {
                eprintln!("{} Account created! Please login.", green("✔"));
            }
            println!("{}", user.id);
            Ok(())
        }
        AccountCommand::Login(args) => {
            let store = CredentialStore::open(&args.db)
                .with_context(|| format!("Failed to open {}", args.db.display()))?;
            let password = password_from(args)?;
            let user = store.authenticate(&args.username, &password)?;
            if !cli.quiet {
                eprintln!("{} Login successful", green("✔"));
            }
            println!("{}", user.username);
            Ok(())
        }
    }
}

fn password_from(args: &CredentialArgs) -> Result<String> {
    if let Some(ref p) = args.password {
        return Ok(p.clone());
    }
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
