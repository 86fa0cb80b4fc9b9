use anyhow::{bail, Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use code_embed::DEFAULT_FETCH_TIMEOUT;
use code_embed_selector::{
    extract, merge_spans, FunctionLocator, FunctionSpan, LanguageRegistry, RangeSpec,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

mod document;

#[derive(Parser)]
#[command(name = "code-embed")]
#[command(about = "Embed live source-code regions in markdown notes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for output)
    #[arg(long, global = true)]
    quiet: bool,

    /// Extra language templates (TOML: [languages.<id>] start/end, [aliases])
    #[arg(long, global = true)]
    templates: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand every embed block of a markdown document
    Render(RenderArgs),

    /// Print selected lines of a file
    Extract(ExtractArgs),

    /// Print the line span of a function
    Locate(LocateArgs),

    /// List registered language templates
    Languages(LanguagesArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Markdown document inside the vault
    doc: PathBuf,

    /// Vault root directory
    #[arg(long, default_value = ".")]
    vault: PathBuf,

    /// Write the rendered document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Timeout for http[s]:// sources, in seconds
    #[arg(long, default_value_t = DEFAULT_FETCH_TIMEOUT.as_secs())]
    fetch_timeout: u64,

    /// Output JSON (document plus one result per embed)
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ExtractArgs {
    file: PathBuf,

    /// Range expression, e.g. "1-3, 10"; wins over --function
    #[arg(long)]
    lines: Option<String>,

    /// Comma-separated function names
    #[arg(long)]
    function: Option<String>,

    /// Language of the file (default: from the extension)
    #[arg(long)]
    lang: Option<String>,
}

#[derive(Args)]
struct LocateArgs {
    file: PathBuf,

    /// Function name
    #[arg(long)]
    function: String,

    /// Language of the file (default: from the extension)
    #[arg(long)]
    lang: Option<String>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct LanguagesArgs {
    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct LocateOutput<'a> {
    file: String,
    language: String,
    function: &'a str,
    #[serde(flatten)]
    span: FunctionSpan,
    line_count: usize,
}

#[derive(Serialize)]
struct LanguageEntry<'a> {
    id: &'a str,
    start: &'a str,
    end: &'a str,
}

#[derive(Serialize)]
struct LanguagesOutput<'a> {
    languages: Vec<LanguageEntry<'a>>,
    aliases: BTreeMap<&'a str, &'a str>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON parsing
    let json_output = match &cli.command {
        Commands::Render(args) => args.json,
        Commands::Locate(args) => args.json,
        Commands::Languages(args) => args.json,
        Commands::Extract(_) => false,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let registry = load_registry(cli.templates.as_deref())?;

    match cli.command {
        Commands::Render(args) => run_render(args, registry).await?,
        Commands::Extract(args) => run_extract(&args, &registry)?,
        Commands::Locate(args) => run_locate(&args, &registry)?,
        Commands::Languages(args) => run_languages(&args, &registry)?,
    }

    Ok(())
}

fn load_registry(templates: Option<&Path>) -> Result<LanguageRegistry> {
    let mut registry = LanguageRegistry::builtin();
    if let Some(path) = templates {
        let added = registry
            .extend_from_file(path)
            .with_context(|| format!("Failed to load templates from {}", path.display()))?;
        log::info!("Loaded {added} language template(s) from {}", path.display());
    }
    Ok(registry)
}

async fn run_render(args: RenderArgs, registry: LanguageRegistry) -> Result<()> {
    let rendered = document::render_document(
        &args.vault,
        &args.doc,
        Arc::new(registry),
        Duration::from_secs(args.fetch_timeout),
    )
    .await?;

    let errors = rendered.error_count();
    if errors > 0 {
        log::warn!(
            "{errors} of {} embed(s) in {} failed",
            rendered.embeds.len(),
            rendered.document
        );
    } else {
        log::info!(
            "Rendered {} embed(s) in {}",
            rendered.embeds.len(),
            rendered.document
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
        return Ok(());
    }

    match &args.output {
        Some(path) => fs::write(path, &rendered.markdown)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{}", rendered.markdown),
    }
    Ok(())
}

fn run_extract(args: &ExtractArgs, registry: &LanguageRegistry) -> Result<()> {
    let text = read_source(&args.file)?;

    let selection = match (&args.lines, &args.function) {
        (Some(expr), _) => {
            if args.function.is_some() {
                log::debug!("--lines given; ignoring --function");
            }
            RangeSpec::parse(expr)
        }
        (None, Some(names)) => {
            let language = language_for(&args.file, args.lang.as_deref())?;
            let names: Vec<&str> = names
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .collect();
            let spans = FunctionLocator::new(registry).locate_all(&language, &names, &text)?;
            merge_spans(&spans)
        }
        (None, None) => RangeSpec::default(),
    };

    for token in selection.malformed_tokens() {
        log::warn!("Ignoring malformed range token {token:?}");
    }

    let shown = extract(&text, &selection);
    if shown.ends_with('\n') {
        print!("{shown}");
    } else {
        println!("{shown}");
    }
    Ok(())
}

fn run_locate(args: &LocateArgs, registry: &LanguageRegistry) -> Result<()> {
    let text = read_source(&args.file)?;
    let language = language_for(&args.file, args.lang.as_deref())?;
    let span = FunctionLocator::new(registry)
        .locate(&language, &args.function, &text)
        .with_context(|| format!("Cannot locate {} in {}", args.function, args.file.display()))?;

    if args.json {
        let output = LocateOutput {
            file: args.file.display().to_string(),
            language: registry.resolve_id(&language),
            function: &args.function,
            span,
            line_count: span.line_count(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{span}");
    }
    Ok(())
}

fn run_languages(args: &LanguagesArgs, registry: &LanguageRegistry) -> Result<()> {
    if args.json {
        let output = LanguagesOutput {
            languages: registry
                .languages()
                .map(|(id, template)| LanguageEntry {
                    id,
                    start: &template.start,
                    end: template.end.as_str(),
                })
                .collect(),
            aliases: registry.aliases().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for (id, template) in registry.languages() {
        println!("{id:<12} {:<9} {}", template.end.as_str(), template.start);
    }
    let aliases: Vec<String> = registry
        .aliases()
        .map(|(alias, target)| format!("{alias}={target}"))
        .collect();
    if !aliases.is_empty() {
        println!();
        println!("aliases: {}", aliases.join(" "));
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Explicit `--lang`, else the file extension (resolved through the aliases)
fn language_for(path: &Path, explicit: Option<&str>) -> Result<String> {
    if let Some(language) = explicit {
        return Ok(language.to_string());
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => Ok(ext.to_string()),
        None => bail!(
            "Cannot infer the language of {}; pass --lang",
            path.display()
        ),
    }
}
