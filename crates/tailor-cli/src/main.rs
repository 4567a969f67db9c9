use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use tailor_client::llm::DEFAULT_PING_MESSAGE;
use tailor_client::{
    HtmdCleaner, HttpJobScraper, PdfTextExtractor, ProviderClient, ProviderClientFactory,
    ReqwestFetcher,
};
use tailor_core::config::{process_env, resolve_api_key};
use tailor_core::traits::{JobScraper, ResumeExtractor};
use tailor_core::{Orchestrator, Provider, TailorRequest, TailoredResume, TracingReporter};
use tailor_export::{JSON_FILE_NAME, MARKDOWN_FILE_NAME, PDF_FILE_NAME};

#[derive(Parser)]
#[command(name = "tailor", version, about = "Tailor a resume to a job posting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, scrape, and tailor in one go
    Run {
        /// Resume PDF
        #[arg(short, long)]
        resume: PathBuf,

        /// Job posting URL
        #[arg(short, long)]
        url: String,

        /// google, openai, or anthropic
        #[arg(
            short,
            long,
            env = "TAILOR_PROVIDER",
            default_value = "google",
            value_parser = parse_provider
        )]
        provider: Provider,

        /// API key (falls back to the provider's environment variable)
        #[arg(short = 'k', long)]
        api_key: Option<String>,

        /// What to write. `all` writes JSON and PDF from one structured run.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::All)]
        format: OutputFormat,

        /// Directory for output files
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Seconds to wait for the provider (default 120)
        #[arg(long, env = "TAILOR_LLM_TIMEOUT")]
        llm_timeout: Option<u64>,
    },

    /// Render a (possibly edited) JSON record to PDF
    Render {
        /// Record exported by `run`
        #[arg(short, long)]
        json: PathBuf,

        /// Output PDF path
        #[arg(short, long, default_value = PDF_FILE_NAME)]
        out: PathBuf,
    },

    /// Print the text extracted from a resume PDF
    Extract {
        #[arg(short, long)]
        resume: PathBuf,
    },

    /// Print the Markdown scraped from a job posting
    Scrape {
        #[arg(short, long)]
        url: String,
    },

    /// Check that a provider answers with the given key
    Ping {
        #[arg(
            short,
            long,
            env = "TAILOR_PROVIDER",
            default_value = "google",
            value_parser = parse_provider
        )]
        provider: Provider,

        #[arg(short = 'k', long)]
        api_key: Option<String>,

        #[arg(short, long, default_value = DEFAULT_PING_MESSAGE)]
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pdf,
    Markdown,
    All,
}

fn parse_provider(s: &str) -> Result<Provider, String> {
    s.parse::<Provider>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let mut filter = EnvFilter::from_default_env();
    for directive in [
        "tailor_cli=info",
        "tailor_core=info",
        "tailor_client=info",
        "tailor_export=info",
    ] {
        filter = filter.add_directive(directive.parse()?);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            resume,
            url,
            provider,
            api_key,
            format,
            out_dir,
            llm_timeout,
        } => {
            let request = TailorRequest {
                resume_pdf: std::fs::read(&resume)
                    .with_context(|| format!("Failed to read resume: {}", resume.display()))?,
                job_url: url,
                api_key,
                provider,
            };
            let mut factory = ProviderClientFactory::new();
            if let Some(secs) = llm_timeout {
                factory = factory.with_llm_timeout(Duration::from_secs(secs));
            }
            cmd_run(&request, factory, format, &out_dir).await?;
        }
        Commands::Render { json, out } => cmd_render(&json, &out)?,
        Commands::Extract { resume } => cmd_extract(&resume).await?,
        Commands::Scrape { url } => cmd_scrape(&url).await?,
        Commands::Ping {
            provider,
            api_key,
            message,
        } => cmd_ping(provider, api_key.as_deref(), &message).await?,
    }

    Ok(())
}

type CliScraper = HttpJobScraper<ReqwestFetcher, HtmdCleaner>;

/// The CLI runs on the user's machine, so private URLs are allowed.
fn job_scraper() -> Result<CliScraper> {
    let fetcher = ReqwestFetcher::new()
        .context("Failed to create HTTP client")?
        .allow_private_urls();
    Ok(HttpJobScraper::new(fetcher, HtmdCleaner::new()))
}

async fn cmd_run(
    request: &TailorRequest,
    factory: ProviderClientFactory,
    format: OutputFormat,
    out_dir: &Path,
) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let orchestrator = Orchestrator::new(PdfTextExtractor::new(), job_scraper()?, factory);

    if format == OutputFormat::Markdown {
        let markdown = orchestrator
            .run_markdown(request, &TracingReporter)
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        write_output(&out_dir.join(MARKDOWN_FILE_NAME), markdown.as_bytes())?;
        return Ok(());
    }

    let result = orchestrator
        .run(request, &TracingReporter)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    report_result(&result);

    if matches!(format, OutputFormat::Json | OutputFormat::All) {
        let json =
            tailor_export::to_pretty_json(&result.record).map_err(|e| anyhow::anyhow!(e))?;
        write_output(&out_dir.join(JSON_FILE_NAME), json.as_bytes())?;
    }
    if matches!(format, OutputFormat::Pdf | OutputFormat::All) {
        let pdf = tailor_export::render(&result.record);
        write_output(&out_dir.join(PDF_FILE_NAME), &pdf)?;
    }

    Ok(())
}

fn report_result(result: &TailoredResume) {
    if let Some(reason) = result.fallback_reason() {
        tracing::warn!(%reason, "Provider response could not be parsed; wrote placeholder record");
    }

    println!("Changes made:");
    for change in &result.record.executive_summary {
        println!("  - {change}");
    }
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    println!("{}", path.display());
    Ok(())
}

fn cmd_render(json: &Path, out: &Path) -> Result<()> {
    let record = tailor_export::read_json_file(json)
        .with_context(|| format!("Failed to load record from {}", json.display()))?;
    let pdf = tailor_export::render(&record);
    write_output(out, &pdf)
}

async fn cmd_extract(resume: &Path) -> Result<()> {
    let text = PdfTextExtractor::new()
        .extract(resume)
        .await
        .with_context(|| format!("Could not extract text from {}", resume.display()))?;
    println!("{text}");
    Ok(())
}

async fn cmd_scrape(url: &str) -> Result<()> {
    let markdown = job_scraper()?
        .scrape(url)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    println!("{markdown}");
    Ok(())
}

async fn cmd_ping(provider: Provider, api_key: Option<&str>, message: &str) -> Result<()> {
    let key = resolve_api_key(api_key, provider, process_env).map_err(|e| anyhow::anyhow!(e))?;
    let client = ProviderClient::for_provider(provider, &key).map_err(|e| anyhow::anyhow!(e))?;

    let reply = client
        .test_connection(message)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    println!("{provider} ({}): {reply}", client.model());
    Ok(())
}
