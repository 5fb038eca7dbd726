//! CLI for Clipcast - Sora video generation delivered to Telegram.

use clap::{Args, Parser, Subcommand, ValueEnum};
use clipcast::pipeline::{download, DEFAULT_OUTPUT};
use clipcast::{
    render_progress, Config, ContentVariant, Pipeline, SoraModel, SoraProvider,
    TelegramUploader, VideoGenerationRequest, VideoProvider, WaitStrategy,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_PROMPT: &str = "Short vertical 4 second video, parkour / survival / satisfying style, \
dynamic camera movement, high detail, realistic lighting, smooth motion.";

const DEFAULT_CAPTION: &str = "Automatic Sora test video ✅";

#[derive(Parser)]
#[command(name = "clipcast")]
#[command(about = "Generate a video with Sora and send it to a Telegram chat")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a video, download it and send it to Telegram
    Run(RunArgs),

    /// Show the current state of a generation job
    Status {
        /// Job id returned at submission
        job_id: String,
    },

    /// Download the content of a finished job
    Download(DownloadArgs),

    /// Send an existing video file to Telegram
    Send(SendArgs),
}

#[derive(Args)]
struct RunArgs {
    /// The text prompt describing the video
    #[arg(default_value = DEFAULT_PROMPT)]
    prompt: String,

    /// Video duration in seconds (Sora accepts 4, 8 or 12)
    #[arg(short, long, default_value_t = 4)]
    seconds: u32,

    /// Resolution as WIDTHxHEIGHT
    #[arg(long, default_value = "720x1280")]
    size: String,

    /// Model identifier
    #[arg(short, long, value_enum, default_value = "sora-2")]
    model: ModelArg,

    /// Where to write the video
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Caption posted with the video
    #[arg(short, long, default_value = DEFAULT_CAPTION)]
    caption: String,

    /// Seconds between status checks
    #[arg(long, default_value_t = 10)]
    poll_interval: u64,

    /// Skip status checks: sleep this many seconds, then download
    #[arg(long, conflicts_with = "timeout")]
    blind_wait: Option<u64>,

    /// Give up polling after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Stop after download, do not send to Telegram
    #[arg(long)]
    no_upload: bool,
}

#[derive(Args)]
struct DownloadArgs {
    /// Job id of a completed job
    job_id: String,

    /// Where to write the content
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Which rendition to fetch
    #[arg(long, value_enum, default_value = "video")]
    variant: VariantArg,
}

#[derive(Args)]
struct SendArgs {
    /// Video file to send
    path: PathBuf,

    /// Caption posted with the video
    #[arg(short, long, default_value = "")]
    caption: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    #[value(name = "sora-2")]
    Sora2,
    #[value(name = "sora-2-pro")]
    Sora2Pro,
}

impl From<ModelArg> for SoraModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Sora2 => SoraModel::Sora2,
            ModelArg::Sora2Pro => SoraModel::Sora2Pro,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    Video,
    Thumbnail,
    Spritesheet,
}

impl From<VariantArg> for ContentVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Video => ContentVariant::Video,
            VariantArg::Thumbnail => ContentVariant::Thumbnail,
            VariantArg::Spritesheet => ContentVariant::Spritesheet,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    // Resolve all credentials before any request goes out
    let config = Config::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Run(args) => run(args, &config, cli.json).await?,
        Commands::Status { job_id } => status(&job_id, &config, cli.json).await?,
        Commands::Download(args) => download_job(args, &config, cli.json).await?,
        Commands::Send(args) => send(args, &config, cli.json).await?,
    }

    Ok(())
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clipcast=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run(args: RunArgs, config: &Config, json_output: bool) -> anyhow::Result<()> {
    let wait = match (args.blind_wait, args.timeout) {
        (Some(delay), _) => WaitStrategy::fixed_delay(Duration::from_secs(delay)),
        (None, timeout) => WaitStrategy::Poll {
            interval: Duration::from_secs(args.poll_interval),
            timeout: timeout.map(Duration::from_secs),
        },
    };
    if matches!(wait, WaitStrategy::Poll { interval, .. } if interval.is_zero()) {
        anyhow::bail!("--poll-interval must be at least 1 second");
    }

    let mut pipeline = Pipeline::from_config(config, args.model.into())?
        .with_wait(wait)
        .with_output(&args.output);
    if args.no_upload {
        pipeline = pipeline.without_upload();
    }

    let request = VideoGenerationRequest::new(&args.prompt)
        .with_duration(args.seconds)
        .with_resolution(&args.size);

    let show_progress = !json_output;
    let report = pipeline
        .run(&request, &args.caption, |job| {
            if show_progress {
                eprint!("\r{}", render_progress(job));
                let _ = std::io::stderr().flush();
            }
        })
        .await;
    if show_progress && matches!(wait, WaitStrategy::Poll { .. }) {
        eprintln!();
    }
    let report = report?;

    if json_output {
        let result = serde_json::json!({
            "type": "run",
            "success": true,
            "job_id": report.job_id,
            "output": report.artifact.path.display().to_string(),
            "size_bytes": report.artifact.size_bytes,
            "delivered": report.delivered,
            "message_id": report.message_id,
            "duration_ms": report.duration_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Generated video: {} ({} bytes) from job {}",
            report.artifact.path.display(),
            report.artifact.size_bytes,
            report.job_id
        );
        if report.delivered {
            println!("Sent to Telegram chat {}", config.telegram_chat_id);
        }
        println!("Total time: {}ms", report.duration_ms);
    }

    Ok(())
}

fn provider(config: &Config) -> anyhow::Result<SoraProvider> {
    let mut builder = SoraProvider::builder().api_key(config.openai_api_key.clone());
    if let Some(url) = &config.openai_base_url {
        builder = builder.base_url(url.clone());
    }
    Ok(builder.build()?)
}

async fn status(job_id: &str, config: &Config, json_output: bool) -> anyhow::Result<()> {
    let job = provider(config)?.retrieve(job_id).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else {
        println!("Job {}: {} ({:.1}%)", job.id, job.status, job.progress);
        if job.status.is_terminal() && job.error.is_some() {
            println!("Error: {}", job.failure_message());
        }
    }

    Ok(())
}

async fn download_job(args: DownloadArgs, config: &Config, json_output: bool) -> anyhow::Result<()> {
    let provider = provider(config)?;
    let artifact = download(&provider, &args.job_id, args.variant.into(), &args.output).await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&artifact)?);
    } else {
        println!(
            "Saved {} ({} bytes)",
            artifact.path.display(),
            artifact.size_bytes
        );
    }

    Ok(())
}

async fn send(args: SendArgs, config: &Config, json_output: bool) -> anyhow::Result<()> {
    if !args.path.is_file() {
        anyhow::bail!("no such file: {}", args.path.display());
    }

    let mut builder = TelegramUploader::builder()
        .bot_token(config.telegram_bot_token.clone())
        .chat_id(config.telegram_chat_id.clone());
    if let Some(url) = &config.telegram_api_url {
        builder = builder.api_url(url.clone());
    }
    let delivery = builder.build()?.send_video(&args.path, &args.caption).await?;

    if json_output {
        let result = serde_json::json!({
            "type": "send",
            "success": true,
            "path": args.path.display().to_string(),
            "message_id": delivery.message_id,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Sent {} to Telegram", args.path.display());
    }

    Ok(())
}
