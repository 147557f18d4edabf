mod settings;
mod tool_server;

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use video_summary_core::encoding::infrastructure::jpeg_frame_encoder::JpegFrameEncoder;
use video_summary_core::pipeline::analyze_image_use_case::AnalyzeImageUseCase;
use video_summary_core::pipeline::encode_executor::{EncodeExecutor, SequentialEncodeExecutor};
use video_summary_core::pipeline::infrastructure::threaded_encode_executor::ThreadedEncodeExecutor;
use video_summary_core::pipeline::pipeline_logger::{
    NullPipelineLogger, PipelineLogger, StdoutPipelineLogger,
};
use video_summary_core::pipeline::summarize_video_use_case::SummarizeVideoUseCase;
use video_summary_core::pipeline::summary_pipeline::SummaryPipeline;
use video_summary_core::remote::domain::summary_request::SummaryResult;
use video_summary_core::remote::infrastructure::openai_vision_client::{
    ClientConfig, OpenAiVisionClient,
};
use video_summary_core::shared::constants::{
    DEFAULT_INTERVAL_SECONDS, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_TOKENS, DEFAULT_MAX_WIDTH,
    DEFAULT_REQUEST_TIMEOUT_SECS, IMAGE_EXTENSIONS,
};
use video_summary_core::video::domain::frame_sampler::SamplingOptions;
use video_summary_core::video::domain::video_reader::VideoReader;
use video_summary_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use video_summary_core::video::infrastructure::image_file_reader::ImageFileReader;

use settings::{Settings, API_KEY_ENV};
use tool_server::UseCaseBackend;

/// Summarize videos and analyze images with a vision-capable language model.
#[derive(Parser)]
#[command(name = "video-summary")]
struct Cli {
    #[command(flatten)]
    remote: RemoteArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct RemoteArgs {
    /// API key (falls back to OPENAI_API_KEY, then the settings file).
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Vision model to use (default gpt-4o-mini).
    #[arg(long, global = true)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Upper bound on the response length in tokens.
    #[arg(long, global = true)]
    max_tokens: Option<u32>,

    /// Initial JPEG quality for frames (1-100).
    #[arg(long, global = true)]
    quality: Option<u8>,

    /// Downscale frames wider than this many pixels (0 keeps full size).
    #[arg(long, global = true)]
    max_width: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a video file.
    Video(VideoArgs),
    /// Analyze a single image.
    Image(ImageArgs),
    /// Run an MCP tool server (JSON-RPC 2.0) over stdin and stdout.
    Serve,
}

#[derive(Args)]
struct VideoArgs {
    /// Input video file.
    input: PathBuf,

    /// Summary style: short, timeline, detailed or technical.
    #[arg(long, conflicts_with = "prompt")]
    style: Option<String>,

    /// Seconds between sampled frames.
    #[arg(long)]
    interval: Option<f64>,

    /// Start of the time window in seconds.
    #[arg(long)]
    start: Option<f64>,

    /// End of the time window in seconds.
    #[arg(long)]
    end: Option<f64>,

    /// Ask this question about the video instead of using a style.
    #[arg(long)]
    prompt: Option<String>,

    /// Encoder threads (1 encodes on the main thread).
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Args)]
struct ImageArgs {
    /// Input image file.
    input: PathBuf,

    /// Analysis style: short, detailed, technical or descriptive.
    #[arg(long, conflicts_with_all = ["count", "prompt"])]
    style: Option<String>,

    /// Count how many of this object appear.
    #[arg(long, conflicts_with = "prompt")]
    count: Option<String>,

    /// Ask this question about the image.
    #[arg(long)]
    prompt: Option<String>,
}

/// Values merged from flags, settings file and built-in defaults.
struct RunConfig {
    client: ClientConfig,
    max_tokens: u32,
    quality: u8,
    interval_seconds: f64,
    max_width: Option<u32>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = Settings::load()?;
    let config = resolve_config(&cli.remote, &settings)?;

    match cli.command {
        Command::Video(args) => run_video(&args, &config),
        Command::Image(args) => run_image(&args, &config),
        Command::Serve => run_serve(&config),
    }
}

fn run_video(args: &VideoArgs, config: &RunConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_input(&args.input)?;
    if is_image(&args.input) {
        log::warn!(
            "{} looks like an image; use the `image` command for still images",
            args.input.display()
        );
    }

    let sampling = SamplingOptions {
        interval_seconds: args.interval.unwrap_or(config.interval_seconds),
        start_time: args.start,
        end_time: args.end,
        max_width: config.max_width,
    };
    let pipeline = build_pipeline(
        Box::new(FfmpegReader::new()),
        config,
        sampling,
        executor_for(args.threads),
        Box::new(StdoutPipelineLogger::new()),
    )?;
    let mut use_case = SummarizeVideoUseCase::new(pipeline);

    let result = match &args.prompt {
        Some(prompt) => use_case.analyze_with_prompt(&args.input, prompt)?,
        None => use_case.summarize(&args.input, args.style.as_deref())?,
    };
    print_result(&result);
    Ok(())
}

fn run_image(args: &ImageArgs, config: &RunConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate_input(&args.input)?;

    let pipeline = build_pipeline(
        Box::new(ImageFileReader::new()),
        config,
        image_sampling(config),
        Box::new(SequentialEncodeExecutor),
        Box::new(StdoutPipelineLogger::new()),
    )?;
    let mut use_case = AnalyzeImageUseCase::new(pipeline);

    let result = if let Some(object) = &args.count {
        use_case.count_items(&args.input, object)?
    } else if let Some(prompt) = &args.prompt {
        use_case.analyze_with_prompt(&args.input, prompt)?
    } else {
        use_case.analyze(&args.input, args.style.as_deref())?
    };
    print_result(&result);
    Ok(())
}

fn run_serve(config: &RunConfig) -> Result<(), Box<dyn std::error::Error>> {
    let video = build_pipeline(
        Box::new(FfmpegReader::new()),
        config,
        SamplingOptions {
            interval_seconds: config.interval_seconds,
            max_width: config.max_width,
            ..SamplingOptions::default()
        },
        executor_for(None),
        Box::new(NullPipelineLogger),
    )?;
    let image = build_pipeline(
        Box::new(ImageFileReader::new()),
        config,
        image_sampling(config),
        Box::new(SequentialEncodeExecutor),
        Box::new(NullPipelineLogger),
    )?;
    let mut backend = UseCaseBackend {
        video: SummarizeVideoUseCase::new(video),
        image: AnalyzeImageUseCase::new(image),
    };

    log::info!("MCP server {} ready on stdio", tool_server::SERVER_NAME);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let answered = tool_server::serve(&mut backend, stdin.lock(), stdout.lock())?;
    log::info!("MCP server stopped after {answered} responses");
    Ok(())
}

fn build_pipeline(
    reader: Box<dyn VideoReader>,
    config: &RunConfig,
    sampling: SamplingOptions,
    executor: Box<dyn EncodeExecutor>,
    logger: Box<dyn PipelineLogger>,
) -> Result<SummaryPipeline, Box<dyn std::error::Error>> {
    let client = OpenAiVisionClient::new(config.client.clone())?;
    let encoder = JpegFrameEncoder::new().with_quality(config.quality);
    Ok(
        SummaryPipeline::new(reader, Box::new(encoder), Box::new(client))
            .with_sampling(sampling)
            .with_executor(executor)
            .with_logger(logger)
            .with_max_tokens(config.max_tokens),
    )
}

fn resolve_config(
    remote: &RemoteArgs,
    settings: &Settings,
) -> Result<RunConfig, Box<dyn std::error::Error>> {
    let api_key =
        settings.resolve_api_key(remote.api_key.as_deref(), std::env::var(API_KEY_ENV).ok())?;

    let mut client = ClientConfig::new(api_key)
        .with_timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS));
    if let Some(model) = remote.model.as_ref().or(settings.model.as_ref()) {
        client = client.with_model(model.as_str());
    }
    if let Some(base_url) = remote.base_url.as_ref().or(settings.base_url.as_ref()) {
        client = client.with_base_url(base_url.as_str());
    }

    let quality = remote
        .quality
        .or(settings.quality)
        .unwrap_or(DEFAULT_JPEG_QUALITY);
    if !(1..=100).contains(&quality) {
        return Err(format!("Quality must be between 1 and 100, got {quality}").into());
    }

    let max_width = match remote.max_width.or(settings.max_width) {
        Some(0) => None,
        Some(width) => Some(width),
        None => Some(DEFAULT_MAX_WIDTH),
    };

    Ok(RunConfig {
        client,
        max_tokens: remote
            .max_tokens
            .or(settings.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS),
        quality,
        interval_seconds: settings
            .interval_seconds
            .unwrap_or(DEFAULT_INTERVAL_SECONDS),
        max_width,
    })
}

fn image_sampling(config: &RunConfig) -> SamplingOptions {
    SamplingOptions {
        max_width: config.max_width,
        ..SamplingOptions::default()
    }
}

fn executor_for(threads: Option<usize>) -> Box<dyn EncodeExecutor> {
    match threads {
        Some(n) if n <= 1 => Box::new(SequentialEncodeExecutor),
        Some(n) => Box::new(ThreadedEncodeExecutor::new(n)),
        None => Box::new(ThreadedEncodeExecutor::with_available_parallelism()),
    }
}

fn validate_input(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Input file not found: {}", path.display()).into());
    }
    Ok(())
}

fn print_result(result: &SummaryResult) {
    println!("{}", result.text);
    println!();
    println!(
        "[Frames used: {}, Model: {}]",
        result.frames_used, result.model
    );
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
