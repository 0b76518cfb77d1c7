// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use hardsub_ocr::app_config::{Config, LogLevel, OcrProvider};
use hardsub_ocr::app_controller::{Controller, OutputTarget};

/// CLI Wrapper for OcrProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliOcrProvider {
    Gemini,
    #[value(name = "openai")]
    OpenAI,
    #[value(name = "lmstudio")]
    LMStudio,
    Anthropic,
    Ollama,
    Mock,
}

impl From<CliOcrProvider> for OcrProvider {
    fn from(cli_provider: CliOcrProvider) -> Self {
        match cli_provider {
            CliOcrProvider::Gemini => OcrProvider::Gemini,
            CliOcrProvider::OpenAI => OcrProvider::OpenAI,
            CliOcrProvider::LMStudio => OcrProvider::LMStudio,
            CliOcrProvider::Anthropic => OcrProvider::Anthropic,
            CliOcrProvider::Ollama => OcrProvider::Ollama,
            CliOcrProvider::Mock => OcrProvider::Mock,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// Options shared by the pipeline subcommands
#[derive(Args, Debug)]
struct CommonArgs {
    /// Directory receiving the subtitle document
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Subtitle document name, without extension
    #[arg(short = 'n', long, default_value = "subtitles")]
    output_name: String,

    /// OCR provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliOcrProvider>,

    /// Model name to use for OCR
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// OCR an existing directory of exported subtitle images
    Ocr {
        /// Directory of images named {channel}_{start}__{end}.ext
        #[arg(value_name = "IMAGES_DIR")]
        images_dir: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Detect intervals, export their frames, then OCR them
    Extract {
        /// Frame signal file (JSON array or JSON lines) from the analyzer
        #[arg(value_name = "SIGNALS")]
        signals: PathBuf,

        /// Directory of decoded frames named {index}.png|jpg|bmp
        #[arg(value_name = "FRAMES_DIR")]
        frames_dir: PathBuf,

        /// Where to export interval images
        #[arg(short, long, default_value = "images")]
        images_dir: PathBuf,

        /// Keep images already in the images directory instead of emptying it
        #[arg(long)]
        keep_images: bool,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate shell completions for hardsub-ocr
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// hardsub-ocr - burned-in subtitle extraction with vision OCR
///
/// Detects subtitle intervals, exports one cropped image per interval, reads
/// them with an OCR backend in concurrent batches and writes an ASS subtitle.
#[derive(Parser, Debug)]
#[command(name = "hardsub-ocr")]
#[command(version)]
#[command(about = "Extract hardcoded subtitles with vision OCR")]
#[command(long_about = "hardsub-ocr turns burned-in video subtitles into an ASS subtitle file.

EXAMPLES:
    hardsub-ocr ocr images/                               # OCR exported images with the default config
    hardsub-ocr ocr -p ollama -m qwen2.5vl images/        # Use a specific provider and model
    hardsub-ocr extract signals.jsonl frames/ -i images/  # Detect, export and OCR
    hardsub-ocr ocr -o out -n episode01 images/           # Write out/episode01.ass
    hardsub-ocr completions bash > hardsub-ocr.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    gemini    - Google Gemini (default, requires GEMINI_API_KEY or GOOGLE_API_KEY)
    openai    - OpenAI API (requires API key)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)
    anthropic - Anthropic Claude API (requires API key)
    ollama    - Local Ollama server with a vision model")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::decoration(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Accept everything here; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "hardsub-ocr", &mut std::io::stdout());
            Ok(())
        }
        Commands::Ocr { images_dir, common } => {
            let config = load_config(&common)?;
            let controller = Controller::with_config(config)?;
            controller
                .run_ocr(&images_dir, &OutputTarget::new(&common.output_dir, &common.output_name))
                .await?;
            Ok(())
        }
        Commands::Extract {
            signals,
            frames_dir,
            images_dir,
            keep_images,
            common,
        } => {
            let mut config = load_config(&common)?;
            if keep_images {
                config.export.clean_images = false;
            }
            let controller = Controller::with_config(config)?;
            controller
                .run_extract(
                    &signals,
                    &frames_dir,
                    &images_dir,
                    &OutputTarget::new(&common.output_dir, &common.output_name),
                )
                .await?;
            Ok(())
        }
    }
}

/// Load or create the configuration, apply CLI overrides and validate
fn load_config(options: &CommonArgs) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let log_level: LogLevel = cmd_log_level.clone().into();
        log::set_max_level(log_level.to_level_filter());
    }

    let config_path = Path::new(&options.config_path);
    let mut config = if config_path.exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", options.config_path);
        let config = Config::default();
        config
            .save(config_path)
            .with_context(|| format!("Failed to write default config to file: {}", options.config_path))?;
        config
    };

    // Override config with CLI options if provided
    if let Some(provider) = &options.provider {
        config.ocr.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        config.ocr.active_provider_config_mut().model = model.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    info!("Provider: {}, model: {}", config.ocr.provider.display_name(), config.ocr.get_model());
    Ok(config)
}
