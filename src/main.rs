// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug};
use std::io::Write;
use std::path::PathBuf;

use subtitler::app_config::{self, Config, Mode, TranslationBackend};
use subtitler::app_controller::Controller;
use subtitler::transcription::seconds_to_ms;

/// CLI Wrapper for TranslationBackend to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationModel {
    Helsinki,
    Nllb,
}

impl From<CliTranslationModel> for TranslationBackend {
    fn from(cli_model: CliTranslationModel) -> Self {
        match cli_model {
            CliTranslationModel::Helsinki => TranslationBackend::Helsinki,
            CliTranslationModel::Nllb => TranslationBackend::Nllb,
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

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate subtitles in the spoken language
    Transcribe(CommonArgs),

    /// Generate subtitles and translate them to the target language
    TranscribeTranslate(CommonArgs),

    /// Translate existing SRT files
    Translate(CommonArgs),

    /// Generate shell completions for subtitler
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Input media or SRT files, or directories containing them
    #[arg(value_name = "FILES", required = true)]
    files: Vec<PathBuf>,

    /// Source language code. For `translate`, the language of the SRT file.
    /// Optional for `transcribe`, where it disables autodetection.
    #[arg(short, long = "source-lang")]
    source_lang: Option<String>,

    /// Target language code ('es' for helsinki, 'spa_Latn' for nllb)
    #[arg(short, long = "target-lang")]
    target_lang: Option<String>,

    /// Whisper model size
    #[arg(long)]
    whisper_model: Option<String>,

    /// Translation model family
    #[arg(long, value_enum)]
    translation_model: Option<CliTranslationModel>,

    /// Minimum time in seconds each subtitle stays on screen [default: 2]
    #[arg(long)]
    min_subtitle_duration: Option<f64>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// subtitler - subtitles from speech, optionally translated
#[derive(Parser, Debug)]
#[command(name = "subtitler")]
#[command(version)]
#[command(about = "Subtitle generation and translation tool")]
#[command(long_about = "subtitler transcribes audio and video files into SRT subtitles with a \
Whisper server and translates subtitles with Helsinki-NLP or NLLB models.

EXAMPLES:
    subtitler transcribe talk.mp4                            # Autodetect the spoken language
    subtitler transcribe -s fr interview.mkv                 # Force French recognition
    subtitler transcribe-translate -t de movie.mkv           # German subtitles via English
    subtitler translate -s en -t es movie.srt                # Translate an SRT file
    subtitler translate --translation-model nllb -s eng_Latn -t spa_Latn movie.srt
    subtitler completions bash > subtitler.bash              # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the config file doesn't
    exist, a default one will be created automatically.")]
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
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(record.level()),
                now,
                Self::get_emoji_for_level(record.level()),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subtitler", &mut std::io::stdout());
            Ok(())
        }
        Commands::Transcribe(args) => run_mode(Mode::Transcribe, args).await,
        Commands::TranscribeTranslate(args) => run_mode(Mode::TranscribeTranslate, args).await,
        Commands::Translate(args) => run_mode(Mode::Translate, args).await,
    }
}

/// Load the configuration and apply command line overrides
fn load_config(options: &CommonArgs) -> Result<Config> {
    // Apply the command line level first so config loading is logged at it
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let mut config = Config::load_or_create(&options.config_path)?;

    if let Some(source_lang) = &options.source_lang {
        config.source_language = Some(source_lang.clone());
    }

    if let Some(target_lang) = &options.target_lang {
        config.target_language = Some(target_lang.clone());
    }

    if let Some(model) = &options.whisper_model {
        config.transcription.model = model.clone();
    }

    if let Some(backend) = &options.translation_model {
        config.translation.backend = backend.clone().into();
    }

    if let Some(seconds) = options.min_subtitle_duration {
        config.subtitle.min_duration_ms = seconds_to_ms(seconds);
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    log::set_max_level(level_filter(&config.log_level));

    Ok(config)
}

async fn run_mode(mode: Mode, options: CommonArgs) -> Result<()> {
    let config = load_config(&options)?;
    debug!("Running {} with the {} translation backend", mode, config.translation.backend);

    let controller = Controller::from_config(config, mode)?;
    let summary = controller.run(&options.files).await?;

    if summary.has_failures() {
        return Err(anyhow!(
            "{} of {} file(s) failed",
            summary.failed.len(),
            summary.failed.len() + summary.written.len()
        ));
    }

    Ok(())
}
