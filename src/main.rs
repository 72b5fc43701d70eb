// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use doctwin::app_config::{self, Config, TranslationProvider};
use doctwin::app_controller::Controller;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(name = "openai")]
    OpenAI,
    #[value(name = "lmstudio")]
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
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
    /// Translate a document, inserting a translated twin after each paragraph
    Translate(TranslateArgs),

    /// Generate shell completions for doctwin
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input document (JSON)
    #[arg(value_name = "INPUT")]
    input_path: PathBuf,

    /// Output document, defaults to <name>.<target>.<ext> next to the input
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'NL', 'de')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'EN-US', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Do not read or write the translation cache
    #[arg(long)]
    no_cache: bool,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

/// doctwin - structure-preserving document translation
///
/// Inserts a translated, italic twin after every paragraph of a document while
/// keeping formatting, lists, tables, headers and footers intact.
#[derive(Parser, Debug)]
#[command(name = "doctwin")]
#[command(version)]
#[command(about = "Structure-preserving bilingual document translation")]
#[command(long_about = "doctwin translates a document paragraph by paragraph and inserts each translation right after its source.

EXAMPLES:
    doctwin translate report.json                     # Translate using default config
    doctwin translate report.json -o report.en.json   # Choose the output file
    doctwin translate -s nl -t en-gb report.json      # Translate from Dutch to British English
    doctwin translate -p lmstudio report.json         # Use a local LM Studio server
    doctwin translate --no-cache report.json          # Skip the translation cache
    doctwin completions bash > doctwin.bash           # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. The OpenAI API key may also be given through
    the OPENAI_API_KEY environment variable.")]
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
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
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

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the max level filters
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "doctwin", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;
    apply_overrides(&mut config, &options);

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config)?;
    controller.run(options.input_path, options.output).await?;

    Ok(())
}

/// Override config values with CLI options if provided
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        if let Some(provider_config) = config.translation.get_active_provider_config_mut() {
            provider_config.model = model.clone();
        }
    }

    if let Some(api_key) = options.api_key.as_deref().filter(|k| !k.is_empty()) {
        if config.translation.provider == TranslationProvider::OpenAI && config.translation.get_api_key().is_empty() {
            config.translation.set_api_key(api_key);
        }
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    if options.no_cache {
        config.cache.enabled = false;
    }
}
