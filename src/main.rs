use anyhow::{Context, Result, bail};
use callscope::analyzer::CallAnalyzer;
use callscope::audio::AudioUpload;
use callscope::cli::{Cli, Commands};
use callscope::config::{Config, api_key_from_env};
use callscope::insight::RemoteExtractor;
use callscope::transcribe::RemoteTranscriber;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.quiet, cli.verbose)?;

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?
        .with_env_overrides();

    match cli.command {
        Commands::Analyze {
            file,
            pretty,
            timeout,
        } => {
            let mut config = config;
            if let Some(secs) = timeout {
                config.transcription.timeout_secs = secs;
            }
            run_analyze(config, &file, pretty).await?;
        }
        Commands::ShowConfig => {
            let toml = toml::to_string_pretty(&config).context("failed to render config")?;
            print!("{}", toml);
        }
    }

    Ok(())
}

async fn run_analyze(config: Config, file: &Path, pretty: bool) -> Result<()> {
    let Some(api_key) = api_key_from_env() else {
        bail!(
            "no API key found; set CALLSCOPE_API_KEY or OPENAI_API_KEY \
             for the transcription and extraction services"
        );
    };

    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("not a file path: {}", file.display()))?;
    let bytes = std::fs::read(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let upload = AudioUpload::new(filename, bytes);

    let transcriber = RemoteTranscriber::new(&config.transcription, api_key.clone())?;
    let extractor = RemoteExtractor::new(&config.extraction, api_key)?;
    let analyzer = CallAnalyzer::new(config, Arc::new(transcriber), Arc::new(extractor));

    let result = analyzer.analyze(upload).await?;

    let json = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", json);

    Ok(())
}

/// Logs go to stderr so stdout stays clean for the result JSON.
fn init_tracing(quiet: bool, verbose: u8) -> Result<()> {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {}", e))?;

    Ok(())
}
