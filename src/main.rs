//! CLI для предобработки датасетов

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use netflow_prep::PipelineConfig;

#[derive(Parser, Debug)]
#[command(
    name = "netflow-prep",
    version,
    about = "Normalize CICIDS2017 and NSL-KDD datasets for model training"
)]
struct Cli {
    /// JSON файл с путями
    #[arg(long)]
    config: Option<PathBuf>,

    /// Каталог с сырыми данными
    #[arg(long)]
    raw_root: Option<PathBuf>,

    /// Каталог для обработанных данных и metadata.json
    #[arg(long)]
    output_root: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("Cannot read config '{}'", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(raw_root) = self.raw_root {
            config.raw_root = raw_root;
        }
        if let Some(output_root) = self.output_root {
            config.output_root = output_root;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<ExitCode> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_config()?;
    tracing::info!(
        "Raw data: {}, output: {}",
        config.raw_root.display(),
        config.output_root.display()
    );

    let report = netflow_prep::run(&config)
        .with_context(|| format!("Cannot prepare output root '{}'", config.output_root.display()))?;

    println!(
        "Processed {}, skipped {}, failed {}, write failures {}",
        report.processed(),
        report.skipped(),
        report.failed(),
        report.write_failures
    );

    Ok(ExitCode::from(report.exit_code() as u8))
}
