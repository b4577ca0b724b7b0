use anyhow::Result;
use clap::Parser;

use tiles2gpkg::cli::{Cli, ReportFormat};
use tiles2gpkg::gpkg::{ConvertOptions, convert_tiles};
use tiles2gpkg::output::{ndjson_lines, text_lines};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    let options = ConvertOptions {
        source: cli.source,
        output: cli.output,
        origin: cli.tile_origin.into(),
        srs: cli.srs.into(),
        imagery: cli.imagery.into(),
        quality: cli.quality,
        threads: cli.threads,
        parallel: !cli.sync,
        no_progress: cli.no_progress,
    };
    let report = convert_tiles(&options)?;

    match cli.report {
        ReportFormat::Text => {
            for line in text_lines(&report) {
                println!("{line}");
            }
        }
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Ndjson => {
            for line in ndjson_lines(&report)? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(level).unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
