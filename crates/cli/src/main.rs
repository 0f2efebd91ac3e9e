mod scenario;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: bbox-overlay <scenario.json>");
        std::process::exit(1);
    }

    let path = PathBuf::from(&args[1]);
    let data = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let scenario: scenario::Scenario = serde_json::from_slice(&data)
        .with_context(|| format!("parsing scenario {}", path.display()))?;

    let outcome = scenario::run(scenario)?;

    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &outcome)?;
    writeln!(out)?;
    Ok(())
}
