use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use codegen::{targets, Emitter};
use schema::EventSchema;

#[derive(Parser)]
#[command(name = "eventgen")]
#[command(about = "Generate event protocol bindings from a JSON schema")]
struct Cli {
    /// Path to the event schema JSON file
    #[arg(long)]
    schema: PathBuf,

    /// Directory for generated sources
    #[arg(long, default_value = "generated")]
    out_dir: PathBuf,

    /// Targets to emit (rust, python, c); defaults to all
    #[arg(long, value_delimiter = ',')]
    targets: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let event_schema = EventSchema::from_json_file(&cli.schema)
        .with_context(|| format!("failed to load schema {}", cli.schema.display()))?;
    info!(
        events = event_schema.events().len(),
        schema = %cli.schema.display(),
        "loaded schema"
    );

    let backends = if cli.targets.is_empty() {
        targets::all()
    } else {
        cli.targets
            .iter()
            .map(|name| targets::by_name(name))
            .collect::<Result<Vec<_>, _>>()?
    };

    let written = Emitter::new(backends).emit_all(&event_schema, &cli.out_dir)?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}
