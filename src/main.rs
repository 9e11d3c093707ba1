use anyhow::{bail, Result};
use clap::Parser;
use serde_json::Value;
use shapemock::adapters::constraint_document::ConstraintDocument;
use shapemock::adapters::type_graph::TypeGraph;
use shapemock::cli::{Cli, Command};
use shapemock::config::Settings;
use shapemock::Mocker;
use tracing::{info, warn, Level};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::new_with_cli(&cli)?;
    let mocker = Mocker::new(settings);
    let mut rng = mocker.rng();

    match &cli.command {
        Command::Typed { file, root } => {
            let graph = TypeGraph::from_path(file)?;
            if root.is_none() && graph.body.is_none() {
                let names: Vec<&str> = graph.types.keys().map(String::as_str).collect();
                bail!(
                    "{} has no body declaration; pick a type with --root ({})",
                    file.display(),
                    names.join(", ")
                );
            }
            info!(file = %file.display(), count = cli.count, "Generating from type graph");

            for _ in 0..cli.count {
                let value = match root {
                    Some(root) => mocker.mock_type(&graph, root, &mut rng)?,
                    None => mocker.mock_body(&graph, &mut rng)?,
                };
                emit(value, cli.pretty)?;
            }
        }
        Command::Schema { file } => {
            let document = ConstraintDocument::from_path(file)?
                .with_reference_root(&mocker.settings().references.root);
            info!(file = %file.display(), count = cli.count, "Generating from constraint document");

            let root = document.root();
            for _ in 0..cli.count {
                emit(mocker.generate(&document, &root, &mut rng)?, cli.pretty)?;
            }
        }
    }

    Ok(())
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn emit(value: Option<Value>, pretty: bool) -> Result<()> {
    let value = value.unwrap_or_else(|| {
        warn!("Root shape produced no value");
        Value::Null
    });
    let text = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    println!("{}", text);
    Ok(())
}
