//! jbridge inspector
//!
//! Loads a fixture into an in-process heap runtime and looks at it through
//! the bridge.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use jbridge::config::BridgeConfig;
use jbridge::fixture::{LoadedFixture, load_fixture};
use jbridge::{Bridge, HeapRuntime, JavaCollection, Value};

/// Inspect foreign objects through the bridge
#[derive(Parser, Debug)]
#[command(name = "jbridge")]
#[command(about = "Inspect foreign collections and enums through the bridge", long_about = None)]
struct Args {
    /// Configuration file (defaults to ./jbridge.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fixture to load, overriding the configured one
    #[arg(short, long)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every named object as JSON
    Dump,
    /// List the constants of an enum type, or look one up by name
    Enum {
        type_name: String,
        name: Option<String>,
    },
    /// Print the size of a named collection
    Size { name: String },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = BridgeConfig::load(args.config.as_deref())?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("Configuration: {:?}", config);

    let runtime = Arc::new(HeapRuntime::new());
    let fixture = match args.fixture.or_else(|| config.fixture.clone()) {
        Some(path) => {
            info!("Loading fixture {}", path.display());
            load_fixture(&path, &runtime).with_context(|| format!("loading {}", path.display()))?
        }
        None => LoadedFixture::default(),
    };
    let bridge = Bridge::new(runtime.clone());

    match args.command {
        Command::Dump => {
            let mut out = serde_json::Map::new();
            for (name, handle) in &fixture.objects {
                out.insert(name.clone(), bridge.to_json(Value::Handle(*handle))?);
            }
            print_json(&serde_json::Value::Object(out), config.pretty)?;
        }
        Command::Enum { type_name, name } => {
            let table = bridge.enum_table(&type_name)?;
            match name {
                Some(name) => {
                    let constant = table.value_of(&name)?;
                    println!("{} {}", constant.ordinal(), constant.name());
                }
                None => {
                    for constant in table.values() {
                        println!("{} {}", constant.ordinal(), constant.name());
                    }
                }
            }
        }
        Command::Size { name } => {
            let Some(handle) = fixture.get(&name) else {
                bail!("no object named {}", name);
            };
            let size = match bridge.inspect(Value::Handle(handle))? {
                jbridge::Inspected::List(list) => list.size()?,
                jbridge::Inspected::Set(set) => set.size()?,
                jbridge::Inspected::Map(map) => map.size()?,
                other => bail!("{} is not a collection: {:?}", name, other),
            };
            println!("{}", size);
        }
    }

    Ok(())
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}
