use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use ros_z_params::{ParamError, ParameterStore, ParserLimits};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "ros-z-params")]
#[command(about = "Inspect and edit ROS 2 parameter files")]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse one or more files into a single store and print it
    Dump {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print the store as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one parameter value
    Get {
        file: PathBuf,
        node: String,
        param: String,
    },
    /// Replace one parameter value and print the resulting store
    Set {
        file: PathBuf,
        node: String,
        param: String,
        value: String,

        /// Print the store as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the parameters a node receives once `/**`-style selectors apply
    Overrides { file: PathBuf, node: String },
}

fn init_logger(debug: bool) {
    let filter = if debug {
        EnvFilter::new("ros_z_params=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ros_z_params=warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn report(err: ParamError, context: &str) -> anyhow::Error {
    anyhow!("{} ({}): {}", context, err.kind(), err)
}

fn load(store: &mut ParameterStore, file: &Path) -> Result<()> {
    store
        .parse_file(file)
        .map_err(|e| report(e, &file.display().to_string()))
}

fn print_store(store: &ParameterStore, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(store)?);
    } else {
        print!("{}", store);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.debug);

    let limits = ParserLimits::from_env().map_err(|e| report(e, "ROSZ_PARAMS_LIMITS"))?;
    let mut store = ParameterStore::with_limits(limits);

    match cli.command {
        Command::Dump { files, json } => {
            for file in &files {
                load(&mut store, file)?;
            }
            store.log_dump();
            print_store(&store, json)?;
        }
        Command::Get { file, node, param } => {
            load(&mut store, &file)?;
            let value = store
                .get(&node, &param)
                .ok_or_else(|| anyhow!("parameter '{}' not found on node '{}'", param, node))?;
            println!("{} ({})", value, value.parameter_type());
        }
        Command::Set {
            file,
            node,
            param,
            value,
            json,
        } => {
            load(&mut store, &file)?;
            store
                .parse_value(&node, &param, &value)
                .map_err(|e| report(e, &format!("{}/{}", node, param)))?;
            print_store(&store, json)?;
        }
        Command::Overrides { file, node } => {
            load(&mut store, &file)?;
            for (name, value) in store.overrides_for(&node) {
                println!("{}: {}", name, value);
            }
        }
    }

    Ok(())
}
