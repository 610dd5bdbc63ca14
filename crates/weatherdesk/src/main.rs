//! weatherdesk - weather and time assistant

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    ask_command, demo_command, init_command, status_command, tool_command, tools_command,
};

/// weatherdesk - ask a chat model about the weather and time in a city
#[derive(Parser)]
#[command(name = "weatherdesk")]
#[command(about = "◆ A weather and time assistant backed by a tool-calling chat model")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Config file (default: ~/.weatherdesk/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scripted weather, time and unsupported-city prompts
    Demo,
    /// Chat with the agent
    Ask {
        /// Message to send; omit for interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Call a tool directly and print its JSON result
    Tool {
        /// Tool name, e.g. get_weather
        name: String,
        /// City to look up
        city: String,
    },
    /// List the tools offered to the model
    Tools,
    /// Write a default config file
    Init,
    /// Show configuration status
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli
        .config
        .unwrap_or_else(weatherdesk_config::config_path);

    let (label, result) = match cli.command {
        Commands::Demo => ("Demo", demo_command(&config_path).await),
        Commands::Ask { message } => ("Ask", ask_command(&config_path, message).await),
        Commands::Tool { name, city } => ("Tool", tool_command(&name, &city).await),
        Commands::Tools => ("Tools", tools_command()),
        Commands::Init => ("Init", init_command(&config_path).await),
        Commands::Status => ("Status", status_command(&config_path).await),
    };

    if let Err(e) = result {
        error!("{} failed: {:#}", label, e);
        std::process::exit(1);
    }
}
