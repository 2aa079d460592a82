//! AgentSuite CLI: the main entry point.
//!
//! Commands:
//! - `init`: write the default config and memory directory
//! - `run`: run one task against a local agent
//! - `serve`: expose a local agent over HTTP
//! - `suite`: host a Suite
//! - `join`: connect a local agent to a Suite
//! - `query`: ask a Suite-connected agent a question
//! - `pipeline`: run a pipeline of local agents from a JSON file
//! - `status`: show configuration and, optionally, Suite status

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;

use commands::AgentArgs;

#[derive(Parser)]
#[command(
    name = "agentsuite",
    about = "AgentSuite: agents with memory and actions, coordinated over WebSocket",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Config file to use instead of ~/.agentsuite/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Run a single task against a local agent
    Run {
        /// The task to run
        task: String,

        #[command(flatten)]
        agent: AgentArgs,

        /// Save the agent to this directory afterwards
        #[arg(long)]
        save: Option<PathBuf>,

        /// Print the full turn log as JSON
        #[arg(long)]
        show_log: bool,
    },

    /// Serve a local agent at POST /{name}
    Serve {
        #[command(flatten)]
        agent: AgentArgs,

        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Host a Suite
    Suite {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Connect a local agent to a Suite and answer its queries
    Join {
        #[command(flatten)]
        agent: AgentArgs,

        /// Suite URL, e.g. ws://localhost:8001
        #[arg(long)]
        url: Option<String>,
    },

    /// Ask an agent through a Suite
    Query {
        /// Target agent name
        agent: String,

        /// The query text
        query: String,

        #[arg(long)]
        url: Option<String>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Name this client announces to the Suite
        #[arg(long, default_value = "agentsuite-cli")]
        client_name: String,
    },

    /// Run a pipeline file
    Pipeline {
        /// JSON file with `agents` and `tiers`
        file: PathBuf,
    },

    /// Show configuration, and Suite status when a URL is given
    Status {
        /// Also ask the Suite at this URL for its status
        #[arg(long)]
        suite: Option<String>,
    },
}

fn init_tracing(verbose: bool, format: LogFormat) {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    if let Commands::Init { force } = cli.command {
        return commands::init::run(cli.config.as_deref(), force).await;
    }

    let config = commands::load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Init { .. } => {}
        Commands::Run {
            task,
            agent,
            save,
            show_log,
        } => commands::run::run(&config, &agent, &task, save.as_deref(), show_log).await?,
        Commands::Serve { agent, host, port } => commands::serve::run(&config, &agent, host, port).await?,
        Commands::Suite { host, port } => commands::suite::run(&config, host, port).await?,
        Commands::Join { agent, url } => commands::join::run(&config, &agent, url).await?,
        Commands::Query {
            agent,
            query,
            url,
            timeout,
            client_name,
        } => commands::query::run(&config, &client_name, &agent, &query, url, timeout).await?,
        Commands::Pipeline { file } => commands::pipeline::run(&config, &file).await?,
        Commands::Status { suite } => commands::status::run(&config, suite).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_with_agent_options() {
        let cli = Cli::try_parse_from([
            "agentsuite",
            "run",
            "what is 2+2?",
            "--name",
            "mathy",
            "--reasoner",
            "memory-aware",
            "--actions",
            "math",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { task, agent, .. } => {
                assert_eq!(task, "what is 2+2?");
                assert_eq!(agent.name, "mathy");
                assert_eq!(agent.actions, vec!["math"]);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn default_action_sets() {
        let cli = Cli::try_parse_from(["agentsuite", "join"]).unwrap();
        match cli.command {
            Commands::Join { agent, url } => {
                assert_eq!(agent.actions, vec!["math", "clock"]);
                assert!(url.is_none());
            }
            _ => panic!("expected join"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["agentsuite", "suite", "--port", "9000", "--log-format", "json", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Commands::Suite { port: Some(9000), .. }));
    }

    #[test]
    fn query_requires_agent_and_text() {
        assert!(Cli::try_parse_from(["agentsuite", "query", "cow"]).is_err());
    }
}
