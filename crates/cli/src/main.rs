use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use pattern_agent::{
    AgentConfig, ConfigOverrides, Flow, McpToolExecutor, OpenAIProvider, Planner, Session,
    ToolChannel,
};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "pattern-agent")]
#[command(about = "Ask for pattern searches and edits in plain language", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML config file (default: ./pattern-agent.toml when present)
    #[arg(long, env = "PATTERN_AGENT_CONFIG")]
    config: Option<PathBuf>,

    /// Chat model name
    #[arg(long, env = "PATTERN_AGENT_MODEL")]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "PATTERN_AGENT_API_BASE")]
    api_base: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Tool server executable
    #[arg(long, env = "PATTERN_AGENT_SERVER")]
    server_command: Option<String>,

    /// Argument passed to the tool server (repeatable)
    #[arg(long = "server-arg")]
    server_args: Vec<String>,

    /// Tool-selection prompt template containing {input}
    #[arg(long)]
    prompt: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log only warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model: self.model.clone(),
            api_base: self.api_base.clone(),
            temperature: self.temperature,
            server_command: self.server_command.clone(),
            server_args: (!self.server_args.is_empty()).then(|| self.server_args.clone()),
            prompt_path: self.prompt.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut config = AgentConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    config.apply(cli.overrides());

    let planner = Planner::new(config.prompt_template()?);
    let model = OpenAIProvider::from_config(&config).context("Failed to set up model client")?;
    let tools = McpToolExecutor::spawn(&config)
        .await
        .context("Failed to start tool server")?;
    let catalog = tools
        .list_tools()
        .await
        .context("Failed to list tools")?;
    log::info!(
        "Available tools: {:?}",
        catalog.iter().map(|t| t.name.as_str()).collect::<Vec<_>>()
    );

    let flow = Flow::new(planner, model, tools);
    let mut session = Session::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("Ask me anything (type 'exit' to quit): ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        match flow.run_turn(&mut session, input).await {
            Ok(turn) => println!("{}", turn.output),
            Err(err) => {
                log::error!("Turn failed: {err}");
                println!("Error: {err}");
            }
        }
    }

    flow.into_tools().shutdown().await?;
    Ok(())
}
