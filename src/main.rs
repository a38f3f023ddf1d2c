use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use dialoq::config::{Config, dialoq_home};
use dialoq::presentation::stream_frame;
use dialoq::provider::provider_for_model;
use dialoq::query::WidgetParams;
use dialoq::transport::HttpTransport;
use dialoq::ui::{self, WidgetOptions};

#[derive(Parser)]
#[command(name = "dialoq")]
#[command(version)]
#[command(about = "Chat with a Dialoqbase bot from the terminal", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.dialoq/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat widget (default)
    Chat(ChatArgs),
    /// Print the provider a model name belongs to
    Provider { model: String },
    /// Print the effective configuration
    Config,
}

#[derive(Args, Default)]
struct ChatArgs {
    /// Bot chat endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Widget URL; its `mode` query parameter selects the presentation
    #[arg(long, conflicts_with = "mode")]
    url: Option<String>,

    /// Presentation mode, e.g. `iframe` when embedded by a host process
    #[arg(long)]
    mode: Option<String>,
}

impl ChatArgs {
    fn widget_params(&self) -> Result<WidgetParams> {
        if let Some(url) = &self.url {
            return WidgetParams::from_url(url).with_context(|| format!("Invalid widget URL: {url}"));
        }
        Ok(self
            .mode
            .clone()
            .map(WidgetParams::with_mode)
            .unwrap_or_default())
    }
}

async fn chat(config: Config, args: ChatArgs) -> Result<()> {
    let config = config.with_endpoint(args.endpoint.clone());
    let params = args.widget_params()?;
    let transport = HttpTransport::from_config(&config)?;

    let _guard = dialoq::logging::init(&config.log_dir)?;
    tracing::info!(endpoint = %transport.endpoint(), "starting dialoq");

    // Hosts embedding the widget as a child process read signals from stderr.
    let parent = stream_frame(io::stderr());

    ui::run(WidgetOptions {
        config,
        params,
        transport: Arc::new(transport),
        parent,
    })
    .await
}

async fn execute(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Chat(ChatArgs::default())) {
        Commands::Chat(args) => chat(Config::load(config_path)?, args).await,
        Commands::Provider { model } => {
            println!("{}", provider_for_model(&model));
            Ok(())
        }
        Commands::Config => {
            let rendered = Config::load(config_path)?.to_toml()?;
            println!("# home: {}", dialoq_home().display());
            print!("{rendered}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    execute(Cli::parse()).await
}
