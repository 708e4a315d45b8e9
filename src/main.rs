use clap::Parser;
use groq_agent::adapters::health_handler::HealthHandler;
use groq_agent::agents::image::ImageResolver;
use groq_agent::agents::llm::create_provider;
use groq_agent::agents::{AgentHandler, Utterance};
use groq_agent::cli::{Cli, Command};
use groq_agent::config::Settings;
use groq_agent::devices::create_registry;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut settings = Settings::from_file(&cli.config)?;

    let registry = create_registry(&settings.registry).await?;
    let provider = create_provider(&settings.llm)?;
    let images = ImageResolver::new(&settings.llm)?;

    match cli.command {
        Command::Serve { host, port } => {
            settings.apply_server_overrides(host, port);
            let addr: SocketAddr =
                format!("{}:{}", settings.server.host, settings.server.port).parse()?;

            let agent = Arc::new(AgentHandler::new(settings.agent, provider, registry, images));
            let health_handler = Arc::new(HealthHandler::new(agent.clone()));
            let app = groq_agent::create_app(agent, health_handler);

            info!("Listening on {}", addr);
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
        Command::Ask {
            text,
            language,
            json,
        } => {
            let agent = AgentHandler::new(settings.agent, provider, registry, images);
            let result = agent.process(Utterance::new(text, language)).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.speech_text);
            }
        }
        Command::Models => {
            let agent = AgentHandler::new(settings.agent, provider, registry, images);
            for model in agent.list_models(None).await? {
                println!("{}", model);
            }
        }
    }

    Ok(())
}
