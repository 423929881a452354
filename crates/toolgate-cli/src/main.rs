//! `toolgate`: serve the tool registry over MCP, or ask a model that can use it

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use toolgate_core::{
    create_provider, default_registry, CancellationToken, ChildProcessConnector, Connector,
    ChainSecretStore, Credentials, EnvSecretStore, GatewayConfig, HttpConnector, LocalConnector, Logger,
    Orchestrator, OrchestratorError, RegistryServer, SecretStore, Session, ToolConfig,
    ToolContext, ToolRegistry, TracingLogger,
};

#[derive(Debug, Parser)]
#[command(name = "toolgate")]
#[command(version, about = "Tool-serving agent gateway over MCP")]
struct Cli {
    /// Config file (default: ~/.config/toolgate/config.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Credential override, e.g. `--secret tavily=tvly-...`; beats the environment
    #[arg(long = "secret", global = true, value_name = "NAME=VALUE", value_parser = parse_secret)]
    secrets: Vec<(String, String)>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the tool registry as an MCP server on stdin/stdout
    Serve,

    /// Connect to the registry and print its catalog
    Tools {
        /// Use the registry in this process instead of spawning a server
        #[arg(long)]
        in_process: bool,
    },

    /// Answer one query, letting the model call tools
    Ask {
        /// The query; read from stdin when omitted
        query: Option<String>,

        /// Hide web-search tools and tell the model it is offline
        #[arg(long)]
        offline: bool,

        /// Use the registry in this process instead of spawning a server
        #[arg(long)]
        in_process: bool,

        /// Model provider (overrides config)
        #[arg(long)]
        provider: Option<String>,

        /// Model name (overrides config)
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; real env vars still apply
    let _ = dotenvy::dotenv();

    // stdout carries MCP frames in `serve`, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => GatewayConfig::load(path),
        None => GatewayConfig::load_default(),
    }
    .context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::default());
    let overrides = cli.secrets.clone();
    let secrets: Arc<dyn SecretStore> = Arc::new(ChainSecretStore::with_overrides(cli.secrets));

    match cli.command {
        Command::Serve => serve(&config, secrets.as_ref(), logger).await,
        Command::Tools { in_process } => {
            let connector = connector(&config, cli.config.as_ref(), in_process, &overrides, secrets.as_ref(), &logger)?;
            list_tools(&config, connector, logger).await
        }
        Command::Ask {
            query,
            offline,
            in_process,
            provider,
            model,
        } => {
            let mut config = config;
            if offline {
                config.assistant.internet = false;
            }
            if let Some(provider) = provider {
                config.model.provider = provider;
            }
            if let Some(model) = model {
                config.model.model = model;
            }
            let connector = connector(&config, cli.config.as_ref(), in_process, &overrides, secrets.as_ref(), &logger)?;
            ask(config, connector, secrets, logger, query).await
        }
    }
}

fn build_registry(
    config: &GatewayConfig,
    secrets: &dyn SecretStore,
    logger: &Arc<dyn Logger>,
) -> Result<ToolRegistry> {
    let credentials = Credentials::resolve(secrets);
    let missing = credentials.missing();
    if !missing.is_empty() {
        logger.warn(&format!(
            "[toolgate] Missing credentials: {}; those tools will report errors",
            missing.join(", ")
        ));
    }
    for (name, info) in Credentials::sources(secrets) {
        if info.available {
            logger.debug(&format!("[toolgate] Credential {} from {}", name, info.source));
        }
    }

    let context = ToolContext::new(
        ToolConfig::new(config.endpoints.clone(), credentials),
        logger.clone(),
    );
    default_registry(context, &config.registry, logger.clone()).context("failed to build tool registry")
}

/// Pick the registry to talk to: in-process, remote HTTP, or a spawned server
fn connector(
    config: &GatewayConfig,
    config_path: Option<&PathBuf>,
    in_process: bool,
    overrides: &[(String, String)],
    secrets: &dyn SecretStore,
    logger: &Arc<dyn Logger>,
) -> Result<Box<dyn Connector>> {
    if in_process {
        let registry = build_registry(config, secrets, logger)?;
        return Ok(Box::new(LocalConnector::new(Arc::new(registry))));
    }
    if let Some(url) = &config.server.url {
        return Ok(Box::new(HttpConnector::new(url)));
    }

    let connector = match &config.server.command {
        Some(command) => ChildProcessConnector::new(command, config.server.args.clone()),
        None => {
            // Re-run this binary as the server
            let exe = std::env::current_exe().context("cannot locate the toolgate executable")?;
            let mut args = Vec::new();
            if let Some(path) = config_path {
                args.push("--config".to_string());
                args.push(path.display().to_string());
            }
            args.push("serve".to_string());
            ChildProcessConnector::new(exe.display().to_string(), args)
        }
    };
    // `--secret` values reach a spawned server through its environment, never argv
    Ok(Box::new(connector.with_env(override_env(overrides))))
}

fn override_env(overrides: &[(String, String)]) -> Vec<(String, String)> {
    overrides
        .iter()
        .map(|(name, value)| (EnvSecretStore::var_for(name), value.clone()))
        .collect()
}

/// `NAME=VALUE` for `--secret`
fn parse_secret(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() && !value.is_empty() => {
            Ok((name.trim().to_lowercase(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}

async fn serve(config: &GatewayConfig, secrets: &dyn SecretStore, logger: Arc<dyn Logger>) -> Result<()> {
    let registry = build_registry(config, secrets, &logger)?;
    RegistryServer::new(Arc::new(registry), logger)
        .serve_stdio()
        .await
        .context("MCP server failed")
}

async fn list_tools(config: &GatewayConfig, connector: Box<dyn Connector>, logger: Arc<dyn Logger>) -> Result<()> {
    let mut session = Session::from_settings(connector, &config.server, logger);
    session.connect().await.context("failed to connect to the tool registry")?;

    let listed = session.list_tools().await;
    session.close().await.ok();

    for tool in listed? {
        println!("{}: {}", tool.name, tool.description);
    }
    Ok(())
}

async fn read_query() -> Result<String> {
    print!("Enter your query: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line.trim().to_string())
}

async fn ask(
    config: GatewayConfig,
    connector: Box<dyn Connector>,
    secrets: Arc<dyn SecretStore>,
    logger: Arc<dyn Logger>,
    query: Option<String>,
) -> Result<()> {
    let query = match query {
        Some(q) => q,
        None => read_query().await?,
    };
    if query.trim().is_empty() {
        bail!("empty query");
    }

    let provider = create_provider(&config.model.provider, secrets, logger.clone());
    let orchestrator = Orchestrator::new(
        Arc::from(provider),
        config.model.clone(),
        config.assistant.clone(),
        logger.clone(),
    );

    let mut session = Session::from_settings(connector, &config.server, logger);
    let cancel = CancellationToken::new();

    let outcome = orchestrator
        .connect_and_answer(&mut session, &query, &cancel, tokio::signal::ctrl_c())
        .await;

    // Runs on every path, including an interrupt during connect
    if let Err(e) = session.close().await {
        tracing::warn!("error while closing session: {}", e);
    }

    let result = match outcome {
        Ok(answer) => {
            println!("{}", answer);
            Ok(())
        }
        Err(OrchestratorError::Cancelled) => {
            println!("Process interrupted by user.");
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("query failed")),
    };
    eprintln!("Cleanup completed.");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secret() {
        assert_eq!(
            parse_secret("Tavily=tvly-1=2").unwrap(),
            ("tavily".to_string(), "tvly-1=2".to_string())
        );
        assert!(parse_secret("tavily").is_err());
        assert!(parse_secret("=value").is_err());
        assert!(parse_secret("tavily=").is_err());
    }

    #[test]
    fn test_secret_flag_is_global_and_repeatable() {
        let cli = Cli::try_parse_from([
            "toolgate",
            "--secret",
            "tavily=tvly-x",
            "ask",
            "--secret",
            "weather=wk-y",
            "hello",
        ])
        .unwrap();
        assert_eq!(cli.secrets.len(), 2);

        let secrets = ChainSecretStore::with_overrides(cli.secrets);
        assert_eq!(secrets.get("tavily"), Some("tvly-x".to_string()));
        assert_eq!(secrets.get_info("weather").source, "memory");
    }

    #[test]
    fn test_override_env_uses_store_variables() {
        let env = override_env(&[
            ("tavily".to_string(), "tvly-x".to_string()),
            ("google_search_cx".to_string(), "cx-1".to_string()),
        ]);
        assert_eq!(
            env,
            [
                ("TAVILY_API_KEY".to_string(), "tvly-x".to_string()),
                ("PROGRAMMABLE_SEARCH_ENGINE_ID".to_string(), "cx-1".to_string()),
            ]
        );
    }
}
