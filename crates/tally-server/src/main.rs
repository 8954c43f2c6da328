use anyhow::Context;
use clap::Parser;
use tally_config::TallyConfig;
use tally_db::TallyService;
use tally_server::{AppState, app};

mod cli;

use cli::{Cli, Commands, UserCommand};

const DEFAULT_LOG_FILTER: &str = "medal_tally=info,tally_server=info,tally_db=info,tower_http=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("medal-tally error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = TallyConfig::load_with_dotenv().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    match cli.command {
        Commands::Serve { bind, port } => serve(config, bind, port).await,
        Commands::User { action } => user(&config, action).await,
    }
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose {
        "medal_tally=debug,tally_server=debug,tally_db=debug,tower_http=debug"
    } else {
        DEFAULT_LOG_FILTER
    };
    let filter = tracing_subscriber::EnvFilter::try_from_env("TALLY_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

async fn serve(
    mut config: TallyConfig,
    bind: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let state = AppState::from_config(&config).await?;
    let router = app(state, config.server.cors_permissive);

    let addr = config.server.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn user(config: &TallyConfig, action: UserCommand) -> anyhow::Result<()> {
    let service = open_service(config).await?;
    match action {
        UserCommand::Add {
            email,
            password,
            role,
        } => {
            let account = service
                .create_account(None, &email, &password, role.into())
                .await?;
            println!("{}", serde_json::to_string_pretty(&account)?);
        }
        UserCommand::Role { user_id, role } => {
            service.assign_role(None, &user_id, role.into()).await?;
            let role = tally_core::enums::Role::from(role);
            println!("assigned {role} to {user_id}");
        }
    }
    Ok(())
}

async fn open_service(config: &TallyConfig) -> anyhow::Result<TallyService> {
    let service = if config.database.is_remote() {
        TallyService::new_remote(&config.database.url, &config.database.auth_token).await?
    } else {
        TallyService::new_local(&config.database.path).await?
    };
    Ok(service)
}
