use anyhow::{anyhow, Context};
use clap::Parser;
use forgot_password_frontend::{
    api::ApiClient,
    config,
    pages::forgot_password::{self, RequestState},
};
use tokio::task::LocalSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Request a password reset email for an account.
#[derive(Debug, Parser)]
#[command(name = "forgot-password", version)]
struct Cli {
    /// Address the reset link should be sent to.
    #[arg(long)]
    email: String,

    /// Overrides API_BASE_URL and the runtime config file.
    #[arg(long)]
    api_base_url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forgot_password_frontend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Cli {
        email,
        api_base_url,
    } = Cli::parse();
    let runtime_config = config::init().context("Failed to load runtime config")?;
    let controller = match api_base_url {
        Some(url) => {
            let mut overridden = runtime_config.clone();
            overridden.api_base_url = url.trim_end_matches('/').to_string();
            tracing::info!(url = %overridden.reset_request_url(), "Using overridden API base URL");
            forgot_password::with_api_client(ApiClient::with_config(overridden))
        }
        None => {
            tracing::info!(url = %runtime_config.reset_request_url(), "Runtime config initialized");
            forgot_password::use_forgot_password_controller()
        }
    };

    let local = LocalSet::new();
    let settled = local
        .run_until(async move {
            controller.submit(&email);
            let mut state = controller.subscribe();
            let settled = state
                .wait_for(|s| !s.is_pending())
                .await
                .map(|s| (*s).clone())
                .map_err(|_| anyhow!("Controller dropped before the request settled"))?;
            anyhow::Ok(settled)
        })
        .await?;

    match settled {
        RequestState::Succeeded(request) => {
            println!("Reset link requested for {}", request.email());
            Ok(())
        }
        RequestState::Failed { reason, .. } => Err(anyhow!(reason.message())),
        other => Err(anyhow!("Unexpected state: {}", other.name())),
    }
}
