use std::sync::Arc;

use intake_wizard::config::{FlowSettings, ServerConfig};
use intake_wizard::error::{ConfigError, Result};
use intake_wizard::flows;
use intake_wizard::gateway::HttpGateway;
use intake_wizard::session::{SessionRegistry, spawn_sweep_task, wizard_routes};
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let server = ServerConfig::from_env()?;
    let settings = FlowSettings::from_env()?;

    let enabled = flows::enabled(&settings)?;
    if enabled.is_empty() {
        return Err(ConfigError::NoFlows {
            hint: "Set INTAKE_<FLOW>_ENDPOINT and INTAKE_<FLOW>_REDIRECT_URL for at least one flow."
                .to_string(),
        }
        .into());
    }

    let client = reqwest::Client::new();
    let mut registry = SessionRegistry::new(server.session_idle_timeout);
    for flow in enabled {
        let gateway = HttpGateway::with_client(client.clone(), flow.endpoints.submit_url.clone());
        registry.register_flow(flow, Arc::new(gateway));
    }
    let registry = Arc::new(registry);

    eprintln!("Intake wizard v{}", env!("CARGO_PKG_VERSION"));
    for flow in registry.flows() {
        eprintln!("   {} ({} sections): {}", flow.title, flow.sections, flow.id);
    }
    eprintln!("   API: http://0.0.0.0:{}/api/flows\n", server.port);

    let _sweep = spawn_sweep_task(registry.clone(), server.sweep_interval);

    let app = wizard_routes(registry).layer(CorsLayer::permissive());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", server.port)).await?;
    tracing::info!(port = server.port, "Intake wizard server started");
    axum::serve(listener, app).await?;

    Ok(())
}
