use std::net::TcpListener;

use anyhow::Context;
use tracing::info;

use att2grade::model::configuration::ApplicationConfiguration;
use att2grade::{observability, scheduler, startup};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init dotenv
    dotenvy::dotenv().ok();

    let subscriber = observability::get_subscriber("att2grade", "info");
    observability::init_subscriber(subscriber)?;

    let configuration = ApplicationConfiguration::from_env()?;
    let services = startup::build_services(&configuration)?;

    let _scheduler = scheduler::schedule_export_purge(
        services.grade_service.store().clone(),
        configuration.export_retention,
        &configuration.purge_cron,
    )
    .await?;

    let listener = TcpListener::bind(&configuration.listen_on)
        .with_context(|| format!("Could not listen on {}", configuration.listen_on))?;
    info!("Listening on http://{}", configuration.listen_on);

    let result = startup::startup(services, configuration, listener).await;
    opentelemetry::global::shutdown_tracer_provider();

    result
}
