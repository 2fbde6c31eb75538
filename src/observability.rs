use std::env::var;

use anyhow::Context;
use opentelemetry_sdk::trace::Tracer;
use tracing::{subscriber::set_global_default, Subscriber};
use tracing_log::LogTracer;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

pub fn get_subscriber(name: &str, env_filter: &str) -> impl Subscriber + Sync + Send {
    let telemetry = build_jaeger(name);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    // LOG_FORMAT=json for log shippers, human readable otherwise
    let json = var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let (text_layer, json_layer) = if json {
        (None, Some(fmt::Layer::new().json()))
    } else {
        (Some(fmt::Layer::new()), None)
    };

    Registry::default()
        .with(telemetry)
        .with(env_filter)
        .with(text_layer)
        .with(json_layer)
}

pub fn init_subscriber(subscriber: impl Subscriber + Sync + Send) -> anyhow::Result<()> {
    LogTracer::init().context("Failed to set logger")?;
    set_global_default(subscriber).context("Failed to set subscriber")?;
    Ok(())
}

fn build_jaeger<S>(name: &str) -> Option<OpenTelemetryLayer<S, Tracer>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    // Building the jaeger layer, if needed
    if var("JAEGER_ENABLED").is_ok() {
        opentelemetry_jaeger::new_agent_pipeline()
            .with_service_name(name)
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .map_err(|err| eprintln!("Jaeger error {:?}", err))
            .ok()
            .map(|x| tracing_opentelemetry::layer().with_tracer(x))
    } else {
        None
    }
}
