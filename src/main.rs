//! core-utils demo binary.
//!
//! Wires the cache, logger and flag registries together and runs one pass
//! over each, printing the flag report as JSON.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use core_utils::cache::BoundedCache;
use core_utils::config::Config;
use core_utils::flags::{FlagContext, RegisterOptions};
use core_utils::logger::{
    create_observability_transport, ConsoleTransport, LogContext, TracingObservability,
};
use core_utils::Services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("core_utils=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting core-utils...");

    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);

    let services = Services::new(config);

    // Every logger gets the tracing-backed observability sink
    services
        .loggers
        .add_global_transport(Arc::new(create_observability_transport(Arc::new(
            TracingObservability,
        ))));

    let logger = services.app_logger();
    logger.add_transport(Arc::new(ConsoleTransport::new()));

    // Cache
    let lookups: BoundedCache<String, String> = services
        .cache
        .create("translations", services.config.cache_config());
    lookups.set("home.title".to_string(), "Home".to_string());
    lookups.set_with_ttl(
        "promo.banner".to_string(),
        "Spring sale".to_string(),
        Duration::from_secs(60),
    );
    logger
        .info_with(
            "Cache warmed",
            LogContext::new()
                .extra("entries", lookups.size())
                .tag("cache", lookups.name()),
        )
        .await;

    // Flags
    services.flags.register(
        "new-checkout",
        |ctx: FlagContext| async move {
            anyhow::Ok(json!(ctx.get("plan") == Some(&json!("pro"))))
        },
        RegisterOptions::new()
            .description("New checkout flow")
            .adapter("local"),
    );
    services.flags.register(
        "homepage-variant",
        |_ctx: FlagContext| async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            anyhow::Ok(json!("b"))
        },
        RegisterOptions::new()
            .description("Homepage experiment")
            .flag_type("variant"),
    );

    let context = FlagContext::new().user("demo-user").attribute("plan", "pro");
    let values = services
        .flags
        .evaluate_registered(&context, &services.config.evaluate_options())
        .await?;
    logger
        .info(format!("Evaluated {} flags: {:?}", values.len(), values))
        .await;

    let report = services.flags.generate_report();
    println!("{}", serde_json::to_string_pretty(&report)?);

    let stats = services.loggers.get_global_stats();
    info!("Logger stats: {}", serde_json::to_string(&stats)?);
    info!("Cache stats: {}", serde_json::to_string(&lookups.stats())?);

    services.shutdown().await;
    info!("Shutdown complete");

    Ok(())
}
