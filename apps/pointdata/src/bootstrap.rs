use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use pointdata_cache::{Cache, MemoryCache, RedisCache};
use pointdata_common::{ServiceConfig, ServiceConfigPatch};
use pointdata_core::Core;
use pointdata_storage::SeaOrmEventStore;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::dsn::{MysqlParts, ensure_sqlite_parent_dir, redis_url, resolve_dsn};

pub(crate) struct Bootstrap {
    pub(crate) config: ServiceConfig,
    pub(crate) core: Core,
}

pub(crate) async fn bootstrap(cli: Cli) -> anyhow::Result<Bootstrap> {
    let config = load_config(cli)?;
    info!(
        host = %config.host,
        port = config.port,
        memory_cache = config.memory_cache,
        event_timeout_ms = config.event_timeout_ms,
        schema_sync = config.schema_sync,
        "config loaded"
    );

    ensure_sqlite_parent_dir(&config.dsn)?;
    let store = SeaOrmEventStore::connect(&config.dsn)
        .await
        .context("connect store")?;
    if config.schema_sync {
        store.sync().await.context("schema sync")?;
    } else {
        info!("schema sync disabled; expecting an existing pointdata table");
    }
    info!(backend = ?store.backend(), "store ready");

    let cache: Arc<dyn Cache> = if config.memory_cache {
        warn!("using in-process cache; dedup markers and the IP queue are lost on exit");
        Arc::new(MemoryCache::new())
    } else {
        Arc::new(
            RedisCache::connect(&config.redis_url)
                .await
                .context("connect cache")?,
        )
    };

    let core = Core::new(cache, Arc::new(store), config.event_timeout());
    Ok(Bootstrap { config, core })
}

/// CLI > ENV is resolved by clap per field; the result overlays the defaults.
fn load_config(cli: Cli) -> anyhow::Result<ServiceConfig> {
    let dsn = resolve_dsn(
        env_text(cli.dsn),
        MysqlParts {
            hostname: env_text(cli.mysql_hostname),
            username: env_text(cli.mysql_username),
            password: env_text(cli.mysql_password),
            database: env_text(cli.mysql_database),
        },
    )?;
    let redis = redis_url(
        env_text(cli.redis_hostname),
        parse_env_value(cli.redis_port, "POINTDATA_REDIS_PORT")?,
        parse_env_value(cli.redis_db, "POINTDATA_REDIS_DB")?,
    );

    let mut merged = ServiceConfigPatch::default();
    merged.overlay(ServiceConfigPatch {
        host: env_text(cli.host),
        port: parse_env_value(cli.port, "POINTDATA_PORT")?,
        dsn: Some(dsn),
        redis_url: Some(redis),
        memory_cache: parse_env_switch(cli.memory_cache, "POINTDATA_MEMORY_CACHE")?,
        event_timeout_ms: parse_env_value(cli.event_timeout_ms, "POINTDATA_EVENT_TIMEOUT_MS")?,
        schema_sync: parse_env_switch(cli.schema_sync, "POINTDATA_SCHEMA_SYNC")?,
    });
    merged
        .into_config()
        .context("finalize merged service config")
}

/// Trimmed value, or `None` when blank or an unexpanded `${VAR}` placeholder.
fn env_text(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    let placeholder = value.starts_with("${") && value.ends_with('}');
    (!value.is_empty() && !placeholder).then(|| value.to_string())
}

fn parse_env_value<T>(value: Option<String>, env_name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env_text(value)
        .map(|raw| {
            raw.parse::<T>()
                .with_context(|| format!("invalid {env_name} value: {raw}"))
        })
        .transpose()
}

fn parse_env_switch(value: Option<String>, env_name: &str) -> anyhow::Result<Option<bool>> {
    let Some(raw) = env_text(value) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => anyhow::bail!("invalid {env_name} value: {raw}"),
    }
}
