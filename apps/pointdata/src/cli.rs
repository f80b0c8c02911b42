use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "pointdata",
    version,
    about = "Pointdata ingestion endpoint"
)]
pub(crate) struct Cli {
    /// Bind host.
    #[arg(long, env = "POINTDATA_HOST")]
    pub(crate) host: Option<String>,

    /// Bind port.
    #[arg(long, env = "POINTDATA_PORT")]
    pub(crate) port: Option<String>,

    /// Full store DSN. Takes precedence over the mysql-* parts.
    #[arg(long, env = "POINTDATA_DSN")]
    pub(crate) dsn: Option<String>,

    #[arg(long, env = "POINTDATA_MYSQL_HOSTNAME")]
    pub(crate) mysql_hostname: Option<String>,

    #[arg(long, env = "POINTDATA_MYSQL_USERNAME")]
    pub(crate) mysql_username: Option<String>,

    #[arg(long, env = "POINTDATA_MYSQL_PASSWORD")]
    pub(crate) mysql_password: Option<String>,

    #[arg(long, env = "POINTDATA_MYSQL_DATABASE")]
    pub(crate) mysql_database: Option<String>,

    #[arg(long, env = "POINTDATA_REDIS_HOSTNAME")]
    pub(crate) redis_hostname: Option<String>,

    #[arg(long, env = "POINTDATA_REDIS_PORT")]
    pub(crate) redis_port: Option<String>,

    /// Redis database index.
    #[arg(long, env = "POINTDATA_REDIS_DB")]
    pub(crate) redis_db: Option<String>,

    /// Keep dedup markers, aliases and the IP queue in process memory instead
    /// of Redis. For local runs only.
    #[arg(long, env = "POINTDATA_MEMORY_CACHE")]
    pub(crate) memory_cache: Option<String>,

    /// Upper bound for processing one event, in milliseconds.
    #[arg(long, env = "POINTDATA_EVENT_TIMEOUT_MS")]
    pub(crate) event_timeout_ms: Option<String>,

    /// Create or alter the `pointdata` table on startup. Leave off against a
    /// shared production table; syncing adds a surrogate `id` column.
    #[arg(long, env = "POINTDATA_SCHEMA_SYNC")]
    pub(crate) schema_sync: Option<String>,
}
