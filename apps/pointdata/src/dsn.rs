use std::path::{Path, PathBuf};

use anyhow::Context;

pub(crate) const DEFAULT_SQLITE_DSN: &str = "sqlite://pointdata.db?mode=rwc";
pub(crate) const DEFAULT_REDIS_HOST: &str = "127.0.0.1";
pub(crate) const DEFAULT_REDIS_PORT: u16 = 6379;

#[derive(Debug, Clone, Default)]
pub(crate) struct MysqlParts {
    pub(crate) hostname: Option<String>,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) database: Option<String>,
}

/// Explicit DSN wins; otherwise build a MySQL DSN from its parts; otherwise
/// fall back to a local SQLite file.
pub(crate) fn resolve_dsn(explicit: Option<String>, mysql: MysqlParts) -> anyhow::Result<String> {
    if let Some(dsn) = explicit {
        return Ok(dsn);
    }
    let Some(hostname) = mysql.hostname else {
        return Ok(DEFAULT_SQLITE_DSN.to_string());
    };
    let database = mysql
        .database
        .context("POINTDATA_MYSQL_DATABASE is required when POINTDATA_MYSQL_HOSTNAME is set")?;

    let credentials = match (mysql.username, mysql.password) {
        (Some(user), Some(password)) => format!(
            "{}:{}@",
            urlencoding::encode(&user),
            urlencoding::encode(&password)
        ),
        (Some(user), None) => format!("{}@", urlencoding::encode(&user)),
        (None, _) => String::new(),
    };
    Ok(format!(
        "mysql://{credentials}{hostname}/{}",
        urlencoding::encode(&database)
    ))
}

pub(crate) fn redis_url(hostname: Option<String>, port: Option<u16>, db: Option<u16>) -> String {
    let hostname = hostname.unwrap_or_else(|| DEFAULT_REDIS_HOST.to_string());
    let port = port.unwrap_or(DEFAULT_REDIS_PORT);
    let db = db.unwrap_or(0);
    format!("redis://{hostname}:{port}/{db}")
}

/// Creates the directory holding a file-backed SQLite database so that
/// `mode=rwc` can create the file itself. Other DSNs are left alone.
pub(crate) fn ensure_sqlite_parent_dir(dsn: &str) -> anyhow::Result<()> {
    let Some(parent) = sqlite_file_path(dsn)
        .as_deref()
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
    else {
        return Ok(());
    };
    std::fs::create_dir_all(&parent)
        .with_context(|| format!("create sqlite parent dir {}", parent.display()))
}

/// File path of a `sqlite:` DSN without its query; `None` for in-memory DSNs.
fn sqlite_file_path(dsn: &str) -> Option<PathBuf> {
    let location = dsn.strip_prefix("sqlite:")?.split(['?', '#']).next()?.trim();
    let location = location.strip_prefix("//").unwrap_or(location);
    if location.is_empty() || location.eq_ignore_ascii_case(":memory:") {
        return None;
    }
    Some(PathBuf::from(location))
}
