//! Process arguments and layered settings.
//!
//! Where to connect comes from the command line (`clap`); tuning knobs come
//! from environment variables and configuration files (`ortho_config`,
//! prefix `DBMANAGER`).

use std::ffi::OsString;
use std::time::Duration;

use clap::Parser;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::persistence::PoolConfig;

/// `db-manager` command arguments.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "db-manager",
    about = "Interactive user table manager with audited, transactional writes",
    version
)]
pub struct CliArgs {
    /// Database host.
    #[arg(value_name = "host", requires_all = ["port", "user", "dbname", "password"])]
    pub host: Option<String>,
    /// Database port.
    #[arg(value_name = "port")]
    pub port: Option<u16>,
    /// Database role.
    #[arg(value_name = "user")]
    pub user: Option<String>,
    /// Database name.
    #[arg(value_name = "dbname")]
    pub dbname: Option<String>,
    /// Role password.
    #[arg(value_name = "password")]
    pub password: Option<String>,
    /// Database connection URL. Falls back to `DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url", conflicts_with = "host")]
    pub database_url: Option<String>,
    /// Keep everything in process memory instead of PostgreSQL.
    #[arg(long = "in-memory")]
    pub in_memory: bool,
}

/// Settings loaded from `DBMANAGER_*` variables and configuration files.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "DBMANAGER")]
pub struct StorageSettings {
    /// Upper bound on pooled log store connections.
    #[ortho_config(default = 5)]
    pub pool_max_size: u32,
    /// Seconds to wait when opening or checking out a connection.
    #[ortho_config(default = 30)]
    pub connect_timeout_secs: u64,
    /// Run without PostgreSQL. Unset means `false`.
    pub in_memory: Option<bool>,
}

impl StorageSettings {
    /// Load settings from the environment and configuration files only.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Settings`] when a layer holds an invalid value.
    pub fn load_layers() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("db-manager")]).map_err(|err| {
            ConfigError::Settings {
                message: err.to_string(),
            }
        })
    }

    /// Whether any layer asked for in-memory storage.
    pub fn in_memory(&self) -> bool {
        self.in_memory.unwrap_or(false)
    }

    /// Build pool settings for `database_url`.
    pub fn pool_config(&self, database_url: &str) -> PoolConfig {
        PoolConfig::new(database_url)
            .with_max_size(self.pool_max_size)
            .with_connection_timeout(Duration::from_secs(self.connect_timeout_secs))
    }
}

/// Configuration failures detected before any connection is attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No way to reach a database was given.
    #[error(
        "database URL missing: pass <host> <port> <user> <dbname> <password>, \
         set --database-url or DATABASE_URL, or use --in-memory"
    )]
    MissingDatabase,
    /// `--database-url` or `DATABASE_URL` was blank.
    #[error("database URL must not be empty when provided")]
    EmptyDatabaseUrl,
    /// A settings layer could not be parsed.
    #[error("invalid settings: {message}")]
    Settings {
        /// Parser error description.
        message: String,
    },
}

/// Where user and log data live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// Process memory; nothing survives exit.
    InMemory,
    /// A PostgreSQL connection string.
    Postgres(String),
}

impl DatabaseTarget {
    /// Decide the target from arguments, settings and `DATABASE_URL`.
    ///
    /// In-memory mode wins, then positional connection parts, then
    /// `--database-url`, then the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when no usable target is configured.
    pub fn resolve(
        args: &CliArgs,
        settings: &StorageSettings,
        env_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        if args.in_memory || settings.in_memory() {
            return Ok(Self::InMemory);
        }

        if let (Some(host), Some(port), Some(user), Some(dbname), Some(password)) = (
            args.host.as_deref(),
            args.port,
            args.user.as_deref(),
            args.dbname.as_deref(),
            args.password.as_deref(),
        ) {
            return Ok(Self::Postgres(connection_string(
                host, port, user, dbname, password,
            )));
        }

        let url = args
            .database_url
            .clone()
            .or(env_url)
            .ok_or(ConfigError::MissingDatabase)?;
        if url.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseUrl);
        }
        Ok(Self::Postgres(url))
    }
}

/// Build a libpq key/value connection string with TLS disabled.
pub fn connection_string(
    host: &str,
    port: u16,
    user: &str,
    dbname: &str,
    password: &str,
) -> String {
    format!(
        "host={} port={port} user={} dbname={} password={} sslmode=disable",
        quote(host),
        quote(user),
        quote(dbname),
        quote(password),
    )
}

fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\');
    if !needs_quotes {
        return value.to_owned();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

#[cfg(test)]
mod tests {
    //! Unit tests for argument and settings resolution.

    use super::*;

    use env_lock::lock_env;
    use rstest::{fixture, rstest};

    #[fixture]
    fn settings() -> StorageSettings {
        StorageSettings {
            pool_max_size: 5,
            connect_timeout_secs: 30,
            in_memory: None,
        }
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env([
            ("DBMANAGER_POOL_MAX_SIZE", None::<String>),
            ("DBMANAGER_CONNECT_TIMEOUT_SECS", None::<String>),
            ("DBMANAGER_IN_MEMORY", None::<String>),
        ]);

        let settings = StorageSettings::load_layers().expect("config should load");
        assert_eq!(settings.pool_max_size, 5);
        assert_eq!(settings.connect_timeout_secs, 30);
        assert_eq!(settings.in_memory, None);
        assert!(!settings.in_memory());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("DBMANAGER_POOL_MAX_SIZE", Some("2".to_owned())),
            ("DBMANAGER_CONNECT_TIMEOUT_SECS", Some("7".to_owned())),
            ("DBMANAGER_IN_MEMORY", Some("true".to_owned())),
        ]);

        let settings = StorageSettings::load_layers().expect("config should load");
        assert_eq!(settings.pool_max_size, 2);
        assert_eq!(settings.connect_timeout_secs, 7);
        assert_eq!(settings.in_memory, Some(true));
        assert!(settings.in_memory());

        let pool = settings.pool_config("postgres://localhost/db");
        assert_eq!(pool.max_size(), 2);
        assert_eq!(pool.connection_timeout(), Duration::from_secs(7));
    }

    #[rstest]
    fn positional_parts_build_a_key_value_string(settings: StorageSettings) {
        let args = CliArgs::parse_from(["db-manager", "localhost", "5432", "app", "users", "s3cret"]);

        let target = DatabaseTarget::resolve(&args, &settings, None).expect("target");

        assert_eq!(
            target,
            DatabaseTarget::Postgres(
                "host=localhost port=5432 user=app dbname=users password=s3cret sslmode=disable"
                    .to_owned()
            )
        );
    }

    #[rstest]
    fn partial_positional_parts_are_rejected() {
        let result = CliArgs::try_parse_from(["db-manager", "localhost", "5432"]);
        assert!(result.is_err());
    }

    #[rstest]
    fn explicit_url_beats_environment(settings: StorageSettings) {
        let args = CliArgs::parse_from(["db-manager", "--database-url", "postgres://a/b"]);

        let target = DatabaseTarget::resolve(&args, &settings, Some("postgres://env/db".to_owned()))
            .expect("target");

        assert_eq!(target, DatabaseTarget::Postgres("postgres://a/b".to_owned()));
    }

    #[rstest]
    fn environment_url_is_the_fallback(settings: StorageSettings) {
        let target = DatabaseTarget::resolve(
            &CliArgs::default(),
            &settings,
            Some("postgres://env/db".to_owned()),
        )
        .expect("target");

        assert_eq!(target, DatabaseTarget::Postgres("postgres://env/db".to_owned()));
    }

    #[rstest]
    #[case(None, ConfigError::MissingDatabase)]
    #[case(Some("   "), ConfigError::EmptyDatabaseUrl)]
    fn unusable_targets_are_rejected(
        settings: StorageSettings,
        #[case] env_url: Option<&str>,
        #[case] expected: ConfigError,
    ) {
        let err = DatabaseTarget::resolve(&CliArgs::default(), &settings, env_url.map(str::to_owned))
            .expect_err("target should be rejected");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn in_memory_wins(mut settings: StorageSettings) {
        settings.in_memory = Some(true);
        let args = CliArgs::parse_from(["db-manager", "--database-url", "postgres://a/b"]);

        let target = DatabaseTarget::resolve(&args, &settings, None).expect("target");

        assert_eq!(target, DatabaseTarget::InMemory);
    }

    #[rstest]
    #[case("plain", "plain")]
    #[case("two words", "'two words'")]
    #[case("it's", "'it\\'s'")]
    #[case("", "''")]
    fn values_are_quoted_when_needed(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(quote(raw), expected);
    }
}
