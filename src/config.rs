//! Process configuration: command-line flags with environment fallbacks.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Error};
use clap::Parser;
use sqlx::postgres::PgConnectOptions;

/// Chat with a Postgres database in plain language.
#[derive(Parser)]
#[command(name = "ai_db_sql_chat", version, about, long_about = None)]
pub struct Cli {
    /// Full connection URL; takes precedence over the individual --db-* flags.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    pub db_host: String,

    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    pub db_port: u16,

    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,

    #[arg(long, env = "DB_NAME")]
    pub db_name: Option<String>,

    /// Database schema whose tables are described to the model.
    #[arg(long, env = "DB_SCHEMA", default_value = "public")]
    pub db_schema: String,

    #[arg(long, env = "OLLAMA_HOST", default_value = "http://localhost")]
    pub ollama_host: String,

    #[arg(long, env = "OLLAMA_PORT", default_value_t = 11434)]
    pub ollama_port: u16,

    /// Model used for both generation stages.
    #[arg(long, env = "OLLAMA_MODEL", default_value = "llama3.2:latest")]
    pub model: String,

    /// Sample rows shown per table in the schema description (0 disables).
    #[arg(long, env = "SCHEMA_SAMPLE_ROWS", default_value_t = 3)]
    pub sample_rows: u32,

    /// Replace raw database errors with a generic message before they reach the model.
    #[arg(long, env = "REDACT_DB_ERRORS")]
    pub redact_db_errors: bool,
}

impl Cli {
    pub fn connection(&self) -> Result<ConnectionConfig, Error> {
        if let Some(url) = &self.database_url {
            return Ok(ConnectionConfig::Url(url.clone()));
        }

        Ok(ConnectionConfig::Params {
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone().context("DB_USER or DATABASE_URL must be set")?,
            password: self.db_password.clone().unwrap_or_default(),
            database: self.db_name.clone().context("DB_NAME or DATABASE_URL must be set")?,
        })
    }

    pub fn generator(&self) -> GeneratorConfig {
        GeneratorConfig {
            host: self.ollama_host.clone(),
            port: self.ollama_port,
            model: self.model.clone(),
        }
    }

    pub fn error_disclosure(&self) -> ErrorDisclosure {
        if self.redact_db_errors {
            ErrorDisclosure::Redacted
        } else {
            ErrorDisclosure::Verbatim
        }
    }
}

/// Where the database lives and how to log in.
#[derive(Clone)]
pub enum ConnectionConfig {
    Url(String),
    Params {
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    },
}

impl ConnectionConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match self {
            ConnectionConfig::Url(url) => PgConnectOptions::from_str(url),
            ConnectionConfig::Params {
                host,
                port,
                user,
                password,
                database,
            } => Ok(PgConnectOptions::new()
                .host(host)
                .port(*port)
                .username(user)
                .password(password)
                .database(database)),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionConfig::Url(_) => f.write_str("Url(<redacted>)"),
            ConnectionConfig::Params {
                host,
                port,
                user,
                database,
                ..
            } => f
                .debug_struct("Params")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("password", &"<redacted>")
                .field("database", database)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub host: String,
    pub port: u16,
    pub model: String,
}

/// How database error text is passed on to the text generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorDisclosure {
    #[default]
    Verbatim,
    Redacted,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["ai_db_sql_chat"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_connection_from_params() {
        let config = ConnectionConfig::Params {
            host: "db.internal".to_string(),
            port: 6543,
            user: "analyst".to_string(),
            password: "s3cret".to_string(),
            database: "sales".to_string(),
        };
        let options = config.connect_options().unwrap();

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "analyst");
        assert_eq!(options.get_database(), Some("sales"));
    }

    #[test]
    fn test_url_wins_over_params() {
        let cli = parse(&[
            "--database-url",
            "postgres://reader:pw@warehouse:5433/metrics",
            "--db-host",
            "ignored",
        ]);
        let options = cli.connection().unwrap().connect_options().unwrap();

        assert_eq!(options.get_host(), "warehouse");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("metrics"));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let config = ConnectionConfig::Params {
            host: "localhost".to_string(),
            port: 5432,
            user: "analyst".to_string(),
            password: "hunter2".to_string(),
            database: "sales".to_string(),
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("analyst"));

        let url = ConnectionConfig::Url("postgres://a:hunter2@h/db".to_string());
        assert!(!format!("{:?}", url).contains("hunter2"));
    }

    #[test]
    fn test_generator_and_disclosure_settings() {
        let cli = parse(&[
            "--db-user",
            "analyst",
            "--db-name",
            "sales",
            "--model",
            "qwen2.5-coder:7b",
            "--redact-db-errors",
        ]);

        let generator = cli.generator();
        assert_eq!(generator.model, "qwen2.5-coder:7b");
        assert_eq!(cli.error_disclosure(), ErrorDisclosure::Redacted);
    }
}
