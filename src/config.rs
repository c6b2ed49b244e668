// src/config.rs
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection, streaming and table configuration passed to the loader

use std::fmt;
use std::time::Duration;

use crate::constants::*;
use crate::schema::Schema;
use crate::sql;
use crate::stream::ReadBoundary;

/// Database connection parameters
#[derive(Clone)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    /// Database name (None = server default for the user)
    pub database: Option<String>,
    /// TCP connect timeout (None = no timeout)
    pub connect_timeout: Option<Duration>,
    /// Session label reported to the server
    pub application_name: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: None,
            database: None,
            connect_timeout: None,
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Build the wire-protocol client configuration
    pub fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .application_name(&self.application_name);
        if let Some(password) = &self.password {
            config.password(password);
        }
        if let Some(database) = &self.database {
            config.dbname(database);
        }
        if let Some(timeout) = self.connect_timeout {
            config.connect_timeout(timeout);
        }
        config
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("connect_timeout", &self.connect_timeout)
            .field("application_name", &self.application_name)
            .finish()
    }
}

/// How rows are pulled from the generator and handed to COPY
#[derive(Debug, Clone, Copy)]
pub struct StreamConfig {
    /// Bytes requested from the row stream per chunk
    pub read_size: usize,
    /// Whether chunks may end mid-row
    pub boundary: ReadBoundary,
    /// Chunks buffered between the producer task and the COPY sink
    pub prefetch_depth: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            read_size: DEFAULT_READ_SIZE,
            boundary: ReadBoundary::Exact,
            prefetch_depth: DEFAULT_PREFETCH_DEPTH,
        }
    }
}

/// Target table: name, columns and optional partition expression
#[derive(Debug, Clone)]
pub struct TablePlan {
    pub table_name: String,
    pub schema: Schema,
    pub partition: Option<String>,
}

impl TablePlan {
    pub fn new(table_name: impl Into<String>, schema: Schema) -> Self {
        Self {
            table_name: table_name.into(),
            schema,
            partition: None,
        }
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn drop_sql(&self) -> String {
        sql::drop_table(&self.table_name)
    }

    pub fn create_sql(&self) -> String {
        sql::create_table(&self.table_name, &self.schema, self.partition.as_deref())
    }

    pub fn copy_sql(&self) -> String {
        sql::copy_from_stdin(&self.table_name, &self.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeSpec;

    #[test]
    fn test_connection_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5433);
        assert_eq!(config.user, "dbadmin");
        assert!(config.database.is_none());
    }

    #[test]
    fn test_pg_config() {
        let config = ConnectionConfig {
            password: Some("secret".to_string()),
            database: Some("bench".to_string()),
            connect_timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        let pg = config.to_pg_config();
        assert_eq!(pg.get_ports(), &[5433]);
        assert_eq!(pg.get_user(), Some("dbadmin"));
        assert_eq!(pg.get_dbname(), Some("bench"));
        assert_eq!(pg.get_password(), Some(&b"secret"[..]));
        assert_eq!(pg.get_connect_timeout(), Some(&Duration::from_secs(5)));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ConnectionConfig {
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_table_plan_statements() {
        let schema = TypeSpec::Varchar.schema(1, 4, &[]).unwrap();
        let plan = TablePlan::new("T1v4", schema).with_partition("c0");
        assert_eq!(plan.drop_sql(), "DROP TABLE IF EXISTS T1v4 CASCADE");
        assert_eq!(
            plan.create_sql(),
            "CREATE TABLE T1v4 (c0 varchar(4)) PARTITION BY (c0)"
        );
        assert_eq!(
            plan.copy_sql(),
            "COPY T1v4(c0) FROM STDIN DELIMITER ',' ENCLOSED BY '\"'"
        );
    }
}
