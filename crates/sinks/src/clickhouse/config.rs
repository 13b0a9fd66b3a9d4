//! ClickHouse sink configuration
//!
//! Connection settings and the target table.

use clickhouse::Client;

/// Default ClickHouse URL
pub const DEFAULT_URL: &str = "http://localhost:8123";

/// Default table name
pub const DEFAULT_TABLE: &str = "EventLogItems";

/// Configuration for ClickHouse sink
#[derive(Debug, Clone)]
pub struct ClickHouseConfig {
    /// ClickHouse HTTP URL (e.g., "http://localhost:8123")
    pub url: String,

    /// Database name
    pub database: String,

    /// Table receiving the records
    pub table: String,

    /// Username for authentication (optional)
    pub username: Option<String>,

    /// Password for authentication (optional)
    pub password: Option<String>,

    /// Create the database and table on first use
    pub create_schema: bool,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.into(),
            database: "default".into(),
            table: DEFAULT_TABLE.into(),
            username: None,
            password: None,
            create_schema: true,
        }
    }
}

impl ClickHouseConfig {
    /// Set the ClickHouse URL
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the database name
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the table name
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Set authentication credentials
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Build the ClickHouse client bound to the configured database
    pub fn build_client(&self) -> Client {
        self.server_client().with_database(&self.database)
    }

    /// Build a client without a database, for `CREATE DATABASE`
    pub fn server_client(&self) -> Client {
        let mut client = Client::default().with_url(&self.url);

        if let Some(ref username) = self.username {
            client = client.with_user(username);
        }

        if let Some(ref password) = self.password {
            client = client.with_password(password);
        }

        client
    }
}
