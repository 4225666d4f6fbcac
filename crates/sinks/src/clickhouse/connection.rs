//! ClickHouse HTTP driver
//!
//! ClickHouse has no interactive transactions, so a [`ClickHouseTransaction`]
//! buffers executed rows on the client and sends them as one multi-row
//! `INSERT ... VALUES (..), (..)` request on commit. The batch is the unit of
//! atomicity; dropping a transaction without committing discards its rows.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use clickhouse::Client;
use clickhouse::query::Query;
use parking_lot::Mutex;
use url::Url;

use crate::column::Param;
use crate::driver::{Connection, DriverError, InsertTemplate, Statement, Transaction};

/// Default HTTP port for `clickhouse://` connection strings
pub const DEFAULT_HTTP_PORT: u16 = 8123;

// =============================================================================
// Connection string
// =============================================================================

/// A parsed connection string
///
/// Accepted forms:
///
/// ```text
/// http://[user[:password]@]host[:port][/database][?database=..&user=..&password=..]
/// https://...
/// clickhouse://...        (plain HTTP, port 8123 by default)
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Dsn {
    /// Base HTTP URL, `scheme://host:port`
    pub url: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl Dsn {
    /// Parse a connection string
    pub fn parse(dsn: &str) -> Result<Self, DriverError> {
        let parsed = Url::parse(dsn.trim()).map_err(|e| DriverError::invalid_dsn(e.to_string()))?;

        let (scheme, port) = match parsed.scheme() {
            "http" | "https" => (parsed.scheme(), parsed.port_or_known_default()),
            "clickhouse" => ("http", Some(parsed.port().unwrap_or(DEFAULT_HTTP_PORT))),
            "tcp" | "clickhouse+native" => {
                return Err(DriverError::invalid_dsn(
                    "the native TCP protocol is not supported, use http://host:8123",
                ));
            }
            other => {
                return Err(DriverError::invalid_dsn(format!("unsupported scheme '{other}'")));
            }
        };

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| DriverError::invalid_dsn("missing host"))?;
        let port = port.ok_or_else(|| DriverError::invalid_dsn("missing port"))?;

        let mut dsn = Self {
            url: format!("{scheme}://{host}:{port}"),
            user: non_empty(percent_decode(parsed.username())),
            password: parsed.password().map(percent_decode).and_then(non_empty),
            database: non_empty(percent_decode(parsed.path().trim_matches('/'))),
        };

        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "database" => dsn.database = non_empty(value.into_owned()),
                "user" | "username" => dsn.user = non_empty(value.into_owned()),
                "password" => dsn.password = non_empty(value.into_owned()),
                other => tracing::debug!(option = %other, "ignoring connection string option"),
            }
        }

        Ok(dsn)
    }

    /// The connection string with the password masked, for logs
    pub fn redacted(&self) -> String {
        let mut out = self.url.clone();
        if let Some(user) = &self.user {
            let credentials = match self.password {
                Some(_) => format!("{user}:***@"),
                None => format!("{user}@"),
            };
            if let Some(pos) = out.find("://") {
                out.insert_str(pos + 3, &credentials);
            }
        }
        if let Some(db) = &self.database {
            out.push('/');
            out.push_str(db);
        }
        out
    }

    /// Build a ClickHouse client for this connection string
    pub fn client(&self) -> Client {
        let mut client = Client::default().with_url(&self.url);
        if let Some(database) = &self.database {
            client = client.with_database(database);
        }
        if let Some(user) = &self.user {
            client = client.with_user(user);
        }
        if let Some(password) = &self.password {
            client = client.with_password(password);
        }
        client
    }
}

impl FromStr for Dsn {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dsn")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Decode `%XX` escapes in URL userinfo and path segments
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = s.get(i + 1..i + 3)
            && let Ok(byte) = u8::from_str_radix(hex, 16)
        {
            out.push(byte);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

// =============================================================================
// Connection
// =============================================================================

/// A connection to ClickHouse over HTTP
pub struct ClickHouseConnection {
    client: Client,
    dsn: Dsn,
    closed: AtomicBool,
}

impl ClickHouseConnection {
    /// Open a connection from a connection string
    ///
    /// No request is made; use [`Connection::ping`] to verify the server.
    pub fn open(dsn: &str) -> Result<Self, DriverError> {
        let dsn = Dsn::parse(dsn)?;
        Ok(Self {
            client: dsn.client(),
            dsn,
            closed: AtomicBool::new(false),
        })
    }

    /// The parsed connection string
    pub fn dsn(&self) -> &Dsn {
        &self.dsn
    }

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.closed.load(Ordering::Acquire) {
            Err(DriverError::ConnectionClosed)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for ClickHouseConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickHouseConnection")
            .field("dsn", &self.dsn)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

#[async_trait]
impl Connection for ClickHouseConnection {
    async fn ping(&self) -> Result<(), DriverError> {
        self.ensure_open()?;
        self.client.query("SELECT 1").execute().await?;
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>, DriverError> {
        self.ensure_open()?;
        Ok(Box::new(ClickHouseTransaction {
            client: self.client.clone(),
            inserts: Vec::new(),
        }))
    }

    async fn close(&self) -> Result<(), DriverError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(dsn = %self.dsn, "clickhouse connection closed");
        }
        Ok(())
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Rows buffered for one prepared insert
struct PendingInsert {
    template: InsertTemplate,
    rows: Vec<Vec<Param>>,
}

/// A client-side buffered insert transaction
pub struct ClickHouseTransaction {
    client: Client,
    inserts: Vec<Arc<Mutex<PendingInsert>>>,
}

#[async_trait]
impl Transaction for ClickHouseTransaction {
    async fn prepare(&mut self, sql: &str) -> Result<Box<dyn Statement>, DriverError> {
        let template = InsertTemplate::parse(sql)?;
        let expected = template.placeholders();
        let insert = Arc::new(Mutex::new(PendingInsert {
            template,
            rows: Vec::new(),
        }));
        self.inserts.push(Arc::clone(&insert));

        Ok(Box::new(ClickHouseStatement { insert, expected }))
    }

    async fn commit(self: Box<Self>) -> Result<(), DriverError> {
        for insert in &self.inserts {
            let (sql, rows) = {
                let mut pending = insert.lock();
                let rows = std::mem::take(&mut pending.rows);
                (pending.template.render(rows.len()), rows)
            };
            if rows.is_empty() {
                continue;
            }

            insert_query(&self.client, &sql, &rows).execute().await?;

            tracing::debug!(rows = rows.len(), "insert committed");
        }
        Ok(())
    }
}

/// Bind every buffered row, in order, to a rendered multi-row insert
fn insert_query(client: &Client, sql: &str, rows: &[Vec<Param>]) -> Query {
    rows.iter()
        .flatten()
        .fold(client.query(sql), |query, param| query.bind(param))
}

// =============================================================================
// Statement
// =============================================================================

/// A prepared insert that appends rows to its transaction's buffer
pub struct ClickHouseStatement {
    insert: Arc<Mutex<PendingInsert>>,
    expected: usize,
}

#[async_trait]
impl Statement for ClickHouseStatement {
    async fn execute(&mut self, args: &[Param]) -> Result<(), DriverError> {
        if args.len() != self.expected {
            return Err(DriverError::ArgumentCount {
                expected: self.expected,
                actual: args.len(),
            });
        }
        self.insert.lock().rows.push(args.to_vec());
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        // Buffered rows belong to the transaction and survive the statement
        Ok(())
    }
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod connection_test;
