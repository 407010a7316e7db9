use super::SchemaError;
use percent_encoding::percent_decode_str;
use std::fmt;
use url::Url;

/// Decodes a percent-encoded URL component (`p%40ss` becomes `p@ss`).
fn decode(component: &str) -> Result<String, SchemaError> {
    percent_decode_str(component)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| {
            SchemaError::InvalidConnectionUrl(format!("invalid UTF-8 in URL component: {e}"))
        })
}

/// A parsed `<dialect>[+<driver>]://[<user>[:<password>]@]<host>[:<port>]/<database>`
/// connection string.
///
/// User, password and database name are percent-decoded.
///
/// SQLite URLs carry a file path instead of a host: `sqlite:///relative.db`,
/// `sqlite:////absolute/path.db`, or `sqlite://` for an in-memory database.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionUrl {
    pub dialect: String,
    pub driver: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: String,
}

impl ConnectionUrl {
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let invalid = |reason: &str| SchemaError::InvalidConnectionUrl(format!("{reason}: {raw}"));

        let (scheme, rest) = raw
            .split_once("://")
            .ok_or_else(|| invalid("missing '://' separator"))?;
        let (dialect, driver) = match scheme.split_once('+') {
            Some((dialect, driver)) => (dialect, Some(driver.to_string())),
            None => (scheme, None),
        };
        if dialect.is_empty() {
            return Err(invalid("missing dialect"));
        }
        let dialect = dialect.to_ascii_lowercase();

        if dialect == "sqlite" {
            let path = rest.strip_prefix('/').unwrap_or(rest);
            return Ok(Self {
                dialect,
                driver,
                user: None,
                password: None,
                host: None,
                port: None,
                database: if path.is_empty() {
                    ":memory:".to_string()
                } else {
                    path.to_string()
                },
            });
        }

        let parsed = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
        let user = Some(parsed.username())
            .filter(|u| !u.is_empty())
            .map(decode)
            .transpose()?;
        let password = parsed.password().map(decode).transpose()?;
        let database = decode(parsed.path().trim_start_matches('/'))?;
        if database.is_empty() {
            return Err(invalid("missing database name"));
        }

        Ok(Self {
            dialect,
            driver,
            user,
            password,
            host: parsed.host_str().map(String::from),
            port: parsed.port(),
            database,
        })
    }

    /// Whether this URL points at an in-memory SQLite database.
    pub fn is_memory(&self) -> bool {
        self.database == ":memory:"
    }
}

// Keeps passwords out of logs.
impl fmt::Debug for ConnectionUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionUrl")
            .field("dialect", &self.dialect)
            .field("driver", &self.driver)
            .field("user", &self.user)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}
