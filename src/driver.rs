//! # Driver Options Resolver
//!
//! Normalizes heterogeneous connection inputs into a canonical [`DriverConfig`].
//!
//! Each field is resolved in order: explicit option, fallback lookup, built-in
//! default. A `connectionURL` short-circuits everything else.
//!
//! ```rust
//! use schemaforge::driver::{resolve, DriverOptions};
//!
//! let options = DriverOptions {
//!     driver: Some("mysql".into()),
//!     host: Some("db.internal".into()),
//!     ..Default::default()
//! };
//! let config = resolve(&options, |_| None).unwrap();
//! assert_eq!(config.driver(), Some("pdo_mysql"));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Driver used when no level of configuration names one.
///
/// SQLite is the only driver with a built-in catalog, so it doubles as the
/// development default.
pub const DEFAULT_DRIVER: &str = "pdo_sqlite";

const DRIVER_PREFIX: &str = "pdo_";

/// Explicitly supplied connection options. `None` means "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverOptions {
    #[serde(rename = "connectionURL", alias = "url")]
    pub connection_url: Option<String>,
    pub driver: Option<String>,
    pub dbname: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub charset: Option<String>,
    pub server_version: Option<String>,
}

impl DriverOptions {
    /// Build options from a generic key/value bag. Unknown keys are ignored.
    pub fn from_map(bag: &BTreeMap<String, String>) -> Self {
        let get = |key: &str| bag.get(key).cloned();
        Self {
            connection_url: get("connectionURL").or_else(|| get("url")),
            driver: get("driver"),
            dbname: get("dbname"),
            host: get("host"),
            port: get("port"),
            user: get("user"),
            password: get("password"),
            charset: get("charset"),
            server_version: get("server_version"),
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        match key {
            "connectionURL" => self.connection_url.as_deref(),
            "driver" => self.driver.as_deref(),
            "dbname" => self.dbname.as_deref(),
            "host" => self.host.as_deref(),
            "port" => self.port.as_deref(),
            "user" => self.user.as_deref(),
            "password" => self.password.as_deref(),
            "charset" => self.charset.as_deref(),
            "server_version" => self.server_version.as_deref(),
            _ => None,
        }
    }
}

/// Canonical database driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriverConfig {
    /// URL-only configuration; every other option was ignored.
    Url { url: String },
    /// Field-by-field configuration.
    Params {
        driver: String,
        dbname: Option<String>,
        host: Option<String>,
        port: Option<u16>,
        user: Option<String>,
        password: Option<String>,
        charset: Option<String>,
        server_version: Option<String>,
        /// True when no level of configuration named a driver.
        #[serde(default)]
        defaulted_driver: bool,
    },
}

impl DriverConfig {
    /// Normalized driver name, `None` for URL configurations.
    pub fn driver(&self) -> Option<&str> {
        match self {
            DriverConfig::Url { .. } => None,
            DriverConfig::Params { driver, .. } => Some(driver),
        }
    }

    /// Whether the driver came from [`DEFAULT_DRIVER`] rather than configuration.
    pub fn is_default_driver(&self) -> bool {
        matches!(
            self,
            DriverConfig::Params {
                defaulted_driver: true,
                ..
            }
        )
    }
}

/// Add the `pdo_` prefix when missing.
pub fn normalize_driver_name(name: &str) -> String {
    let name = name.trim().to_ascii_lowercase();
    if name.starts_with(DRIVER_PREFIX) {
        name
    } else {
        format!("{DRIVER_PREFIX}{name}")
    }
}

fn default_charset(driver: &str) -> Option<String> {
    match driver {
        "pdo_mysql" => Some("utf8mb4".to_string()),
        "pdo_sqlite" => None,
        _ => Some("utf8".to_string()),
    }
}

/// Resolve `options` into a [`DriverConfig`].
///
/// `fallback` is consulted with the option key (`dbname`, `host`,
/// `connectionURL`, ...) for every option that was not supplied explicitly.
///
/// # Errors
///
/// Returns [`Error::Config`] when the port is not a valid TCP port. Blank
/// values count as "not supplied".
pub fn resolve<F>(options: &DriverOptions, fallback: F) -> Result<DriverConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| -> Option<String> {
        let supplied = |v: &String| !v.trim().is_empty();
        options
            .get(key)
            .map(str::to_string)
            .filter(supplied)
            .or_else(|| fallback(key).filter(supplied))
    };

    if let Some(url) = lookup("connectionURL") {
        return Ok(DriverConfig::Url { url });
    }

    let (driver, defaulted_driver) = match lookup("driver") {
        Some(name) => (normalize_driver_name(&name), false),
        None => {
            warn!(driver = DEFAULT_DRIVER, "No driver configured, using default");
            (DEFAULT_DRIVER.to_string(), true)
        }
    };

    let (host, port) = if driver == "pdo_sqlite" {
        (None, None)
    } else {
        let port = lookup("port")
            .map(|raw| {
                raw.trim()
                    .parse::<u16>()
                    .map_err(|_| Error::Config(format!("invalid port '{raw}'")))
            })
            .transpose()?;
        (lookup("host"), port)
    };

    let charset = lookup("charset").or_else(|| default_charset(&driver));

    Ok(DriverConfig::Params {
        dbname: lookup("dbname"),
        host,
        port,
        user: lookup("user"),
        password: lookup("password"),
        charset,
        server_version: lookup("server_version"),
        driver,
        defaulted_driver,
    })
}
