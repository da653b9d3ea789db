use crate::error::ConfigError;
use crate::progress::DEFAULT_REPORT_INTERVAL;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

/// Runtime settings, read from `TIMETABLE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Catalogue JSON file.
    pub data_path: PathBuf,
    /// Progress batching threshold, in combinations.
    pub report_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            data_path: PathBuf::from("data.json"),
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Config::from_env`] with an explicit variable source.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let report_interval =
            parse_var(&lookup, "TIMETABLE_REPORT_INTERVAL", defaults.report_interval)?;
        if report_interval == 0 {
            return Err(ConfigError::Invalid {
                name: "TIMETABLE_REPORT_INTERVAL",
                value: "0".into(),
                reason: "must be positive".into(),
            });
        }

        Ok(Self {
            host: parse_var(&lookup, "TIMETABLE_HOST", defaults.host)?,
            port: parse_var(&lookup, "TIMETABLE_PORT", defaults.port)?,
            data_path: lookup("TIMETABLE_DATA").map(PathBuf::from).unwrap_or(defaults.data_path),
            report_interval,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<L, T>(lookup: &L, name: &'static str, default: T) -> Result<T, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}
