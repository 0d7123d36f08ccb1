use std::{env, time::Duration};

use log::*;

const DEFAULT_MKT_HOST: &str = "127.0.0.1";
const DEFAULT_MKT_PORT: u16 = 8360;
const DEFAULT_POOL_SIZE: u32 = 25;
const DEFAULT_SETTLEMENT_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_ALERT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_pool_size: u32,
    /// How often the settlement sweep looks for expired listings.
    pub settlement_interval: Duration,
    /// How often the near-close scan looks for auctions entering their final window.
    pub alert_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MKT_HOST.to_string(),
            port: DEFAULT_MKT_PORT,
            database_url: String::default(),
            database_pool_size: DEFAULT_POOL_SIZE,
            settlement_interval: DEFAULT_SETTLEMENT_INTERVAL,
            alert_interval: DEFAULT_ALERT_INTERVAL,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MKT_HOST").ok().unwrap_or_else(|| DEFAULT_MKT_HOST.into());
        let port = parse_var("MKT_PORT", DEFAULT_MKT_PORT);
        let database_url = env::var("MKT_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ MKT_DATABASE_URL is not set. Please set it to the URL for the marketplace database.");
            String::default()
        });
        let database_pool_size = parse_var("MKT_DATABASE_POOL_SIZE", DEFAULT_POOL_SIZE);
        let settlement_interval = Duration::from_secs(parse_var(
            "MKT_SETTLEMENT_INTERVAL_SECS",
            DEFAULT_SETTLEMENT_INTERVAL.as_secs(),
        ));
        let alert_interval =
            Duration::from_secs(parse_var("MKT_ALERT_INTERVAL_SECS", DEFAULT_ALERT_INTERVAL.as_secs()));
        Self { host, port, database_url, database_pool_size, settlement_interval, alert_interval }
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => parse_value(name, &s, default),
        Err(_) => default,
    }
}

fn parse_value<T>(name: &str, raw: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().unwrap_or_else(|e| {
        error!("🪛️ {raw} is not a valid value for {name}. {e} Using the default, {default}, instead.");
        default
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        assert_eq!(parse_value("MKT_PORT", "not-a-port", DEFAULT_MKT_PORT), DEFAULT_MKT_PORT);
        assert_eq!(parse_value("MKT_PORT", "70000", DEFAULT_MKT_PORT), DEFAULT_MKT_PORT);
        assert_eq!(
            parse_value("MKT_SETTLEMENT_INTERVAL_SECS", "-5", DEFAULT_SETTLEMENT_INTERVAL.as_secs()),
            DEFAULT_SETTLEMENT_INTERVAL.as_secs()
        );
    }

    #[test]
    fn well_formed_values_are_used_verbatim() {
        assert_eq!(parse_value("MKT_PORT", "8080", DEFAULT_MKT_PORT), 8080);
        assert_eq!(parse_value("MKT_DATABASE_POOL_SIZE", "4", DEFAULT_POOL_SIZE), 4);
    }
}
