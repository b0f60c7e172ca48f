use std::env;
use std::path::PathBuf;
use thiserror::Error;
use wecom_relay_core::AccountContext;
use wecom_relay_core::account::{DEFAULT_API_BASE, DEFAULT_RECIPIENT};

const DEFAULT_MQTT_PORT: u16 = 1883;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct ServerConfig {
    pub account: AccountContext,
    pub api_key: String,
    pub host: String,
    pub port: u16,
    pub mqtt: Option<MqttConfig>,
    pub log: LogConfig,
}

#[derive(Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub topic: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub dir: PathBuf,
    pub rotate: bool,
    pub max_age_days: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: PathBuf::from("./logs"),
            rotate: true,
            max_age_days: 30,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from a variable lookup. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let corp_id = require("WECOM_CORP_ID")?;
        let secret = require("WECOM_SECRET")?;
        let agent_id = parse("WECOM_AGENT_ID", &require("WECOM_AGENT_ID")?)?;

        let account = AccountContext::new(corp_id, secret, agent_id)
            .with_default_recipient(
                get("WECOM_TO_USER").unwrap_or_else(|| DEFAULT_RECIPIENT.to_string()),
            )
            .with_api_base(get("WECOM_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()));

        let api_key = require("API_KEY")?;
        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get("PORT") {
            Some(value) => parse("PORT", &value)?,
            None => 8080,
        };

        let mqtt = match get("MQTT_BROKER") {
            Some(broker) => {
                let (host, port) = parse_broker(&broker)?;
                let username = get("MQTT_USERNAME");
                Some(MqttConfig {
                    host,
                    port,
                    client_id: get("MQTT_CLIENT_ID").unwrap_or_else(|| "wecom-notifier".to_string()),
                    topic: get("MQTT_TOPIC").unwrap_or_else(|| "wecom/notify".to_string()),
                    password: username
                        .as_ref()
                        .map(|_| lookup("MQTT_PASSWORD").unwrap_or_default()),
                    username,
                })
            }
            None => None,
        };

        let defaults = LogConfig::default();
        let log = LogConfig {
            level: get("LOG_LEVEL").unwrap_or(defaults.level),
            dir: get("LOG_DIR").map(PathBuf::from).unwrap_or(defaults.dir),
            rotate: get("LOG_ROTATE")
                .map(|value| value == "true")
                .unwrap_or(defaults.rotate),
            max_age_days: match get("LOG_MAX_AGE_DAYS") {
                Some(value) => parse("LOG_MAX_AGE_DAYS", &value)?,
                None => defaults.max_age_days,
            },
        };

        Ok(Self {
            account,
            api_key,
            host,
            port,
            mqtt,
            log,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("account", &self.account)
            .field("api_key", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("mqtt", &self.mqtt)
            .field("log", &self.log)
            .finish()
    }
}

impl std::fmt::Debug for MqttConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("client_id", &self.client_id)
            .field("topic", &self.topic)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

/// Accepts `tcp://host:port`, `mqtt://host:port` or `host[:port]`.
fn parse_broker(value: &str) -> Result<(String, u16), ConfigError> {
    let address = value
        .strip_prefix("tcp://")
        .or_else(|| value.strip_prefix("mqtt://"))
        .unwrap_or(value)
        .trim_end_matches('/');

    let (host, port) = match address.rsplit_once(':') {
        Some((host, port)) => (host, parse("MQTT_BROKER", port)?),
        None => (address, DEFAULT_MQTT_PORT),
    };

    if host.is_empty() || address.contains("://") {
        return Err(ConfigError::Invalid {
            name: "MQTT_BROKER",
            value: value.to_string(),
        });
    }
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("WECOM_CORP_ID", "ww123"),
        ("WECOM_SECRET", "s3cr3t"),
        ("WECOM_AGENT_ID", "1000002"),
        ("API_KEY", "key-1"),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        REQUIRED.iter().chain(extra.iter()).copied().collect()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = ServerConfig::from_lookup(lookup(REQUIRED)).unwrap();

        assert_eq!(config.account.corp_id, "ww123");
        assert_eq!(config.account.agent_id, 1000002);
        assert_eq!(config.account.default_recipient, "@all");
        assert_eq!(config.account.api_base, DEFAULT_API_BASE);
        assert_eq!(config.api_key, "key-1");
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert!(config.mqtt.is_none());
        assert_eq!(config.log.level, "info");
        assert!(config.log.rotate);
        assert_eq!(config.log.max_age_days, 30);
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let vars: Vec<_> = REQUIRED
            .iter()
            .filter(|(k, _)| *k != "WECOM_SECRET")
            .copied()
            .collect();
        let err = ServerConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("WECOM_SECRET"));
    }

    #[test]
    fn test_empty_api_key_is_missing() {
        let vars = with(&[("API_KEY", "")]);
        // later entries win in the HashMap
        let err = ServerConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("API_KEY"));
    }

    #[test]
    fn test_non_numeric_agent_id_is_fatal() {
        let vars = with(&[("WECOM_AGENT_ID", "abc")]);
        let err = ServerConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "WECOM_AGENT_ID",
                value: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_port_is_fatal() {
        let vars = with(&[("PORT", "eighty")]);
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
    }

    #[test]
    fn test_mqtt_section() {
        let vars = with(&[
            ("MQTT_BROKER", "tcp://broker.local:1884"),
            ("MQTT_USERNAME", "relay"),
            ("MQTT_PASSWORD", "pw"),
            ("MQTT_TOPIC", "alerts/wecom"),
        ]);
        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();
        let mqtt = config.mqtt.unwrap();

        assert_eq!(mqtt.host, "broker.local");
        assert_eq!(mqtt.port, 1884);
        assert_eq!(mqtt.client_id, "wecom-notifier");
        assert_eq!(mqtt.topic, "alerts/wecom");
        assert_eq!(mqtt.username.as_deref(), Some("relay"));
        assert_eq!(mqtt.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_mqtt_password_ignored_without_username() {
        let vars = with(&[("MQTT_BROKER", "broker.local"), ("MQTT_PASSWORD", "pw")]);
        let mqtt = ServerConfig::from_lookup(lookup(&vars)).unwrap().mqtt.unwrap();
        assert_eq!(mqtt.port, 1883);
        assert!(mqtt.username.is_none());
        assert!(mqtt.password.is_none());
    }

    #[test]
    fn test_parse_broker_forms() {
        assert_eq!(
            parse_broker("mqtt://10.0.0.5:1883").unwrap(),
            ("10.0.0.5".to_string(), 1883)
        );
        assert_eq!(
            parse_broker("localhost").unwrap(),
            ("localhost".to_string(), 1883)
        );
        assert!(parse_broker("ws://host:80").is_err());
        assert!(parse_broker("tcp://:1883").is_err());
        assert!(parse_broker("host:notaport").is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let vars = with(&[
            ("MQTT_BROKER", "broker"),
            ("MQTT_USERNAME", "u"),
            ("MQTT_PASSWORD", "mqtt-pass"),
        ]);
        let config = ServerConfig::from_lookup(lookup(&vars)).unwrap();
        let debug = format!("{:?}", config);

        assert!(!debug.contains("key-1"));
        assert!(!debug.contains("s3cr3t"));
        assert!(!debug.contains("mqtt-pass"));
    }

    #[test]
    fn test_log_settings() {
        let vars = with(&[
            ("LOG_LEVEL", "debug"),
            ("LOG_DIR", "/var/log/wecom"),
            ("LOG_ROTATE", "false"),
            ("LOG_MAX_AGE_DAYS", "7"),
        ]);
        let log = ServerConfig::from_lookup(lookup(&vars)).unwrap().log;
        assert_eq!(log.level, "debug");
        assert_eq!(log.dir, PathBuf::from("/var/log/wecom"));
        assert!(!log.rotate);
        assert_eq!(log.max_age_days, 7);
    }
}
