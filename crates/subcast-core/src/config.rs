//! Configuration types for the subcast relay
//!
//! The on-disk format is a TOML file with one table per category:
//!
//! ```toml
//! [heartbeat]
//! key_regex = "^ping$"
//! notification_lifetime_ms = 60000
//! subscription_lifetime_ms = 180000
//! resend_timeout_ms = 5000
//! port = 5015
//! subscriber_port = 5016
//!
//! [alerts]
//! key = "fire-alarm"   # literal, metacharacters escaped
//! port = 5025
//! subscriber_port = 5026
//! ```
//!
//! Parsing is deliberately tolerant: a table missing both `key` and
//! `key_regex` is skipped with a log line, and a malformed numeric field
//! silently falls back to its default. Only an unreadable or syntactically
//! broken file is an error.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use tracing::warn;

use crate::error::{Error, Result};
use crate::matcher::KeyMatcher;

/// Default notification lifetime: 60 s
pub const DEFAULT_NOTIFICATION_LIFETIME_MS: u64 = 60_000;
/// Default subscription lifetime: 180 s
pub const DEFAULT_SUBSCRIPTION_LIFETIME_MS: u64 = 180_000;
/// Default resend timeout: 5 s
pub const DEFAULT_RESEND_TIMEOUT_MS: u64 = 5_000;
/// Default publish-in port
pub const DEFAULT_PUBLISH_PORT: u16 = 5015;
/// Default subscribe-in / notify-out port
pub const DEFAULT_SUBSCRIBE_PORT: u16 = 5016;

/// Configuration of one category (one pub/sub channel)
#[derive(Debug, Clone)]
pub struct CategoryConfig {
    /// Key pattern as a regular expression (takes precedence over `key`)
    pub key_regex: Option<String>,

    /// Key pattern as a literal string (escaped into a pattern)
    pub key: Option<String>,

    /// How long an activated key stays live (ms)
    pub notification_lifetime_ms: u64,

    /// How long a subscription stays fresh (ms)
    pub subscription_lifetime_ms: u64,

    /// Minimum gap between repeated notifications to one subscriber (ms)
    pub resend_timeout_ms: u64,

    /// Publish-in UDP port
    pub port: u16,

    /// Subscribe-in UDP port, doubling as the notify-out port
    pub subscriber_port: u16,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            key_regex: None,
            key: None,
            notification_lifetime_ms: DEFAULT_NOTIFICATION_LIFETIME_MS,
            subscription_lifetime_ms: DEFAULT_SUBSCRIPTION_LIFETIME_MS,
            resend_timeout_ms: DEFAULT_RESEND_TIMEOUT_MS,
            port: DEFAULT_PUBLISH_PORT,
            subscriber_port: DEFAULT_SUBSCRIBE_PORT,
        }
    }
}

impl CategoryConfig {
    /// Create a config for the given regex pattern, defaults elsewhere
    pub fn with_pattern(pattern: impl Into<String>) -> Self {
        Self {
            key_regex: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Compile the key matcher for this category
    ///
    /// `key_regex` wins over `key`; a `key` literal is escaped. A section
    /// with neither is a configuration error.
    pub fn build_matcher(&self) -> Result<KeyMatcher> {
        if let Some(pattern) = non_blank(&self.key_regex) {
            return KeyMatcher::new(pattern);
        }
        if let Some(literal) = non_blank(&self.key) {
            return KeyMatcher::literal(literal);
        }
        Err(Error::config("no key or key_regex provided"))
    }

    /// Notification lifetime as a [`Duration`]
    pub fn notification_lifetime(&self) -> Duration {
        Duration::from_millis(self.notification_lifetime_ms)
    }

    /// Subscription lifetime as a [`Duration`]
    pub fn subscription_lifetime(&self) -> Duration {
        Duration::from_millis(self.subscription_lifetime_ms)
    }

    /// Resend timeout as a [`Duration`]
    pub fn resend_timeout(&self) -> Duration {
        Duration::from_millis(self.resend_timeout_ms)
    }
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Whole relay configuration: one [`CategoryConfig`] per named section
#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    /// Valid category sections, keyed by section name
    pub categories: BTreeMap<String, CategoryConfig>,
}

impl RelayConfig {
    /// Parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&text)
    }

    /// Parse configuration text
    ///
    /// Invalid sections are skipped (logged), malformed scalar fields fall
    /// back to their defaults. Only unparsable TOML is an error.
    pub fn parse(text: &str) -> Result<Self> {
        let table: toml::Table = text
            .parse()
            .map_err(|e| Error::config(format!("invalid config file: {e}")))?;

        let mut categories = BTreeMap::new();
        for (name, value) in table {
            let Some(section) = value.as_table() else {
                warn!(section = %name, "Config entry is not a table, skipping");
                continue;
            };

            let config = CategoryConfig {
                key_regex: get_string(section, "key_regex"),
                key: get_string(section, "key"),
                notification_lifetime_ms: get_u64(
                    section,
                    &name,
                    "notification_lifetime_ms",
                    DEFAULT_NOTIFICATION_LIFETIME_MS,
                ),
                subscription_lifetime_ms: get_u64(
                    section,
                    &name,
                    "subscription_lifetime_ms",
                    DEFAULT_SUBSCRIPTION_LIFETIME_MS,
                ),
                resend_timeout_ms: get_u64(
                    section,
                    &name,
                    "resend_timeout_ms",
                    DEFAULT_RESEND_TIMEOUT_MS,
                ),
                port: get_port(section, &name, "port", DEFAULT_PUBLISH_PORT),
                subscriber_port: get_port(
                    section,
                    &name,
                    "subscriber_port",
                    DEFAULT_SUBSCRIBE_PORT,
                ),
            };

            if config.key_regex.is_none() && config.key.is_none() {
                warn!(
                    section = %name,
                    "Section is invalid, no key or key_regex provided"
                );
                continue;
            }

            categories.insert(name, config);
        }

        Ok(Self { categories })
    }

    /// Whether no valid category section was found
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

fn get_string(section: &toml::Table, field: &str) -> Option<String> {
    section
        .get(field)
        .and_then(toml::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn get_u64(section: &toml::Table, name: &str, field: &str, default: u64) -> u64 {
    match section.get(field) {
        None => default,
        Some(value) => match value.as_integer().and_then(|n| u64::try_from(n).ok()) {
            Some(n) => n,
            None => {
                warn!(
                    section = name,
                    field,
                    default,
                    "Malformed numeric field, using default"
                );
                default
            }
        },
    }
}

fn get_port(section: &toml::Table, name: &str, field: &str, default: u16) -> u16 {
    match section.get(field) {
        None => default,
        Some(value) => match value.as_integer().and_then(|n| u16::try_from(n).ok()) {
            Some(n) => n,
            None => {
                warn!(
                    section = name,
                    field,
                    default,
                    "Malformed port field, using default"
                );
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_without_key_is_skipped() {
        let config = RelayConfig::parse(
            r#"
            [good]
            key = "ping"

            [bad]
            port = 6000
            "#,
        )
        .unwrap();

        assert_eq!(config.categories.len(), 1);
        assert!(config.categories.contains_key("good"));
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let config = RelayConfig::parse(
            r#"
            [heartbeat]
            key_regex = "^ping$"
            notification_lifetime_ms = "soon"
            resend_timeout_ms = -2
            port = 70000
            "#,
        )
        .unwrap();

        let section = &config.categories["heartbeat"];
        assert_eq!(
            section.notification_lifetime_ms,
            DEFAULT_NOTIFICATION_LIFETIME_MS
        );
        assert_eq!(section.resend_timeout_ms, DEFAULT_RESEND_TIMEOUT_MS);
        assert_eq!(section.port, DEFAULT_PUBLISH_PORT);
    }

    #[test]
    fn explicit_fields_are_honored() {
        let config = RelayConfig::parse(
            r#"
            [alerts]
            key_regex = "^alert-[0-9]+$"
            notification_lifetime_ms = 30000
            subscription_lifetime_ms = 90000
            resend_timeout_ms = 2500
            port = 6015
            subscriber_port = 6016
            "#,
        )
        .unwrap();

        let section = &config.categories["alerts"];
        assert_eq!(section.notification_lifetime(), Duration::from_secs(30));
        assert_eq!(section.subscription_lifetime(), Duration::from_secs(90));
        assert_eq!(section.resend_timeout_ms, 2_500);
        assert_eq!(section.port, 6015);
        assert_eq!(section.subscriber_port, 6016);
    }

    #[test]
    fn key_regex_takes_precedence_over_literal_key() {
        let config = CategoryConfig {
            key_regex: Some("^a+$".to_string()),
            key: Some("zzz".to_string()),
            ..CategoryConfig::default()
        };

        let matcher = config.build_matcher().unwrap();
        assert!(matcher.matches("aaa"));
        assert!(!matcher.matches("zzz"));
    }

    #[test]
    fn blank_pattern_fields_count_as_absent() {
        let config = CategoryConfig {
            key_regex: Some("   ".to_string()),
            key: None,
            ..CategoryConfig::default()
        };

        assert!(config.build_matcher().is_err());
    }

    #[test]
    fn broken_toml_is_an_error() {
        assert!(RelayConfig::parse("[unterminated").is_err());
    }

    #[test]
    fn load_reads_a_file_from_disk() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[heartbeat]\nkey = \"ping\"").unwrap();

        let config = RelayConfig::load(file.path()).unwrap();
        assert_eq!(config.categories.len(), 1);

        let missing = RelayConfig::load(Path::new("/nonexistent/subcast.toml"));
        assert!(missing.is_err());
    }
}
