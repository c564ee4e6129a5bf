//! Engine configuration

use oblisk_relay::{RelayEndpoint, RelayPermissions};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

const APP_RELAYS: &[(&str, bool, bool)] = &[
    ("wss://relay.snort.social", true, true),
    ("wss://relay.damus.io", true, true),
    ("wss://relay.primal.net", true, true),
    ("wss://n.ok0.org", true, true),
    ("wss://nostr.cheeserobot.org", true, true),
    ("wss://nostr.cercatrova.me", true, true),
    ("wss://nostr.swiss-enigma.ch", true, true),
    ("wss://relay.nostr.band", true, true),
    ("wss://purplepag.es", true, true),
    ("wss://nostr.mutinywallet.com", false, true),
];

const DATA_DIR_ENV: &str = "OBLISK_DATA_DIR";

const DEFAULT_USER_RELAYS: &[&str] = &[
    "wss://n.ok0.org",
    "wss://relay.primal.net",
    "wss://nostr.cheeserobot.org",
    "wss://nostr.cercatrova.me",
    "wss://nostr.swiss-enigma.ch",
    "wss://relay.nostr.band",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the local state database
    pub database_path: PathBuf,
    /// Relays holding relay lists and contact lists
    pub app_relays: Vec<RelayEndpoint>,
    /// Relays advertised for a freshly created account
    pub default_relays: Vec<RelayEndpoint>,
    /// Quiet period before a changed window is written back
    pub debounce_delay_ms: u64,
    pub query_timeout_ms: u64,
    pub publish_timeout_ms: u64,
    /// Bind newly opened windows whose tabs equal a stored session
    pub try_match_on_open: bool,
    /// Prefix of every record tag
    pub project: String,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("oblisk.db"),
            app_relays: APP_RELAYS
                .iter()
                .map(|(url, read, write)| RelayEndpoint::new(*url, *read, *write))
                .collect(),
            default_relays: DEFAULT_USER_RELAYS
                .iter()
                .map(|url| RelayEndpoint::new(*url, true, true))
                .collect(),
            debounce_delay_ms: 2000,
            query_timeout_ms: 4000,
            publish_timeout_ms: 4000,
            try_match_on_open: true,
            project: "oblisk-sync".to_string(),
        }
    }

    /// `OBLISK_DATA_DIR` when set, else `Oblisk` under the platform's local
    /// data directory
    pub fn data_dir() -> PathBuf {
        Self::data_dir_from(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
    }

    fn data_dir_from(explicit: Option<PathBuf>) -> PathBuf {
        if let Some(dir) = explicit.filter(|dir| !dir.as_os_str().is_empty()) {
            return dir;
        }
        match dirs::data_local_dir() {
            Some(base) => base.join("Oblisk"),
            None => {
                tracing::warn!("No local data directory, using ./.oblisk");
                PathBuf::from(".oblisk")
            }
        }
    }

    pub fn app_relay_urls(&self) -> Vec<String> {
        self.app_relays.iter().map(|relay| relay.url.clone()).collect()
    }

    pub fn default_relay_map(&self) -> BTreeMap<String, RelayPermissions> {
        self.default_relays
            .iter()
            .map(|relay| (relay.url.clone(), relay.permissions()))
            .collect()
    }

    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new(PathBuf::from("/tmp/oblisk"));
        assert_eq!(config.database_path, PathBuf::from("/tmp/oblisk/oblisk.db"));
        assert_eq!(config.quiet_period(), Duration::from_secs(2));
        assert_eq!(config.query_timeout(), Duration::from_secs(4));
        assert!(config.try_match_on_open);
        assert_eq!(config.project, "oblisk-sync");
    }

    #[test]
    fn test_relay_sets() {
        let config = Config::new(PathBuf::from("/tmp/oblisk"));
        assert_eq!(config.app_relay_urls().len(), 10);

        let mutiny = config
            .app_relays
            .iter()
            .find(|relay| relay.url == "wss://nostr.mutinywallet.com")
            .unwrap();
        assert!(!mutiny.read);
        assert!(mutiny.write);

        let defaults = config.default_relay_map();
        assert_eq!(defaults.len(), 6);
        assert!(defaults.values().all(|flags| flags.read && flags.write));
    }

    #[test]
    fn test_data_dir_override() {
        assert_eq!(
            Config::data_dir_from(Some(PathBuf::from("/srv/oblisk"))),
            PathBuf::from("/srv/oblisk")
        );

        let fallback = Config::data_dir_from(Some(PathBuf::new()));
        assert_eq!(fallback, Config::data_dir_from(None));
        assert!(fallback.ends_with("Oblisk") || fallback == PathBuf::from(".oblisk"));
    }

    #[test]
    fn test_serde_round_trip() {
        let config = Config::new(PathBuf::from("/tmp/oblisk"));
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.app_relays, config.app_relays);
        assert_eq!(parsed.debounce_delay_ms, 2000);
    }
}
