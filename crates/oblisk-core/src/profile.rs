//! Profile metadata and the home view summary

use oblisk_relay::{kind, Event, Filter};
use oblisk_tabs::WindowId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::Engine;
use crate::Result;

const UNSAVED_SESSION: &str = "<Unsaved session>";
const DEFAULT_BANNER: &str = "https://nostr.build/i/nostr.build_b50139c838fdb4834486fdeb25687eef9d5ae2b961aac097a40770c3d584f614.jpg";

/// Public metadata of an account. Fields other than the seven known ones are
/// kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nip05: Option<String>,
    /// Lightning address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lud16: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Profile {
    fn known_fields(&self) -> [(&'static str, &Option<String>); 7] {
        [
            ("name", &self.name),
            ("display_name", &self.display_name),
            ("nip05", &self.nip05),
            ("banner", &self.banner),
            ("picture", &self.picture),
            ("lud16", &self.lud16),
            ("about", &self.about),
        ]
    }
}

/// What the home view shows for one window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeStatus {
    /// `@<session name>` when the window is bound
    pub session: String,
    pub name: Option<String>,
    pub display_name: String,
    pub banner: String,
    pub picture: String,
}

impl Engine {
    pub async fn load_profile(&self) -> Result<Option<Profile>> {
        let account = self.account()?;
        self.load_profile_of(&account.public_hex()).await
    }

    /// Profile published by any author, read from that author's write relays
    pub async fn load_profile_of(&self, pubkey: &str) -> Result<Option<Profile>> {
        match self.metadata_content(pubkey).await? {
            Some(content) => Ok(Some(serde_json::from_str(&content)?)),
            None => Ok(None),
        }
    }

    async fn metadata_content(&self, pubkey: &str) -> Result<Option<String>> {
        let relays = self.directory.resolve_write_relays(pubkey).await?;
        let filter = Filter::new().kind(kind::METADATA).author(pubkey);
        let event = self.directory.gateway().query(&relays, &filter).await?;
        Ok(event.map(|event| event.content))
    }

    /// Overlay the seven known fields of `update` on the published profile
    /// and publish the result. A field left `None` is cleared.
    pub async fn set_profile(&self, update: &Profile) -> Result<Profile> {
        let account = self.account()?;
        let public = account.public_hex();

        let mut content = match self.metadata_content(&public).await? {
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(fields)) => fields,
                _ => {
                    tracing::warn!(pubkey = %public, "Discarding unreadable profile content");
                    Map::new()
                }
            },
            None => Map::new(),
        };
        for (key, value) in update.known_fields() {
            content.insert(key.to_string(), serde_json::to_value(value)?);
        }

        let json = serde_json::to_string(&content)?;
        let relays = self.directory.resolve_write_relays(&public).await?;
        let event = Event::sign(&account, kind::METADATA, Vec::new(), json);
        self.directory.gateway().publish(&relays, &event).await;

        tracing::info!(pubkey = %public, event_id = %event.id, "Profile published");
        Ok(serde_json::from_value(Value::Object(content))?)
    }

    /// Profile summary for the home view. An unbound window is matched
    /// against the stored sessions first, and the account's relays are
    /// resolved afresh.
    pub async fn home_status(&self, window: WindowId) -> Result<HomeStatus> {
        let account = self.account()?;
        let public = account.public_hex();

        if self.tracker.binding(window).is_none() {
            if let Err(e) = self.tracker.try_match(window).await {
                tracing::warn!(window_id = window, error = %e, "Match from home view failed");
            }
        }
        let session = match self.tracker.binding(window) {
            Some(binding) => format!("@{}", binding.session_name),
            None => UNSAVED_SESSION.to_string(),
        };

        self.directory.cache().invalidate();
        let profile = self.load_profile_of(&public).await?.unwrap_or_default();

        Ok(HomeStatus {
            session,
            display_name: profile.display_name.unwrap_or_else(|| public.clone()),
            banner: profile
                .banner
                .unwrap_or_else(|| DEFAULT_BANNER.to_string()),
            picture: profile
                .picture
                .unwrap_or_else(|| format!("https://robohash.org/{public}")),
            name: profile.name,
        })
    }
}
