//! Account lifecycle

use oblisk_crypto::Account;
use oblisk_storage::keys;

use crate::engine::Engine;
use crate::Result;

impl Engine {
    /// The account whose keys are in local state, if any
    pub(crate) fn stored_account(&self) -> Result<Option<Account>> {
        match self.db.get(keys::HEX_PRIV_KEY)? {
            Some(secret) => Ok(Some(Account::from_secret_hex(&secret)?)),
            None => Ok(None),
        }
    }

    pub fn has_account(&self) -> Result<bool> {
        Ok(self.db.get(keys::HEX_PRIV_KEY)?.is_some())
    }

    pub fn public_key(&self) -> Result<Option<String>> {
        Ok(self.db.get(keys::HEX_PUB)?)
    }

    /// Generate a keypair, advertise the default relays for it and sign in.
    /// Returns the public key.
    pub async fn create_account(&self) -> Result<String> {
        let account = Account::generate();

        self.directory
            .advertise(&account, &self.config.default_relay_map())
            .await?;
        self.sign_in(account)
    }

    /// Sign in with an existing secret key, then try to bind the focused
    /// window to one of the account's sessions
    pub async fn import_account(&self, secret_hex: &str) -> Result<String> {
        let account = Account::from_secret_hex(secret_hex.trim())?;
        let public = self.sign_in(account)?;

        match self.windows.current_window().await {
            Ok(window) => {
                if let Err(e) = self.tracker.try_match(window).await {
                    tracing::warn!(window_id = window, error = %e, "Match after import failed");
                }
            }
            Err(e) => tracing::debug!(error = %e, "No focused window to match"),
        }
        Ok(public)
    }

    fn sign_in(&self, account: Account) -> Result<String> {
        let public = account.public_hex();

        self.db.set(keys::HEX_PRIV_KEY, &account.secret_hex())?;
        self.db.set(keys::HEX_PUB, &public)?;
        self.directory.cache().invalidate();
        self.tracker.set_account(Some(account));

        tracing::info!(pubkey = %public, "Signed in");
        Ok(public)
    }

    /// Drop every relay connection and all local state
    pub async fn sign_out(&self) -> Result<()> {
        let mut relays = self.config.app_relay_urls();
        if let Some(public) = self.public_key()? {
            if let Some(resolved) = self.directory.cache().get(&public) {
                relays.extend(resolved);
            }
        }

        self.directory.gateway().close(&relays).await;
        self.directory.cache().invalidate();
        self.tracker.reset();
        self.db.clear()?;

        tracing::info!("Signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::tests::{Harness, APP_RELAY, USER_RELAYS};
    use crate::error::CoreError;
    use oblisk_crypto::{derive_public, Account};
    use oblisk_relay::{kind, Filter, RelayPermissions};
    use oblisk_storage::{keys, Database};
    use oblisk_tabs::WindowManager;

    #[tokio::test]
    async fn test_create_account_advertises_default_relays() {
        let harness = Harness::new();
        assert!(!harness.engine.has_account().unwrap());

        let public = harness.engine.create_account().await.unwrap();
        assert!(harness.engine.has_account().unwrap());
        assert_eq!(harness.engine.public_key().unwrap(), Some(public.clone()));

        let stored = harness.network.events_on(APP_RELAY);
        let contacts = stored
            .iter()
            .find(|e| Filter::new().kind(kind::CONTACTS).matches(e))
            .unwrap();
        let relay_list = stored
            .iter()
            .find(|e| Filter::new().kind(kind::RELAY_LIST).matches(e))
            .unwrap();
        assert_eq!(contacts.pubkey, public);
        assert_eq!(relay_list.tag_values("r").count(), USER_RELAYS.len());

        let relays = harness
            .engine
            .directory()
            .resolve_write_relays(&public)
            .await
            .unwrap();
        assert_eq!(relays, USER_RELAYS.map(String::from).to_vec());

        let declared = harness.engine.directory().user_relays(&public).await.unwrap();
        assert!(declared
            .values()
            .all(|flags| *flags == RelayPermissions::default()));
    }

    #[tokio::test]
    async fn test_import_account() {
        let harness = Harness::new();
        let source = Account::generate();
        let secret = source.secret_hex();

        let public = harness.engine.import_account(&secret).await.unwrap();
        assert_eq!(public, derive_public(&secret).unwrap());
        assert_eq!(
            harness.db.get(keys::HEX_PRIV_KEY).unwrap().as_deref(),
            Some(secret.as_str())
        );
    }

    #[tokio::test]
    async fn test_import_rejects_bad_key() {
        let harness = Harness::new();
        let result = harness.engine.import_account("not hex").await;
        assert!(matches!(result, Err(CoreError::Crypto(_))));
        assert!(!harness.engine.has_account().unwrap());
    }

    #[tokio::test]
    async fn test_import_binds_matching_window() {
        let first = Harness::new();
        let secret = {
            first.engine.create_account().await.unwrap();
            first.db.get(keys::HEX_PRIV_KEY).unwrap().unwrap()
        };
        let window = first.browser.open_window(&["https://a", "https://b"]);
        first.engine.save_new_session(window, "work").await.unwrap();

        // another device on the same relays
        let second = Harness::with_parts(first.network.clone(), Database::open_in_memory().unwrap());
        let window = second.browser.open_window(&["https://a", "https://b"]);
        second.engine.import_account(&secret).await.unwrap();

        assert_eq!(
            second.engine.tracker().binding(window).unwrap().session_name,
            "work"
        );
    }

    #[tokio::test]
    async fn test_sign_out_clears_everything() {
        let harness = Harness::signed_in().await;
        let window = harness.browser.open_window(&["https://a"]);
        harness.engine.save_new_session(window, "work").await.unwrap();

        harness.engine.sign_out().await.unwrap();

        assert!(!harness.engine.has_account().unwrap());
        assert!(harness.engine.tracker().binding(window).is_none());
        assert_eq!(harness.engine.tracker().last_tracked().unwrap(), None);
        assert!(matches!(
            harness.engine.load_sessions().await,
            Err(CoreError::NoAccount)
        ));

        let disconnected = harness.network.disconnected();
        assert!(disconnected.contains(&APP_RELAY.to_string()));
        for relay in USER_RELAYS {
            assert!(disconnected.contains(&relay.to_string()));
        }

        // the window itself is untouched
        assert_eq!(harness.browser.tabs(window).await.unwrap().len(), 1);
    }
}
