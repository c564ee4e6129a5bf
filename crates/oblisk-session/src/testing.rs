//! Shared fixtures for the unit tests

use oblisk_crypto::Account;
use oblisk_relay::{kind, Event, MemoryNetwork, RelayDirectory, RelayGateway, Tag};
use std::sync::Arc;

use crate::slot::SlotStore;
use crate::store::SessionStore;

pub(crate) const APP_RELAY: &str = "wss://app.relay";
pub(crate) const WRITE_RELAYS: [&str; 2] = ["wss://w1", "wss://w2"];
pub(crate) const PROJECT: &str = "oblisk-sync";

/// An account whose relay list on the app relay declares [`WRITE_RELAYS`]
pub(crate) struct Fixture {
    pub network: Arc<MemoryNetwork>,
    pub account: Account,
    pub directory: Arc<RelayDirectory>,
}

impl Fixture {
    pub fn new() -> Self {
        let network = Arc::new(MemoryNetwork::new());
        let account = Account::generate();

        let tags = WRITE_RELAYS
            .iter()
            .map(|url| Tag::relay(*url, None))
            .collect();
        network.seed(
            APP_RELAY,
            Event::sign_at(&account, kind::RELAY_LIST, tags, "", 1),
        );

        let gateway = Arc::new(RelayGateway::new(network.clone()));
        let directory = Arc::new(RelayDirectory::new(gateway, vec![APP_RELAY.to_string()]));

        Self {
            network,
            account,
            directory,
        }
    }

    pub fn slots(&self) -> Arc<SlotStore> {
        Arc::new(SlotStore::new(self.directory.clone()))
    }

    pub fn store(&self) -> Arc<SessionStore> {
        Arc::new(SessionStore::new(self.slots(), PROJECT))
    }
}
