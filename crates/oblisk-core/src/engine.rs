//! Background coordinator
//!
//! Owns the relay stack, the session store and the tracker, and exposes the
//! operations a browser front end calls. Nothing here holds a lock across an
//! await; every shared piece is behind its own `Arc`.

use oblisk_crypto::Account;
use oblisk_relay::{RelayDirectory, RelayGateway, RelayTransport, WebSocketTransport};
use oblisk_session::{
    ActiveSessionTracker, BadgeSink, Binding, Session, SessionError, SessionIndexEntry,
    SessionStore, SlotStore,
};
use oblisk_storage::Database;
use oblisk_tabs::{BrowserEvent, NewTab, Tab, WindowId, WindowManager};
use std::sync::Arc;

use crate::config::Config;
use crate::error::CoreError;
use crate::settings::Settings;
use crate::Result;

pub struct Engine {
    pub(crate) config: Config,
    pub(crate) db: Database,
    pub(crate) directory: Arc<RelayDirectory>,
    pub(crate) store: Arc<SessionStore>,
    pub(crate) windows: Arc<dyn WindowManager>,
    pub(crate) tracker: ActiveSessionTracker,
}

impl Engine {
    /// Open the database at `config.database_path` and talk to relays over
    /// WebSockets
    pub fn open(
        config: Config,
        windows: Arc<dyn WindowManager>,
        badge: Arc<dyn BadgeSink>,
    ) -> Result<Self> {
        let db = Database::open(&config.database_path)?;
        Self::new(config, db, Arc::new(WebSocketTransport::new()), windows, badge)
    }

    pub fn new(
        config: Config,
        db: Database,
        transport: Arc<dyn RelayTransport>,
        windows: Arc<dyn WindowManager>,
        badge: Arc<dyn BadgeSink>,
    ) -> Result<Self> {
        if config.app_relays.is_empty() {
            return Err(CoreError::Config("no app relays configured".to_string()));
        }

        let gateway = Arc::new(
            RelayGateway::new(transport)
                .with_timeouts(config.query_timeout(), config.publish_timeout()),
        );
        let directory = Arc::new(RelayDirectory::new(gateway, config.app_relay_urls()));
        let slots = Arc::new(SlotStore::new(directory.clone()));
        let store = Arc::new(SessionStore::new(slots, config.project.clone()));

        let tracker = ActiveSessionTracker::new(
            db.clone(),
            store.clone(),
            windows.clone(),
            badge,
            config.quiet_period(),
        )?
        .with_try_match(config.try_match_on_open);

        let engine = Self {
            config,
            db,
            directory,
            store,
            windows,
            tracker,
        };
        engine.tracker.set_account(engine.stored_account()?);

        tracing::info!(
            app_relays = engine.config.app_relays.len(),
            signed_in = engine.has_account()?,
            "Engine initialized"
        );
        Ok(engine)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn directory(&self) -> &Arc<RelayDirectory> {
        &self.directory
    }

    pub fn tracker(&self) -> &ActiveSessionTracker {
        &self.tracker
    }

    pub(crate) fn account(&self) -> Result<Account> {
        self.stored_account()?.ok_or(CoreError::NoAccount)
    }

    /// At startup either reopen the last tracked session in `window` or bind
    /// `window` to a stored session with the same tabs
    pub async fn on_startup(&self, window: WindowId) -> Result<()> {
        let _guard = self.tracker.begin_restore();

        if self.load_settings()?.restore_last_session {
            self.restore_last_session(window).await?;
        } else if self.has_account()? {
            self.tracker.try_match(window).await?;
        }
        Ok(())
    }

    pub async fn handle_event(&self, event: &BrowserEvent) -> Result<()> {
        self.tracker.handle_event(event).await?;
        Ok(())
    }

    /// Store the tabs of `window` as a new session called `name` and bind
    /// the window to it
    pub async fn save_new_session(
        &self,
        window: WindowId,
        name: &str,
    ) -> Result<Vec<SessionIndexEntry>> {
        let account = self.account()?;
        let tabs = self.windows.tabs(window).await?;
        let session = Session::new(name, tabs);

        let entries = self.store.create(&account, &session).await?;
        self.tracker.bind(window, &session.id, &session.name)?;
        Ok(entries)
    }

    /// Store an unbound window under a generated name. Returns `None` when
    /// the window is already bound.
    pub async fn save_untracked_session(&self, window: WindowId) -> Result<Option<Session>> {
        if self.tracker.binding(window).is_some() {
            return Ok(None);
        }

        let account = self.account()?;
        let tabs = self.windows.tabs(window).await?;
        let session = Session::untracked(tabs);

        self.store.create(&account, &session).await?;
        self.tracker.bind(window, &session.id, &session.name)?;
        Ok(Some(session))
    }

    /// Open `session_id` in a new maximized window, bound to the session.
    ///
    /// The lowest-indexed tab becomes the window's first tab; every other
    /// tab is opened in the background at its recorded position and pinned
    /// as recorded. The recorded active tab is activated.
    pub async fn restore_session(&self, session_id: &str) -> Result<WindowId> {
        let account = self.account()?;
        let session = self
            .store
            .get(&account, session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;

        let _guard = self.tracker.begin_restore();

        let mut tabs = session.tabs.clone();
        tabs.sort_by_key(|tab| tab.index);

        let mut rest = tabs.iter();
        let first_url = rest.next().map(Tab::url_or_blank).unwrap_or("about:blank");
        let window = self.windows.create_window(first_url, true).await?;

        for tab in rest {
            let created = self
                .windows
                .create_tab(
                    window,
                    NewTab {
                        url: tab.url.clone(),
                        active: false,
                        pinned: tab.pinned,
                        index: Some(tab.index),
                    },
                )
                .await?;
            if tab.active {
                self.windows.activate_tab(created).await?;
            }
        }

        self.tracker.bind(window, &session.id, &session.name)?;
        tracing::info!(
            window_id = window,
            session_id = %session.id,
            tabs = tabs.len(),
            "Restored session"
        );
        Ok(window)
    }

    /// Reopen the last tracked session inside `window`. The pointer is
    /// consumed even when the session no longer exists.
    pub async fn restore_last_session(&self, window: WindowId) -> Result<Option<Binding>> {
        let Some(session_id) = self.tracker.last_tracked()? else {
            return Ok(None);
        };

        let account = self.account()?;
        let session = self.store.get(&account, &session_id).await?;
        self.tracker.forget_last_tracked()?;

        let Some(session) = session else {
            tracing::warn!(session_id = %session_id, "Last tracked session no longer exists");
            return Ok(None);
        };

        let _guard = self.tracker.begin_restore();
        self.tracker.bind(window, &session.id, &session.name)?;

        let mut first = None;
        for tab in &session.tabs {
            let created = self
                .windows
                .create_tab(window, NewTab::background(tab.url.clone()))
                .await?;
            first.get_or_insert(created);
        }
        if let Some(tab) = first {
            self.windows.activate_tab(tab).await?;
        }

        tracing::info!(window_id = window, session_id = %session.id, "Restored last session");
        Ok(self.tracker.binding(window))
    }

    pub async fn load_sessions(&self) -> Result<Vec<SessionIndexEntry>> {
        let account = self.account()?;
        Ok(self.store.list(&account).await?)
    }

    /// Remove a stored session. Windows bound to it stay bound.
    pub async fn delete_session(&self, session_id: &str) -> Result<Vec<SessionIndexEntry>> {
        let account = self.account()?;
        Ok(self.store.delete(&account, session_id).await?)
    }

    pub fn load_settings(&self) -> Result<Settings> {
        Settings::load(&self.db)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        settings.save(&self.db)
    }
}
