//! Active session tracking
//!
//! Binds browser windows to stored sessions and keeps the stored copy in step
//! with the window's tabs.
//!
//! ```text
//! Unbound ──match / save / restore──▶ Bound(synced)
//! Bound(*) ──tab mutation──▶ Bound(pending) ──quiet period──▶ write
//!                                          write ok ──▶ Bound(synced)
//!                                          write err ──▶ Bound(error)
//! ```
//!
//! A failed write is not retried; the next tab mutation arms another cycle.
//! Deleting a session does not unbind the windows still bound to it.

use oblisk_crypto::Account;
use oblisk_storage::{keys, Database};
use oblisk_tabs::{BrowserEvent, WindowId, WindowManager};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::badge::{Badge, BadgeSink};
use crate::debounce::Debouncer;
use crate::error::SessionError;
use crate::index::SessionIndexEntry;
use crate::matcher::SessionMatcher;
use crate::store::SessionStore;
use crate::Result;

/// Window-to-session link as persisted under `activeSessions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub session_id: String,
    pub session_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Pending,
    Synced,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowState {
    Unbound,
    Bound { binding: Binding, status: SyncStatus },
}

/// Tab events are ignored while any of these is alive
pub struct RestoreGuard {
    restoring: Arc<AtomicUsize>,
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        self.restoring.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct ActiveSessionTracker {
    db: Database,
    store: Arc<SessionStore>,
    windows: Arc<dyn WindowManager>,
    badge: Arc<dyn BadgeSink>,
    account: Arc<RwLock<Option<Account>>>,
    bindings: Arc<RwLock<HashMap<WindowId, Binding>>>,
    status: Arc<RwLock<HashMap<WindowId, SyncStatus>>>,
    /// Live restore guards
    restoring: Arc<AtomicUsize>,
    try_match_on_open: bool,
    debouncer: Debouncer,
}

impl ActiveSessionTracker {
    /// Load persisted bindings from `db`. Every loaded binding starts out
    /// synced.
    pub fn new(
        db: Database,
        store: Arc<SessionStore>,
        windows: Arc<dyn WindowManager>,
        badge: Arc<dyn BadgeSink>,
        quiet_period: Duration,
    ) -> Result<Self> {
        let persisted: BTreeMap<String, Binding> =
            db.get_json(keys::ACTIVE_SESSIONS)?.unwrap_or_default();

        let mut bindings = HashMap::new();
        for (window, binding) in persisted {
            match window.parse::<WindowId>() {
                Ok(window) => {
                    bindings.insert(window, binding);
                }
                Err(_) => tracing::warn!(window = %window, "Ignoring binding with invalid window id"),
            }
        }
        let status = bindings
            .keys()
            .map(|window| (*window, SyncStatus::Synced))
            .collect();

        tracing::debug!(bindings = bindings.len(), "Loaded active sessions");

        Ok(Self {
            db,
            store,
            windows,
            badge,
            account: Arc::new(RwLock::new(None)),
            bindings: Arc::new(RwLock::new(bindings)),
            status: Arc::new(RwLock::new(status)),
            restoring: Arc::new(AtomicUsize::new(0)),
            try_match_on_open: true,
            debouncer: Debouncer::new(quiet_period),
        })
    }

    pub fn with_try_match(mut self, enabled: bool) -> Self {
        self.try_match_on_open = enabled;
        self
    }

    pub fn set_account(&self, account: Option<Account>) {
        *self.account.write() = account;
    }

    fn account(&self) -> Result<Account> {
        self.account.read().clone().ok_or(SessionError::NoAccount)
    }

    pub fn binding(&self, window: WindowId) -> Option<Binding> {
        self.bindings.read().get(&window).cloned()
    }

    pub fn state(&self, window: WindowId) -> WindowState {
        match self.binding(window) {
            Some(binding) => WindowState::Bound {
                binding,
                status: self
                    .status
                    .read()
                    .get(&window)
                    .copied()
                    .unwrap_or(SyncStatus::Synced),
            },
            None => WindowState::Unbound,
        }
    }

    pub fn is_pending(&self, window: WindowId) -> bool {
        self.debouncer.is_armed(window)
            && matches!(self.status.read().get(&window), Some(SyncStatus::Pending))
    }

    /// Bind `window` to a session, persist the binding and make the session
    /// the last tracked one
    pub fn bind(&self, window: WindowId, session_id: &str, session_name: &str) -> Result<()> {
        let binding = Binding {
            session_id: session_id.to_string(),
            session_name: session_name.to_string(),
        };

        self.bindings.write().insert(window, binding);
        self.status.write().insert(window, SyncStatus::Synced);
        self.persist()?;
        self.db.set(keys::LAST_TRACKED_SESSION_ID, session_id)?;
        self.badge.show(Badge::synced(session_name));

        tracing::info!(window_id = window, session_id = %session_id, session_name = %session_name, "Window bound to session");
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        let snapshot: BTreeMap<String, Binding> = self
            .bindings
            .read()
            .iter()
            .map(|(window, binding)| (window.to_string(), binding.clone()))
            .collect();
        self.db.set_json(keys::ACTIVE_SESSIONS, &snapshot)?;
        Ok(())
    }

    fn remember_last_tracked(&self, window: WindowId) -> Result<()> {
        if let Some(binding) = self.binding(window) {
            self.db
                .set(keys::LAST_TRACKED_SESSION_ID, &binding.session_id)?;
        }
        Ok(())
    }

    pub fn last_tracked(&self) -> Result<Option<String>> {
        Ok(self.db.get(keys::LAST_TRACKED_SESSION_ID)?)
    }

    pub fn forget_last_tracked(&self) -> Result<()> {
        Ok(self.db.remove(keys::LAST_TRACKED_SESSION_ID)?)
    }

    /// Suppress tab events until the guard is dropped
    pub fn begin_restore(&self) -> RestoreGuard {
        self.restoring.fetch_add(1, Ordering::SeqCst);
        RestoreGuard {
            restoring: Arc::clone(&self.restoring),
        }
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring.load(Ordering::SeqCst) > 0
    }

    pub async fn handle_event(&self, event: &BrowserEvent) -> Result<()> {
        match event {
            BrowserEvent::WindowCreated(window) => {
                if self.try_match_on_open {
                    if let Err(e) = self.try_match(*window).await {
                        tracing::warn!(window_id = *window, error = %e, "Match on open failed");
                    }
                }
            }
            BrowserEvent::FocusChanged(None) => {}
            BrowserEvent::FocusChanged(Some(window)) => {
                if self.binding(*window).is_none() && self.try_match_on_open {
                    if let Err(e) = self.try_match(*window).await {
                        tracing::warn!(window_id = *window, error = %e, "Match on focus failed");
                    }
                }
                self.remember_last_tracked(*window)?;
                self.show_badge(*window);
            }
            BrowserEvent::TabRemoved {
                window,
                is_window_closing: true,
                ..
            } => self.remember_last_tracked(*window)?,
            BrowserEvent::WindowClosed(window) => self.window_closed(*window)?,
            mutation if mutation.is_tab_mutation() => {
                if let Some(window) = mutation.window() {
                    self.tabs_changed(window);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn show_badge(&self, window: WindowId) {
        let badge = match self.state(window) {
            WindowState::Unbound => Badge::unbound(),
            WindowState::Bound {
                status: SyncStatus::Pending,
                ..
            } => Badge::pending(),
            WindowState::Bound {
                status: SyncStatus::Error,
                ..
            } => Badge::error(),
            WindowState::Bound { binding, .. } => Badge::synced(&binding.session_name),
        };
        self.badge.show(badge);
    }

    /// Mark a bound window pending and (re)arm its quiet period
    pub fn tabs_changed(&self, window: WindowId) {
        if self.is_restoring() {
            return;
        }

        if self.binding(window).is_none() {
            self.badge.show(Badge::unbound());
            return;
        }

        self.status.write().insert(window, SyncStatus::Pending);
        self.badge.show(Badge::pending());

        let tracker = self.clone();
        self.debouncer.signal(window, move |window| {
            let tracker = tracker.clone();
            async move { tracker.run_sync(window).await }
        });
    }

    async fn run_sync(&self, window: WindowId) {
        match self.sync_window(window).await {
            Ok(()) => {
                if let Some(binding) = self.binding(window) {
                    self.status.write().insert(window, SyncStatus::Synced);
                    self.badge.show(Badge::synced(&binding.session_name));
                }
            }
            Err(e) => {
                tracing::error!(window_id = window, error = %e, "Session sync failed");
                if self.binding(window).is_some() {
                    self.status.write().insert(window, SyncStatus::Error);
                }
                self.badge.show(Badge::error());
            }
        }
    }

    /// Write the window's current tabs to its bound session
    pub async fn sync_window(&self, window: WindowId) -> Result<()> {
        let Some(binding) = self.binding(window) else {
            return Ok(());
        };

        let tabs = self.windows.tabs(window).await?;
        if tabs.is_empty() {
            return Ok(());
        }

        let account = self.account()?;
        let stored = self
            .store
            .get(&account, &binding.session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(binding.session_id.clone()))?;

        self.db
            .set(keys::LAST_TRACKED_SESSION_ID, &binding.session_id)?;

        let updated = stored.with_tabs(tabs);
        self.store.update(&account, &updated).await?;

        tracing::info!(window_id = window, session_id = %updated.id, tabs = updated.tabs.len(), "Session synced");
        Ok(())
    }

    /// Bind an unbound window to the stored session whose hash equals its
    /// current tabs, if any
    pub async fn try_match(&self, window: WindowId) -> Result<Option<SessionIndexEntry>> {
        if self.binding(window).is_some() {
            return Ok(None);
        }

        let account = self.account()?;
        let tabs = self.windows.tabs(window).await?;
        let entries = self.store.list(&account).await?;

        let Some(entry) = SessionMatcher::find(&entries, &tabs).cloned() else {
            tracing::debug!(window_id = window, "No stored session matches window");
            return Ok(None);
        };

        // a restore may have bound the window while the index was loading
        if self.binding(window).is_some() {
            return Ok(None);
        }

        self.bind(window, &entry.session_id, &entry.name)?;
        Ok(Some(entry))
    }

    /// Drop the live binding and remember the session as last tracked. The
    /// persisted binding stays until it is overwritten.
    fn window_closed(&self, window: WindowId) -> Result<()> {
        self.remember_last_tracked(window)?;
        self.debouncer.cancel(window);
        self.status.write().remove(&window);

        if let Some(binding) = self.bindings.write().remove(&window) {
            tracing::debug!(window_id = window, session_id = %binding.session_id, "Window closed");
        }
        Ok(())
    }

    /// Forget every window and the account (sign-out)
    pub fn reset(&self) {
        self.debouncer.cancel_all();
        self.bindings.write().clear();
        self.status.write().clear();
        self.set_account(None);
    }
}

impl Clone for ActiveSessionTracker {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            store: Arc::clone(&self.store),
            windows: Arc::clone(&self.windows),
            badge: Arc::clone(&self.badge),
            account: Arc::clone(&self.account),
            bindings: Arc::clone(&self.bindings),
            status: Arc::clone(&self.status),
            restoring: Arc::clone(&self.restoring),
            try_match_on_open: self.try_match_on_open,
            debouncer: self.debouncer.clone(),
        }
    }
}
