//! In-process window manager
//!
//! Keeps windows and their tab strips in memory. The mutating helpers return
//! the [`BrowserEvent`]s a real browser would emit for the same change, so a
//! caller can feed them straight to the engine.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::error::TabError;
use crate::event::BrowserEvent;
use crate::manager::{NewTab, WindowManager};
use crate::tab::{Tab, TabId, WindowId};
use crate::Result;

#[derive(Debug, Default)]
struct Window {
    tabs: Vec<Tab>,
    maximized: bool,
}

impl Window {
    fn reindex(&mut self) {
        for (index, tab) in self.tabs.iter_mut().enumerate() {
            tab.index = index;
        }
    }

    fn focus(&mut self, tab: TabId) {
        for candidate in &mut self.tabs {
            candidate.active = candidate.id == Some(tab);
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    windows: BTreeMap<WindowId, Window>,
    current: Option<WindowId>,
    next_window: WindowId,
    next_tab: TabId,
}

impl Inner {
    fn allocate_window(&mut self) -> WindowId {
        self.next_window += 1;
        self.next_window
    }

    fn allocate_tab(&mut self) -> TabId {
        self.next_tab += 1;
        self.next_tab
    }

    fn window_of(&self, tab: TabId) -> Result<WindowId> {
        self.windows
            .iter()
            .find(|(_, window)| window.tabs.iter().any(|t| t.id == Some(tab)))
            .map(|(id, _)| *id)
            .ok_or(TabError::TabNotFound(tab))
    }

    fn window_mut(&mut self, window: WindowId) -> Result<&mut Window> {
        self.windows
            .get_mut(&window)
            .ok_or(TabError::WindowNotFound(window))
    }
}

#[derive(Debug, Default)]
pub struct MemoryBrowser {
    inner: Mutex<Inner>,
}

impl MemoryBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open and focus a window showing `urls`, the first tab active
    pub fn open_window(&self, urls: &[&str]) -> WindowId {
        let mut inner = self.inner.lock();
        let id = inner.allocate_window();

        let mut window = Window::default();
        for (index, url) in urls.iter().enumerate() {
            let tab_id = inner.allocate_tab();
            window.tabs.push(Tab {
                id: Some(tab_id),
                active: index == 0,
                ..Tab::new(index, *url)
            });
        }

        inner.windows.insert(id, window);
        inner.current = Some(id);
        id
    }

    pub fn set_current(&self, window: Option<WindowId>) -> BrowserEvent {
        self.inner.lock().current = window;
        BrowserEvent::FocusChanged(window)
    }

    /// Append a tab showing `url` to `window`
    pub fn open_tab(&self, window: WindowId, url: &str) -> Result<BrowserEvent> {
        let mut inner = self.inner.lock();
        let tab_id = inner.allocate_tab();
        let strip = inner.window_mut(window)?;
        let index = strip.tabs.len();
        strip.tabs.push(Tab {
            id: Some(tab_id),
            ..Tab::new(index, url)
        });

        Ok(BrowserEvent::TabCreated {
            window,
            tab: tab_id,
        })
    }

    pub fn navigate(&self, tab: TabId, url: &str) -> Result<BrowserEvent> {
        let mut inner = self.inner.lock();
        let window = inner.window_of(tab)?;
        let strip = inner.window_mut(window)?;
        if let Some(target) = strip.tabs.iter_mut().find(|t| t.id == Some(tab)) {
            target.url = Some(url.to_string());
        }

        Ok(BrowserEvent::TabUpdated {
            window,
            tab,
            url_changed: true,
        })
    }

    pub fn move_tab(&self, tab: TabId, to: usize) -> Result<BrowserEvent> {
        let mut inner = self.inner.lock();
        let window = inner.window_of(tab)?;
        let strip = inner.window_mut(window)?;

        let from = strip
            .tabs
            .iter()
            .position(|t| t.id == Some(tab))
            .ok_or(TabError::TabNotFound(tab))?;
        let moved = strip.tabs.remove(from);
        let to = to.min(strip.tabs.len());
        strip.tabs.insert(to, moved);
        strip.reindex();

        Ok(BrowserEvent::TabMoved { window, tab })
    }

    pub fn remove_tab(&self, tab: TabId) -> Result<BrowserEvent> {
        let mut inner = self.inner.lock();
        let window = inner.window_of(tab)?;
        let strip = inner.window_mut(window)?;
        strip.tabs.retain(|t| t.id != Some(tab));
        strip.reindex();

        Ok(BrowserEvent::TabRemoved {
            window,
            tab,
            is_window_closing: false,
        })
    }

    /// Close `window`: one closing removal per tab, then the window itself
    pub fn close_window(&self, window: WindowId) -> Result<Vec<BrowserEvent>> {
        let mut inner = self.inner.lock();
        let closed = inner
            .windows
            .remove(&window)
            .ok_or(TabError::WindowNotFound(window))?;
        if inner.current == Some(window) {
            inner.current = None;
        }

        let mut events: Vec<BrowserEvent> = closed
            .tabs
            .iter()
            .filter_map(|tab| tab.id)
            .map(|tab| BrowserEvent::TabRemoved {
                window,
                tab,
                is_window_closing: true,
            })
            .collect();
        events.push(BrowserEvent::WindowClosed(window));
        Ok(events)
    }

    pub fn windows(&self) -> Vec<WindowId> {
        self.inner.lock().windows.keys().copied().collect()
    }

    pub fn is_maximized(&self, window: WindowId) -> bool {
        self.inner
            .lock()
            .windows
            .get(&window)
            .map(|w| w.maximized)
            .unwrap_or(false)
    }
}

#[async_trait]
impl WindowManager for MemoryBrowser {
    async fn tabs(&self, window: WindowId) -> Result<Vec<Tab>> {
        self.inner
            .lock()
            .windows
            .get(&window)
            .map(|w| w.tabs.clone())
            .ok_or(TabError::WindowNotFound(window))
    }

    async fn current_window(&self) -> Result<WindowId> {
        self.inner.lock().current.ok_or(TabError::NoCurrentWindow)
    }

    async fn create_window(&self, url: &str, maximized: bool) -> Result<WindowId> {
        let mut inner = self.inner.lock();
        let id = inner.allocate_window();
        let tab_id = inner.allocate_tab();

        inner.windows.insert(
            id,
            Window {
                tabs: vec![Tab {
                    id: Some(tab_id),
                    active: true,
                    ..Tab::new(0, url)
                }],
                maximized,
            },
        );
        inner.current = Some(id);

        tracing::debug!(window_id = id, url = %url, "Window created");
        Ok(id)
    }

    async fn create_tab(&self, window: WindowId, tab: NewTab) -> Result<TabId> {
        let mut inner = self.inner.lock();
        let tab_id = inner.allocate_tab();
        let strip = inner.window_mut(window)?;

        let position = tab.index.unwrap_or(strip.tabs.len()).min(strip.tabs.len());
        strip.tabs.insert(
            position,
            Tab {
                id: Some(tab_id),
                index: position,
                active: false,
                pinned: tab.pinned,
                url: tab.url,
                ..Tab::default()
            },
        );
        strip.reindex();
        if tab.active {
            strip.focus(tab_id);
        }

        Ok(tab_id)
    }

    async fn activate_tab(&self, tab: TabId) -> Result<()> {
        let mut inner = self.inner.lock();
        let window = inner.window_of(tab)?;
        inner.window_mut(window)?.focus(tab);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(tabs: &[Tab]) -> Vec<&str> {
        tabs.iter().map(Tab::url_or_blank).collect()
    }

    #[tokio::test]
    async fn test_open_window_and_snapshot() {
        let browser = MemoryBrowser::new();
        let window = browser.open_window(&["https://a", "https://b"]);

        assert_eq!(browser.current_window().await.unwrap(), window);
        let tabs = browser.tabs(window).await.unwrap();
        assert_eq!(urls(&tabs), vec!["https://a", "https://b"]);
        assert!(tabs[0].active);
        assert_eq!(tabs[1].index, 1);
    }

    #[tokio::test]
    async fn test_create_tab_at_index_and_activate() {
        let browser = MemoryBrowser::new();
        let window = browser.create_window("https://first", true).await.unwrap();
        assert!(browser.is_maximized(window));

        let last = browser
            .create_tab(window, NewTab::background(Some("https://last".to_string())))
            .await
            .unwrap();
        browser
            .create_tab(
                window,
                NewTab {
                    url: Some("https://middle".to_string()),
                    index: Some(1),
                    pinned: true,
                    ..NewTab::default()
                },
            )
            .await
            .unwrap();

        let tabs = browser.tabs(window).await.unwrap();
        assert_eq!(urls(&tabs), vec!["https://first", "https://middle", "https://last"]);
        assert!(tabs[1].pinned);
        assert!(tabs[0].active);

        browser.activate_tab(last).await.unwrap();
        let tabs = browser.tabs(window).await.unwrap();
        assert!(!tabs[0].active);
        assert!(tabs[2].active);
    }

    #[tokio::test]
    async fn test_mutations_emit_events() {
        let browser = MemoryBrowser::new();
        let window = browser.open_window(&["https://a", "https://b"]);
        let tabs = browser.tabs(window).await.unwrap();
        let (a, b) = (tabs[0].id.unwrap(), tabs[1].id.unwrap());

        assert_eq!(
            browser.move_tab(b, 0).unwrap(),
            BrowserEvent::TabMoved { window, tab: b }
        );
        assert_eq!(
            urls(&browser.tabs(window).await.unwrap()),
            vec!["https://b", "https://a"]
        );

        assert!(browser.navigate(a, "https://c").unwrap().is_tab_mutation());
        assert!(browser.remove_tab(b).unwrap().is_tab_mutation());

        let closing = browser.close_window(window).unwrap();
        assert_eq!(closing.last(), Some(&BrowserEvent::WindowClosed(window)));
        assert!(closing.iter().all(|event| !event.is_tab_mutation()));
        assert!(matches!(
            browser.current_window().await,
            Err(TabError::NoCurrentWindow)
        ));
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let browser = MemoryBrowser::new();
        assert!(matches!(browser.tabs(9).await, Err(TabError::WindowNotFound(9))));
        assert!(matches!(browser.activate_tab(3).await, Err(TabError::TabNotFound(3))));
    }
}
