//! Browser lifecycle events

use crate::tab::{TabId, WindowId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    WindowCreated(WindowId),
    /// `None` when focus left every browser window
    FocusChanged(Option<WindowId>),
    TabCreated {
        window: WindowId,
        tab: TabId,
    },
    TabUpdated {
        window: WindowId,
        tab: TabId,
        url_changed: bool,
    },
    TabMoved {
        window: WindowId,
        tab: TabId,
    },
    TabRemoved {
        window: WindowId,
        tab: TabId,
        is_window_closing: bool,
    },
    WindowClosed(WindowId),
}

impl BrowserEvent {
    pub fn window(&self) -> Option<WindowId> {
        match self {
            BrowserEvent::WindowCreated(window) | BrowserEvent::WindowClosed(window) => Some(*window),
            BrowserEvent::FocusChanged(window) => *window,
            BrowserEvent::TabCreated { window, .. }
            | BrowserEvent::TabUpdated { window, .. }
            | BrowserEvent::TabMoved { window, .. }
            | BrowserEvent::TabRemoved { window, .. } => Some(*window),
        }
    }

    /// Whether the event changes the tab set a session snapshot would capture
    pub fn is_tab_mutation(&self) -> bool {
        match self {
            BrowserEvent::TabCreated { .. } | BrowserEvent::TabMoved { .. } => true,
            BrowserEvent::TabUpdated { url_changed, .. } => *url_changed,
            BrowserEvent::TabRemoved {
                is_window_closing, ..
            } => !is_window_closing,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_mutations() {
        assert!(BrowserEvent::TabCreated { window: 1, tab: 2 }.is_tab_mutation());
        assert!(BrowserEvent::TabMoved { window: 1, tab: 2 }.is_tab_mutation());
        assert!(BrowserEvent::TabUpdated {
            window: 1,
            tab: 2,
            url_changed: true
        }
        .is_tab_mutation());

        // title and favicon updates do not count
        assert!(!BrowserEvent::TabUpdated {
            window: 1,
            tab: 2,
            url_changed: false
        }
        .is_tab_mutation());
        assert!(!BrowserEvent::TabRemoved {
            window: 1,
            tab: 2,
            is_window_closing: true
        }
        .is_tab_mutation());
        assert!(!BrowserEvent::WindowCreated(1).is_tab_mutation());
    }

    #[test]
    fn test_window_of_event() {
        assert_eq!(BrowserEvent::FocusChanged(None).window(), None);
        assert_eq!(BrowserEvent::WindowClosed(4).window(), Some(4));
        assert_eq!(BrowserEvent::TabMoved { window: 3, tab: 9 }.window(), Some(3));
    }
}
