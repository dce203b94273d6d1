//! Two-valued display theme shared by every view, with change notification.
//!
//! A [`ThemeStore`] is created once and handed to the views that need it;
//! each view subscribes and redraws when the theme changes.
//!
//! Library-only: the `blog-feed` CLI prints plain text and takes no theme.
//! Embedders that draw the feed in a themed surface hold the store.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

pub struct ThemeStore {
    current: watch::Sender<Theme>,
}

impl ThemeStore {
    pub fn new(initial: Theme) -> Self {
        let (current, _) = watch::channel(initial);
        Self { current }
    }

    pub fn current(&self) -> Theme {
        *self.current.borrow()
    }

    /// Set the theme. Subscribers are only notified when it actually changes.
    pub fn set(&self, theme: Theme) -> bool {
        let changed = self.current.send_if_modified(|current| {
            if *current == theme {
                false
            } else {
                *current = theme;
                true
            }
        });
        if changed {
            debug!(?theme, "Theme changed");
        }
        changed
    }

    /// Flip between dark and light and return the new theme.
    pub fn toggle(&self) -> Theme {
        let next = self.current().toggled();
        self.set(next);
        next
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.current.subscribe()
    }
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}
