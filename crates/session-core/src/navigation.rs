//! Redirect targets for the logout flow.

use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Moves the application to another route.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str);
}

impl<T> Navigator for std::sync::Arc<T>
where
    T: Navigator + ?Sized,
{
    fn redirect(&self, route: &str) {
        self.as_ref().redirect(route)
    }
}

/// Hands redirects to the application's router over a channel.
///
/// Used by native clients whose router runs on its own task.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelNavigator {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Navigator for ChannelNavigator {
    fn redirect(&self, route: &str) {
        if self.tx.send(route.to_string()).is_err() {
            warn!(route, "router is gone; dropping redirect");
        }
    }
}

/// Full page navigation through `window.location`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn redirect(&self, route: &str) {
        debug!(route, "redirecting");
        #[cfg(feature = "web")]
        {
            let Some(window) = web_sys::window() else {
                warn!(route, "window not available; cannot redirect");
                return;
            };
            if let Err(e) = window.location().set_href(route) {
                warn!(route, error = ?e, "failed to redirect");
            }
        }
        #[cfg(not(feature = "web"))]
        warn!(route, "browser navigation requires the `web` feature");
    }
}
