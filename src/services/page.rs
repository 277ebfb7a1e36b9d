//! Hosting page capability.
//!
//! The widget never touches the browser directly; it reads the page location
//! and title and requests navigation through this trait.

/// Navigation and document access provided by the host page.
pub trait Page {
    /// Full current location (`window.location.href`).
    fn location(&self) -> String;

    /// Document title.
    fn title(&self) -> String;

    /// Full navigation to `url`. The current page is gone afterwards.
    fn navigate(&mut self, url: &str);

    /// Rewrite the current history entry without navigating.
    fn replace_location(&mut self, url: &str);

    /// Reload the current location, dropping in-memory state.
    fn reload(&mut self);
}

/// Navigation requested through a [`StaticPage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Navigate(String),
    Replace(String),
    Reload,
}

/// A page with a fixed title that records navigation instead of performing it.
///
/// Used by headless hosts that apply navigation themselves, and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticPage {
    location: String,
    title: String,
    events: Vec<PageEvent>,
}

impl StaticPage {
    pub fn new(location: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            title: title.into(),
            events: Vec::new(),
        }
    }

    /// Navigation requested so far, oldest first.
    pub fn events(&self) -> &[PageEvent] {
        &self.events
    }

    /// Target of the most recent full navigation.
    pub fn last_navigation(&self) -> Option<&str> {
        self.events.iter().rev().find_map(|event| match event {
            PageEvent::Navigate(url) => Some(url.as_str()),
            _ => None,
        })
    }
}

impl Page for StaticPage {
    fn location(&self) -> String {
        self.location.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn navigate(&mut self, url: &str) {
        self.location = url.to_string();
        self.events.push(PageEvent::Navigate(url.to_string()));
    }

    fn replace_location(&mut self, url: &str) {
        self.location = url.to_string();
        self.events.push(PageEvent::Replace(url.to_string()));
    }

    fn reload(&mut self) {
        self.events.push(PageEvent::Reload);
    }
}
