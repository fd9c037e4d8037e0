use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use url::Url;

use crate::app::buffer::TextBuffer;
use crate::storage::Link;

pub const INVALID_URL_HINT: &str = "Invalid URL - must start with http:// or https://";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkField {
    #[default]
    Url,
    Title,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Pending,
    Completed(Link),
}

/// Two-step prompt for a new link: URL first, then an optional title.
#[derive(Debug, Clone, Default)]
pub struct LinkEntryFlow {
    url: TextBuffer,
    title: TextBuffer,
    field: LinkField,
}

impl LinkEntryFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self) -> LinkField {
        self.field
    }

    pub fn url(&self) -> &TextBuffer {
        &self.url
    }

    pub fn title(&self) -> &TextBuffer {
        &self.title
    }

    pub fn focused(&self) -> &TextBuffer {
        match self.field {
            LinkField::Url => &self.url,
            LinkField::Title => &self.title,
        }
    }

    fn focused_mut(&mut self) -> &mut TextBuffer {
        match self.field {
            LinkField::Url => &mut self.url,
            LinkField::Title => &mut self.title,
        }
    }

    /// Hint to show under the URL field, if the typed text will not be accepted.
    pub fn url_hint(&self) -> Option<&'static str> {
        if self.url.is_empty() || is_valid_url(self.url.text()) {
            None
        } else {
            Some(INVALID_URL_HINT)
        }
    }

    /// Esc is left to the caller, which cancels the whole flow.
    pub fn handle_key(&mut self, key: KeyEvent) -> LinkOutcome {
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
        {
            return LinkOutcome::Pending;
        }
        match key.code {
            KeyCode::Enter => return self.submit(),
            KeyCode::Char(ch) => {
                self.focused_mut().insert_char(ch);
            }
            KeyCode::Backspace | KeyCode::Delete => {
                self.focused_mut().backspace();
            }
            KeyCode::Left => {
                self.focused_mut().move_left();
            }
            KeyCode::Right => {
                self.focused_mut().move_right();
            }
            KeyCode::Home => {
                self.focused_mut().move_home();
            }
            KeyCode::End => {
                self.focused_mut().move_end();
            }
            KeyCode::Up | KeyCode::BackTab if self.field == LinkField::Title => {
                self.field = LinkField::Url;
            }
            _ => {}
        }
        LinkOutcome::Pending
    }

    /// Advances from URL to title, or completes from the title field. An
    /// invalid URL never advances and never completes.
    pub fn submit(&mut self) -> LinkOutcome {
        if !is_valid_url(self.url.text()) {
            return LinkOutcome::Pending;
        }
        match self.field {
            LinkField::Url => {
                self.field = LinkField::Title;
                LinkOutcome::Pending
            }
            LinkField::Title => {
                let url = self.url.text().trim().to_string();
                let title = match self.title.text().trim() {
                    "" => url.clone(),
                    title => title.to_string(),
                };
                *self = Self::default();
                LinkOutcome::Completed(Link { url, title })
            }
        }
    }
}

/// Absolute URL with an http or https scheme.
pub fn is_valid_url(candidate: &str) -> bool {
    Url::parse(candidate.trim())
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}
