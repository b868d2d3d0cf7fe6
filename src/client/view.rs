//! The page the controller drives, and where it keeps its cookies.

use std::sync::Mutex;

use tower_cookies::cookie::{Cookie, CookieJar};

/// The subscribe form as the controller sees it.
///
/// The view never receives markup. Every string it gets is plain text and is rendered as a
/// text node, never through `innerHTML`.
pub trait FormView: Send + Sync + 'static {
    /// Values of every email input (desktop and mobile layouts), in page order.
    fn email_inputs(&self) -> Vec<String>;
    /// Value of the hidden `website` field.
    fn honeypot(&self) -> String;
    fn clear_inputs(&self);
    fn show_message(&self, message: &StatusMessage);
    fn hide_message(&self);
    /// Current labels of every button wired to the subscribe action.
    fn button_labels(&self) -> Vec<String>;
    /// Relabels every button; `labels` has one entry per button.
    fn set_buttons(&self, labels: &[String], disabled: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

impl MessageKind {
    pub fn icon(self) -> char {
        match self {
            MessageKind::Success => '✓',
            MessageKind::Error => '✕',
        }
    }
}

/// A status line for the form. The view renders `icon` next to `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: MessageKind,
    pub icon: char,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, text)
    }

    fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            icon: kind.icon(),
            text: text.into(),
        }
    }
}

/// Every subscribe button on the page, moved through states together.
#[derive(Debug, Clone)]
pub struct ButtonGroup {
    original: Vec<String>,
}

impl ButtonGroup {
    /// Remembers the labels as they are now, so `restore` can put them back verbatim.
    pub fn capture(view: &impl FormView) -> Self {
        Self {
            original: view.button_labels(),
        }
    }

    pub fn set_all(&self, view: &impl FormView, label: &str, disabled: bool) {
        let labels = vec![label.to_string(); self.original.len()];
        view.set_buttons(&labels, disabled);
    }

    pub fn restore(&self, view: &impl FormView) {
        view.set_buttons(&self.original, false);
    }
}

/// Browser-side cookie access.
pub trait CookieStore: Send + Sync + 'static {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, cookie: Cookie<'static>);
}

impl CookieStore for Mutex<CookieJar> {
    fn get(&self, name: &str) -> Option<String> {
        let jar = self.lock().ok()?;
        jar.get(name).map(|c| c.value().to_string())
    }

    fn set(&self, cookie: Cookie<'static>) {
        if let Ok(mut jar) = self.lock() {
            jar.add(cookie);
        }
    }
}
