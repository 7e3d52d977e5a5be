use serde_json::{Map, Value};
use std::fmt;

/// Where to send the browser after a notification was queued.
///
/// Mirrors the loose `bool | string` shape notifications carry in the session:
/// `true` means "reload the current URL", `false` or an empty location means
/// "stay on this request and render now", anything else is a location.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum Redirect {
    Enabled(bool),
    Location(String),
}

impl Default for Redirect {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

impl Redirect {
    pub fn target(&self, current_url: &str) -> Option<String> {
        match self {
            Self::Enabled(true) => Some(current_url.to_owned()),
            Self::Enabled(false) => None,
            Self::Location(location) if location.is_empty() => None,
            Self::Location(location) => Some(location.clone()),
        }
    }
}

impl From<bool> for Redirect {
    fn from(value: bool) -> Self {
        Self::Enabled(value)
    }
}

impl From<&str> for Redirect {
    fn from(value: &str) -> Self {
        Self::Location(value.to_owned())
    }
}

impl From<String> for Redirect {
    fn from(value: String) -> Self {
        Self::Location(value)
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Notification {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<Redirect>,
    /// Anything else the caller attached; handed to the view untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Notification {
    pub fn new<M: fmt::Display>(message: M) -> Self {
        Self {
            message: message.to_string(),
            ..Default::default()
        }
    }

    pub fn with_kind<K: fmt::Display>(self, kind: K) -> Self {
        Self {
            kind: Some(kind.to_string()),
            ..self
        }
    }

    pub fn with_redirect<R: Into<Redirect>>(self, redirect: R) -> Self {
        Self {
            redirect: Some(redirect.into()),
            ..self
        }
    }

    pub fn with_field<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// The shapes a call to the flash utility can take.
pub enum FlashArgs {
    Empty,
    ByMessage(String),
    ByTypeAndMessage {
        kind: String,
        message: String,
        redirect: Option<Redirect>,
    },
    ByRecord(Notification),
}

impl FlashArgs {
    pub fn message<M: fmt::Display>(message: M) -> Self {
        Self::ByMessage(message.to_string())
    }

    pub fn typed<K: fmt::Display, M: fmt::Display>(kind: K, message: M) -> Self {
        Self::ByTypeAndMessage {
            kind: kind.to_string(),
            message: message.to_string(),
            redirect: None,
        }
    }

    pub fn with_redirect<R: Into<Redirect>>(self, redirect: R) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::ByMessage(message) => {
                Self::ByRecord(Notification::new(message).with_redirect(redirect))
            }
            Self::ByTypeAndMessage { kind, message, .. } => Self::ByTypeAndMessage {
                kind,
                message,
                redirect: Some(redirect.into()),
            },
            Self::ByRecord(notification) => Self::ByRecord(notification.with_redirect(redirect)),
        }
    }

    /// Turns the call into the notification to queue and the redirect to apply.
    /// `None` means there is nothing to queue.
    pub fn resolve(self) -> Option<(Notification, Redirect)> {
        match self {
            Self::Empty => None,
            Self::ByMessage(message) => Some((Notification::new(message), Redirect::default())),
            Self::ByTypeAndMessage {
                kind,
                message,
                redirect,
            } => Some((
                Notification::new(message).with_kind(kind),
                redirect.unwrap_or_default(),
            )),
            Self::ByRecord(notification) => {
                let redirect = notification.redirect.clone().unwrap_or_default();

                Some((notification, redirect))
            }
        }
    }
}

impl From<()> for FlashArgs {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

impl From<&str> for FlashArgs {
    fn from(message: &str) -> Self {
        Self::ByMessage(message.to_owned())
    }
}

impl From<String> for FlashArgs {
    fn from(message: String) -> Self {
        Self::ByMessage(message)
    }
}

impl From<Notification> for FlashArgs {
    fn from(notification: Notification) -> Self {
        Self::ByRecord(notification)
    }
}

impl<K: fmt::Display, M: fmt::Display> From<(K, M)> for FlashArgs {
    fn from((kind, message): (K, M)) -> Self {
        Self::typed(kind, message)
    }
}

impl<K: fmt::Display, M: fmt::Display, R: Into<Redirect>> From<(K, M, R)> for FlashArgs {
    fn from((kind, message, redirect): (K, M, R)) -> Self {
        Self::typed(kind, message).with_redirect(redirect)
    }
}
