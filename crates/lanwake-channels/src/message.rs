//! Message - transport-neutral message and reply types

/// Prefix of callback data produced by wake buttons
pub const WAKE_CALLBACK_PREFIX: &str = "wol:";

/// Telegram rejects callback data longer than this many bytes
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

/// An inbound text message after transport filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    /// Chat the message arrived in
    pub channel_id: String,
    /// Opaque identity of the sender
    pub user_id: String,
    /// Platform message id
    pub message_id: String,
    /// Message text
    pub text: String,
}

impl NormalizedMessage {
    /// Create a new normalized message
    #[must_use]
    pub fn new(
        channel_id: impl Into<String>,
        user_id: impl Into<String>,
        message_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            user_id: user_id.into(),
            message_id: message_id.into(),
            text: text.into(),
        }
    }
}

/// An inline button attached to a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageButton {
    /// Button label
    pub text: String,
    /// Data delivered back when pressed
    pub callback_data: String,
}

impl MessageButton {
    /// Button that wakes the named device when pressed
    ///
    /// Returns `None` when the name does not fit into callback data.
    #[must_use]
    pub fn wake(name: &str) -> Option<Self> {
        let callback_data = format!("{}{}", WAKE_CALLBACK_PREFIX, name);
        if callback_data.len() > MAX_CALLBACK_DATA_LEN {
            return None;
        }
        Some(Self {
            text: format!("Wake {}", name),
            callback_data,
        })
    }
}

/// A reply to send back to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply text (plain)
    pub text: String,
    /// Optional inline buttons, one per row
    pub buttons: Vec<MessageButton>,
}

impl Reply {
    /// Plain text reply
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    /// Attach buttons
    #[must_use]
    pub fn with_buttons(mut self, buttons: Vec<MessageButton>) -> Self {
        self.buttons = buttons;
        self
    }
}
