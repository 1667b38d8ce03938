//! Chat commands
//!
//! Parsing and execution are independent of any transport: adapters turn an
//! incoming message into a [`Command`] and render the returned [`Reply`].

use crate::error::{Error, Result};
use crate::message::{MessageButton, Reply, WAKE_CALLBACK_PREFIX};
use lanwake_core::{WakeDispatcher, WakeOutcome};
use tracing::{error, info};

/// Usage line for `/addmac`
pub const ADD_USAGE: &str = "Usage: /addmac <name> <mac_address>";
/// Usage line for `/wol`
pub const WAKE_USAGE: &str = "Usage: /wol <name>";
/// Usage line for `/delmac`
pub const REMOVE_USAGE: &str = "Usage: /delmac <name>";

/// Greeting shown by `/start` and `/help`
pub const HELP_TEXT: &str = "Hello! I'm a Wake-on-LAN bot. You can register devices with \
/addmac <name> <mac_address> and wake up registered devices with /wol <name>. \
Use /listmacs to see your devices and /delmac <name> to remove one. \
Your registry is private to your account.";

/// A parsed chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` or `/help`
    Help,
    /// `/addmac <name> <mac>`
    AddDevice {
        /// Device name
        name: String,
        /// Hardware address
        address: String,
    },
    /// `/listmacs`
    ListDevices,
    /// `/wol <name>`
    Wake {
        /// Device name
        name: String,
    },
    /// `/delmac <name>`
    RemoveDevice {
        /// Device name
        name: String,
    },
}

impl Command {
    /// Parse message text into a command
    ///
    /// Returns `Ok(None)` for plain text and unknown commands, and
    /// [`Error::Usage`] when a known command lacks arguments. A trailing
    /// `@botname` on the command is ignored, as are extra arguments.
    pub fn parse(text: &str) -> Result<Option<Self>> {
        let mut tokens = text.split_whitespace();
        let Some(head) = tokens.next() else {
            return Ok(None);
        };
        if !head.starts_with('/') {
            return Ok(None);
        }
        let command = head.split('@').next().unwrap_or(head);

        let command = match command {
            "/start" | "/help" => Self::Help,
            "/listmacs" => Self::ListDevices,
            "/addmac" => match (tokens.next(), tokens.next()) {
                (Some(name), Some(address)) => Self::AddDevice {
                    name: name.to_string(),
                    address: address.to_string(),
                },
                _ => return Err(Error::Usage(ADD_USAGE)),
            },
            "/wol" => Self::Wake {
                name: tokens.next().ok_or(Error::Usage(WAKE_USAGE))?.to_string(),
            },
            "/delmac" => Self::RemoveDevice {
                name: tokens.next().ok_or(Error::Usage(REMOVE_USAGE))?.to_string(),
            },
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

/// A request to wake one of the caller's devices
///
/// Built from `/wol` and from wake-button presses alike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeRequest {
    /// Caller identity
    pub user_id: String,
    /// Device name
    pub name: String,
}

impl WakeRequest {
    /// Create a wake request
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
        }
    }

    /// Parse wake-button callback data (`wol:<name>`)
    #[must_use]
    pub fn from_callback(user_id: impl Into<String>, data: &str) -> Option<Self> {
        let name = data.strip_prefix(WAKE_CALLBACK_PREFIX)?;
        if name.is_empty() {
            return None;
        }
        Some(Self::new(user_id, name))
    }
}

/// Executes commands against the device directory
#[derive(Clone)]
pub struct CommandExecutor {
    dispatcher: WakeDispatcher,
}

impl CommandExecutor {
    /// Create an executor over `dispatcher`
    #[must_use]
    pub fn new(dispatcher: WakeDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Parse and execute message text from `user_id`
    ///
    /// Returns `None` when the text is not a known command.
    pub async fn handle_text(&self, user_id: &str, text: &str) -> Option<Reply> {
        match Command::parse(text) {
            Ok(Some(command)) => Some(self.execute(user_id, command).await),
            Ok(None) => None,
            Err(e) => Some(Reply::text(e.to_string())),
        }
    }

    /// Execute a parsed command
    pub async fn execute(&self, user_id: &str, command: Command) -> Reply {
        info!(user_id = %user_id, command = ?command, "Processing command");

        let directory = self.dispatcher.directory();
        match command {
            Command::Help => Reply::text(HELP_TEXT),
            Command::AddDevice { name, address } => {
                match directory.register(user_id, &name, &address).await {
                    Ok(stored) => Reply::text(format!(
                        "MAC address '{}' registered as '{}'.",
                        stored, name
                    )),
                    Err(e) => Reply::text(describe_error(&e)),
                }
            }
            Command::ListDevices => {
                let devices = directory.list(user_id).await;
                if devices.is_empty() {
                    return Reply::text("You have no registered devices.");
                }
                let lines: Vec<String> = devices
                    .iter()
                    .map(|(name, mac)| format!("{}: {}", name, mac))
                    .collect();
                let buttons = devices
                    .iter()
                    .filter_map(|(name, _)| MessageButton::wake(name))
                    .collect();
                Reply::text(format!("Registered devices:\n{}", lines.join("\n")))
                    .with_buttons(buttons)
            }
            Command::Wake { name } => self.wake(WakeRequest::new(user_id, name)).await,
            Command::RemoveDevice { name } => match directory.remove(user_id, &name).await {
                Ok(true) => Reply::text(format!("Device '{}' removed.", name)),
                Ok(false) => Reply::text(not_found_text(&name)),
                Err(e) => Reply::text(describe_error(&e)),
            },
        }
    }

    /// Wake a device
    pub async fn wake(&self, request: WakeRequest) -> Reply {
        match self.dispatcher.wake(&request.user_id, &request.name).await {
            Ok(WakeOutcome::Sent { name, address }) => Reply::text(format!(
                "Sending Wake-on-LAN packet to '{}' ({}).",
                name, address
            )),
            Ok(WakeOutcome::NotFound { name }) => Reply::text(not_found_text(&name)),
            Err(e) => {
                error!(user_id = %request.user_id, name = %request.name, error = %e, "Wake failed");
                Reply::text(format!(
                    "Failed to send Wake-on-LAN packet to '{}'. {}",
                    request.name,
                    describe_error(&e)
                ))
            }
        }
    }
}

fn not_found_text(name: &str) -> String {
    format!(
        "Device '{}' not found. Use /listmacs to see registered devices.",
        name
    )
}

/// User-facing description of a core error
fn describe_error(e: &lanwake_core::Error) -> String {
    match e {
        lanwake_core::Error::Validation(msg) => msg.clone(),
        lanwake_core::Error::Persist(_) => {
            error!(error = %e, "Registry persistence failed");
            "Could not save your devices. Please try again later.".to_string()
        }
        lanwake_core::Error::Locked(_) => {
            error!(error = %e, "Registry is locked by another process");
            "Could not save your devices. Please try again later.".to_string()
        }
        lanwake_core::Error::InvalidAddress(_) => {
            "The stored hardware address is not a valid MAC address.".to_string()
        }
        lanwake_core::Error::Dispatch(_) => "A network error occurred.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanwake_core::{
        DeviceDirectory, DirectoryPolicy, MemoryStore, UdpWakeSender, WakeSender,
    };
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl WakeSender for RecordingSender {
        async fn send_wake(&self, address: &str) -> lanwake_core::Result<()> {
            self.sent.lock().unwrap().push(address.to_string());
            Ok(())
        }
    }

    struct FailingSender;

    #[async_trait::async_trait]
    impl WakeSender for FailingSender {
        async fn send_wake(&self, _address: &str) -> lanwake_core::Result<()> {
            Err(lanwake_core::Error::Dispatch(
                "Failed to send magic packet to MAC address: network unreachable".to_string(),
            ))
        }
    }

    fn executor_with(sender: Arc<dyn WakeSender>) -> (CommandExecutor, Arc<MemoryStore>) {
        executor_with_policy(sender, DirectoryPolicy::default())
    }

    fn executor_with_policy(
        sender: Arc<dyn WakeSender>,
        policy: DirectoryPolicy,
    ) -> (CommandExecutor, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let policy = policy.with_retry_backoff(Duration::ZERO);
        let directory = Arc::new(DeviceDirectory::open(store.clone(), policy).unwrap());
        let executor = CommandExecutor::new(WakeDispatcher::new(directory, sender));
        (executor, store)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start").unwrap(), Some(Command::Help));
        assert_eq!(Command::parse("/listmacs").unwrap(), Some(Command::ListDevices));
        assert_eq!(
            Command::parse("/addmac pc AA:BB:CC:DD:EE:FF").unwrap(),
            Some(Command::AddDevice {
                name: "pc".to_string(),
                address: "AA:BB:CC:DD:EE:FF".to_string(),
            })
        );
        assert_eq!(
            Command::parse("  /wol   pc  extra").unwrap(),
            Some(Command::Wake {
                name: "pc".to_string()
            })
        );
        assert_eq!(
            Command::parse("/delmac pc").unwrap(),
            Some(Command::RemoveDevice {
                name: "pc".to_string()
            })
        );
    }

    #[test]
    fn test_parse_strips_bot_suffix() {
        assert_eq!(
            Command::parse("/wol@lanwake_bot desktop").unwrap(),
            Some(Command::Wake {
                name: "desktop".to_string()
            })
        );
    }

    #[test]
    fn test_parse_missing_arguments() {
        assert!(matches!(Command::parse("/addmac pc"), Err(Error::Usage(ADD_USAGE))));
        assert!(matches!(Command::parse("/addmac"), Err(Error::Usage(ADD_USAGE))));
        assert!(matches!(Command::parse("/wol"), Err(Error::Usage(WAKE_USAGE))));
        assert!(matches!(Command::parse("/delmac"), Err(Error::Usage(REMOVE_USAGE))));
    }

    #[test]
    fn test_parse_ignores_other_text() {
        assert_eq!(Command::parse("hello").unwrap(), None);
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("/unknown arg").unwrap(), None);
    }

    #[test]
    fn test_wake_request_from_callback() {
        assert_eq!(
            WakeRequest::from_callback("42", "wol:desktop"),
            Some(WakeRequest::new("42", "desktop"))
        );
        assert_eq!(WakeRequest::from_callback("42", "wol:"), None);
        assert_eq!(WakeRequest::from_callback("42", "approve:1"), None);
    }

    #[tokio::test]
    async fn test_add_list_wake_flow() {
        let sender = Arc::new(RecordingSender::default());
        let (executor, store) = executor_with(sender.clone());

        let reply = executor
            .handle_text("42", "/addmac desktop AA:BB:CC:DD:EE:FF")
            .await
            .unwrap();
        assert_eq!(
            reply.text,
            "MAC address 'AA:BB:CC:DD:EE:FF' registered as 'desktop'."
        );
        assert_eq!(store.snapshot().unwrap().get("42", "desktop"), Some("AA:BB:CC:DD:EE:FF"));

        let reply = executor.handle_text("42", "/listmacs").await.unwrap();
        assert_eq!(reply.text, "Registered devices:\ndesktop: AA:BB:CC:DD:EE:FF");
        assert_eq!(reply.buttons, vec![MessageButton::wake("desktop").unwrap()]);

        let reply = executor.handle_text("42", "/wol desktop").await.unwrap();
        assert_eq!(
            reply.text,
            "Sending Wake-on-LAN packet to 'desktop' (AA:BB:CC:DD:EE:FF)."
        );
        assert_eq!(*sender.sent.lock().unwrap(), vec!["AA:BB:CC:DD:EE:FF"]);
    }

    #[tokio::test]
    async fn test_other_users_see_nothing() {
        let (executor, _store) = executor_with(Arc::new(RecordingSender::default()));

        executor
            .handle_text("42", "/addmac desktop AA:BB:CC:DD:EE:FF")
            .await
            .unwrap();

        let reply = executor.handle_text("99", "/listmacs").await.unwrap();
        assert_eq!(reply.text, "You have no registered devices.");
        assert!(reply.buttons.is_empty());

        let reply = executor.handle_text("99", "/wol desktop").await.unwrap();
        assert_eq!(
            reply.text,
            "Device 'desktop' not found. Use /listmacs to see registered devices."
        );
    }

    #[tokio::test]
    async fn test_usage_replies() {
        let (executor, _store) = executor_with(Arc::new(RecordingSender::default()));

        let reply = executor.handle_text("42", "/addmac pc").await.unwrap();
        assert_eq!(reply.text, ADD_USAGE);

        let reply = executor.handle_text("42", "/wol").await.unwrap();
        assert_eq!(reply.text, WAKE_USAGE);

        assert!(executor.handle_text("42", "just chatting").await.is_none());
    }

    #[tokio::test]
    async fn test_button_wake_matches_command() {
        let sender = Arc::new(RecordingSender::default());
        let (executor, _store) = executor_with(sender.clone());
        executor
            .handle_text("42", "/addmac pc 11:22:33:44:55:66")
            .await
            .unwrap();

        let request = WakeRequest::from_callback("42", "wol:pc").unwrap();
        let reply = executor.wake(request).await;
        assert_eq!(
            reply.text,
            "Sending Wake-on-LAN packet to 'pc' (11:22:33:44:55:66)."
        );
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_command() {
        let (executor, _store) = executor_with(Arc::new(RecordingSender::default()));
        executor
            .handle_text("42", "/addmac pc 11:22:33:44:55:66")
            .await
            .unwrap();

        let reply = executor.handle_text("42", "/delmac pc").await.unwrap();
        assert_eq!(reply.text, "Device 'pc' removed.");

        let reply = executor.handle_text("42", "/delmac pc").await.unwrap();
        assert!(reply.text.starts_with("Device 'pc' not found"));
    }

    #[tokio::test]
    async fn test_persist_failure_reported() {
        let (executor, store) = executor_with(Arc::new(RecordingSender::default()));
        store.fail_next_saves(10);

        let reply = executor
            .handle_text("42", "/addmac pc 11:22:33:44:55:66")
            .await
            .unwrap();
        assert_eq!(reply.text, "Could not save your devices. Please try again later.");

        let reply = executor.handle_text("42", "/listmacs").await.unwrap();
        assert_eq!(reply.text, "You have no registered devices.");
    }

    #[tokio::test]
    async fn test_dispatch_failure_reported() {
        let (executor, _store) = executor_with(Arc::new(FailingSender));
        executor
            .handle_text("42", "/addmac pc 11:22:33:44:55:66")
            .await
            .unwrap();

        let reply = executor.handle_text("42", "/wol pc").await.unwrap();
        assert_eq!(
            reply.text,
            "Failed to send Wake-on-LAN packet to 'pc'. A network error occurred."
        );
    }

    #[tokio::test]
    async fn test_invalid_stored_address_reported() {
        let (executor, _store) = executor_with(Arc::new(UdpWakeSender::default()));
        executor
            .handle_text("42", "/addmac nas not-a-mac")
            .await
            .unwrap();

        let reply = executor.handle_text("42", "/wol nas").await.unwrap();
        assert_eq!(
            reply.text,
            "Failed to send Wake-on-LAN packet to 'nas'. \
             The stored hardware address is not a valid MAC address."
        );
    }

    #[tokio::test]
    async fn test_strict_add_echoes_stored_address() {
        let (executor, store) = executor_with_policy(
            Arc::new(RecordingSender::default()),
            DirectoryPolicy::default().with_validate_addresses(true),
        );

        let reply = executor
            .handle_text("42", "/addmac pc aa-bb-cc-dd-ee-ff")
            .await
            .unwrap();
        assert_eq!(reply.text, "MAC address 'AA:BB:CC:DD:EE:FF' registered as 'pc'.");
        assert_eq!(
            store.snapshot().unwrap().get("42", "pc"),
            Some("AA:BB:CC:DD:EE:FF")
        );
    }
}
