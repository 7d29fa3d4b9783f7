//! Shared message and channel types exchanged between protocol connectors
//! and the gateway router.
//!
//! These types are consumed, not processed, by the configuration core; they
//! live here because every collaborator that takes a [`crate::Config`] also
//! speaks this vocabulary.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event names carried in [`Message::event`].
pub const EVENT_JOIN_LEAVE: &str = "join_leave";
pub const EVENT_TOPIC_CHANGE: &str = "topic_change";
pub const EVENT_FAILURE: &str = "failure";
pub const EVENT_FILE_FAILURE_SIZE: &str = "file_failure_size";
pub const EVENT_AVATAR_DOWNLOAD: &str = "avatar_download";
pub const EVENT_REJOIN_CHANNELS: &str = "rejoin_channels";
pub const EVENT_USER_ACTION: &str = "user_action";
pub const EVENT_MSG_DELETE: &str = "msg_delete";
pub const EVENT_FILE_DELETE: &str = "file_delete";
pub const EVENT_API_CONNECTED: &str = "api_connected";
pub const EVENT_USER_TYPING: &str = "user_typing";
pub const EVENT_GET_CHANNEL_MEMBERS: &str = "get_channel_members";
pub const EVENT_NOTICE_IRC: &str = "notice_irc";

/// Sentinel parent ID for replies whose parent could not be resolved.
pub const PARENT_ID_NOT_FOUND: &str = "msg-parent-not-found";

/// Key under which file attachments travel in [`Message::extra`].
pub const EXTRA_FILE: &str = "file";

/// An attachment contained in a message.
///
/// A connector receiving an attachment populates `data`/`size`. When a
/// media server is configured, the gateway router uploads the file and
/// fills in `url`/`sha` for services that cannot upload themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    pub comment: String,
    pub url: String,
    pub size: i64,
    pub avatar: bool,
    pub sha: String,
    pub native_id: String,
}

/// A single entry in a message's extra payload.
///
/// Known payloads decode into their typed form; anything else is carried
/// as raw JSON so connectors can round-trip data they do not understand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    File(FileInfo),
    Other(serde_json::Value),
}

/// One message as it travels across the relay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub channel: String,
    pub username: String,
    /// Username before the remote nick format was applied.
    pub original_username: String,
    /// User ID on the originating service.
    #[serde(rename = "userid")]
    pub user_id: String,
    pub avatar: String,
    /// Instance reference, `protocol.name`.
    pub account: String,
    pub event: String,
    pub protocol: String,
    pub gateway: String,
    pub parent_id: String,
    pub timestamp: DateTime<Utc>,
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Vec<ExtraValue>>,
}

impl Message {
    /// True if a parent was referenced but could not be resolved.
    pub fn parent_not_found(&self) -> bool {
        self.parent_id == PARENT_ID_NOT_FOUND
    }

    /// True if the message carries a usable parent reference.
    pub fn parent_valid(&self) -> bool {
        !self.parent_id.is_empty() && !self.parent_not_found()
    }

    /// The typed file attachments of this message.
    ///
    /// Entries under the file key that are not attachments are skipped
    /// with a warning; this never fails.
    pub fn file_infos(&self) -> Vec<&FileInfo> {
        let Some(entries) = self.extra.get(EXTRA_FILE) else {
            return Vec::new();
        };
        entries
            .iter()
            .filter_map(|entry| match entry {
                ExtraValue::File(info) => Some(info),
                ExtraValue::Other(_) => {
                    tracing::warn!(
                        id = %self.id,
                        account = %self.account,
                        "message extra entry under the file key is not an attachment"
                    );
                    None
                }
            })
            .collect()
    }
}

/// Expand an avatar URL template against a message.
///
/// Supported placeholders: `{NICK}`, `{BRIDGE}` (instance name) and
/// `{PROTOCOL}`, resolved from the message's `protocol.name` account
/// reference.
pub fn icon_url(msg: &Message, template: &str) -> String {
    let (protocol, name) = msg
        .account
        .split_once('.')
        .unwrap_or((msg.account.as_str(), ""));
    template
        .replace("{NICK}", &msg.username)
        .replace("{BRIDGE}", name)
        .replace("{PROTOCOL}", protocol)
}

/// A channel as seen by one protocol instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub name: String,
    pub account: String,
    pub direction: String,
    pub id: String,
    pub same_channel: BTreeMap<String, bool>,
    pub options: crate::config::ChannelOptions,
}

/// One member of a channel, as reported by a connector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelMember {
    pub username: String,
    pub nick: String,
    pub user_id: String,
    pub channel_id: String,
    pub channel_name: String,
}

pub type ChannelMembers = Vec<ChannelMember>;
