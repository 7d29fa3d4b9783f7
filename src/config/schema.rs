//! Typed configuration schema and projection.
//!
//! # Responsibilities
//! - Define the nested settings schema: protocol families → named instances
//!   → per-protocol option sets, plus general, routing and scripting blocks
//! - Project the generic document tree into that schema in one structural
//!   decode
//! - Apply post-projection normalization (media download size default)
//!
//! # Design Decisions
//! - The projection is best-effort, not a validator: unknown keys are
//!   ignored and absent fields keep their zero defaults
//! - The snapshot cannot express presence; callers that must distinguish
//!   "unset" from an explicit zero value go through the dynamic accessor
//! - Serde names are the lowercase fold of the document keys, so the
//!   projection addresses exactly the same tree as the dynamic lookups

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::document::DocumentStore;

/// Applied to `general.mediadownloadsize` when the document leaves it unset
/// or zero.
pub const DEFAULT_MEDIA_DOWNLOAD_SIZE: i64 = 1_000_000;

/// Error raised when the document tree does not structurally decode into the
/// settings schema.
#[derive(Debug, Error)]
#[error("failed to decode typed settings: {0}")]
pub struct ProjectionError(#[from] serde_json::Error);

/// Per-instance option set for one protocol connector.
///
/// Every field is optional; absence decodes to the type's zero value. The
/// snapshot alone therefore cannot distinguish "unset" from an explicit
/// `false`/`0`/`""` — consumers needing that distinction ask the document
/// store instead.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtocolSettings {
    /// Roles or users a relayed message may mention.
    #[serde(rename = "allowmention")]
    pub allow_mention: Vec<String>,
    #[serde(rename = "bindaddress")]
    pub bind_address: String,
    /// Message buffer size for the API connector.
    pub buffer: i64,
    /// Character set used when talking to the server.
    pub charset: String,
    #[serde(rename = "clientid")]
    pub client_id: String,
    /// Map nicks to per-user colors where the protocol allows it.
    #[serde(rename = "colornicks")]
    pub color_nicks: bool,
    pub debug: bool,
    #[serde(rename = "debuglevel")]
    pub debug_level: i64,
    #[serde(rename = "deviceid")]
    pub device_id: String,
    #[serde(rename = "disablewebpagepreview")]
    pub disable_web_page_preview: bool,
    /// Suffix appended to edited messages.
    #[serde(rename = "editsuffix")]
    pub edit_suffix: String,
    /// Drop message edits instead of relaying them.
    #[serde(rename = "editdisable")]
    pub edit_disable: bool,
    #[serde(rename = "htmldisable")]
    pub html_disable: bool,
    /// Avatar URL template; supports {NICK}, {BRIDGE} and {PROTOCOL}.
    #[serde(rename = "iconurl")]
    pub icon_url: String,
    /// Keep the relay running when this instance fails to connect at start.
    #[serde(rename = "ignorefailureonstart")]
    pub ignore_failure_on_start: bool,
    /// Space-separated nicks whose messages are never relayed.
    #[serde(rename = "ignorenicks")]
    pub ignore_nicks: String,
    /// Regex of message texts that are never relayed.
    #[serde(rename = "ignoremessages")]
    pub ignore_messages: String,
    pub jid: String,
    /// Delay before joining channels, as a duration string.
    #[serde(rename = "joindelay")]
    pub join_delay: String,
    pub label: String,
    pub login: String,
    /// Path the process log is appended to; empty keeps the default sink.
    #[serde(rename = "logfile")]
    pub log_file: String,
    /// Regex patterns for media file names that must not be downloaded.
    #[serde(rename = "mediadownloadblacklist")]
    pub media_download_blacklist: Vec<String>,
    /// Local directory downloaded media is written to.
    #[serde(rename = "mediadownloadpath")]
    pub media_download_path: String,
    /// Largest media attachment, in bytes, the relay will download.
    #[serde(rename = "mediadownloadsize")]
    pub media_download_size: i64,
    #[serde(rename = "mediaserverdownload")]
    pub media_server_download: String,
    #[serde(rename = "mediaconverttgs")]
    pub media_convert_tgs: String,
    #[serde(rename = "mediaconvertwebptopng")]
    pub media_convert_webp_to_png: bool,
    /// Milliseconds to wait between outgoing messages (flood control).
    #[serde(rename = "messagedelay")]
    pub message_delay: i64,
    #[serde(rename = "messageformat")]
    pub message_format: String,
    /// Maximum length of an outgoing message.
    #[serde(rename = "messagelength")]
    pub message_length: i64,
    /// Size of the outgoing message queue.
    #[serde(rename = "messagequeue")]
    pub message_queue: i64,
    /// Split messages longer than the limit instead of clipping them.
    #[serde(rename = "messagesplit")]
    pub message_split: bool,
    #[serde(rename = "messagesplitmaxcount")]
    pub message_split_max_count: i64,
    pub muc: String,
    #[serde(rename = "mxid")]
    pub mx_id: String,
    pub name: String,
    pub nick: String,
    #[serde(rename = "nickformatter")]
    pub nick_formatter: String,
    #[serde(rename = "nickservnick")]
    pub nick_serv_nick: String,
    #[serde(rename = "nickservusername")]
    pub nick_serv_username: String,
    #[serde(rename = "nickservpassword")]
    pub nick_serv_password: String,
    #[serde(rename = "nicksperrow")]
    pub nicks_per_row: i64,
    #[serde(rename = "nohomeserversuffix")]
    pub no_home_server_suffix: bool,
    #[serde(rename = "nosendjoinpart")]
    pub no_send_join_part: bool,
    #[serde(rename = "notls")]
    pub no_tls: bool,
    pub password: String,
    #[serde(rename = "picklekey")]
    pub pickle_key: String,
    #[serde(rename = "prefixmessageswithnick")]
    pub prefix_messages_with_nick: bool,
    #[serde(rename = "preservethreading")]
    pub preserve_threading: bool,
    pub protocol: String,
    #[serde(rename = "quotedisable")]
    pub quote_disable: bool,
    #[serde(rename = "quoteformat")]
    pub quote_format: String,
    #[serde(rename = "quotelengthlimit")]
    pub quote_length_limit: i64,
    #[serde(rename = "realname")]
    pub real_name: String,
    #[serde(rename = "recoverykey")]
    pub recovery_key: String,
    #[serde(rename = "rejoindelay")]
    pub rejoin_delay: i64,
    /// Pairs of (pattern, replacement) applied to message texts.
    #[serde(rename = "replacemessages")]
    pub replace_messages: Vec<Vec<String>>,
    /// Pairs of (pattern, replacement) applied to nicks.
    #[serde(rename = "replacenicks")]
    pub replace_nicks: Vec<Vec<String>>,
    /// Format template for nicks relayed from other instances.
    #[serde(rename = "remotenickformat")]
    pub remote_nick_format: String,
    /// Raw commands sent after connecting.
    #[serde(rename = "runcommands")]
    pub run_commands: Vec<String>,
    pub server: String,
    #[serde(rename = "sessionfile")]
    pub session_file: String,
    #[serde(rename = "showjoinpart")]
    pub show_join_part: bool,
    #[serde(rename = "showtopicchange")]
    pub show_topic_change: bool,
    #[serde(rename = "showusertyping")]
    pub show_user_typing: bool,
    #[serde(rename = "showembeds")]
    pub show_embeds: bool,
    #[serde(rename = "skiptlsverify")]
    pub skip_tls_verify: bool,
    #[serde(rename = "skipversioncheck")]
    pub skip_version_check: bool,
    #[serde(rename = "stripnick")]
    pub strip_nick: bool,
    #[serde(rename = "stripmarkdown")]
    pub strip_markdown: bool,
    #[serde(rename = "synctopic")]
    pub sync_topic: bool,
    /// Script invoked to rewrite a message before it is relayed.
    #[serde(rename = "scriptmodifymessage")]
    pub script_modify_message: String,
    pub team: String,
    #[serde(rename = "teamid")]
    pub team_id: String,
    #[serde(rename = "tenantid")]
    pub tenant_id: String,
    pub token: String,
    pub topic: String,
    pub url: String,
    #[serde(rename = "useapi")]
    pub use_api: bool,
    #[serde(rename = "uselocalavatar")]
    pub use_local_avatar: Vec<String>,
    #[serde(rename = "usesasl")]
    pub use_sasl: bool,
    #[serde(rename = "usetls")]
    pub use_tls: bool,
    #[serde(rename = "usediscriminator")]
    pub use_discriminator: bool,
    #[serde(rename = "usefirstname")]
    pub use_first_name: bool,
    #[serde(rename = "useusername")]
    pub use_user_name: bool,
    #[serde(rename = "useinsecureurl")]
    pub use_insecure_url: bool,
    #[serde(rename = "username")]
    pub user_name: String,
    #[serde(rename = "verbosejoinpart")]
    pub verbose_join_part: bool,
    #[serde(rename = "webhookbindaddress")]
    pub webhook_bind_address: String,
    #[serde(rename = "webhookurl")]
    pub webhook_url: String,
}

/// Per-channel options carried by a gateway endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelOptions {
    /// Channel key/password where the protocol supports one.
    pub key: String,
    #[serde(rename = "webhookurl")]
    pub webhook_url: String,
    pub topic: String,
}

/// One endpoint of a gateway: an account (protocol instance) plus a channel.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeEndpoint {
    /// Instance reference, `protocol.name` (e.g. `irc.libera`).
    pub account: String,
    pub channel: String,
    pub options: ChannelOptions,
    #[serde(rename = "samechannel")]
    pub same_channel: bool,
}

/// Routing between named relay instances. Endpoints are grouped by
/// direction: inbound only, outbound only, or both.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub name: String,
    pub enable: bool,
    #[serde(rename = "in")]
    pub inbound: Vec<BridgeEndpoint>,
    #[serde(rename = "out")]
    pub outbound: Vec<BridgeEndpoint>,
    #[serde(rename = "inout")]
    pub bidirectional: Vec<BridgeEndpoint>,
}

/// A named group of channels/accounts treated as one logical room.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SameChannelGatewayConfig {
    pub name: String,
    pub enable: bool,
    pub channels: Vec<String>,
    pub accounts: Vec<String>,
}

/// Scripting hooks applied around message handling.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScriptHooksConfig {
    #[serde(rename = "inmessage")]
    pub in_message: String,
    pub message: String,
    #[serde(rename = "remotenickformat")]
    pub remote_nick_format: String,
    #[serde(rename = "outmessage")]
    pub out_message: String,
}

/// The typed settings snapshot: the whole document projected into the
/// nested schema.
///
/// Rebuilt wholesale by [`RelayValues::project`]; a snapshot taken at load
/// time is NOT refreshed when the document store reloads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayValues {
    pub api: BTreeMap<String, ProtocolSettings>,
    pub irc: BTreeMap<String, ProtocolSettings>,
    pub mattermost: BTreeMap<String, ProtocolSettings>,
    pub matrix: BTreeMap<String, ProtocolSettings>,
    pub slack: BTreeMap<String, ProtocolSettings>,
    #[serde(rename = "slacklegacy")]
    pub slack_legacy: BTreeMap<String, ProtocolSettings>,
    pub steam: BTreeMap<String, ProtocolSettings>,
    pub xmpp: BTreeMap<String, ProtocolSettings>,
    pub discord: BTreeMap<String, ProtocolSettings>,
    pub telegram: BTreeMap<String, ProtocolSettings>,
    pub rocketchat: BTreeMap<String, ProtocolSettings>,
    #[serde(rename = "sshchat")]
    pub ssh_chat: BTreeMap<String, ProtocolSettings>,
    pub whatsapp: BTreeMap<String, ProtocolSettings>,
    pub zulip: BTreeMap<String, ProtocolSettings>,
    pub keybase: BTreeMap<String, ProtocolSettings>,
    pub mumble: BTreeMap<String, ProtocolSettings>,
    /// Options shared process-wide, addressed under `general.*`.
    pub general: ProtocolSettings,
    pub scripting: ScriptHooksConfig,
    pub gateway: Vec<GatewayConfig>,
    #[serde(rename = "samechannelgateway")]
    pub same_channel_gateway: Vec<SameChannelGatewayConfig>,
}

impl RelayValues {
    /// Structurally decode the document store into the settings schema.
    ///
    /// Normalization: an unset or zero `general.mediadownloadsize` is
    /// defaulted to [`DEFAULT_MEDIA_DOWNLOAD_SIZE`].
    pub fn project(document: &DocumentStore) -> Result<Self, ProjectionError> {
        let mut values: RelayValues = serde_json::from_value(document.root().to_json())?;
        if values.general.media_download_size == 0 {
            values.general.media_download_size = DEFAULT_MEDIA_DOWNLOAD_SIZE;
        }
        Ok(values)
    }

    /// Iterate every configured protocol instance as
    /// `(family, instance name, settings)`.
    pub fn instances(&self) -> impl Iterator<Item = (&'static str, &str, &ProtocolSettings)> {
        let families: [(&'static str, &BTreeMap<String, ProtocolSettings>); 16] = [
            ("api", &self.api),
            ("irc", &self.irc),
            ("mattermost", &self.mattermost),
            ("matrix", &self.matrix),
            ("slack", &self.slack),
            ("slacklegacy", &self.slack_legacy),
            ("steam", &self.steam),
            ("xmpp", &self.xmpp),
            ("discord", &self.discord),
            ("telegram", &self.telegram),
            ("rocketchat", &self.rocketchat),
            ("sshchat", &self.ssh_chat),
            ("whatsapp", &self.whatsapp),
            ("zulip", &self.zulip),
            ("keybase", &self.keybase),
            ("mumble", &self.mumble),
        ];
        families.into_iter().flat_map(|(family, instances)| {
            instances
                .iter()
                .map(move |(name, settings)| (family, name.as_str(), settings))
        })
    }
}
