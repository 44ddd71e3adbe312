// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model.
//!
//! Every struct uses `#[serde(deny_unknown_fields)]` so a typo in
//! `blacklab.toml` fails at startup instead of being silently ignored.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BlacklabConfig {
    #[serde(default)]
    pub bot: BotConfig,

    /// Texts shown to customers.
    #[serde(default)]
    pub business: BusinessConfig,

    /// WhatsApp Cloud API credentials and endpoints.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP listener for the webhook and admin API.
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// trace, debug, info, warn or error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "blacklab".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessConfig {
    #[serde(default = "default_display_name")]
    pub display_name: String,

    /// Prefix shown before prices, e.g. `KSh`.
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_about_text")]
    pub about_text: String,

    #[serde(default = "default_support_phone")]
    pub support_phone: String,

    #[serde(default = "default_support_email")]
    pub support_email: String,

    /// Footer line on interactive messages.
    #[serde(default = "default_footer")]
    pub footer: String,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
            currency: default_currency(),
            about_text: default_about_text(),
            support_phone: default_support_phone(),
            support_email: default_support_email(),
            footer: default_footer(),
        }
    }
}

fn default_display_name() -> String {
    "BlackLab".to_string()
}

fn default_currency() -> String {
    "KSh".to_string()
}

fn default_about_text() -> String {
    "Kenya's #1 Instant Airtime & Data Vendor. Bundles are delivered the moment your M-Pesa payment clears.".to_string()
}

fn default_support_phone() -> String {
    "+254 700 000 000".to_string()
}

fn default_support_email() -> String {
    "support@blacklab.ke".to_string()
}

fn default_footer() -> String {
    "Instant Delivery • 24/7".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Graph API bearer token. Required by `serve` and `broadcast`.
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub phone_number_id: Option<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Token Meta echoes during the `GET /webhook` subscription handshake.
    #[serde(default)]
    pub verify_token: Option<String>,

    /// When set, `X-Hub-Signature-256` is required on every delivery.
    #[serde(default)]
    pub app_secret: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Delay before the single retry of a failed send.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            api_version: default_api_version(),
            api_base_url: default_api_base_url(),
            verify_token: None,
            app_secret: None,
            request_timeout_secs: default_request_timeout_secs(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_api_version() -> String {
    "v20.0".to_string()
}

fn default_api_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_retry_backoff_ms() -> u64 {
    500
}

/// Where conversation sessions live.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: SessionBackend,

    /// Inactivity after which a session counts as idle.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Number of recent message ids remembered for duplicate detection.
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            timeout_secs: default_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            dedup_capacity: default_dedup_capacity(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    900
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_dedup_capacity() -> usize {
    10_000
}

/// SQLite database holding the catalog, orders, users and (optionally) sessions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("blacklab").join("blacklab.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("blacklab.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token for `/v1/*`. Without it the admin API rejects every request.
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_token: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}
