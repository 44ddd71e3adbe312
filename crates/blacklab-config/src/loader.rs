// SPDX-FileCopyrightText: 2026 BlackLab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-based layered loading.
//!
//! Merge order, later wins: compiled defaults, `/etc/blacklab/blacklab.toml`,
//! `~/.config/blacklab/blacklab.toml`, `./blacklab.toml`, `BLACKLAB_*` env vars.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::BlacklabConfig;

/// Top-level sections, used to map `BLACKLAB_<SECTION>_<KEY>` onto `section.key`.
const SECTIONS: &[&str] = &["bot", "business", "whatsapp", "session", "storage", "server"];

/// Config files in merge order (lowest precedence first).
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/blacklab/blacklab.toml")];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("blacklab/blacklab.toml"));
    }
    paths.push(PathBuf::from("blacklab.toml"));
    paths
}

pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(BlacklabConfig::default()));
    for path in config_paths() {
        figment = figment.merge(Toml::file(path));
    }
    figment.merge(env_provider())
}

pub fn load_config() -> Result<BlacklabConfig, figment::Error> {
    build_figment().extract()
}

/// Loads from a TOML string only, without files or env vars.
pub fn load_config_from_str(toml_content: &str) -> Result<BlacklabConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BlacklabConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Loads from one file, skipping the XDG lookup, with env overrides.
pub fn load_config_from_path(path: &Path) -> Result<BlacklabConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BlacklabConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// `BLACKLAB_WHATSAPP_ACCESS_TOKEN` -> `whatsapp.access_token`.
///
/// Only the section prefix is split; `Env::split("_")` would break keys
/// that contain underscores.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("BLACKLAB_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
