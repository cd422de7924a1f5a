//! Configuration file loading and merging with CLI flags.
//!
//! The file is plain `key = value` lines:
//!
//! ```text
//! # ~/.config/ebook-archiver/config.toml
//! username = "reader@example.com"
//! password = "secret"
//! save_path = "/srv/books"
//! insecure_tls = false
//! run_timeout_secs = 3600
//! ```
//!
//! String values must be double-quoted. Inside quotes any character is
//! allowed, `#` included; write `\"` for a quote and `\\` for a backslash.
//! Other backslashes are kept as written. A `#` outside quotes starts a
//! comment.

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use ebook_archiver_core::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use ebook_archiver_core::{Credentials, TransportOptions};

use crate::cli::Args;

const APP_DIR: &str = "ebook-archiver";
const USERNAME_ENV: &str = "EBOOK_USERNAME";
const PASSWORD_ENV: &str = "EBOOK_PASSWORD";
const DEFAULT_SAVE_PATH: &str = "books";

/// Values read from the configuration file.
#[derive(Clone, Default)]
pub(crate) struct FileConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub save_path: Option<PathBuf>,
    pub proxy: Option<String>,
    pub insecure_tls: Option<bool>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    pub run_timeout_secs: Option<u64>,
}

impl fmt::Debug for FileConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("save_path", &self.save_path)
            .field("proxy", &self.proxy)
            .field("insecure_tls", &self.insecure_tls)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .field("run_timeout_secs", &self.run_timeout_secs)
            .finish()
    }
}

impl FileConfig {
    /// Validates value ranges.
    pub(crate) fn validate(&self) -> Result<()> {
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs, 3600)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs, 3600)?;
        validate_timeout_secs("run_timeout_secs", self.run_timeout_secs, 7 * 24 * 3600)?;
        if let Some(proxy) = &self.proxy
            && proxy.trim().is_empty()
        {
            bail!("Invalid config value for `proxy`: must not be empty");
        }
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>, max: u64) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=max).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..={max}");
    }
    Ok(())
}

/// Everything a run needs, after merging flags, file and environment.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub credentials: Credentials,
    pub save_path: PathBuf,
    pub transport: TransportOptions,
    pub run_timeout: Option<Duration>,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/ebook-archiver/config.toml`
/// 2. `$HOME/.config/ebook-archiver/config.toml`
#[must_use]
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist; the default path is optional.
pub(crate) fn load_file_config(explicit: Option<&Path>) -> Result<FileConfig> {
    if let Some(path) = explicit {
        return read_file_config(path);
    }
    match resolve_default_config_path() {
        Some(path) if path.exists() => read_file_config(&path),
        _ => Ok(FileConfig::default()),
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

/// Merges CLI flags over the file config, filling credentials from the environment.
pub(crate) fn resolve_settings(
    args: &Args,
    file: FileConfig,
    env_lookup: impl Fn(&str) -> Option<String>,
) -> Result<RunSettings> {
    let username = file
        .username
        .filter(|v| !v.is_empty())
        .or_else(|| env_lookup(USERNAME_ENV))
        .unwrap_or_default();
    let password = file
        .password
        .filter(|v| !v.is_empty())
        .or_else(|| env_lookup(PASSWORD_ENV))
        .unwrap_or_default();
    let credentials = Credentials::new(username, password);
    if !credentials.is_complete() {
        bail!(
            "Missing credentials: set `username` and `password` in the config file \
             or {USERNAME_ENV} / {PASSWORD_ENV}"
        );
    }

    let save_path = args
        .output_dir
        .clone()
        .or(file.save_path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_PATH));

    let transport = TransportOptions {
        insecure_tls: args.insecure || file.insecure_tls.unwrap_or(false),
        proxy: args.proxy.clone().or(file.proxy),
        connect_timeout_secs: file.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS),
        read_timeout_secs: file.read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
    };

    Ok(RunSettings {
        credentials,
        save_path,
        transport,
        run_timeout: file.run_timeout_secs.map(Duration::from_secs),
    })
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_no = line_index + 1;

        match key {
            "username" => {
                cfg.username = Some(
                    parse_string_literal(value)
                        .with_context(|| format!("Invalid `username` value on line {line_no}"))?,
                );
            }
            "password" => {
                cfg.password = Some(
                    parse_string_literal(value)
                        .with_context(|| format!("Invalid `password` value on line {line_no}"))?,
                );
            }
            "save_path" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `save_path` value on line {line_no}"))?;
                cfg.save_path = Some(PathBuf::from(parsed));
            }
            "proxy" => {
                cfg.proxy = Some(
                    parse_string_literal(value)
                        .with_context(|| format!("Invalid `proxy` value on line {line_no}"))?,
                );
            }
            "insecure_tls" => {
                cfg.insecure_tls = Some(
                    parse_boolean(value)
                        .with_context(|| format!("Invalid `insecure_tls` value on line {line_no}"))?,
                );
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(|| {
                    format!("Invalid `connect_timeout_secs` value on line {line_no}")
                })?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(|| {
                    format!("Invalid `read_timeout_secs` value on line {line_no}")
                })?);
            }
            "run_timeout_secs" => {
                cfg.run_timeout_secs = Some(parse_integer_u64(value).with_context(|| {
                    format!("Invalid `run_timeout_secs` value on line {line_no}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (index, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    let Some(rest) = raw_value.strip_prefix('"') else {
        bail!("Expected double-quoted string");
    };
    let mut out = String::with_capacity(rest.len());
    let mut chars = rest.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if !chars.as_str().trim().is_empty() {
                    bail!("Unexpected characters after closing quote");
                }
                return Ok(out);
            }
            '\\' => match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => break,
            },
            c => out.push(c),
        }
    }
    bail!("Expected double-quoted string")
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}
