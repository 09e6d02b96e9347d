use crate::alert::{AlertConfig, EmailAlertConfig};
use crate::cloudmark::CloudmarkConfig;

/// Internal validation, called automatically during `CloudmarkConfig::from_str` / `load`.
pub(crate) fn validate(config: &CloudmarkConfig) -> anyhow::Result<()> {
    for entry in &config.alerts {
        match &entry.config {
            AlertConfig::Email(email) => validate_email(&entry.name, email)?,
            AlertConfig::File(file) => {
                if file.path.as_os_str().is_empty() {
                    anyhow::bail!("alerts.{}: path must not be empty", entry.name);
                }
            }
        }
    }
    Ok(())
}

fn validate_email(name: &str, cfg: &EmailAlertConfig) -> anyhow::Result<()> {
    if cfg.host.trim().is_empty() {
        anyhow::bail!("alerts.{name}: host must not be empty");
    }
    if cfg.port == 0 {
        anyhow::bail!("alerts.{name}: port must be > 0");
    }
    if cfg.sender.trim().is_empty() {
        anyhow::bail!("alerts.{name}: sender must not be empty");
    }
    if cfg.to.is_empty() {
        anyhow::bail!("alerts.{name}: to must contain at least one recipient");
    }
    if let Some(i) = cfg.to.iter().position(|r| r.trim().is_empty()) {
        anyhow::bail!("alerts.{name}: to[{i}] is empty");
    }
    match (&cfg.username, &cfg.password) {
        (Some(_), None) => anyhow::bail!("alerts.{name}: username is set but password is missing"),
        (None, Some(_)) => anyhow::bail!("alerts.{name}: password is set but username is missing"),
        _ => {}
    }
    if cfg.timeout.is_zero() {
        anyhow::bail!("alerts.{name}: timeout must be > 0");
    }
    Ok(())
}

/// Plugin names must match `[A-Za-z_][A-Za-z0-9_-]*` so they can be used in
/// log fields and CLI output without quoting.
pub(crate) fn validate_names<'a>(
    section: &str,
    names: impl IntoIterator<Item = &'a String>,
) -> anyhow::Result<()> {
    for name in names {
        if !is_valid_plugin_name(name) {
            anyhow::bail!(
                "{section}: invalid plugin name {name:?}, must match [A-Za-z_][A-Za-z0-9_-]*"
            );
        }
    }
    Ok(())
}

fn is_valid_plugin_name(name: &str) -> bool {
    let mut chars = name.bytes();
    match chars.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    chars.all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}
