use crate::error::{BridgeError, Result};

/// Longest name the WireGuard backends accept for a tunnel interface.
pub const MAX_TUNNEL_NAME_LEN: usize = 15;

/// Identity and configuration for one named tunnel. The controller owns the
/// current handle exclusively; monitors only ever read the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelHandle {
    name: String,
    config_text: Option<String>,
}

impl TunnelHandle {
    /// Create a handle for a validated tunnel name. The config is attached
    /// later, at connect time.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            config_text: None,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config_text(&self) -> Option<&str> {
        self.config_text.as_deref()
    }

    pub fn set_config_text(&mut self, config_text: impl Into<String>) {
        self.config_text = Some(config_text.into());
    }
}

/// Enforce the backend naming scheme: 1-15 characters from
/// `[A-Za-z0-9_=+.-]` (the rule wireguard-android applies to tunnel names).
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "name must not be empty"));
    }
    if name.len() > MAX_TUNNEL_NAME_LEN {
        return Err(invalid(
            name,
            "name must be at most 15 characters for the backend interface",
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '=' | '+' | '.' | '-')))
    {
        return Err(invalid(
            name,
            format!("character {bad:?} is not allowed in a tunnel name"),
        ));
    }
    Ok(())
}

fn invalid(name: &str, reason: impl Into<String>) -> BridgeError {
    BridgeError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}
