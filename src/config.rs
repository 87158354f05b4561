use std::fs;
use std::path::PathBuf;

use crate::error::Result;

const APP_DIR: &str = "wgbridge";

/// Root config directory: ~/.config/wgbridge/
#[must_use]
pub fn app_config_dir() -> PathBuf {
    xdg_config_home().join(APP_DIR)
}

/// Tunnel config directory: ~/.config/wgbridge/tunnels/
#[must_use]
pub fn tunnel_config_dir() -> PathBuf {
    app_config_dir().join("tunnels")
}

/// Config file path for one tunnel: ~/.config/wgbridge/tunnels/<name>.conf
#[must_use]
pub fn tunnel_config_path(tunnel: &str) -> PathBuf {
    tunnel_config_dir().join(format!("{tunnel}.conf"))
}

fn xdg_config_home() -> PathBuf {
    if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(config)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".config")
    } else {
        PathBuf::from("/tmp")
    }
}

pub fn ensure_tunnel_config_dir() -> Result<PathBuf> {
    let dir = tunnel_config_dir();
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o700))?;
        }
    }
    Ok(dir)
}

/// Write a tunnel config, private-key material included, with owner-only
/// permissions.
pub fn write_tunnel_config(tunnel: &str, config_text: &str) -> Result<PathBuf> {
    ensure_tunnel_config_dir()?;
    let path = tunnel_config_path(tunnel);
    fs::write(&path, config_text)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(path)
}

pub fn remove_tunnel_config(tunnel: &str) -> Result<()> {
    let path = tunnel_config_path(tunnel);
    if path.exists() {
        fs::remove_file(&path)?;
    }
    Ok(())
}
