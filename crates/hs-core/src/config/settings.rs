//! Homestead settings file

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::expand_home;

/// Root of `settings.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where state, markers and generated files live
    pub paths: PathSettings,

    /// Preflight checks
    pub preflight: PreflightSettings,

    /// Container runtime step
    pub container: ContainerSettings,

    /// WireGuard defaults
    pub wireguard: WireGuardSettings,

    /// Deployment step
    pub deployment: DeploymentSettings,
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Flat key=value store
    pub state_file: PathBuf,

    /// Completion marker directory
    pub marker_dir: PathBuf,

    /// Directory receiving `<iface>.conf`
    pub wireguard_dir: PathBuf,

    /// Directory receiving exported client configs
    pub peer_output_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("~/.config/homestead/state"),
            marker_dir: PathBuf::from("~/.config/homestead/markers"),
            wireguard_dir: PathBuf::from("/etc/wireguard"),
            peer_output_dir: PathBuf::from("~/.config/homestead/peers"),
        }
    }
}

impl PathSettings {
    /// State file with `~` expanded
    pub fn state_file(&self) -> PathBuf {
        expand_home(&self.state_file)
    }

    /// Marker directory with `~` expanded
    pub fn marker_dir(&self) -> PathBuf {
        expand_home(&self.marker_dir)
    }

    /// WireGuard config directory with `~` expanded
    pub fn wireguard_dir(&self) -> PathBuf {
        expand_home(&self.wireguard_dir)
    }

    /// Peer export directory with `~` expanded
    pub fn peer_output_dir(&self) -> PathBuf {
        expand_home(&self.peer_output_dir)
    }
}

/// Preflight step settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreflightSettings {
    /// Programs that must resolve on `PATH`
    pub required_commands: Vec<String>,
}

impl Default for PreflightSettings {
    fn default() -> Self {
        Self {
            required_commands: vec!["systemctl".into(), "mount".into(), "id".into()],
        }
    }
}

/// Container step settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// Runtimes offered at the prompt, first is the default
    pub runtimes: Vec<String>,

    /// Package manager used to install a missing runtime
    pub package_manager: String,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            runtimes: vec!["docker".into(), "podman".into()],
            package_manager: "apt-get".into(),
        }
    }
}

/// Which implementation produces WireGuard keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyBackend {
    /// `wg` when installed, native otherwise
    #[default]
    Auto,
    /// Always shell out to `wg`
    Wg,
    /// In-process Curve25519
    Native,
}

impl fmt::Display for KeyBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyBackend::Auto => write!(f, "auto"),
            KeyBackend::Wg => write!(f, "wg"),
            KeyBackend::Native => write!(f, "native"),
        }
    }
}

/// WireGuard defaults offered at prompts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WireGuardSettings {
    /// Key generation backend
    pub key_backend: KeyBackend,

    /// Default interface name
    pub interface: String,

    /// Default server address (CIDR)
    pub address: String,

    /// Default UDP listen port
    pub listen_port: u16,

    /// Default DNS pushed to clients
    pub dns: String,

    /// Default persistent keepalive in seconds (0 disables)
    pub keepalive: u16,
}

impl Default for WireGuardSettings {
    fn default() -> Self {
        Self {
            key_backend: KeyBackend::Auto,
            interface: "wg0".into(),
            address: "10.253.0.1/24".into(),
            listen_port: 51820,
            dns: "1.1.1.1".into(),
            keepalive: 25,
        }
    }
}

/// Deployment step settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentSettings {
    /// Images offered for pulling
    pub images: Vec<String>,
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self {
            images: vec![
                "portainer/portainer-ce:latest".into(),
                "containrrr/watchtower:latest".into(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[wireguard]
key_backend = "native"
listen_port = 51821
"#,
        )
        .unwrap();

        assert_eq!(settings.wireguard.key_backend, KeyBackend::Native);
        assert_eq!(settings.wireguard.listen_port, 51821);
        assert_eq!(settings.wireguard.interface, "wg0");
        assert_eq!(settings.container.runtimes[0], "docker");
    }

    #[test]
    fn test_key_backend_display() {
        assert_eq!(KeyBackend::Auto.to_string(), "auto");
        assert_eq!(KeyBackend::Native.to_string(), "native");
    }

    #[test]
    fn test_settings_json_shape() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["wireguard"]["key_backend"], "auto");
        assert_eq!(json["paths"]["wireguard_dir"], "/etc/wireguard");
    }
}
