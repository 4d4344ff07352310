//! Type-safe configuration types for debsteward
//!
//! This module replaces stringly-typed configuration with proper Rust enums
//! that provide compile-time validation and exhaustive matching.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Desktop environment selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum DesktopEnvironment {
    #[default]
    #[strum(serialize = "xfce")]
    Xfce,
    #[strum(serialize = "kde")]
    Kde,
    #[strum(serialize = "gnome")]
    Gnome,
    #[strum(serialize = "cinnamon")]
    Cinnamon,
}

impl DesktopEnvironment {
    /// Metapackage set installed when switching to this environment
    pub fn packages(&self) -> &'static [&'static str] {
        match self {
            Self::Xfce => &["xfce4", "xfce4-goodies"],
            Self::Kde => &["kde-plasma-desktop"],
            Self::Gnome => &["gnome-core"],
            Self::Cinnamon => &["cinnamon-desktop-environment"],
        }
    }

    /// Package whose presence marks this environment as installed
    pub fn marker_package(&self) -> &'static str {
        match self {
            Self::Xfce => "xfce4-session",
            Self::Kde => "plasma-workspace",
            Self::Gnome => "gnome-shell",
            Self::Cinnamon => "cinnamon",
        }
    }

    /// Display manager paired with this environment
    pub fn display_manager(&self) -> DisplayManager {
        match self {
            Self::Xfce | Self::Cinnamon => DisplayManager::LightDm,
            Self::Kde => DisplayManager::Sddm,
            Self::Gnome => DisplayManager::Gdm3,
        }
    }
}

/// Display manager selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum DisplayManager {
    #[default]
    #[strum(serialize = "lightdm")]
    LightDm,
    #[strum(serialize = "sddm")]
    Sddm,
    #[strum(serialize = "gdm3")]
    Gdm3,
}

impl DisplayManager {
    /// Debian package name (matches the systemd service name)
    pub fn package(&self) -> &'static str {
        match self {
            Self::LightDm => "lightdm",
            Self::Sddm => "sddm",
            Self::Gdm3 => "gdm3",
        }
    }

    /// systemd service unit to enable after installation
    pub fn service(&self) -> &'static str {
        match self {
            Self::LightDm => "lightdm.service",
            Self::Sddm => "sddm.service",
            Self::Gdm3 => "gdm3.service",
        }
    }

    /// Configuration paths protected by a snapshot before switching
    pub fn config_paths(&self) -> Vec<std::path::PathBuf> {
        let paths = match self {
            Self::LightDm => &["/etc/lightdm"][..],
            Self::Sddm => &["/etc/sddm.conf.d"][..],
            Self::Gdm3 => &["/etc/gdm3"][..],
        };
        paths.iter().map(|p| std::path::PathBuf::from(*p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_desktop_environment_roundtrip() {
        for de in DesktopEnvironment::iter() {
            let s = de.to_string();
            let parsed: DesktopEnvironment = s.parse().unwrap();
            assert_eq!(de, parsed);
        }
    }

    #[test]
    fn test_desktop_environment_parse() {
        let de: DesktopEnvironment = "kde".parse().unwrap();
        assert_eq!(de, DesktopEnvironment::Kde);
        assert!("unity".parse::<DesktopEnvironment>().is_err());
    }

    #[test]
    fn test_display_manager_pairing() {
        assert_eq!(
            DesktopEnvironment::Gnome.display_manager(),
            DisplayManager::Gdm3
        );
        assert_eq!(
            DesktopEnvironment::Kde.display_manager(),
            DisplayManager::Sddm
        );
    }

    #[test]
    fn test_package_sets_non_empty() {
        for de in DesktopEnvironment::iter() {
            assert!(!de.packages().is_empty());
            assert!(!de.marker_package().is_empty());
        }
        for dm in DisplayManager::iter() {
            assert!(dm.service().ends_with(".service"));
        }
    }
}
