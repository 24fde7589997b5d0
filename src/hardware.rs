use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::sysfs::{is_amd_vendor, is_device_enabled};

const CARD_PREFIX: &str = "card";

/// An eligible GPU found under the DRM class directory.
#[derive(Debug)]
pub struct Card {
    pub name: String,           // "card0", "card1", ...
    pub device_dir: PathBuf,    // <drm>/cardN/device, where the amdgpu attributes live
}

/// Matches "cardN" where N is one or more decimal digits. Connectors such as
/// "card0-DP-1" and render nodes are rejected.
pub fn is_card_name(name: &str) -> bool {
    match name.strip_prefix(CARD_PREFIX) {
        Some(number) => !number.is_empty() && number.bytes().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

/// Lazily walks `drm_dir` and yields every enabled AMD card, in whatever
/// order the kernel lists them.
pub fn eligible_cards(drm_dir: &Path) -> io::Result<impl Iterator<Item = Card>> {
    let entries = fs::read_dir(drm_dir)?;

    Ok(entries.flatten().filter_map(|entry| {
        let path = entry.path();
        // Entries under /sys/class/drm are symlinks, so follow them
        if !path.is_dir() {
            return None;
        }

        let name = entry.file_name().into_string().ok()?;
        if !is_card_name(&name) {
            return None;
        }

        let device_dir = path.join("device");

        if !is_amd_vendor(&device_dir) {
            debug!("Skipping {name}: not an AMD GPU");
            return None;
        }

        if !is_device_enabled(&device_dir) {
            debug!("Skipping {name}: device not enabled");
            return None;
        }

        Some(Card { name, device_dir })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn add_card(drm: &Path, name: &str, vendor: &str, enable: &str) {
        let device = drm.join(name).join("device");
        fs::create_dir_all(&device).unwrap();
        fs::write(device.join("vendor"), vendor).unwrap();
        fs::write(device.join("enable"), enable).unwrap();
    }

    fn names(drm: &Path) -> Vec<String> {
        let mut names: Vec<String> = eligible_cards(drm).unwrap().map(|c| c.name).collect();
        names.sort();
        names
    }

    #[test]
    fn test_card_name_pattern() {
        assert!(is_card_name("card0"));
        assert!(is_card_name("card12"));
        assert!(!is_card_name("card"));
        assert!(!is_card_name("cardX"));
        assert!(!is_card_name("card0-DP-1"));
        assert!(!is_card_name("card1a"));
        assert!(!is_card_name("renderD128"));
        assert!(!is_card_name("car"));
        assert!(!is_card_name(""));
    }

    #[test]
    fn test_yields_enabled_amd_cards_once_each() {
        let tmp = TempDir::new().unwrap();
        add_card(tmp.path(), "card0", "0x1002\n", "1\n");
        add_card(tmp.path(), "card1", "0x1002\n", "1\n");

        assert_eq!(names(tmp.path()), vec!["card0", "card1"]);
    }

    #[test]
    fn test_skips_foreign_and_disabled_cards() {
        let tmp = TempDir::new().unwrap();
        add_card(tmp.path(), "card0", "0x1002\n", "1\n");
        add_card(tmp.path(), "card1", "0x1002\n", "0\n");
        add_card(tmp.path(), "card2", "0x10de\n", "1\n");
        add_card(tmp.path(), "card3", "0x8086\n", "0\n");

        assert_eq!(names(tmp.path()), vec!["card0"]);
    }

    #[test]
    fn test_skips_malformed_names_and_plain_files() {
        let tmp = TempDir::new().unwrap();
        add_card(tmp.path(), "card0", "0x1002\n", "1\n");
        add_card(tmp.path(), "cardX", "0x1002\n", "1\n");
        add_card(tmp.path(), "card0-DP-1", "0x1002\n", "1\n");
        add_card(tmp.path(), "renderD128", "0x1002\n", "1\n");
        fs::write(tmp.path().join("card5"), "not a directory").unwrap();
        fs::write(tmp.path().join("version"), "drm 1.1.0").unwrap();

        assert_eq!(names(tmp.path()), vec!["card0"]);
    }

    #[test]
    fn test_device_dir_points_at_attributes() {
        let tmp = TempDir::new().unwrap();
        add_card(tmp.path(), "card7", "0x1002\n", "1\n");

        let card = eligible_cards(tmp.path()).unwrap().next().unwrap();
        assert_eq!(card.name, "card7");
        assert_eq!(card.device_dir, tmp.path().join("card7").join("device"));
    }

    #[test]
    fn test_missing_drm_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(eligible_cards(&tmp.path().join("drm")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_follows_symlinked_entries() {
        let tmp = TempDir::new().unwrap();
        let devices = tmp.path().join("devices");
        let drm = tmp.path().join("drm");
        fs::create_dir_all(&drm).unwrap();
        add_card(&devices, "card0", "0x1002\n", "1\n");
        std::os::unix::fs::symlink(devices.join("card0"), drm.join("card0")).unwrap();

        assert_eq!(names(&drm), vec!["card0"]);
    }
}
