//! Standard paths used by pomo

use std::path::PathBuf;

/// Application directory name under the platform config root
pub const APP_DIR: &str = "pomo";

/// Standard pomo paths
pub struct Paths {
    /// Config directory (~/.config/pomo)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join(APP_DIR);

        Self { config }
    }

    /// Paths rooted somewhere other than the user's home
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            config: root.into().join("config"),
        }
    }

    /// Path of the settings file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_end_in_app_dir() {
        let paths = Paths::new();
        assert!(paths.config.ends_with(APP_DIR));
    }

    #[test]
    fn test_rooted_config_file() {
        let paths = Paths::rooted("/tmp/pomo-test");
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/tmp/pomo-test/config/config.toml")
        );
    }
}
