use std::path::PathBuf;

/// Environment override for the data directory.
pub const DATA_DIR_ENV: &str = "NODETRUST_DATA_DIR";

/// Root data directory for nodetrust.
///
/// - `NODETRUST_DATA_DIR` if set
/// - Linux: `~/.nodetrust/`
/// - macOS: `~/Library/Application Support/nodetrust/`
/// - Windows: `%LOCALAPPDATA%\nodetrust\`
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("nodetrust");
        }
    }

    #[cfg(windows)]
    {
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            return PathBuf::from(local).join("nodetrust");
        }
    }

    #[cfg(not(any(target_os = "macos", windows)))]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".nodetrust");
        }
    }

    PathBuf::from(".nodetrust")
}

/// Path to the shared `config.toml`.
pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

/// Log directory (audit log lives here).
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_live_under_data_dir() {
        let root = data_dir();
        assert_eq!(config_path(), root.join("config.toml"));
        assert_eq!(log_dir(), root.join("logs"));
    }
}
