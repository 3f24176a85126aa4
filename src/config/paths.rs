//! Default path helpers and symlink checks.

use dirs::{config_dir, data_dir};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::errors::{KatalError, Result};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "KATAL_CONFIG";

/// Where the config path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigOrigin {
    Flag,
    Env,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub origin: ConfigOrigin,
}

/// OS-appropriate default config path: `<config_dir>/katal/config.xml`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(mut base) = config_dir() {
        base.push("katal");
        base.push("config.xml");
        Some(base)
    } else {
        env::var("HOME").ok().map(|h| {
            PathBuf::from(h)
                .join(".config")
                .join("katal")
                .join("config.xml")
        })
    }
}

/// OS-appropriate default log file path (data dir).
pub fn default_log_path() -> Option<PathBuf> {
    if let Some(mut base) = data_dir() {
        base.push("katal");
        base.push("katal.log");
        Some(base)
    } else {
        env::var("HOME").ok().map(|h| {
            PathBuf::from(h)
                .join(".local")
                .join("share")
                .join("katal")
                .join("katal.log")
        })
    }
}

/// Pick the config file: `--config` flag, then `KATAL_CONFIG`, then the default path.
pub fn resolve_config_path(flag: Option<&Path>) -> Result<ConfigLocation> {
    if let Some(p) = flag {
        return Ok(ConfigLocation {
            path: p.to_path_buf(),
            origin: ConfigOrigin::Flag,
        });
    }
    if let Some(p) = env::var_os(CONFIG_ENV_VAR)
        && !p.is_empty()
    {
        return Ok(ConfigLocation {
            path: PathBuf::from(p),
            origin: ConfigOrigin::Env,
        });
    }
    default_config_path()
        .map(|path| ConfigLocation {
            path,
            origin: ConfigOrigin::Default,
        })
        .ok_or_else(|| KatalError::Config("cannot determine a default config directory".into()))
}

/// Return true if any existing ancestor of `path` is a symlink.
pub fn path_has_symlink_ancestor(path: &Path) -> io::Result<bool> {
    let mut p = path.parent();
    while let Some(anc) = p {
        if anc.exists() {
            let meta = fs::symlink_metadata(anc)?;
            if meta.file_type().is_symlink() {
                return Ok(true);
            }
        }
        p = anc.parent();
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins() {
        let loc = resolve_config_path(Some(Path::new("/x/cfg.xml"))).unwrap();
        assert_eq!(loc.origin, ConfigOrigin::Flag);
        assert_eq!(loc.path, PathBuf::from("/x/cfg.xml"));
    }

    #[test]
    fn defaults_end_in_katal() {
        if let Some(p) = default_config_path() {
            assert!(p.ends_with("katal/config.xml"));
        }
        if let Some(p) = default_log_path() {
            assert!(p.ends_with("katal/katal.log"));
        }
    }

    #[cfg(unix)]
    #[test]
    fn detects_symlinked_ancestor() {
        let td = tempfile::tempdir().unwrap();
        let real = td.path().join("real");
        fs::create_dir(&real).unwrap();
        let link = td.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        assert!(path_has_symlink_ancestor(&link.join("file.log")).unwrap());
        assert!(!path_has_symlink_ancestor(&real.join("file.log")).unwrap());
    }
}
