use crate::error::{RcError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Startup files larger than this are refused.
pub(crate) const MAX_RC_BYTES: u64 = 1024 * 1024;

pub(crate) fn default_rc_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("me", "shoryuken", "tabula")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("tabularc");
    Some(path)
}

/// Read a startup file, refusing anything over [`MAX_RC_BYTES`].
pub(crate) fn read_rc(path: &Path) -> Result<String> {
    let io_err = |source| RcError::Io {
        path: path.to_path_buf(),
        source,
    };
    let size = fs::metadata(path).map_err(io_err)?.len();
    if size > MAX_RC_BYTES {
        return Err(RcError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: MAX_RC_BYTES,
        });
    }
    fs::read_to_string(path).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tabula-rc-{}-{}", std::process::id(), name))
    }

    #[test]
    fn default_rc_path_is_deterministic() {
        // Should never panic and should either be Some(path) or None.
        let _ = default_rc_path();
    }

    #[test]
    fn reads_small_file() {
        let path = temp_path("small");
        fs::write(&path, "bind q {goto A1}\n").unwrap();
        assert_eq!(read_rc(&path).unwrap(), "bind q {goto A1}\n");
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn refuses_oversized_file() {
        let path = temp_path("large");
        fs::write(&path, vec![b'#'; MAX_RC_BYTES as usize + 1]).unwrap();
        assert!(matches!(read_rc(&path), Err(RcError::TooLarge { .. })));
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = temp_path("missing");
        assert!(matches!(read_rc(&path), Err(RcError::Io { .. })));
    }
}
