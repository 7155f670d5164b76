// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface used by the synthesis engine.
pub trait FileSystem: Send + Sync + Debug {
    /// Read a file's bytes; `Ok(None)` if it does not exist.
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>>;
    /// Create parent directories as needed and replace the file's contents.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn set_readonly(&self, path: &Path, readonly: bool) -> Result<()>;
    fn set_executable(&self, path: &Path, executable: bool) -> Result<()>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading file {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating dir {:?}", parent))?;
            }
        }
        // A previous synthesis may have left the file readonly.
        if path.exists() {
            self.set_readonly(path, false)?;
        }
        let mut file =
            fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        file.write_all(contents)
            .with_context(|| format!("writing to file {:?}", path))?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        if path.exists() {
            self.set_readonly(path, false)?;
        }
        fs::remove_file(path).with_context(|| format!("removing file {:?}", path))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn set_readonly(&self, path: &Path, readonly: bool) -> Result<()> {
        let mut perms = fs::metadata(path)
            .with_context(|| format!("reading metadata of {:?}", path))?
            .permissions();
        if perms.readonly() == readonly {
            return Ok(());
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = perms.mode();
            perms.set_mode(if readonly { mode & !0o222 } else { mode | 0o200 });
        }
        #[cfg(not(unix))]
        perms.set_readonly(readonly);

        fs::set_permissions(path, perms)
            .with_context(|| format!("setting permissions of {:?}", path))
    }

    #[cfg(unix)]
    fn set_executable(&self, path: &Path, executable: bool) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)
            .with_context(|| format!("reading metadata of {:?}", path))?
            .permissions();
        let mode = perms.mode();
        let wanted = if executable { mode | 0o111 } else { mode & !0o111 };
        if wanted == mode {
            return Ok(());
        }
        perms.set_mode(wanted);
        fs::set_permissions(path, perms)
            .with_context(|| format!("setting permissions of {:?}", path))
    }

    #[cfg(not(unix))]
    fn set_executable(&self, _path: &Path, _executable: bool) -> Result<()> {
        Ok(())
    }
}
