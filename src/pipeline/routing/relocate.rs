use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::{NamedTempFile, TempPath};

use super::RoutingError;

/// How a file reached its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStrategy {
    /// Single atomic rename on the same filesystem.
    Renamed,
    /// Copied across devices, verified, then source removed.
    Copied,
}

impl MoveStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Renamed => "rename",
            Self::Copied => "copy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub path: PathBuf,
    pub strategy: MoveStrategy,
}

/// Move `source` into `target_dir` under `file_name`.
///
/// Never overwrites: an existing entry with that name is `TargetExists`.
/// A source that already sits at the target is left alone and reported
/// as renamed. On any failure the source stays at its original path.
pub fn relocate(
    source: &Path,
    target_dir: &Path,
    file_name: &str,
) -> Result<Relocation, RoutingError> {
    validate_file_name(file_name)?;

    let metadata = match fs::metadata(source) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(RoutingError::SourceMissing(source.to_path_buf()))
        }
        Err(e) => return Err(RoutingError::io("reading source metadata")(e)),
    };
    if !metadata.is_file() {
        return Err(RoutingError::NotAFile(source.to_path_buf()));
    }

    fs::create_dir_all(target_dir).map_err(RoutingError::io("creating target directory"))?;
    let target = target_dir.join(file_name);

    if already_in_place(source, target_dir, file_name)? {
        tracing::debug!(path = %target.display(), "Source already at target");
        return Ok(Relocation {
            path: target,
            strategy: MoveStrategy::Renamed,
        });
    }

    match rename_noclobber(source, &target) {
        Ok(()) => Ok(Relocation {
            path: target,
            strategy: MoveStrategy::Renamed,
        }),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(RoutingError::TargetExists(target)),
        Err(e) if is_cross_device(&e) => {
            copy_across(source, target_dir, &target)?;
            Ok(Relocation {
                path: target,
                strategy: MoveStrategy::Copied,
            })
        }
        Err(e) => Err(RoutingError::io("renaming into destination")(e)),
    }
}

/// Whether `source` is the entry `file_name` inside `target_dir`.
/// Directories are compared after resolving symlinks; the final
/// component is compared as written so a link at the target never
/// counts as the source itself.
fn already_in_place(source: &Path, target_dir: &Path, file_name: &str) -> Result<bool, RoutingError> {
    let (Some(source_dir), Some(source_name)) = (source.parent(), source.file_name()) else {
        return Ok(false);
    };
    if source_name != OsStr::new(file_name) {
        return Ok(false);
    }
    let source_dir = if source_dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        source_dir
    };
    let here = fs::canonicalize(source_dir).map_err(RoutingError::io("resolving source directory"))?;
    let there = fs::canonicalize(target_dir).map_err(RoutingError::io("resolving target directory"))?;
    Ok(here == there)
}

/// Atomic rename that fails with `AlreadyExists` instead of replacing
/// the target (`renameat2(RENAME_NOREPLACE)` on Linux, the platform
/// equivalent elsewhere).
fn rename_noclobber(source: &Path, target: &Path) -> io::Result<()> {
    // TempPath deletes its file on drop; every error path disarms it.
    let guard = TempPath::from_path(source);
    match guard.persist_noclobber(target) {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Err(keep) = e.path.keep() {
                tracing::error!(
                    path = %source.display(),
                    error = %keep.error,
                    "Could not release rename guard"
                );
            }
            Err(e.error)
        }
    }
}

/// Copy into a temp file beside `target`, fsync, verify length and
/// SHA-256 against the source, publish without clobbering, then remove
/// the source.
pub(crate) fn copy_across(
    source: &Path,
    target_dir: &Path,
    target: &Path,
) -> Result<(), RoutingError> {
    let mut input = File::open(source).map_err(RoutingError::io("opening source"))?;
    let mut staged =
        NamedTempFile::new_in(target_dir).map_err(RoutingError::io("creating staging file"))?;

    let (copied_len, source_digest) = copy_hashing(&mut input, staged.as_file_mut())?;
    staged
        .as_file()
        .sync_all()
        .map_err(RoutingError::io("syncing staged copy"))?;

    let expected_len = fs::metadata(source)
        .map_err(RoutingError::io("reading source metadata"))?
        .len();
    if copied_len != expected_len {
        return Err(RoutingError::CopyVerification(format!(
            "copied {copied_len} bytes, source has {expected_len}"
        )));
    }

    let file = staged.as_file_mut();
    file.seek(SeekFrom::Start(0))
        .map_err(RoutingError::io("rewinding staged copy"))?;
    let (staged_len, staged_digest) = copy_hashing(file, &mut io::sink())?;
    if staged_len != copied_len || staged_digest != source_digest {
        return Err(RoutingError::CopyVerification(
            "staged copy does not match source checksum".into(),
        ));
    }

    staged.persist_noclobber(target).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            RoutingError::TargetExists(target.to_path_buf())
        } else {
            RoutingError::io("publishing staged copy")(e.error)
        }
    })?;

    remove_source_or_rollback(source, target)
}

fn copy_hashing<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> Result<(u64, Vec<u8>), RoutingError> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(RoutingError::io("reading during copy"))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        writer
            .write_all(&buf[..n])
            .map_err(RoutingError::io("writing during copy"))?;
        total += n as u64;
    }
    Ok((total, hasher.finalize().to_vec()))
}

/// The file now exists at both names; drop the source, or undo the
/// target so exactly one copy remains at the original path.
fn remove_source_or_rollback(source: &Path, target: &Path) -> Result<(), RoutingError> {
    if let Err(e) = fs::remove_file(source) {
        if let Err(undo) = fs::remove_file(target) {
            tracing::error!(
                path = %target.display(),
                error = %undo,
                "Could not roll back destination copy; file now exists twice"
            );
        }
        return Err(RoutingError::io("removing source after move")(e));
    }
    Ok(())
}

fn validate_file_name(file_name: &str) -> Result<(), RoutingError> {
    let invalid = file_name.is_empty()
        || file_name == "."
        || file_name == ".."
        || file_name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(RoutingError::InvalidFileName(file_name.to_string()));
    }
    Ok(())
}

fn is_cross_device(e: &io::Error) -> bool {
    #[cfg(unix)]
    const CROSS_DEVICE: i32 = 18; // EXDEV
    #[cfg(windows)]
    const CROSS_DEVICE: i32 = 17; // ERROR_NOT_SAME_DEVICE
    #[cfg(not(any(unix, windows)))]
    const CROSS_DEVICE: i32 = -1;

    e.raw_os_error() == Some(CROSS_DEVICE)
}
