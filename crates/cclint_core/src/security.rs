//! Path security gate.
//!
//! Every user-supplied path goes through [`resolve_secure`] (or one of its
//! wrappers) before the engine touches the filesystem with it. A path is
//! accepted only if it stays inside `base` both lexically and after symlinks
//! are resolved.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::PathSecurityError;

/// Resolves `input` against `base` and verifies the result exists inside it.
///
/// Relative inputs are joined onto `base`; absolute inputs are used as-is but
/// are still subject to the boundary check. Returns the canonical path.
pub fn resolve_secure(
    input: impl AsRef<Path>,
    base: impl AsRef<Path>,
) -> Result<PathBuf, PathSecurityError> {
    let input = input.as_ref();
    let base = base.as_ref();

    let nominal = check_lexically(input, base)?;

    fs::metadata(&nominal).map_err(|e| PathSecurityError::from_io(nominal.clone(), e))?;

    let real_target =
        fs::canonicalize(&nominal).map_err(|e| PathSecurityError::from_io(nominal.clone(), e))?;
    let real_base = fs::canonicalize(base)
        .map_err(|e| PathSecurityError::from_io(base.to_path_buf(), e))?;

    if !real_target.starts_with(&real_base) {
        return Err(PathSecurityError::SymlinkEscape {
            path: nominal,
            base: real_base,
        });
    }

    Ok(real_target)
}

/// Like [`resolve_secure`] but additionally requires a directory.
pub fn resolve_secure_dir(
    input: impl AsRef<Path>,
    base: impl AsRef<Path>,
) -> Result<PathBuf, PathSecurityError> {
    let resolved = resolve_secure(input, base)?;
    if !resolved.is_dir() {
        return Err(PathSecurityError::NotADirectory(resolved));
    }
    Ok(resolved)
}

/// Validates a project root supplied directly by an SDK caller.
///
/// There is no enclosing boundary here, so only the input sanity checks and
/// the existence/directory checks apply.
pub fn resolve_project_root(input: impl AsRef<Path>) -> Result<PathBuf, PathSecurityError> {
    let input = input.as_ref();
    check_input(input)?;

    let absolute = std::path::absolute(input)
        .map_err(|e| PathSecurityError::from_io(input.to_path_buf(), e))?;
    let real =
        fs::canonicalize(&absolute).map_err(|e| PathSecurityError::from_io(absolute.clone(), e))?;
    if !real.is_dir() {
        return Err(PathSecurityError::NotADirectory(real));
    }
    Ok(real)
}

/// Cheap, filesystem-free variant of [`resolve_secure`].
///
/// Only the lexical traversal arithmetic is performed. It cannot detect a
/// symlink inside `base` that points elsewhere, so a `true` result is a
/// pre-check, never a substitute for [`resolve_secure`].
pub fn is_safe(input: impl AsRef<Path>, base: impl AsRef<Path>) -> bool {
    check_lexically(input.as_ref(), base.as_ref()).is_ok()
}

/// Returns true when `path` lies at or below `root` after lexical normalization.
pub fn is_within(path: &Path, root: &Path) -> bool {
    normalize(path).starts_with(normalize(root))
}

fn check_input(input: &Path) -> Result<(), PathSecurityError> {
    let raw = input.as_os_str();
    if raw.is_empty() {
        return Err(PathSecurityError::InvalidInput("path is empty".to_string()));
    }
    if raw.as_encoded_bytes().contains(&0) {
        return Err(PathSecurityError::NullByte);
    }
    Ok(())
}

fn check_lexically(input: &Path, base: &Path) -> Result<PathBuf, PathSecurityError> {
    check_input(input)?;
    check_input(base)?;

    let base_abs = std::path::absolute(base)
        .map_err(|e| PathSecurityError::from_io(base.to_path_buf(), e))?;
    let base_norm = normalize(&base_abs);
    let joined = if input.is_absolute() {
        input.to_path_buf()
    } else {
        base_abs.join(input)
    };
    let target = normalize(&joined);

    match target.strip_prefix(&base_norm) {
        Ok(relative)
            if !relative
                .components()
                .next()
                .is_some_and(|c| matches!(c, Component::ParentDir)) =>
        {
            Ok(target)
        }
        _ => Err(PathSecurityError::Traversal {
            path: input.to_path_buf(),
            base: base_norm,
        }),
    }
}

/// Resolves `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}
