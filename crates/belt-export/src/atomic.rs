//! All-or-nothing file output.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::warn;

use crate::errors::ExportError;

/// Write `contents` to `path`, replacing any existing file.
///
/// The bytes go to a temporary file in the destination directory which is
/// then renamed over `path`. Readers see either the old file or the complete
/// new one; on failure the temporary file is removed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    let tmp = stage(path, contents)?;
    tmp.persist(path)
        .map_err(|e| ExportError::io(path, e.error))?;
    Ok(())
}

/// Write several files as a group.
///
/// Every file is staged before any is renamed into place, so an unwritable
/// destination fails with nothing changed on disk. If a rename fails part
/// way, the files already renamed are removed again.
pub fn write_all_atomic(files: &[(&Path, &[u8])]) -> Result<(), ExportError> {
    let mut staged = Vec::with_capacity(files.len());
    for &(path, contents) in files {
        staged.push((path, stage(path, contents)?));
    }

    let mut written: Vec<&Path> = Vec::with_capacity(staged.len());
    for (path, tmp) in staged {
        if let Err(e) = tmp.persist(path) {
            for done in written {
                if let Err(cleanup) = std::fs::remove_file(done) {
                    warn!(path = %done.display(), error = %cleanup, "could not remove partial output");
                }
            }
            return Err(ExportError::io(path, e.error));
        }
        written.push(path);
    }
    Ok(())
}

/// Synced temporary file holding `contents`, next to `path`.
fn stage(path: &Path, contents: &[u8]) -> Result<NamedTempFile, ExportError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ExportError::io(path, e))?;
    tmp.write_all(contents)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| ExportError::io(path, e))?;
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("belt.stl");
        std::fs::write(&path, b"old contents that are longer").unwrap();

        write_atomic(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("belt.stl");
        match write_atomic(&path, b"data") {
            Err(ExportError::Io { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected Io error, got {:?}", other),
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn group_written_together() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("belt.stl");
        let b = dir.path().join("belt.step");
        write_all_atomic(&[(a.as_path(), &b"mesh"[..]), (b.as_path(), &b"brep"[..])]).unwrap();
        assert_eq!(std::fs::read(&a).unwrap(), b"mesh");
        assert_eq!(std::fs::read(&b).unwrap(), b"brep");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn one_bad_destination_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("belt.stl");
        let bad = dir.path().join("missing").join("belt.step");
        match write_all_atomic(&[(good.as_path(), &b"mesh"[..]), (bad.as_path(), &b"brep"[..])]) {
            Err(ExportError::Io { path: reported, .. }) => assert_eq!(reported, bad),
            other => panic!("expected Io error, got {:?}", other),
        }
        assert!(!good.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
