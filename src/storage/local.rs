use std::path::{Component, Path, PathBuf};

use crate::annotations::json::parse_annotations;
use crate::annotations::model::AnnotationSet;
use crate::foundation::error::{VidsumError, VidsumResult};

/// Storage collaborator: where annotations and videos come from and where outputs go.
pub trait MediaStore {
    /// Make the video at `uri` available as a local file for the lifetime of the lease.
    fn fetch_video(&self, uri: &str) -> VidsumResult<LocalMedia>;

    fn read_annotations(&self, uri: &str) -> VidsumResult<AnnotationSet>;

    fn write_output(&self, bytes: &[u8], destination: &str, content_type: &str)
    -> VidsumResult<()>;
}

/// Scoped local copy of a fetched video.
///
/// The copy lives in a private temporary directory that is removed when the lease is dropped,
/// on every exit path.
#[derive(Debug)]
pub struct LocalMedia {
    dir: tempfile::TempDir,
    path: PathBuf,
}

impl LocalMedia {
    /// Copy `source` into a fresh temporary directory.
    pub fn copy_from(source: &Path) -> VidsumResult<Self> {
        if !source.is_file() {
            return Err(VidsumError::storage(format!(
                "video '{}' does not exist",
                source.display()
            )));
        }
        let file_name = source.file_name().ok_or_else(|| {
            VidsumError::storage(format!("video path '{}' has no file name", source.display()))
        })?;
        let dir = tempfile::Builder::new()
            .prefix("vidsum-")
            .tempdir()
            .map_err(|e| VidsumError::storage(format!("failed to create temp dir: {e}")))?;
        let path = dir.path().join(file_name);
        std::fs::copy(source, &path).map_err(|e| {
            VidsumError::storage(format!("failed to copy '{}': {e}", source.display()))
        })?;
        tracing::debug!(src = %source.display(), dst = %path.display(), "fetched video");
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Local-filesystem store: URIs are file paths.
///
/// Outputs are written at their destination path, or mirrored under `output_root` when set.
#[derive(Clone, Debug, Default)]
pub struct LocalStore {
    output_root: Option<PathBuf>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_root(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: Some(output_root.into()),
        }
    }

    pub fn output_root(&self) -> Option<&Path> {
        self.output_root.as_deref()
    }

    /// Where `destination` lands on disk.
    pub fn resolve_output(&self, destination: &str) -> VidsumResult<PathBuf> {
        match &self.output_root {
            None => Ok(PathBuf::from(destination)),
            Some(root) => Ok(root.join(mirror_rel_path(destination)?)),
        }
    }
}

impl MediaStore for LocalStore {
    fn fetch_video(&self, uri: &str) -> VidsumResult<LocalMedia> {
        LocalMedia::copy_from(Path::new(uri))
    }

    fn read_annotations(&self, uri: &str) -> VidsumResult<AnnotationSet> {
        let bytes = std::fs::read(uri).map_err(|e| {
            VidsumError::storage(format!("failed to read annotations '{uri}': {e}"))
        })?;
        parse_annotations(&bytes)
    }

    fn write_output(
        &self,
        bytes: &[u8],
        destination: &str,
        content_type: &str,
    ) -> VidsumResult<()> {
        let path = self.resolve_output(destination)?;
        ensure_parent_dir(&path)?;
        std::fs::write(&path, bytes).map_err(|e| {
            VidsumError::storage(format!("failed to write '{}': {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), content_type, bytes = bytes.len(), "wrote output");
        Ok(())
    }
}

pub fn ensure_parent_dir(path: &Path) -> VidsumResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Relative form of `destination`: root, prefix, `.` and `..` components are dropped so the
/// result always stays under the output root.
fn mirror_rel_path(destination: &str) -> VidsumResult<PathBuf> {
    let rel: PathBuf = Path::new(destination)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    if rel.as_os_str().is_empty() {
        return Err(VidsumError::storage(format!(
            "output destination '{destination}' has no file name"
        )));
    }
    Ok(rel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_removes_its_copy_on_drop() {
        let src_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("clip.mp4");
        std::fs::write(&src, b"not really a video").unwrap();

        let media = LocalStore::new().fetch_video(src.to_str().unwrap()).unwrap();
        let copy = media.path().to_path_buf();
        let dir = media.dir().to_path_buf();
        assert_eq!(std::fs::read(&copy).unwrap(), b"not really a video");
        assert_ne!(copy, src);

        drop(media);
        assert!(!dir.exists());
        assert!(src.exists());
    }

    #[test]
    fn missing_videos_are_storage_errors() {
        let err = LocalStore::new()
            .fetch_video("no/such/clip.mp4")
            .unwrap_err();
        assert!(matches!(err, VidsumError::Storage(_)));
    }

    #[test]
    fn outputs_are_mirrored_under_the_root() {
        let out = tempfile::tempdir().unwrap();
        let store = LocalStore::with_output_root(out.path());
        store
            .write_output(b"png", "/videos/../clips/cat.mp4.000_shot.png", "image/png")
            .unwrap();
        let written = out.path().join("videos/clips/cat.mp4.000_shot.png");
        assert_eq!(std::fs::read(written).unwrap(), b"png");
        assert!(store.resolve_output("/").is_err());
    }

    #[test]
    fn unreadable_annotations_are_storage_errors() {
        let err = LocalStore::new()
            .read_annotations("no/such/clip.mp4.json")
            .unwrap_err();
        assert!(matches!(err, VidsumError::Storage(_)));
    }
}
