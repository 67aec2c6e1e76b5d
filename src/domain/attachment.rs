use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use blake3::Hasher;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::PreviewRegistry;

/// Raw file payload selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl AttachmentFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_content_type(&file_name).map(str::to_string);
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    pub async fn read(path: &Path) -> AppResult<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                AppError::Draft(format!("not a file path: {}", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(file_name, bytes))
    }
}

fn guess_content_type(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "pdf" => Some("application/pdf"),
        "txt" => Some("text/plain"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StagedId(String);

impl StagedId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StagedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Handle on a preview resource. Clones share the same release flag, so the
/// registry sees exactly one revoke no matter which path gets there first.
#[derive(Clone)]
pub struct PreviewLease {
    inner: Arc<LeaseInner>,
}

struct LeaseInner {
    url: String,
    released: AtomicBool,
    registry: Arc<dyn PreviewRegistry>,
}

impl PreviewLease {
    pub fn acquire(registry: Arc<dyn PreviewRegistry>, file: &AttachmentFile) -> Self {
        let url = registry.create(file);
        Self {
            inner: Arc::new(LeaseInner {
                url,
                released: AtomicBool::new(false),
                registry,
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::SeqCst)
    }

    /// Returns `true` only for the call that actually released the preview.
    pub fn release(&self) -> bool {
        if self.inner.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.registry.revoke(&self.inner.url);
        true
    }

    /// Releases the preview after `delay` unless something released it first.
    /// Needs a Tokio runtime; without one the lease is only released
    /// explicitly.
    fn release_after(&self, delay: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let lease = self.clone();
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if lease.release() {
                debug!(url = lease.url(), "preview released by timer");
            }
        });
    }
}

impl fmt::Debug for PreviewLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewLease")
            .field("url", &self.inner.url)
            .field("released", &self.is_released())
            .finish()
    }
}

#[derive(Debug)]
pub struct StagedAttachment {
    id: StagedId,
    file: AttachmentFile,
    preview: PreviewLease,
}

impl StagedAttachment {
    pub fn id(&self) -> &StagedId {
        &self.id
    }

    pub fn file(&self) -> &AttachmentFile {
        &self.file
    }

    pub fn preview(&self) -> &PreviewLease {
        &self.preview
    }
}

impl Drop for StagedAttachment {
    fn drop(&mut self) {
        self.preview.release();
    }
}

/// Files picked for the next commit. Dropping an entry, by any route,
/// releases its preview.
#[derive(Debug, Default)]
pub struct StagingList {
    entries: Vec<StagedAttachment>,
    sequence: u64,
}

impl StagingList {
    pub fn stage(
        &mut self,
        file: AttachmentFile,
        registry: Arc<dyn PreviewRegistry>,
        release_after: Option<Duration>,
    ) -> StagedId {
        self.sequence += 1;
        let id = Self::compute_id(self.sequence, &file);
        let preview = PreviewLease::acquire(registry, &file);
        if let Some(delay) = release_after {
            preview.release_after(delay);
        }
        self.entries.push(StagedAttachment {
            id: id.clone(),
            file,
            preview,
        });
        id
    }

    pub fn unstage(&mut self, id: &StagedId) -> bool {
        match self.entries.iter().position(|entry| &entry.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StagedAttachment> {
        self.entries.iter()
    }

    pub fn files(&self) -> Vec<AttachmentFile> {
        self.entries.iter().map(|entry| entry.file.clone()).collect()
    }

    fn compute_id(sequence: u64, file: &AttachmentFile) -> StagedId {
        let mut hasher = Hasher::new();
        hasher.update(&sequence.to_le_bytes());
        hasher.update(file.file_name.as_bytes());
        hasher.update(&file.bytes);
        let digest = hasher.finalize().to_hex();
        StagedId(format!("stg-{}", &digest.as_str()[..12]))
    }
}
