use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use blake3::Hasher;
use tracing::{debug, warn};

use crate::domain::attachment::AttachmentFile;
use crate::services::PreviewRegistry;

/// Keeps track of `blob:` style preview handles handed out for staged files.
#[derive(Default)]
pub struct BlobPreviews {
    live: Mutex<HashSet<String>>,
    counter: AtomicU64,
}

impl BlobPreviews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> usize {
        self.live
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl PreviewRegistry for BlobPreviews {
    fn create(&self, file: &AttachmentFile) -> String {
        let serial = self.counter.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Hasher::new();
        hasher.update(&file.bytes);
        let digest = hasher.finalize().to_hex();
        let url = format!("blob:ticketdesk/{}-{serial}", &digest.as_str()[..16]);

        self.live
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(url.clone());
        debug!(url = %url, file = %file.file_name, "preview created");
        url
    }

    fn revoke(&self, url: &str) {
        let removed = self
            .live
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(url);
        if removed {
            debug!(url, "preview revoked");
        } else {
            warn!(url, "revoke for unknown preview");
        }
    }
}
