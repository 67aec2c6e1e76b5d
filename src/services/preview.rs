use crate::domain::attachment::AttachmentFile;

/// Creates and releases local preview handles for staged files.
pub trait PreviewRegistry: Send + Sync {
    fn create(&self, file: &AttachmentFile) -> String;
    fn revoke(&self, url: &str);
}
