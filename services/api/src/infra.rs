use campus_jobs::marketplace::identity::{BlobError, BlobStore, BlobUpload};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;

const UNTYPED: &str = "application/octet-stream";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Fills in the content type of untyped uploads from the file extension.
#[derive(Clone)]
pub(crate) struct GuessingBlobStore<B> {
    inner: B,
}

impl<B> GuessingBlobStore<B> {
    pub(crate) fn new(inner: B) -> Self {
        Self { inner }
    }
}

impl<B: BlobStore> BlobStore for GuessingBlobStore<B> {
    fn store(&self, mut upload: BlobUpload) -> Result<String, BlobError> {
        if upload.content_type.trim().is_empty() || upload.content_type == UNTYPED {
            if let Some(guess) = mime_guess::from_path(&upload.file_name).first() {
                debug!(file = %upload.file_name, content_type = %guess, "guessed upload content type");
                upload.content_type = guess.essence_str().to_string();
            }
        }
        self.inner.store(upload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_jobs::marketplace::store::MemoryBlobStore;

    fn upload(file_name: &str, content_type: &str) -> BlobUpload {
        BlobUpload {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes: b"%PDF-1.7".to_vec(),
        }
    }

    #[test]
    fn untyped_uploads_get_a_guessed_type() {
        let backing = MemoryBlobStore::default();
        let store = GuessingBlobStore::new(backing.clone());

        let reference = store
            .store(upload("resume.pdf", UNTYPED))
            .expect("stored");

        let stored = backing.get(&reference).expect("blob kept");
        assert_eq!(stored.content_type, "application/pdf");
    }

    #[test]
    fn declared_types_are_left_alone() {
        let backing = MemoryBlobStore::default();
        let store = GuessingBlobStore::new(backing.clone());

        let reference = store
            .store(upload("avatar.bin", "image/png"))
            .expect("stored");
        let unknown = store
            .store(upload("notes.zzunknown", UNTYPED))
            .expect("stored");

        assert_eq!(
            backing.get(&reference).expect("blob kept").content_type,
            "image/png"
        );
        assert_eq!(
            backing.get(&unknown).expect("blob kept").content_type,
            UNTYPED
        );
    }
}
