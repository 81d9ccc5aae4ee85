use shared_types::{AppError, Attachment, AttachmentUpload};
use tracing::info;
use uuid::Uuid;

use super::submission::stage;
use crate::storage::{object_key, ObjectStore};

/// Store one file in the media bucket under the caller's prefix and return
/// where it lives. The URL is what avatars and help requests reference.
pub async fn upload(
    store: &dyn ObjectStore,
    user_id: Uuid,
    upload: &AttachmentUpload,
) -> Result<Attachment, AppError> {
    let file = stage(upload).map_err(|message| AppError::field("file", message))?;
    let key = object_key(&user_id.to_string(), &file.name);
    let size = file.bytes.len() as i64;

    let url = store.put(&key, &file.mime_type, file.bytes).await?;
    info!(%user_id, %key, size, "media uploaded");

    Ok(Attachment {
        url,
        name: file.name,
        mime_type: file.mime_type,
        size,
    })
}
