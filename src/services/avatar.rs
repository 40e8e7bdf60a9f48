//! Profile photo lookup.
//!
//! Any failure along the way is logged and reported as "no avatar"; the
//! sticker is then rendered with a placeholder.

use tracing::{debug, warn};

use crate::model::TransportError;
use crate::transport::TelegramClient;

/// Bytes of the user's current profile photo at its largest size.
pub async fn fetch_avatar(client: &TelegramClient, user_id: i64) -> Option<Vec<u8>> {
    match try_fetch_avatar(client, user_id).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(user_id, error = %e, "Failed to fetch avatar");
            None
        }
    }
}

async fn try_fetch_avatar(client: &TelegramClient, user_id: i64) -> Result<Option<Vec<u8>>, TransportError> {
    let photos = client.get_user_profile_photos(user_id, 0, 1).await?;
    let Some(file_id) = photos.largest_file_id() else {
        debug!(user_id, "User has no profile photo");
        return Ok(None);
    };

    let file = client.get_file(file_id).await?;
    let Some(file_path) = file.file_path.filter(|path| !path.is_empty()) else {
        debug!(user_id, "Profile photo has no downloadable path");
        return Ok(None);
    };

    let bytes = client.download_file(&file_path).await?;
    Ok(Some(bytes).filter(|bytes| !bytes.is_empty()))
}
