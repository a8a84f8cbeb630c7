//! Orphaned-recording cleanup loop.

use std::path::Path;

use ctbrec_client::{ClientError, RecClient, RecordingStatus};

/// Delete finished recordings whose media file no longer exists on the
/// local disk. Only useful when run on the machine holding the
/// recording volume.
pub async fn run(client: &RecClient) -> Result<(), ClientError> {
    let recordings = client.get_recordings().await?;
    tracing::info!(count = recordings.len(), "recordings on server");
    for recording in &recordings {
        let Some(file) = recording.absolute_file.as_deref() else {
            continue;
        };
        if Path::new(file).exists() {
            continue;
        }
        tracing::info!(
            file,
            status = recording.status.as_str(),
            "recording file missing on disk"
        );
        if recording.status == RecordingStatus::Finished {
            client.delete_recording(recording).await?;
            tracing::info!(
                file = recording.meta_data_file.as_deref().unwrap_or("<unknown>"),
                "deleted recording"
            );
        }
    }
    Ok(())
}
