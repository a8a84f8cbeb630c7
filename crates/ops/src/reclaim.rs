//! Disk-space reclamation loop.

use std::time::Duration;

use ctbrec_client::{ClientError, RecClient, RecordingStatus};

/// Delay between deletions, giving the server time to settle.
const DELETE_PAUSE: Duration = Duration::from_secs(2);

/// Delete unpinned, finished recordings in listing order until free
/// space reaches the current free space plus `recover_bytes`.
pub async fn run(client: &RecClient, recover_bytes: i64) -> Result<(), ClientError> {
    let space = client.get_space().await?;
    let required_free = space.space_free + recover_bytes;
    tracing::info!(
        free = space.space_free,
        required = required_free,
        "starting space reclamation"
    );

    let recordings = client.get_recordings().await?;
    for recording in &recordings {
        if recording.pinned || recording.status != RecordingStatus::Finished {
            continue;
        }
        if client.get_space().await?.space_free >= required_free {
            break;
        }
        client.delete_recording(recording).await?;
        tracing::info!(
            file = recording.meta_data_file.as_deref().unwrap_or("<unknown>"),
            "deleted recording"
        );
        tokio::time::sleep(DELETE_PAUSE).await;
    }
    Ok(())
}
