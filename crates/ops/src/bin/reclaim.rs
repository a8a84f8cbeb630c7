//! `reclaim` -- free disk space on a recording server.
//!
//! Deletes unpinned, finished recordings in listing order until the
//! requested number of bytes has been reclaimed.
//!
//! # Environment variables
//!
//! | Variable     | Required | Description                                 |
//! |--------------|----------|---------------------------------------------|
//! | `SRVURL`     | yes      | Server base URL, e.g. `https://host:8443`   |
//! | `SRVUSR`     | no       | Basic-auth username                         |
//! | `SRVPSS`     | no       | Basic-auth password                         |
//! | `VERIFY_TLS` | no       | Verify the server certificate (default off) |
//! | `RECOVER`    | yes      | Bytes of disk space to free                 |

use ctbrec_client::RecClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reclaim=info,ctbrec_ops=info,ctbrec_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ctbrec_ops::env::client_config();
    let recover_bytes = ctbrec_ops::env::recover_bytes();

    let client = match RecClient::connect(config).await {
        Ok(client) => client,
        Err(error) => {
            tracing::error!(error = %error, "failed to connect to server");
            std::process::exit(1);
        }
    };

    if let Err(error) = ctbrec_ops::reclaim::run(&client, recover_bytes).await {
        tracing::error!(error = %error, "space reclamation failed");
        std::process::exit(1);
    }
}
