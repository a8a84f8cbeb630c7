//! Environment-variable configuration shared by the ops binaries.

use ctbrec_client::ClientConfig;

/// Read the server connection settings (`SRVURL`, `SRVUSR`, `SRVPSS`,
/// `VERIFY_TLS`). Exits the process when `SRVURL` is missing.
pub fn client_config() -> ClientConfig {
    let mut config = ClientConfig::new(require("SRVURL"));
    config.username = std::env::var("SRVUSR").ok();
    config.password = std::env::var("SRVPSS").ok();
    config.verify_tls = std::env::var("VERIFY_TLS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    config
}

/// Bytes of disk space `reclaim` should free (`RECOVER`).
pub fn recover_bytes() -> i64 {
    require("RECOVER").parse().unwrap_or_else(|_| {
        tracing::error!("RECOVER must be a byte count");
        std::process::exit(1);
    })
}

fn require(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        tracing::error!("{name} environment variable is required");
        std::process::exit(1);
    })
}
