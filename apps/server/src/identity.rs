//! The server's persisted public identifier.

use std::fs;
use std::path::Path;

use anyhow::Context;
use pricefeed_rpc::PeerId;
use tracing::info;

/// Read the peer id from `path`, or create and persist a fresh one.
pub fn load_or_create_peer_id(path: &Path) -> anyhow::Result<PeerId> {
    if path.exists() {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read peer key file {}", path.display()))?;
        let peer: PeerId = contents
            .parse()
            .with_context(|| format!("Invalid peer key in {}", path.display()))?;
        return Ok(peer);
    }

    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
    }

    let peer = PeerId::random();
    fs::write(path, peer.to_hex())
        .with_context(|| format!("Failed to write peer key file {}", path.display()))?;
    info!("Generated new peer id, stored in {}", path.display());
    Ok(peer)
}
