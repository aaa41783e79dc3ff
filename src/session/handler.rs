//! russh client handler.

use std::future::Future;

use russh::keys::PublicKey;
use tracing::debug;

/// Client-side handler for the SSH handshake.
///
/// Accepts the server key after logging its fingerprint. Host key
/// pinning against a known-hosts store is left to the embedding
/// application.
pub struct ClientHandler {
    host: String,
}

impl ClientHandler {
    /// Create a handler for a connection to `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl russh::client::Handler for ClientHandler {
    type Error = russh::Error;

    fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send {
        let fingerprint = server_public_key.fingerprint(russh::keys::ssh_key::HashAlg::Sha256);
        debug!(
            host = %self.host,
            algorithm = %server_public_key.algorithm(),
            %fingerprint,
            "server key presented"
        );
        async { Ok(true) }
    }
}
