//! Shared test fixtures.

use tokio::net::UnixStream;
use zbus::{connection::Builder, Connection, Guid};

/// Builds a connected peer-to-peer pair over a socketpair.
///
/// Returns `(client, server)`; keep both alive for the duration of the test
/// or the transport closes.
pub(crate) async fn p2p_connection() -> (Connection, Connection) {
    let (client_stream, server_stream) = UnixStream::pair().expect("socketpair");
    let guid = Guid::generate();
    let server = async {
        Builder::unix_stream(server_stream)
            .server(guid)
            .expect("server builder")
            .p2p()
            .build()
            .await
    };
    let client = async { Builder::unix_stream(client_stream).p2p().build().await };
    let (client, server) = tokio::join!(client, server);
    (
        client.expect("client connection"),
        server.expect("server connection"),
    )
}
