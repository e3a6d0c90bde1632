use super::ordering::OrderingGuard;
use crate::error::TransportError;
use crate::frame::FrameConnection;
use crate::server::ConnectionContext;
use otelgen::ExportAck;
use tracing::debug;

/// Runs the streaming protocol on one accepted connection.
///
/// Every request is decoded, checked against the ordering guard, handed to
/// the receiver and acknowledged, in that order. The first violation ends
/// the connection with an error and nothing after it reaches the receiver.
///
/// Returns the number of accepted requests when the peer closes or the
/// server shuts down.
pub(crate) async fn serve_connection(
    mut conn: FrameConnection,
    ctx: ConnectionContext,
) -> Result<u64, TransportError> {
    let peer = conn.peer_addr();
    let mut guard = OrderingGuard::new();

    loop {
        let frame = tokio::select! {
            biased;

            // A frame racing with shutdown is dropped unacknowledged.
            () = ctx.shutdown.wait() => {
                guard.terminate();
                debug!(%peer, "connection interrupted by shutdown");
                return Ok(guard.accepted());
            }

            frame = conn.recv() => frame,
        };

        let Some(frame) = frame? else {
            return Ok(guard.accepted());
        };

        let request = match ctx.encoding.decode_request(&frame) {
            Ok(request) => request,
            Err(e) => {
                guard.terminate();
                return Err(e.into());
            }
        };

        guard.accept(request.id)?;
        let item_count = ctx.deliver(&request)?;
        debug!(%peer, id = request.id, kind = request.body.kind(), item_count, "request accepted");

        let ack = ctx.encoding.encode_ack(&ExportAck::for_request(&request))?;
        conn.send(ack).await?;
    }
}
