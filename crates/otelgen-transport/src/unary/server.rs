use super::{UnaryCall, UnaryReply};
use crate::error::{ProtocolViolation, TransportError};
use crate::frame::FrameConnection;
use crate::server::ConnectionContext;
use otelgen::{ExportAck, RESERVED_REQUEST_ID};
use tracing::debug;

/// Answers unary calls on one accepted connection until the peer leaves.
///
/// Identifier 0 is the only identifier rejected; anything else is delivered
/// and echoed back regardless of what came before.
pub(crate) async fn serve_connection(
    mut conn: FrameConnection,
    ctx: ConnectionContext,
) -> Result<u64, TransportError> {
    let peer = conn.peer_addr();
    let mut handled = 0u64;

    loop {
        let frame = tokio::select! {
            biased;

            () = ctx.shutdown.wait() => return Ok(handled),

            frame = conn.recv() => frame,
        };
        let Some(frame) = frame? else {
            return Ok(handled);
        };

        let call: UnaryCall = ctx.encoding.decode(&frame)?;
        debug!(%peer, kind = call.kind(), "call received");

        let reply = match call {
            UnaryCall::Hello => UnaryReply::Hello,
            UnaryCall::Export(request) => {
                if request.id == RESERVED_REQUEST_ID {
                    return Err(ProtocolViolation::ReservedId.into());
                }
                let item_count = ctx.deliver(&request)?;
                handled += 1;
                debug!(%peer, id = request.id, kind = request.body.kind(), item_count, "request accepted");
                UnaryReply::Export(ExportAck::for_request(&request))
            }
        };

        conn.send(ctx.encoding.encode(&reply)?).await?;
    }
}
