//! Application hook invoked for every validated inbound request.

use otelgen::ExportRequest;

/// Receives validated export requests.
///
/// Called exactly once per accepted request, synchronously on the
/// connection task, before the acknowledgement is written. A slow receiver
/// therefore slows the sender down.
///
/// Any `Fn(&ExportRequest, usize) + Send + Sync` closure is a receiver.
pub trait BatchReceiver: Send + Sync {
    fn on_receive(&self, request: &ExportRequest, item_count: usize);
}

impl<F> BatchReceiver for F
where
    F: Fn(&ExportRequest, usize) + Send + Sync,
{
    fn on_receive(&self, request: &ExportRequest, item_count: usize) {
        self(request, item_count)
    }
}
