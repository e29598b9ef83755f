//! Asynchronous transfer requests and their completion

use alloc::boxed::Box;
use usb_device::endpoint::EndpointAddress;

use crate::buffer::DmaBuffer;

bitflags::bitflags! {
    /// Submission flags for a transfer request.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TransferFlags: u32 {
        /// The buffer already carries its DMA mapping; the controller must
        /// not map it again.
        const NO_DMA_MAP = 1 << 0;
        /// Terminate the transfer with a zero-length packet when its length
        /// is a multiple of the endpoint's max packet size.
        const ZERO_PACKET = 1 << 1;
    }
}

/// A handle to one transfer descriptor allocated from the host controller.
///
/// The write path releases its handle by consuming it in
/// [`submit`](crate::HostController::submit); the controller keeps the
/// accepted transfer alive until completion. A handle dropped before
/// submission is simply forgotten.
#[derive(Debug)]
pub struct Transfer {
    id: u64,
}

impl Transfer {
    pub const fn new(id: u64) -> Self {
        Transfer { id }
    }

    pub const fn id(&self) -> u64 {
        self.id
    }
}

/// The result of a finished transfer, delivered to the completion callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferStatus {
    /// Every byte was transferred.
    Complete,
    /// The request was cancelled before it finished.
    Cancelled,
    /// The device was reset or removed while the request was in flight.
    Disconnected,
    /// The transfer failed on the bus.
    Fault,
}

impl TransferStatus {
    /// Benign teardown: the request went away with the device, not because
    /// of a transfer error.
    pub fn is_teardown(&self) -> bool {
        matches!(self, TransferStatus::Cancelled | TransferStatus::Disconnected)
    }
}

/// A single-delivery completion callback.
///
/// The host controller invokes it exactly once per accepted request, handing
/// back the DMA buffer along with the status. Consuming `self` makes a
/// second delivery unrepresentable.
pub struct Completion(Box<dyn FnOnce(TransferStatus, DmaBuffer) + Send>);

impl Completion {
    pub fn new(complete: impl FnOnce(TransferStatus, DmaBuffer) + Send + 'static) -> Self {
        Completion(Box::new(complete))
    }
}

/// One asynchronous bulk-out request handed to the host controller.
///
/// Owns the DMA buffer from construction until either the controller accepts
/// the submission (the buffer then travels to the completion callback) or
/// the caller reclaims it with [`into_buffer`](TransferRequest::into_buffer).
pub struct TransferRequest {
    endpoint: EndpointAddress,
    flags: TransferFlags,
    buffer: DmaBuffer,
    completion: Completion,
}

impl TransferRequest {
    pub fn new(
        endpoint: EndpointAddress,
        buffer: DmaBuffer,
        flags: TransferFlags,
        completion: Completion,
    ) -> Self {
        TransferRequest {
            endpoint,
            flags,
            buffer,
            completion,
        }
    }

    pub fn endpoint(&self) -> EndpointAddress {
        self.endpoint
    }

    pub fn flags(&self) -> TransferFlags {
        self.flags
    }

    pub fn buffer(&self) -> &DmaBuffer {
        &self.buffer
    }

    /// Number of bytes to transfer.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Deliver the result, moving the buffer into the completion callback.
    ///
    /// Controllers call this exactly once per accepted request.
    pub fn complete(self, status: TransferStatus) {
        (self.completion.0)(status, self.buffer)
    }

    /// Reclaim the buffer from a request that was never accepted.
    ///
    /// The completion callback is dropped without running.
    pub fn into_buffer(self) -> DmaBuffer {
        self.buffer
    }
}

#[cfg(test)]
mod test {
    use super::{Completion, TransferFlags, TransferRequest, TransferStatus};
    use crate::buffer::DmaBuffer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use usb_device::endpoint::EndpointAddress;

    fn request(deliveries: &Arc<AtomicUsize>) -> TransferRequest {
        let deliveries = Arc::clone(deliveries);
        TransferRequest::new(
            EndpointAddress::from(0x02),
            DmaBuffer::new(8, 0x2000),
            TransferFlags::NO_DMA_MAP,
            Completion::new(move |_, buffer| {
                assert_eq!(buffer.len(), 8);
                deliveries.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn complete_delivers_buffer_once() {
        let deliveries = Arc::new(AtomicUsize::new(0));
        let request = request(&deliveries);

        request.complete(TransferStatus::Complete);
        assert_eq!(deliveries.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn reclaimed_request_never_completes() {
        let deliveries = Arc::new(AtomicUsize::new(0));
        let request = request(&deliveries);

        let buffer = request.into_buffer();
        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.dma(), 0x2000);
        assert_eq!(deliveries.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn teardown_statuses() {
        assert!(TransferStatus::Cancelled.is_teardown());
        assert!(TransferStatus::Disconnected.is_teardown());
        assert!(!TransferStatus::Complete.is_teardown());
        assert!(!TransferStatus::Fault.is_teardown());
    }
}
