//! A host-side USB bulk write driver core
//!
//! `usbh-bulk` attaches to a vendor/product-matched USB device, classifies
//! the bulk endpoints of its interface, and exposes a write path that copies
//! caller-supplied bytes into DMA-capable buffers and submits them
//! asynchronously. Writes return as soon as the controller accepts the
//! transfer; the completion callback releases the buffer.
//!
//! To interface the library, you must define an implementation of
//! [`HostController`]. See the trait documentation for more information.

#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

mod buffer;
mod descriptor;
mod device;
mod driver;
mod transfer;
mod uaccess;

pub use buffer::DmaBuffer;
pub use descriptor::{BulkEndpoints, EndpointDescriptor};
pub use device::DeviceContext;
pub use driver::{Attachment, BulkDriver, DeviceId};
pub use transfer::{Completion, Transfer, TransferFlags, TransferRequest, TransferStatus};
pub use uaccess::UserBuffer;

/// Errors produced by the attach and write paths.
///
/// All errors are local to the failing call. A failed write leaves the
/// device attached and ready for the next write; nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A transfer descriptor or DMA buffer could not be allocated.
    OutOfMemory,
    /// The caller-supplied memory region could not be read.
    InvalidUserPointer,
    /// The host controller rejected the transfer.
    SubmissionFailed,
    /// Classification found neither a bulk-in nor a bulk-out endpoint.
    EndpointsNotFound,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::OutOfMemory => f.write_str("out of memory"),
            Error::InvalidUserPointer => f.write_str("could not copy from caller memory"),
            Error::SubmissionFailed => f.write_str("host controller rejected the transfer"),
            Error::EndpointsNotFound => {
                f.write_str("could not find both bulk-in and bulk-out endpoints")
            }
        }
    }
}

impl core::error::Error for Error {}

/// A handle to the host controller and bus framework
///
/// `HostController` is the seam between this driver and the platform: it
/// allocates transfer descriptors and DMA-capable buffers, accepts
/// asynchronous submissions, and registers the user-facing entry point.
/// Implementations are expected to be cheap, shareable handles; the write
/// path clones one into every completion callback.
///
/// # Ownership
///
/// A [`DmaBuffer`] has exactly one owner at any instant. [`allocate_dma`]
/// hands it to the caller, [`submit`] moves it (inside the request) into the
/// controller, and completion moves it into the callback. [`free_dma`] and
/// [`TransferRequest::complete`] consume it, so it cannot be released twice.
///
/// [`allocate_dma`]: HostController::allocate_dma
/// [`submit`]: HostController::submit
/// [`free_dma`]: HostController::free_dma
///
/// # Example
///
/// A loopback controller that accepts every transfer and completes it
/// immediately:
///
/// ```
/// use usbh_bulk::{
///     DmaBuffer, HostController, Transfer, TransferRequest, TransferStatus,
/// };
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Clone, Default)]
/// struct Loopback(Arc<AtomicU64>);
///
/// impl HostController for Loopback {
///     type Device = ();
///     type Interface = ();
///
///     fn allocate_transfer(&self) -> Option<Transfer> {
///         Some(Transfer::new(self.0.fetch_add(1, Ordering::Relaxed)))
///     }
///     fn allocate_dma(&self, _device: &(), len: usize) -> Option<DmaBuffer> {
///         Some(DmaBuffer::new(len, 0))
///     }
///     fn free_dma(&self, _device: &(), buffer: DmaBuffer) {
///         drop(buffer);
///     }
///     fn submit(
///         &self,
///         _transfer: Transfer,
///         request: TransferRequest,
///     ) -> Result<(), TransferRequest> {
///         request.complete(TransferStatus::Complete);
///         Ok(())
///     }
///     fn register(&self, _interface: &()) -> Result<u8, ()> {
///         Ok(0)
///     }
///     fn deregister(&self, _interface: &()) {}
/// }
/// ```
pub trait HostController: Clone + Send + Sync + 'static {
    /// A counted reference to the device connection.
    ///
    /// Held by the [`DeviceContext`] and released when the context is
    /// destroyed.
    type Device: Send + Sync + 'static;
    /// The claimed interface.
    type Interface: Send + Sync + 'static;

    /// Allocate a transfer descriptor.
    ///
    /// Returns `None` when the controller has no descriptors left. A
    /// descriptor dropped without being submitted is simply forgotten.
    fn allocate_transfer(&self) -> Option<Transfer>;

    /// Allocate a DMA-capable buffer of `len` bytes for transfers to
    /// `device`.
    fn allocate_dma(&self, device: &Self::Device, len: usize) -> Option<DmaBuffer>;

    /// Release a buffer obtained from [`allocate_dma`](HostController::allocate_dma).
    fn free_dma(&self, device: &Self::Device, buffer: DmaBuffer);

    /// Hand a request to the controller for asynchronous transfer.
    ///
    /// On acceptance the controller owns the request and delivers
    /// [`TransferRequest::complete`] exactly once, possibly concurrently
    /// with new writes. On rejection the request comes back to the caller,
    /// which still owns the buffer; the completion callback of a rejected
    /// request never runs.
    fn submit(&self, transfer: Transfer, request: TransferRequest) -> Result<(), TransferRequest>;

    /// Register the user-facing entry point for `interface`.
    ///
    /// Returns the assigned minor number, which this driver uses only for
    /// logging.
    fn register(&self, interface: &Self::Interface) -> Result<u8, ()>;

    /// Remove the entry point registered for `interface`.
    fn deregister(&self, interface: &Self::Interface);
}
