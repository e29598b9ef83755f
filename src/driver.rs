//! The bulk write driver
//!
//! `BulkDriver` ties the pieces together. The bus framework calls
//! [`probe`](BulkDriver::probe) when a device matching the id table shows
//! up, routes entry-point writes to [`write`](BulkDriver::write) while the
//! device is attached, and calls [`disconnect`](BulkDriver::disconnect) on
//! removal. Detach does not cancel in-flight transfers; their completion
//! callbacks hold the device context alive until they run.

use alloc::sync::Arc;
use log::{debug, warn};

use crate::descriptor::{BulkEndpoints, EndpointDescriptor};
use crate::device::DeviceContext;
use crate::transfer::{Completion, TransferFlags, TransferRequest, TransferStatus};
use crate::uaccess::UserBuffer;
use crate::{Error, HostController};

/// A vendor/product identity pair this driver binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId {
    vendor: u16,
    product: u16,
}

impl DeviceId {
    pub const fn new(vendor: u16, product: u16) -> Self {
        DeviceId { vendor, product }
    }

    pub const fn vendor(&self) -> u16 {
        self.vendor
    }

    pub const fn product(&self) -> u16 {
        self.product
    }
}

/// One attached device, returned from [`BulkDriver::probe`] and consumed by
/// [`BulkDriver::disconnect`].
pub struct Attachment<H: HostController> {
    ctx: Arc<DeviceContext<H>>,
    minor: Option<u8>,
}

impl<H: HostController> Attachment<H> {
    /// The shared device context. Clone it to route writes.
    pub fn context(&self) -> &Arc<DeviceContext<H>> {
        &self.ctx
    }

    /// The minor number of the registered entry point.
    ///
    /// `None` when registration failed; the device is attached but has no
    /// user-facing entry point.
    pub fn minor(&self) -> Option<u8> {
        self.minor
    }
}

/// A host-side bulk write driver.
///
/// One `BulkDriver` serves every device matching its id table. The table is
/// fixed at construction; there is no global registration state.
pub struct BulkDriver<H: HostController> {
    hc: H,
    id_table: &'static [DeviceId],
}

impl<H: HostController> BulkDriver<H> {
    pub fn new(hc: H, id_table: &'static [DeviceId]) -> Self {
        BulkDriver { hc, id_table }
    }

    /// Whether this driver binds to `id`.
    pub fn matches(&self, id: DeviceId) -> bool {
        self.id_table.contains(&id)
    }

    /// Attach to a freshly matched device.
    ///
    /// Classifies `descriptors`, builds the device context (allocating the
    /// receive buffer when a bulk-in endpoint exists), and registers the
    /// user-facing entry point. A device with neither bulk direction is
    /// malformed and the attach fails; a single missing direction is only
    /// logged, and a write on the missing bulk-out surfaces at first use.
    /// Registration failure clears the entry point but keeps the context —
    /// outstanding references are still valid.
    pub fn probe(
        &self,
        device: H::Device,
        interface: H::Interface,
        id: DeviceId,
        descriptors: &[EndpointDescriptor],
    ) -> Result<Attachment<H>, Error> {
        let endpoints = BulkEndpoints::classify(descriptors);
        if endpoints.is_empty() {
            warn!("could not find bulk-in or bulk-out endpoints");
            return Err(Error::EndpointsNotFound);
        }
        if !endpoints.is_complete() {
            warn!("could not find both bulk-in and bulk-out endpoints");
        }

        let ctx = Arc::new(DeviceContext::new(device, interface, endpoints)?);

        let minor = match self.hc.register(ctx.interface()) {
            Ok(minor) => {
                debug!("device now attached, minor {}", minor);
                Some(minor)
            }
            Err(()) => {
                warn!("not able to get a minor for this device");
                None
            }
        };

        debug!("device {:04x}:{:04x} plugged", id.vendor(), id.product());
        Ok(Attachment { ctx, minor })
    }

    /// Detach from a removed device.
    ///
    /// Removes the entry point and drops this driver's context reference.
    /// In-flight transfers are not cancelled; each one holds its own
    /// reference and releases it from its completion callback.
    pub fn disconnect(&self, attachment: Attachment<H>) {
        if attachment.minor.is_some() {
            self.hc.deregister(attachment.ctx.interface());
        }
        debug!("device removed");
    }

    /// Accept `data` for asynchronous bulk-out transfer.
    ///
    /// Returns the full byte count once the controller accepts the
    /// submission — accepted, not yet transmitted. The buffer then belongs
    /// to the controller until the completion callback releases it. On any
    /// failing path the half-built request is torn down here: a buffer that
    /// was never submitted has no completion callback to free it.
    pub fn write<U>(&self, ctx: &Arc<DeviceContext<H>>, data: &U) -> Result<usize, Error>
    where
        U: UserBuffer + ?Sized,
    {
        let count = data.len();
        if count == 0 {
            return Ok(0);
        }

        // An interface that classified without a bulk-out endpoint reports
        // it at first use.
        let endpoint = ctx.bulk_out().ok_or(Error::SubmissionFailed)?;

        let transfer = self.hc.allocate_transfer().ok_or(Error::OutOfMemory)?;
        let mut buffer = self
            .hc
            .allocate_dma(ctx.device(), count)
            .ok_or(Error::OutOfMemory)?;

        if let Err(err) = data.read_into(buffer.as_mut_slice()) {
            self.hc.free_dma(ctx.device(), buffer);
            return Err(err);
        }

        let request = TransferRequest::new(
            endpoint,
            buffer,
            TransferFlags::NO_DMA_MAP,
            write_bulk_completion(self.hc.clone(), Arc::clone(ctx)),
        );

        match self.hc.submit(transfer, request) {
            Ok(()) => Ok(count),
            Err(request) => {
                warn!("failed submitting write transfer");
                self.hc.free_dma(ctx.device(), request.into_buffer());
                Err(Error::SubmissionFailed)
            }
        }
    }
}

/// The completion for a bulk write: release the buffer, whatever the status.
///
/// Captures its own context reference so the device handle outlives the
/// transfer.
fn write_bulk_completion<H: HostController>(hc: H, ctx: Arc<DeviceContext<H>>) -> Completion {
    Completion::new(move |status, buffer| {
        match status {
            TransferStatus::Complete => {}
            status if status.is_teardown() => {
                debug!("write transfer torn down: {:?}", status)
            }
            status => warn!("nonzero write bulk status received: {:?}", status),
        }
        hc.free_dma(ctx.device(), buffer);
    })
}
