//! Per-attachment device state

use alloc::boxed::Box;
use alloc::vec::Vec;
use usb_device::endpoint::EndpointAddress;

use crate::descriptor::BulkEndpoints;
use crate::{Error, HostController};

/// The state for one attached device.
///
/// Built by the probe path after endpoint classification, and read-only from
/// then on. The context is shared as `Arc<DeviceContext<H>>`: the attachment
/// holds one reference, and every in-flight write clones another into its
/// completion callback. The receive buffer and the device handle are
/// released when the last reference drops — a detach with transfers still in
/// flight leaves the context alive until they finish.
pub struct DeviceContext<H: HostController> {
    device: H::Device,
    interface: H::Interface,
    endpoints: BulkEndpoints,
    bulk_in_buffer: Option<Box<[u8]>>,
}

impl<H: HostController> DeviceContext<H> {
    /// Record the handles and endpoints, and allocate the receive buffer.
    ///
    /// The receive buffer is sized to the bulk-in max packet size, and is
    /// skipped entirely when no bulk-in endpoint was found.
    pub(crate) fn new(
        device: H::Device,
        interface: H::Interface,
        endpoints: BulkEndpoints,
    ) -> Result<Self, Error> {
        let bulk_in_buffer = match endpoints.bulk_in() {
            Some((_, size)) => {
                let mut buffer = Vec::new();
                buffer
                    .try_reserve_exact(size)
                    .map_err(|_| Error::OutOfMemory)?;
                buffer.resize(size, 0);
                Some(buffer.into_boxed_slice())
            }
            None => None,
        };

        Ok(DeviceContext {
            device,
            interface,
            endpoints,
            bulk_in_buffer,
        })
    }

    pub fn device(&self) -> &H::Device {
        &self.device
    }

    pub fn interface(&self) -> &H::Interface {
        &self.interface
    }

    pub fn bulk_in(&self) -> Option<(EndpointAddress, usize)> {
        self.endpoints.bulk_in()
    }

    pub fn bulk_out(&self) -> Option<EndpointAddress> {
        self.endpoints.bulk_out()
    }

    /// The receive buffer, present whenever a bulk-in endpoint was found.
    pub fn bulk_in_buffer(&self) -> Option<&[u8]> {
        self.bulk_in_buffer.as_deref()
    }
}
