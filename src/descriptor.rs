//! Endpoint descriptors and bulk endpoint classification

use usb_device::{endpoint::EndpointAddress, UsbDirection};

/// Transfer type field of `bmAttributes`.
const ENDPOINT_XFERTYPE_MASK: u8 = 0x03;
const ENDPOINT_XFER_BULK: u8 = 0x02;

/// One endpoint descriptor from an interface's active alternate setting.
///
/// A read-only view of the raw descriptor fields. The classifier consumes
/// these; nothing in the driver mutates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    address: u8,
    attributes: u8,
    max_packet_size: u16,
}

impl EndpointDescriptor {
    /// Wrap the raw `bEndpointAddress`, `bmAttributes`, and
    /// `wMaxPacketSize` fields.
    pub const fn new(address: u8, attributes: u8, max_packet_size: u16) -> Self {
        EndpointDescriptor {
            address,
            attributes,
            max_packet_size,
        }
    }

    pub fn address(&self) -> EndpointAddress {
        self.address.into()
    }

    pub fn direction(&self) -> UsbDirection {
        self.address().direction()
    }

    pub fn is_bulk(&self) -> bool {
        self.attributes & ENDPOINT_XFERTYPE_MASK == ENDPOINT_XFER_BULK
    }

    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size.into()
    }
}

/// The bulk endpoints selected from an interface's descriptor list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkEndpoints {
    bulk_in: Option<(EndpointAddress, usize)>,
    bulk_out: Option<EndpointAddress>,
}

impl BulkEndpoints {
    /// Select the first bulk-in and first bulk-out endpoints of `descriptors`.
    ///
    /// One linear pass, in list order. The first qualifying endpoint of each
    /// direction wins; later qualifying endpoints are ignored. A direction
    /// that never qualifies stays unset — callers decide whether that is
    /// tolerable.
    pub fn classify(descriptors: &[EndpointDescriptor]) -> Self {
        let mut bulk_in = None;
        let mut bulk_out = None;

        for endpoint in descriptors {
            if bulk_in.is_none() && endpoint.direction() == UsbDirection::In && endpoint.is_bulk() {
                bulk_in = Some((endpoint.address(), endpoint.max_packet_size()));
            }
            if bulk_out.is_none() && endpoint.direction() == UsbDirection::Out && endpoint.is_bulk()
            {
                bulk_out = Some(endpoint.address());
            }
        }

        BulkEndpoints { bulk_in, bulk_out }
    }

    /// The bulk-in address and its max packet size.
    pub fn bulk_in(&self) -> Option<(EndpointAddress, usize)> {
        self.bulk_in
    }

    /// The bulk-out address.
    pub fn bulk_out(&self) -> Option<EndpointAddress> {
        self.bulk_out
    }

    /// Both directions were found.
    pub fn is_complete(&self) -> bool {
        self.bulk_in.is_some() && self.bulk_out.is_some()
    }

    /// Neither direction was found.
    pub fn is_empty(&self) -> bool {
        self.bulk_in.is_none() && self.bulk_out.is_none()
    }
}
