//! DMA-capable transfer buffers

use alloc::boxed::Box;
use alloc::vec;
use core::fmt;

/// An owned, DMA-capable transfer buffer.
///
/// The buffer carries the bus address the device uses to reach it, so the
/// controller does not map it again at submission time.
///
/// `DmaBuffer` is intentionally not `Clone`: a buffer has exactly one owner
/// at any instant. The write path owns it until submission, the host
/// controller owns it in flight, and the completion callback owns it last.
pub struct DmaBuffer {
    data: Box<[u8]>,
    dma: u64,
}

impl DmaBuffer {
    /// Allocate a zero-filled buffer of `len` bytes, reachable by the device
    /// at bus address `dma`.
    pub fn new(len: usize, dma: u64) -> Self {
        DmaBuffer {
            data: vec![0; len].into_boxed_slice(),
            dma,
        }
    }

    /// The bus address of the buffer.
    pub fn dma(&self) -> u64 {
        self.dma
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl fmt::Debug for DmaBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DmaBuffer")
            .field("len", &self.data.len())
            .field("dma", &self.dma)
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::DmaBuffer;

    #[test]
    fn zero_filled() {
        let buffer = DmaBuffer::new(16, 0x1000);
        assert_eq!(buffer.len(), 16);
        assert_eq!(buffer.dma(), 0x1000);
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn writable() {
        let mut buffer = DmaBuffer::new(4, 0);
        buffer.as_mut_slice().copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 4]);
    }
}
