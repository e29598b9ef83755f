//! Caller-supplied write sources

use crate::Error;

/// A caller-owned byte region the write path copies from.
///
/// This models a user-space buffer: the length is known up front, but the
/// copy itself can fault if the region was never valid or went away. Callers
/// holding plain slices get an infallible implementation for free.
pub trait UserBuffer {
    /// The number of bytes available.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy every available byte into `dst`.
    ///
    /// `dst` is exactly [`len`](UserBuffer::len) bytes. Fails with
    /// [`Error::InvalidUserPointer`] when the region cannot be read.
    fn read_into(&self, dst: &mut [u8]) -> Result<(), Error>;
}

impl UserBuffer for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn read_into(&self, dst: &mut [u8]) -> Result<(), Error> {
        dst.copy_from_slice(self);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::UserBuffer;

    #[test]
    fn slice_copies_in_full() {
        let source = [5u8, 6, 7];
        let mut dst = [0u8; 3];
        UserBuffer::read_into(&source[..], &mut dst).unwrap();
        assert_eq!(dst, source);
    }

    #[test]
    fn slice_reports_length() {
        assert_eq!(UserBuffer::len(&b"abc"[..]), 3);
        assert!(UserBuffer::is_empty(&b""[..]));
    }
}
