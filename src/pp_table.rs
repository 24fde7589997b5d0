//! Owned buffer holding one device's PP table between fetch and upload.

use crate::error::BufferError;

/// Fixed-capacity byte buffer with a separately committed size.
///
/// Capacity is reserved once by [`PpTable::allocate`]; the number of valid
/// bytes is committed afterwards with [`PpTable::set_size`]. Not `Clone`:
/// tables move between steps, they are never duplicated.
#[derive(Debug, Default)]
pub struct PpTable {
    data: Box<[u8]>,
    size: usize,
}

impl PpTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `capacity` zeroed bytes. Only the first non-empty allocation
    /// succeeds; later calls leave the buffer untouched.
    pub fn allocate(&mut self, capacity: usize) -> Result<(), BufferError> {
        if !self.data.is_empty() {
            return Err(BufferError::AlreadyAllocated {
                capacity: self.data.len(),
            });
        }

        self.data = vec![0u8; capacity].into_boxed_slice();
        Ok(())
    }

    /// Commit the number of valid bytes. Signed like the count returned by
    /// `read(2)`, so negative values are rejected rather than unrepresentable.
    pub fn set_size(&mut self, size: isize) -> Result<(), BufferError> {
        let capacity = self.capacity();
        match usize::try_from(size) {
            Ok(size) if size <= capacity => {
                self.size = size;
                Ok(())
            }
            _ => Err(BufferError::SizeOutOfRange { size, capacity }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The committed bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.size]
    }

    /// The whole allocation, for filling before the size is committed.
    pub fn capacity_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
