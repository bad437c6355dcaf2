use std::collections::HashMap;

/// Flat byte-addressable data memory. Sparse; unwritten bytes read as zero.
/// All multi-byte accesses are little-endian.
#[derive(Debug, Default)]
pub struct DataMemory {
    bytes: HashMap<u64, u8>,
}

impl DataMemory {
    /// Assemble `bytes` bytes starting at `addr`, little-endian, into the low
    /// bits of the result.
    pub fn load(&self, addr: u64, bytes: usize) -> u64 {
        let mut raw = 0u64;
        for i in 0..bytes {
            if let Some(b) = self.bytes.get(&addr.wrapping_add(i as u64)) {
                raw |= (*b as u64) << (8 * i);
            }
        }
        raw
    }

    pub fn store(&mut self, addr: u64, bytes: usize, value: u64) {
        for i in 0..bytes {
            self.bytes
                .insert(addr.wrapping_add(i as u64), (value >> (8 * i)) as u8);
        }
    }

    pub fn write_block(&mut self, addr: u64, data: &[u8]) {
        for (i, b) in data.iter().enumerate() {
            self.bytes.insert(addr.wrapping_add(i as u64), *b);
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
