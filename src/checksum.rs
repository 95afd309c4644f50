//! The running checksum carried alongside a [`crate::DeflateOutput`] window.
//!
//! Gzip carries CRC-32, zlib carries Adler-32, and raw deflate carries
//! nothing; `HistoryWindow`/`DeflateChunkedBufferOutput` is generic over
//! this trait rather than hard-wiring `crc32fast::Hasher` so the same
//! window type backs all three wrapper kinds.

pub trait Checksum: Default + Clone {
    fn update(&mut self, bytes: &[u8]);
    fn finalize(&self) -> u32;
}

#[derive(Default, Clone)]
pub struct Crc32Checksum(crc32fast::Hasher);

impl Checksum for Crc32Checksum {
    #[inline(always)]
    fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    #[inline(always)]
    fn finalize(&self) -> u32 {
        self.0.clone().finalize()
    }
}

#[derive(Clone)]
pub struct Adler32Checksum(u32);

const ADLER32_MOD: u32 = 65521;

impl Adler32Checksum {
    fn new() -> Self {
        Self(1)
    }
}

impl Default for Adler32Checksum {
    fn default() -> Self {
        Self::new()
    }
}

impl Checksum for Adler32Checksum {
    fn update(&mut self, bytes: &[u8]) {
        let mut a = self.0 & 0xFFFF;
        let mut b = (self.0 >> 16) & 0xFFFF;

        // NMAX = 5552: largest chunk processable before `b` could overflow
        // a u32 accumulator between reductions mod ADLER32_MOD.
        for chunk in bytes.chunks(5552) {
            for &byte in chunk {
                a += byte as u32;
                b += a;
            }
            a %= ADLER32_MOD;
            b %= ADLER32_MOD;
        }

        self.0 = (b << 16) | a;
    }

    fn finalize(&self) -> u32 {
        if self.0 == 0 {
            1
        } else {
            self.0
        }
    }
}

#[derive(Default, Clone)]
pub struct NoChecksum;

impl Checksum for NoChecksum {
    #[inline(always)]
    fn update(&mut self, _bytes: &[u8]) {}

    #[inline(always)]
    fn finalize(&self) -> u32 {
        0
    }
}

/// Standalone Adler-32 over a full in-memory buffer, independent of any
/// wrapper (spec asserts it as a testable property in its own right).
pub fn adler32(data: &[u8]) -> u32 {
    let mut h = Adler32Checksum::new();
    h.update(data);
    h.finalize()
}

/// Standalone CRC-32 over a full in-memory buffer.
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adler32_empty() {
        assert_eq!(adler32(b""), 1);
    }

    #[test]
    fn adler32_wikipedia_example() {
        // "Wikipedia" -> 0x11E60398, the canonical worked example.
        assert_eq!(adler32(b"Wikipedia"), 0x11E60398);
    }

    #[test]
    fn crc32_known_vector() {
        assert_eq!(crc32(b"123456789"), 0xCBF43926);
    }
}
