/// Running 8-bit additive checksum.
///
/// Sums bytes modulo 256. No polynomial, no final inversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum(u8);

impl Checksum {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn update(&mut self, byte: u8) {
        self.0 = self.0.wrapping_add(byte);
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Checksum of a complete byte slice.
pub fn additive(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}
