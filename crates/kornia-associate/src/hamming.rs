/// Precomputed Hamming distance between every pair of bytes.
///
/// The table is built once and never mutated, wrap it in an [`std::sync::Arc`]
/// to share it between score functions and threads.
#[derive(Clone)]
pub struct HammingTable8 {
    table: Box<[[u8; 256]; 256]>,
}

impl HammingTable8 {
    /// Build the 256x256 lookup table.
    pub fn new() -> Self {
        let mut table = Box::new([[0u8; 256]; 256]);
        for (a, row) in table.iter_mut().enumerate() {
            for (b, value) in row.iter_mut().enumerate() {
                *value = (a ^ b).count_ones() as u8;
            }
        }
        Self { table }
    }

    /// Number of differing bits between two bytes.
    #[inline]
    pub fn lookup(&self, a: u8, b: u8) -> u8 {
        self.table[a as usize][b as usize]
    }

    /// Hamming distance between two byte descriptors of equal length.
    #[inline]
    pub fn distance(&self, a: &[u8], b: &[u8]) -> u32 {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| self.lookup(x, y) as u32)
            .sum()
    }
}

impl Default for HammingTable8 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HammingTable8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HammingTable8").finish_non_exhaustive()
    }
}
