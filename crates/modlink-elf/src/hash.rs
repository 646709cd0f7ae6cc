//! Classic ELF symbol hash.

/// Hash a symbol name with the standard ELF hash function.
///
/// A 4-bit-shift accumulator with high-nibble folding, as specified for
/// `DT_HASH`; the loader reduces the result modulo its bucket count.
#[must_use]
pub fn elf_hash(name: &[u8]) -> u32 {
    let mut h: u32 = 0;
    for &ch in name {
        h = (h << 4).wrapping_add(u32::from(ch));
        let g = h & 0xF000_0000;
        if g != 0 {
            h ^= g >> 24;
            h &= !g;
        }
    }
    h
}
