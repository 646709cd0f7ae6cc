//! File header and section header decoding.

use crate::target::{Class, TargetSpec};
use crate::{ElfError, Result};

/// Decoded ELF file header.
///
/// Wide enough for both classes; ELF32 fields are zero-extended.
#[derive(Clone, Debug)]
pub struct FileHeader {
    pub ident: [u8; 16],
    pub e_type: u16,
    pub machine: u16,
    pub version: u32,
    pub entry: u64,
    pub phoff: u64,
    pub shoff: u64,
    pub flags: u32,
    pub ehsize: u16,
    pub phentsize: u16,
    pub phnum: u16,
    pub shentsize: u16,
    pub shnum: u16,
    pub shstrndx: u16,
}

impl FileHeader {
    /// Decode a file header from a buffer of at least `target.ehsize()` bytes.
    pub fn parse(data: &[u8], target: &TargetSpec) -> Result<Self> {
        let need = target.ehsize();
        if data.len() < need {
            return Err(ElfError::Truncated {
                record: "file header",
                need,
                have: data.len(),
            });
        }

        let mut ident = [0u8; 16];
        ident.copy_from_slice(&data[..16]);
        let en = target.endian;

        let header = match target.class {
            Class::Elf32 => Self {
                ident,
                e_type: en.read_u16(data, 16),
                machine: en.read_u16(data, 18),
                version: en.read_u32(data, 20),
                entry: u64::from(en.read_u32(data, 24)),
                phoff: u64::from(en.read_u32(data, 28)),
                shoff: u64::from(en.read_u32(data, 32)),
                flags: en.read_u32(data, 36),
                ehsize: en.read_u16(data, 40),
                phentsize: en.read_u16(data, 42),
                phnum: en.read_u16(data, 44),
                shentsize: en.read_u16(data, 46),
                shnum: en.read_u16(data, 48),
                shstrndx: en.read_u16(data, 50),
            },
            Class::Elf64 => Self {
                ident,
                e_type: en.read_u16(data, 16),
                machine: en.read_u16(data, 18),
                version: en.read_u32(data, 20),
                entry: en.read_u64(data, 24),
                phoff: en.read_u64(data, 32),
                shoff: en.read_u64(data, 40),
                flags: en.read_u32(data, 48),
                ehsize: en.read_u16(data, 52),
                phentsize: en.read_u16(data, 54),
                phnum: en.read_u16(data, 56),
                shentsize: en.read_u16(data, 58),
                shnum: en.read_u16(data, 60),
                shstrndx: en.read_u16(data, 62),
            },
        };

        Ok(header)
    }
}

/// Decoded section header entry.
#[derive(Clone, Debug, Default)]
pub struct SectionHeader {
    pub name_offset: u32,
    pub sh_type: u32,
    pub flags: u64,
    pub addr: u64,
    pub offset: u64,
    pub size: u64,
    pub link: u32,
    pub info: u32,
    pub addralign: u64,
    pub entsize: u64,
}

impl SectionHeader {
    /// Decode one section header entry from a `target.shentsize()`-byte buffer.
    pub fn parse(data: &[u8], target: &TargetSpec) -> Result<Self> {
        let need = target.shentsize();
        if data.len() < need {
            return Err(ElfError::Truncated {
                record: "section header",
                need,
                have: data.len(),
            });
        }

        let en = target.endian;
        let header = match target.class {
            Class::Elf32 => Self {
                name_offset: en.read_u32(data, 0),
                sh_type: en.read_u32(data, 4),
                flags: u64::from(en.read_u32(data, 8)),
                addr: u64::from(en.read_u32(data, 12)),
                offset: u64::from(en.read_u32(data, 16)),
                size: u64::from(en.read_u32(data, 20)),
                link: en.read_u32(data, 24),
                info: en.read_u32(data, 28),
                addralign: u64::from(en.read_u32(data, 32)),
                entsize: u64::from(en.read_u32(data, 36)),
            },
            Class::Elf64 => Self {
                name_offset: en.read_u32(data, 0),
                sh_type: en.read_u32(data, 4),
                flags: en.read_u64(data, 8),
                addr: en.read_u64(data, 16),
                offset: en.read_u64(data, 24),
                size: en.read_u64(data, 32),
                link: en.read_u32(data, 40),
                info: en.read_u32(data, 44),
                addralign: en.read_u64(data, 48),
                entsize: en.read_u64(data, 56),
            },
        };

        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;

    fn elf32_header_bytes() -> Vec<u8> {
        let mut data = vec![0u8; 52];
        data[..4].copy_from_slice(&ELF_MAGIC);
        data[4] = ELF_CLASS_32;
        data[5] = ELF_DATA_LSB;
        data[6] = EV_CURRENT;
        data[16..18].copy_from_slice(&ET_REL.to_le_bytes());
        data[18..20].copy_from_slice(&EM_ARM.to_le_bytes());
        data[20..24].copy_from_slice(&1u32.to_le_bytes());
        data[32..36].copy_from_slice(&0x1000u32.to_le_bytes()); // e_shoff
        data[46..48].copy_from_slice(&40u16.to_le_bytes()); // e_shentsize
        data[48..50].copy_from_slice(&5u16.to_le_bytes()); // e_shnum
        data[50..52].copy_from_slice(&4u16.to_le_bytes()); // e_shstrndx
        data
    }

    #[test]
    fn test_parse_elf32_header() {
        let data = elf32_header_bytes();
        let header = FileHeader::parse(&data, &TargetSpec::ARM).unwrap();
        assert_eq!(header.e_type, ET_REL);
        assert_eq!(header.machine, EM_ARM);
        assert_eq!(header.shoff, 0x1000);
        assert_eq!(header.shentsize, 40);
        assert_eq!(header.shnum, 5);
        assert_eq!(header.shstrndx, 4);
    }

    #[test]
    fn test_parse_header_truncated() {
        let data = elf32_header_bytes();
        let err = FileHeader::parse(&data[..20], &TargetSpec::ARM);
        assert!(matches!(err, Err(ElfError::Truncated { .. })));
    }

    #[test]
    fn test_parse_elf32_section_header_big_endian() {
        let mut data = vec![0u8; 40];
        data[0..4].copy_from_slice(&7u32.to_be_bytes()); // sh_name
        data[4..8].copy_from_slice(&SHT_PROGBITS.to_be_bytes());
        data[8..12].copy_from_slice(&((SHF_ALLOC | SHF_EXECINSTR) as u32).to_be_bytes());
        data[20..24].copy_from_slice(&0x80u32.to_be_bytes()); // sh_size
        let sh = SectionHeader::parse(&data, &TargetSpec::MIPS).unwrap();
        assert_eq!(sh.name_offset, 7);
        assert_eq!(sh.sh_type, SHT_PROGBITS);
        assert_eq!(sh.flags, SHF_ALLOC | SHF_EXECINSTR);
        assert_eq!(sh.size, 0x80);
    }

    #[test]
    fn test_parse_elf64_section_header() {
        let mut data = vec![0u8; 64];
        data[4..8].copy_from_slice(&SHT_SYMTAB.to_le_bytes());
        data[32..40].copy_from_slice(&(24u64 * 3).to_le_bytes()); // sh_size
        data[40..44].copy_from_slice(&2u32.to_le_bytes()); // sh_link
        data[44..48].copy_from_slice(&1u32.to_le_bytes()); // sh_info
        data[56..64].copy_from_slice(&24u64.to_le_bytes()); // sh_entsize
        let sh = SectionHeader::parse(&data, &TargetSpec::X86_64).unwrap();
        assert_eq!(sh.sh_type, SHT_SYMTAB);
        assert_eq!(sh.size, 72);
        assert_eq!(sh.link, 2);
        assert_eq!(sh.info, 1);
        assert_eq!(sh.entsize, 24);
    }
}
