//! Symbol and relocation entry decoding.

use crate::target::{Class, RelocFormat, TargetSpec};
use crate::{ElfError, Result};

/// Decoded symbol table entry.
#[derive(Clone, Debug)]
pub struct SymbolEntry {
    pub name_offset: u32,
    pub value: u64,
    pub size: u64,
    pub info: u8,
    pub other: u8,
    pub shndx: u16,
}

impl SymbolEntry {
    /// Decode one symbol entry from a `target.symentsize()`-byte buffer.
    pub fn parse(data: &[u8], target: &TargetSpec) -> Result<Self> {
        let need = target.symentsize();
        if data.len() < need {
            return Err(ElfError::Truncated {
                record: "symbol entry",
                need,
                have: data.len(),
            });
        }

        let en = target.endian;
        let entry = match target.class {
            Class::Elf32 => Self {
                name_offset: en.read_u32(data, 0),
                value: u64::from(en.read_u32(data, 4)),
                size: u64::from(en.read_u32(data, 8)),
                info: data[12],
                other: data[13],
                shndx: en.read_u16(data, 14),
            },
            Class::Elf64 => Self {
                name_offset: en.read_u32(data, 0),
                info: data[4],
                other: data[5],
                shndx: en.read_u16(data, 6),
                value: en.read_u64(data, 8),
                size: en.read_u64(data, 16),
            },
        };

        Ok(entry)
    }
}

/// Decoded relocation entry (REL or RELA per the target).
#[derive(Clone, Debug)]
pub struct RelocEntry {
    pub offset: u64,
    pub info: u64,
    /// Explicit addend; 0 for REL-shaped targets.
    pub addend: i64,
}

impl RelocEntry {
    /// Decode one relocation entry from a `target.relentsize()`-byte buffer.
    pub fn parse(data: &[u8], target: &TargetSpec) -> Result<Self> {
        let need = target.relentsize();
        if data.len() < need {
            return Err(ElfError::Truncated {
                record: "relocation entry",
                need,
                have: data.len(),
            });
        }

        let en = target.endian;
        let rela = target.reloc_format == RelocFormat::Rela;
        let entry = match target.class {
            Class::Elf32 => Self {
                offset: u64::from(en.read_u32(data, 0)),
                info: u64::from(en.read_u32(data, 4)),
                addend: if rela {
                    i64::from(en.read_u32(data, 8) as i32)
                } else {
                    0
                },
            },
            Class::Elf64 => Self {
                offset: en.read_u64(data, 0),
                info: en.read_u64(data, 8),
                addend: if rela {
                    en.read_u64(data, 16) as i64
                } else {
                    0
                },
            },
        };

        Ok(entry)
    }
}
