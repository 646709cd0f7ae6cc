//! Target configuration: the single architecture a loader instance accepts.

use crate::constants::*;

/// ELF class (word width).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Class {
    Elf32,
    Elf64,
}

/// Byte order of the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    #[inline]
    #[must_use]
    pub fn read_u16(self, data: &[u8], offset: usize) -> u16 {
        let b = [data[offset], data[offset + 1]];
        match self {
            Self::Little => u16::from_le_bytes(b),
            Self::Big => u16::from_be_bytes(b),
        }
    }

    #[inline]
    #[must_use]
    pub fn read_u32(self, data: &[u8], offset: usize) -> u32 {
        let b = [
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ];
        match self {
            Self::Little => u32::from_le_bytes(b),
            Self::Big => u32::from_be_bytes(b),
        }
    }

    #[inline]
    #[must_use]
    pub fn read_u64(self, data: &[u8], offset: usize) -> u64 {
        let b = [
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ];
        match self {
            Self::Little => u64::from_le_bytes(b),
            Self::Big => u64::from_be_bytes(b),
        }
    }
}

/// Relocation entry shape used by the target ABI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelocFormat {
    Rel,
    Rela,
}

impl RelocFormat {
    /// The `SHT_*` type code carrying relocations of this shape.
    #[must_use]
    pub const fn section_type(self) -> u32 {
        match self {
            Self::Rel => SHT_REL,
            Self::Rela => SHT_RELA,
        }
    }

    /// The shape this target does *not* use.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Rel => Self::Rela,
            Self::Rela => Self::Rel,
        }
    }

    /// The `SHT_*` type code of the shape this target does *not* use.
    #[must_use]
    pub const fn other_section_type(self) -> u32 {
        self.other().section_type()
    }
}

/// The architecture a loader instance is built for.
///
/// An explicit runtime value handed to `load`, so one build can serve any
/// supported machine.
#[derive(Clone, Copy, Debug)]
pub struct TargetSpec {
    /// Expected `e_machine`.
    pub machine: u16,
    pub class: Class,
    pub endian: Endian,
    pub reloc_format: RelocFormat,
    /// Architecture "short/small data" section flag, 0 if the target has none.
    pub short_data_flag: u64,
    /// Fold bit 2 of `st_other` into the low bit of the symbol value
    /// (SH-5 ISA mode switching).
    pub value_mode_bit: bool,
}

impl TargetSpec {
    pub const I386: Self = Self {
        machine: EM_386,
        class: Class::Elf32,
        endian: Endian::Little,
        reloc_format: RelocFormat::Rel,
        short_data_flag: 0,
        value_mode_bit: false,
    };

    pub const ARM: Self = Self {
        machine: EM_ARM,
        class: Class::Elf32,
        endian: Endian::Little,
        reloc_format: RelocFormat::Rel,
        short_data_flag: 0,
        value_mode_bit: false,
    };

    pub const MIPS: Self = Self {
        machine: EM_MIPS,
        class: Class::Elf32,
        endian: Endian::Big,
        reloc_format: RelocFormat::Rel,
        short_data_flag: 0,
        value_mode_bit: false,
    };

    pub const SH64: Self = Self {
        machine: EM_SH,
        class: Class::Elf32,
        endian: Endian::Little,
        reloc_format: RelocFormat::Rela,
        short_data_flag: 0,
        value_mode_bit: true,
    };

    pub const IA64: Self = Self {
        machine: EM_IA_64,
        class: Class::Elf64,
        endian: Endian::Little,
        reloc_format: RelocFormat::Rela,
        short_data_flag: SHF_IA_64_SHORT,
        value_mode_bit: false,
    };

    pub const X86_64: Self = Self {
        machine: EM_X86_64,
        class: Class::Elf64,
        endian: Endian::Little,
        reloc_format: RelocFormat::Rela,
        short_data_flag: 0,
        value_mode_bit: false,
    };

    /// Expected `EI_CLASS` byte.
    #[must_use]
    pub const fn class_byte(&self) -> u8 {
        match self.class {
            Class::Elf32 => ELF_CLASS_32,
            Class::Elf64 => ELF_CLASS_64,
        }
    }

    /// Expected `EI_DATA` byte.
    #[must_use]
    pub const fn data_byte(&self) -> u8 {
        match self.endian {
            Endian::Little => ELF_DATA_LSB,
            Endian::Big => ELF_DATA_MSB,
        }
    }

    /// Size of the file header.
    #[must_use]
    pub const fn ehsize(&self) -> usize {
        match self.class {
            Class::Elf32 => 52,
            Class::Elf64 => 64,
        }
    }

    /// Fixed size of one section header entry.
    #[must_use]
    pub const fn shentsize(&self) -> usize {
        match self.class {
            Class::Elf32 => 40,
            Class::Elf64 => 64,
        }
    }

    /// Fixed size of one symbol table entry.
    #[must_use]
    pub const fn symentsize(&self) -> usize {
        match self.class {
            Class::Elf32 => 16,
            Class::Elf64 => 24,
        }
    }

    /// Fixed size of one relocation entry of this target's shape.
    #[must_use]
    pub const fn relentsize(&self) -> usize {
        match (self.class, self.reloc_format) {
            (Class::Elf32, RelocFormat::Rel) => 8,
            (Class::Elf32, RelocFormat::Rela) => 12,
            (Class::Elf64, RelocFormat::Rel) => 16,
            (Class::Elf64, RelocFormat::Rela) => 24,
        }
    }

    /// Symbol table index packed in a relocation `r_info` field.
    #[must_use]
    pub const fn rel_sym(&self, r_info: u64) -> u64 {
        match self.class {
            Class::Elf32 => r_info >> 8,
            Class::Elf64 => r_info >> 32,
        }
    }

    /// Relocation type code packed in a relocation `r_info` field.
    #[must_use]
    pub const fn rel_type(&self, r_info: u64) -> u32 {
        match self.class {
            Class::Elf32 => (r_info & 0xFF) as u32,
            Class::Elf64 => (r_info & 0xFFFF_FFFF) as u32,
        }
    }
}
