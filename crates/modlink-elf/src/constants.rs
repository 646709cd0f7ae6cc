//! ELF specification constants.

// Identification bytes
pub const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];
pub const ELF_CLASS_32: u8 = 1;
pub const ELF_CLASS_64: u8 = 2;
pub const ELF_DATA_LSB: u8 = 1;
pub const ELF_DATA_MSB: u8 = 2;
pub const EV_CURRENT: u8 = 1;

// Object file types
pub const ET_NONE: u16 = 0;
pub const ET_REL: u16 = 1;
pub const ET_EXEC: u16 = 2;

// Machine ids
pub const EM_386: u16 = 3;
pub const EM_MIPS: u16 = 8;
pub const EM_ARM: u16 = 40;
pub const EM_SH: u16 = 42;
pub const EM_IA_64: u16 = 50;
pub const EM_X86_64: u16 = 62;

// Section types
pub const SHT_NULL: u32 = 0;
pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_RELA: u32 = 4;
pub const SHT_NOTE: u32 = 7;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_REL: u32 = 9;
/// Start of the processor-specific section type range.
pub const SHT_LOPROC: u32 = 0x7000_0000;

// Section flags
pub const SHF_WRITE: u64 = 0x1;
pub const SHF_ALLOC: u64 = 0x2;
pub const SHF_EXECINSTR: u64 = 0x4;
/// Architecture "short/small data" flag on IA-64 (`SHF_IA_64_SHORT`).
pub const SHF_IA_64_SHORT: u64 = 0x1000_0000;

// Reserved section indices
pub const SHN_UNDEF: u32 = 0;
pub const SHN_LORESERVE: u32 = 0xFF00;
pub const SHN_ABS: u32 = 0xFFF1;
pub const SHN_COMMON: u32 = 0xFFF2;
pub const SHN_HIRESERVE: u32 = 0xFFFF;

// Symbol binding (upper 4 bits of st_info)
pub const STB_LOCAL: u8 = 0;
pub const STB_GLOBAL: u8 = 1;
pub const STB_WEAK: u8 = 2;

// Symbol type (lower 4 bits of st_info)
pub const STT_NOTYPE: u8 = 0;
pub const STT_OBJECT: u8 = 1;
pub const STT_FUNC: u8 = 2;
pub const STT_SECTION: u8 = 3;
pub const STT_FILE: u8 = 4;

/// Reserved null symbol index.
pub const STN_UNDEF: u64 = 0;

/// Extract the binding from a packed `st_info` byte.
#[inline]
#[must_use]
pub const fn st_bind(info: u8) -> u8 {
    info >> 4
}

/// Extract the type from a packed `st_info` byte.
#[inline]
#[must_use]
pub const fn st_type(info: u8) -> u8 {
    info & 0xF
}

/// Pack binding and type into an `st_info` byte.
#[inline]
#[must_use]
pub const fn st_info(bind: u8, typ: u8) -> u8 {
    (bind << 4) | (typ & 0xF)
}
