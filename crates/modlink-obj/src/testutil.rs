//! Test-only builder for in-memory ELF images.
//!
//! Emits byte-exact images for any [`TargetSpec`]: a null section, the
//! caller's sections, and an auto-generated `.shstrtab`, with the section
//! header table at the end. Overrides exist for deliberately corrupt
//! headers.

use modlink_elf::{
    ELF_MAGIC, ET_REL, EV_CURRENT, Class, Endian, RelocFormat, SHT_NULL, SHT_STRTAB, SHT_SYMTAB,
    TargetSpec,
};

fn put16(buf: &mut Vec<u8>, en: Endian, v: u16) {
    buf.extend_from_slice(&match en {
        Endian::Little => v.to_le_bytes(),
        Endian::Big => v.to_be_bytes(),
    });
}

fn put32(buf: &mut Vec<u8>, en: Endian, v: u32) {
    buf.extend_from_slice(&match en {
        Endian::Little => v.to_le_bytes(),
        Endian::Big => v.to_be_bytes(),
    });
}

fn put64(buf: &mut Vec<u8>, en: Endian, v: u64) {
    buf.extend_from_slice(&match en {
        Endian::Little => v.to_le_bytes(),
        Endian::Big => v.to_be_bytes(),
    });
}

/// Build a string-table blob (leading NUL) and the offset of each name.
pub fn strtab(names: &[&str]) -> (Vec<u8>, Vec<u32>) {
    let mut pool = vec![0u8];
    let mut offsets = Vec::with_capacity(names.len());
    for name in names {
        offsets.push(u32::try_from(pool.len()).unwrap());
        pool.extend_from_slice(name.as_bytes());
        pool.push(0);
    }
    (pool, offsets)
}

/// Encode one symbol table entry for the target.
pub fn sym_entry(
    target: &TargetSpec,
    name_off: u32,
    value: u64,
    size: u64,
    info: u8,
    other: u8,
    shndx: u16,
) -> Vec<u8> {
    let mut b = Vec::new();
    let en = target.endian;
    match target.class {
        Class::Elf32 => {
            put32(&mut b, en, name_off);
            put32(&mut b, en, value as u32);
            put32(&mut b, en, size as u32);
            b.push(info);
            b.push(other);
            put16(&mut b, en, shndx);
        }
        Class::Elf64 => {
            put32(&mut b, en, name_off);
            b.push(info);
            b.push(other);
            put16(&mut b, en, shndx);
            put64(&mut b, en, value);
            put64(&mut b, en, size);
        }
    }
    b
}

/// Encode one relocation entry of the target's shape (zero addend for RELA).
pub fn rel_entry(target: &TargetSpec, offset: u64, sym: u64, rtype: u32) -> Vec<u8> {
    let mut b = Vec::new();
    let en = target.endian;
    let rela = target.reloc_format == RelocFormat::Rela;
    match target.class {
        Class::Elf32 => {
            put32(&mut b, en, offset as u32);
            put32(&mut b, en, ((sym as u32) << 8) | (rtype & 0xFF));
            if rela {
                put32(&mut b, en, 0);
            }
        }
        Class::Elf64 => {
            put64(&mut b, en, offset);
            put64(&mut b, en, (sym << 32) | u64::from(rtype));
            if rela {
                put64(&mut b, en, 0);
            }
        }
    }
    b
}

struct SectionSpec {
    name: String,
    sh_type: u32,
    flags: u64,
    contents: Vec<u8>,
    link: u32,
    info: u32,
    entsize: u64,
}

pub struct ImageBuilder {
    target: TargetSpec,
    e_type: u16,
    machine: u16,
    class_byte: u8,
    shentsize: u16,
    sections: Vec<SectionSpec>,
}

impl ImageBuilder {
    pub fn new(target: TargetSpec) -> Self {
        Self {
            e_type: ET_REL,
            machine: target.machine,
            class_byte: target.class_byte(),
            shentsize: u16::try_from(target.shentsize()).unwrap(),
            target,
            sections: Vec::new(),
        }
    }

    pub fn e_type(mut self, e_type: u16) -> Self {
        self.e_type = e_type;
        self
    }

    pub fn machine(mut self, machine: u16) -> Self {
        self.machine = machine;
        self
    }

    pub fn class_byte(mut self, class_byte: u8) -> Self {
        self.class_byte = class_byte;
        self
    }

    pub fn shentsize(mut self, shentsize: u16) -> Self {
        self.shentsize = shentsize;
        self
    }

    pub fn section(mut self, name: &str, sh_type: u32, flags: u64, contents: Vec<u8>) -> Self {
        self.sections.push(SectionSpec {
            name: name.to_owned(),
            sh_type,
            flags,
            contents,
            link: 0,
            info: 0,
            entsize: 0,
        });
        self
    }

    pub fn symtab_section(self, name: &str, contents: Vec<u8>, link: u32, info: u32) -> Self {
        let entsize = self.target.symentsize() as u64;
        self.symtab_section_entsize(name, contents, link, info, entsize)
    }

    pub fn symtab_section_entsize(
        mut self,
        name: &str,
        contents: Vec<u8>,
        link: u32,
        info: u32,
        entsize: u64,
    ) -> Self {
        self.sections.push(SectionSpec {
            name: name.to_owned(),
            sh_type: SHT_SYMTAB,
            flags: 0,
            contents,
            link,
            info,
            entsize,
        });
        self
    }

    pub fn rel_section(mut self, name: &str, contents: Vec<u8>, link: u32, info: u32) -> Self {
        self.sections.push(SectionSpec {
            name: name.to_owned(),
            sh_type: self.target.reloc_format.section_type(),
            flags: 0,
            contents,
            link,
            info,
            entsize: self.target.relentsize() as u64,
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let t = &self.target;
        let en = t.endian;

        // Section-name string table, leading NUL first.
        let mut shstrtab = vec![0u8];
        let mut name_offs = Vec::with_capacity(self.sections.len() + 1);
        for spec in &self.sections {
            name_offs.push(u32::try_from(shstrtab.len()).unwrap());
            shstrtab.extend_from_slice(spec.name.as_bytes());
            shstrtab.push(0);
        }
        let shstrtab_name_off = u32::try_from(shstrtab.len()).unwrap();
        shstrtab.extend_from_slice(b".shstrtab");
        shstrtab.push(0);

        // Contents after the header, section header table last.
        let mut image = vec![0u8; t.ehsize()];
        struct Placed {
            name_off: u32,
            sh_type: u32,
            flags: u64,
            offset: u64,
            size: u64,
            link: u32,
            info: u32,
            entsize: u64,
        }
        let mut placed = vec![Placed {
            name_off: 0,
            sh_type: SHT_NULL,
            flags: 0,
            offset: 0,
            size: 0,
            link: 0,
            info: 0,
            entsize: 0,
        }];
        for (spec, &name_off) in self.sections.iter().zip(&name_offs) {
            let offset = image.len() as u64;
            image.extend_from_slice(&spec.contents);
            placed.push(Placed {
                name_off,
                sh_type: spec.sh_type,
                flags: spec.flags,
                offset,
                size: spec.contents.len() as u64,
                link: spec.link,
                info: spec.info,
                entsize: spec.entsize,
            });
        }
        let shstrtab_offset = image.len() as u64;
        let shstrtab_size = shstrtab.len() as u64;
        image.extend_from_slice(&shstrtab);
        placed.push(Placed {
            name_off: shstrtab_name_off,
            sh_type: SHT_STRTAB,
            flags: 0,
            offset: shstrtab_offset,
            size: shstrtab_size,
            link: 0,
            info: 0,
            entsize: 0,
        });

        let shoff = image.len() as u64;
        for p in &placed {
            match t.class {
                Class::Elf32 => {
                    put32(&mut image, en, p.name_off);
                    put32(&mut image, en, p.sh_type);
                    put32(&mut image, en, p.flags as u32);
                    put32(&mut image, en, 0); // sh_addr
                    put32(&mut image, en, p.offset as u32);
                    put32(&mut image, en, p.size as u32);
                    put32(&mut image, en, p.link);
                    put32(&mut image, en, p.info);
                    put32(&mut image, en, 0); // sh_addralign
                    put32(&mut image, en, p.entsize as u32);
                }
                Class::Elf64 => {
                    put32(&mut image, en, p.name_off);
                    put32(&mut image, en, p.sh_type);
                    put64(&mut image, en, p.flags);
                    put64(&mut image, en, 0);
                    put64(&mut image, en, p.offset);
                    put64(&mut image, en, p.size);
                    put32(&mut image, en, p.link);
                    put32(&mut image, en, p.info);
                    put64(&mut image, en, 0);
                    put64(&mut image, en, p.entsize);
                }
            }
        }

        // File header, written last so shoff is known.
        let mut header = Vec::with_capacity(t.ehsize());
        header.extend_from_slice(&ELF_MAGIC);
        header.push(self.class_byte);
        header.push(t.data_byte());
        header.push(EV_CURRENT);
        header.resize(16, 0);
        put16(&mut header, en, self.e_type);
        put16(&mut header, en, self.machine);
        put32(&mut header, en, 1); // e_version
        let shnum = u16::try_from(placed.len()).unwrap();
        let shstrndx = shnum - 1;
        match t.class {
            Class::Elf32 => {
                put32(&mut header, en, 0); // e_entry
                put32(&mut header, en, 0); // e_phoff
                put32(&mut header, en, shoff as u32);
                put32(&mut header, en, 0); // e_flags
                put16(&mut header, en, u16::try_from(t.ehsize()).unwrap());
                put16(&mut header, en, 0); // e_phentsize
                put16(&mut header, en, 0); // e_phnum
                put16(&mut header, en, self.shentsize);
                put16(&mut header, en, shnum);
                put16(&mut header, en, shstrndx);
            }
            Class::Elf64 => {
                put64(&mut header, en, 0);
                put64(&mut header, en, 0);
                put64(&mut header, en, shoff);
                put32(&mut header, en, 0);
                put16(&mut header, en, u16::try_from(t.ehsize()).unwrap());
                put16(&mut header, en, 0);
                put16(&mut header, en, 0);
                put16(&mut header, en, self.shentsize);
                put16(&mut header, en, shnum);
                put16(&mut header, en, shstrndx);
            }
        }
        image[..t.ehsize()].copy_from_slice(&header);
        image
    }
}
