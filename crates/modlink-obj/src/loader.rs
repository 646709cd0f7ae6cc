//! The load driver: header validation, section-table ingestion, name
//! resolution, and pass orchestration.

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use modlink_elf::{
    ELF_MAGIC, EV_CURRENT, ET_EXEC, ET_REL, FileHeader, SHF_ALLOC, SHT_LOPROC, SHT_NOBITS,
    SHT_NOTE, SHT_NULL, SHT_PROGBITS, SHT_STRTAB, SHT_SYMTAB, SectionHeader, SymbolEntry,
    TargetSpec,
};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::hooks::{ProcSectionHandler, RejectProcSections};
use crate::load_order::{insert_load_order, load_priority};
use crate::object::{NameRef, ObjectFile, Section, name_bytes};
use crate::reloc::annotate_relocations;
use crate::symtab::SymbolTable;
use crate::{Diagnostic, LoadError, Result};

/// What the caller expects `e_type` to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Any,
    Relocatable,
    Executable,
}

impl ObjectKind {
    const fn matches(self, e_type: u16) -> bool {
        match self {
            Self::Any => true,
            Self::Relocatable => e_type == ET_REL,
            Self::Executable => e_type == ET_EXEC,
        }
    }
}

/// Load an ELF object from a seekable byte source.
///
/// Rejects processor-specific sections; use [`load_with_handler`] to accept
/// them.
///
/// # Errors
///
/// Any structural problem (short read, bad magic, architecture or type
/// mismatch, unsupported section or relocation format) aborts the load; no
/// partial [`ObjectFile`] is ever returned. Recoverable symbol/relocation
/// problems are collected on the returned object instead.
pub fn load<R: Read + Seek>(
    cursor: &mut R,
    target: &TargetSpec,
    expected: ObjectKind,
    label: &str,
) -> Result<ObjectFile> {
    load_with_handler(cursor, target, expected, label, &mut RejectProcSections)
}

/// Load an ELF object, delegating processor-specific sections to `handler`.
///
/// # Errors
///
/// See [`load`]; handler failures propagate verbatim.
pub fn load_with_handler<R: Read + Seek, H: ProcSectionHandler<R>>(
    cursor: &mut R,
    target: &TargetSpec,
    expected: ObjectKind,
    label: &str,
    handler: &mut H,
) -> Result<ObjectFile> {
    let header = read_header(cursor, target, expected, label)?;
    let mut sections = read_sections(cursor, target, &header, label, handler)?;
    resolve_names(&mut sections, header.shstrndx as usize, label)?;

    let mut diagnostics = Vec::new();
    let mut symtab = SymbolTable::new();
    let mut load_order_head = None;
    let mut priorities = vec![0u32; sections.len()];

    for idx in 0..sections.len() {
        let name = name_bytes(&sections, sections[idx].name);
        // Module metadata is never memory-resident, whatever its flags say.
        if name == b".modinfo" || name == b".modstring" {
            sections[idx].header.flags &= !SHF_ALLOC;
        }
        if sections[idx].header.flags & SHF_ALLOC != 0 {
            priorities[idx] = load_priority(target, &sections, idx);
            insert_load_order(&mut load_order_head, &mut sections, &priorities, idx);
        }
        if sections[idx].header.sh_type == SHT_SYMTAB {
            build_symbol_table(&sections, idx, target, &mut symtab, &mut diagnostics, label)?;
        }
    }

    annotate_relocations(&sections, &mut symtab, target, label, &mut diagnostics)?;

    let mut name_index = FxHashMap::default();
    for sec in &sections {
        let key: Box<[u8]> = name_bytes(&sections, sec.name).into();
        name_index.entry(key).or_insert(sec.idx);
    }

    debug!(file = label, sections = sections.len(), "object loaded");
    Ok(ObjectFile {
        target: *target,
        header,
        filename: label.to_owned(),
        sections,
        symtab,
        load_order_head,
        name_index,
        diagnostics,
    })
}

fn format_err(file: &str, reason: impl Into<String>) -> LoadError {
    LoadError::Format {
        file: file.to_owned(),
        reason: reason.into(),
    }
}

/// Exact-length read; a short read is a format error, not an I/O error.
fn read_exact_or_format<R: Read>(
    cursor: &mut R,
    buf: &mut [u8],
    file: &str,
    what: &str,
) -> Result<()> {
    cursor.read_exact(buf).map_err(|e| {
        if e.kind() == ErrorKind::UnexpectedEof {
            format_err(file, format!("short read in {what}"))
        } else {
            LoadError::Io {
                file: file.to_owned(),
                source: e,
            }
        }
    })
}

fn seek_to<R: Seek>(cursor: &mut R, offset: u64, file: &str) -> Result<()> {
    cursor
        .seek(SeekFrom::Start(offset))
        .map(|_| ())
        .map_err(|source| LoadError::Io {
            file: file.to_owned(),
            source,
        })
}

fn read_header<R: Read + Seek>(
    cursor: &mut R,
    target: &TargetSpec,
    expected: ObjectKind,
    file: &str,
) -> Result<FileHeader> {
    seek_to(cursor, 0, file)?;
    let mut buf = vec![0u8; target.ehsize()];
    read_exact_or_format(cursor, &mut buf, file, "ELF header")?;
    let header = FileHeader::parse(&buf, target).map_err(|source| LoadError::Elf {
        file: file.to_owned(),
        source,
    })?;

    if header.ident[..4] != ELF_MAGIC {
        return Err(format_err(file, "not an ELF file"));
    }
    if header.ident[4] != target.class_byte()
        || header.ident[5] != target.data_byte()
        || header.ident[6] != EV_CURRENT
        || header.machine != target.machine
    {
        return Err(LoadError::ArchitectureMismatch {
            file: file.to_owned(),
        });
    }
    if !expected.matches(header.e_type) {
        return Err(LoadError::TypeMismatch {
            file: file.to_owned(),
            expected,
            found: header.e_type,
        });
    }
    debug!(file, e_type = header.e_type, "ELF header accepted");
    Ok(header)
}

fn read_sections<R: Read + Seek, H: ProcSectionHandler<R>>(
    cursor: &mut R,
    target: &TargetSpec,
    header: &FileHeader,
    file: &str,
    handler: &mut H,
) -> Result<Vec<Section>> {
    let shentsize = target.shentsize();
    if header.shentsize as usize != shentsize {
        return Err(format_err(
            file,
            format!(
                "section header size mismatch: {} != {}",
                header.shentsize, shentsize
            ),
        ));
    }

    let shnum = header.shnum as usize;
    seek_to(cursor, header.shoff, file)?;
    let mut table = vec![0u8; shnum * shentsize];
    read_exact_or_format(cursor, &mut table, file, "section header table")?;

    let mut sections = Vec::with_capacity(shnum);
    for idx in 0..shnum {
        let raw = &table[idx * shentsize..(idx + 1) * shentsize];
        let sh = SectionHeader::parse(raw, target).map_err(|source| LoadError::Elf {
            file: file.to_owned(),
            source,
        })?;
        let mut sec = Section {
            idx,
            header: sh,
            name: NameRef::EMPTY,
            contents: None,
            load_next: None,
        };

        let sh_type = sec.header.sh_type;
        if sh_type == SHT_NULL || sh_type == SHT_NOTE || sh_type == SHT_NOBITS {
            // No stored contents.
        } else if sh_type == SHT_PROGBITS
            || sh_type == SHT_SYMTAB
            || sh_type == SHT_STRTAB
            || sh_type == target.reloc_format.section_type()
        {
            if sec.header.size > 0 {
                let size = usize::try_from(sec.header.size)
                    .map_err(|_| format_err(file, format!("section {idx} too large")))?;
                let mut contents = vec![0u8; size];
                seek_to(cursor, sec.header.offset, file)?;
                read_exact_or_format(cursor, &mut contents, file, "section contents")?;
                debug!(file, section = idx, size, "section contents read");
                sec.contents = Some(contents);
            }
        } else if sh_type == target.reloc_format.other_section_type() {
            // Tolerated only when empty.
            if sec.header.size != 0 {
                return Err(LoadError::UnsupportedRelocationFormat {
                    file: file.to_owned(),
                    format: target.reloc_format.other(),
                });
            }
        } else if sh_type >= SHT_LOPROC {
            handler.load_section(file, &mut sec, cursor)?;
        } else {
            return Err(LoadError::UnsupportedSectionType {
                file: file.to_owned(),
                index: idx,
                sh_type,
            });
        }
        sections.push(sec);
    }
    Ok(sections)
}

/// Bind every section's name to the designated string table.
fn resolve_names(sections: &mut [Section], shstrndx: usize, file: &str) -> Result<()> {
    if shstrndx >= sections.len() {
        return Err(format_err(
            file,
            format!("bad section name string table index {shstrndx}"),
        ));
    }
    let mut names = Vec::with_capacity(sections.len());
    for sec in sections.iter() {
        names.push(string_ref(
            sections,
            shstrndx,
            sec.header.name_offset,
            file,
        )?);
    }
    for (sec, name) in sections.iter_mut().zip(names) {
        sec.name = name;
    }
    Ok(())
}

/// Validated reference to a NUL-terminated string inside a string-table
/// section. An offset at or past the end of the table is a format error.
pub(crate) fn string_ref(
    sections: &[Section],
    strtab: usize,
    offset: u32,
    file: &str,
) -> Result<NameRef> {
    let data = sections[strtab].bytes();
    let off = offset as usize;
    if off >= data.len() {
        return Err(format_err(
            file,
            format!("string offset {offset:#x} outside string table (section {strtab})"),
        ));
    }
    let len = data[off..]
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(data.len() - off);
    Ok(NameRef {
        section: u32::try_from(strtab).unwrap_or(u32::MAX),
        offset,
        len: u32::try_from(len).unwrap_or(0),
    })
}

/// Name for a symbol entry: string-table lookup, or the owning section's
/// name for anonymous (section-start) symbols.
pub(crate) fn symbol_name(
    sections: &[Section],
    strtab: usize,
    entry: &SymbolEntry,
    file: &str,
) -> Result<NameRef> {
    if entry.name_offset != 0 {
        string_ref(sections, strtab, entry.name_offset, file)
    } else {
        let shndx = entry.shndx as usize;
        if shndx >= sections.len() {
            return Err(format_err(
                file,
                format!("anonymous symbol names nonexistent section {shndx}"),
            ));
        }
        Ok(sections[shndx].name)
    }
}

fn build_symbol_table(
    sections: &[Section],
    idx: usize,
    target: &TargetSpec,
    symtab: &mut SymbolTable,
    diagnostics: &mut Vec<Diagnostic>,
    file: &str,
) -> Result<()> {
    let sec = &sections[idx];
    let symentsize = target.symentsize();
    if sec.header.entsize != symentsize as u64 {
        return Err(format_err(
            file,
            format!(
                "symbol size mismatch: {} != {}",
                sec.header.entsize, symentsize
            ),
        ));
    }
    let strtab = sec.header.link as usize;
    if strtab >= sections.len() {
        return Err(format_err(
            file,
            format!("bad symbol string table index {strtab}"),
        ));
    }

    let data = sec.bytes();
    let nsym = data.len() / symentsize;
    let local_count = sec.header.info as usize;
    symtab.reset_locals(local_count);
    debug!(file, section = idx, nsym, local_count, "symbol table");

    // Entry 0 is the reserved null symbol.
    for j in 1..nsym {
        let raw = &data[j * symentsize..(j + 1) * symentsize];
        let entry = SymbolEntry::parse(raw, target).map_err(|source| LoadError::Elf {
            file: file.to_owned(),
            source,
        })?;
        let name = symbol_name(sections, strtab, &entry, file)?;

        let mut value = entry.value;
        // ISA mode switching carried in st_other, folded into the value's
        // low bit (SH-5 SHmedia vs SHcompact).
        if target.value_mode_bit && entry.other & 0x4 != 0 {
            value |= 1;
        }

        symtab.resolve_or_insert(
            sections,
            name,
            Some(j as u64),
            entry.info,
            u32::from(entry.shndx),
            value,
            entry.size,
            diagnostics,
        );
    }
    Ok(())
}
