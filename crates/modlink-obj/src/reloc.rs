//! Relocation annotation: stamp each referenced symbol with its relocation
//! type code.

use modlink_elf::{RelocEntry, STB_LOCAL, STN_UNDEF, SymbolEntry, TargetSpec, st_bind};
use tracing::warn;

use crate::loader::symbol_name;
use crate::object::{Section, name_bytes};
use crate::symtab::SymbolTable;
use crate::{Diagnostic, LoadError, Result};

/// Second pass over all relocation sections; requires the symbol table to be
/// fully populated. Later entries referencing the same symbol overwrite the
/// stamp.
pub(crate) fn annotate_relocations(
    sections: &[Section],
    symtab: &mut SymbolTable,
    target: &TargetSpec,
    file: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<()> {
    for sec in sections {
        if sec.header.sh_type == target.reloc_format.section_type() {
            annotate_section(sections, sec, symtab, target, file, diagnostics)?;
        }
    }
    Ok(())
}

fn annotate_section(
    sections: &[Section],
    sec: &Section,
    symtab: &mut SymbolTable,
    target: &TargetSpec,
    file: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<()> {
    let relentsize = target.relentsize();
    if sec.header.entsize != relentsize as u64 {
        return Err(LoadError::Format {
            file: file.to_owned(),
            reason: format!(
                "relocation entry size mismatch: {} != {}",
                sec.header.entsize, relentsize
            ),
        });
    }

    let symtab_idx = sec.header.link as usize;
    if symtab_idx >= sections.len() {
        return Err(LoadError::Format {
            file: file.to_owned(),
            reason: format!("bad relocation symbol table link {symtab_idx}"),
        });
    }
    let symsec = &sections[symtab_idx];
    let symdata = symsec.bytes();
    let symentsize = target.symentsize();
    let nsyms = (symdata.len() / symentsize) as u64;
    let strtab = symsec.header.link as usize;
    if strtab >= sections.len() {
        return Err(LoadError::Format {
            file: file.to_owned(),
            reason: format!("bad symbol string table link {strtab}"),
        });
    }

    let data = sec.bytes();
    for raw in data.chunks_exact(relentsize) {
        let rel = RelocEntry::parse(raw, target).map_err(|source| LoadError::Elf {
            file: file.to_owned(),
            source,
        })?;
        let symndx = target.rel_sym(rel.info);
        if symndx == STN_UNDEF {
            continue;
        }
        if symndx >= nsyms {
            warn!(file, section = sec.idx, symndx, nsyms, "bad symbol index");
            diagnostics.push(Diagnostic::BadSymbolIndex {
                section: sec.idx,
                index: symndx,
                count: nsyms,
            });
            continue;
        }

        let off = symndx as usize * symentsize;
        let entry = SymbolEntry::parse(&symdata[off..off + symentsize], target).map_err(
            |source| LoadError::Elf {
                file: file.to_owned(),
                source,
            },
        )?;

        // Locals resolve through the local-symbol array; everything else by
        // name through the hash table.
        let id = if st_bind(entry.info) == STB_LOCAL {
            symtab.local(symndx as usize)
        } else {
            let name = symbol_name(sections, strtab, &entry, file)?;
            symtab.find(sections, name_bytes(sections, name))
        };
        if let Some(id) = id {
            symtab.get_mut(id).reloc_type = target.rel_type(rel.info);
        }
    }
    Ok(())
}
