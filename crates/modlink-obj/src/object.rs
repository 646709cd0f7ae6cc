//! The loaded object: section arena, name references, load-order chain.

use modlink_elf::{FileHeader, SHF_ALLOC, SHF_EXECINSTR, SHF_WRITE, SectionHeader, TargetSpec};
use rustc_hash::FxHashMap;

use crate::symtab::{Symbol, SymbolTable};
use crate::Diagnostic;

/// A borrowed name: `(owning section, byte offset, length)` into that
/// section's contents. Resolved on demand, never copied.
///
/// Only constructed after the offset has been validated against the owning
/// string table, so resolution cannot go out of bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameRef {
    pub section: u32,
    pub offset: u32,
    pub len: u32,
}

impl NameRef {
    pub const EMPTY: Self = Self {
        section: 0,
        offset: 0,
        len: 0,
    };
}

/// Resolve a [`NameRef`] against the section arena.
pub(crate) fn name_bytes(sections: &[Section], name: NameRef) -> &[u8] {
    if name.len == 0 {
        return b"";
    }
    let data = sections[name.section as usize].bytes();
    &data[name.offset as usize..(name.offset + name.len) as usize]
}

/// One section of the object file.
#[derive(Debug)]
pub struct Section {
    /// Position in the section table; equals the index into `sections`.
    pub idx: usize,
    pub header: SectionHeader,
    /// Name, bound by the name-resolution pass.
    pub name: NameRef,
    /// Stored contents; `None` for NULL/NOTE/NOBITS and zero-size sections.
    pub contents: Option<Vec<u8>>,
    /// Next section in the load-order chain, if this section is in it.
    pub(crate) load_next: Option<usize>,
}

impl Section {
    /// Section contents, empty for sections without stored data.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.contents.as_deref().unwrap_or(&[])
    }

    #[must_use]
    pub fn is_alloc(&self) -> bool {
        self.header.flags & SHF_ALLOC != 0
    }

    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.header.flags & SHF_WRITE != 0
    }

    #[must_use]
    pub fn is_executable(&self) -> bool {
        self.header.flags & SHF_EXECINSTR != 0
    }
}

/// A fully loaded object file.
///
/// Owns every section buffer; all [`NameRef`]s held by sections and symbols
/// point into those buffers and live exactly as long as this value.
#[derive(Debug)]
pub struct ObjectFile {
    pub(crate) target: TargetSpec,
    pub(crate) header: FileHeader,
    pub(crate) filename: String,
    pub(crate) sections: Vec<Section>,
    pub(crate) symtab: SymbolTable,
    pub(crate) load_order_head: Option<usize>,
    pub(crate) name_index: FxHashMap<Box<[u8]>, usize>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl ObjectFile {
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub const fn header(&self) -> &FileHeader {
        &self.header
    }

    #[must_use]
    pub const fn target(&self) -> &TargetSpec {
        &self.target
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Look up a section by exact name; first match wins.
    #[must_use]
    pub fn find_section(&self, name: &str) -> Option<&Section> {
        self.name_index
            .get(name.as_bytes())
            .map(|&idx| &self.sections[idx])
    }

    /// Resolve a name reference to its raw bytes.
    #[must_use]
    pub fn name_bytes(&self, name: NameRef) -> &[u8] {
        name_bytes(&self.sections, name)
    }

    /// Resolve a name reference to a string; empty if not valid UTF-8.
    #[must_use]
    pub fn name_str(&self, name: NameRef) -> &str {
        std::str::from_utf8(self.name_bytes(name)).unwrap_or("")
    }

    /// Look up a globally visible symbol by name.
    #[must_use]
    pub fn find_symbol(&self, name: &str) -> Option<&Symbol> {
        self.symtab
            .find(&self.sections, name.as_bytes())
            .map(|id| self.symtab.get(id))
    }

    /// The symbol recorded at an original symbol-table index, if local.
    #[must_use]
    pub fn local_symbol(&self, index: usize) -> Option<&Symbol> {
        self.symtab.local(index).map(|id| self.symtab.get(id))
    }

    #[must_use]
    pub const fn symbol_table(&self) -> &SymbolTable {
        &self.symtab
    }

    /// Allocatable sections in descending load priority.
    #[must_use]
    pub fn load_order(&self) -> LoadOrder<'_> {
        LoadOrder {
            sections: &self.sections,
            cur: self.load_order_head,
        }
    }

    /// Recoverable conditions recorded while loading.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Iterator over the load-order chain.
pub struct LoadOrder<'a> {
    sections: &'a [Section],
    cur: Option<usize>,
}

impl<'a> Iterator for LoadOrder<'a> {
    type Item = &'a Section;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cur?;
        let sec = &self.sections[idx];
        self.cur = sec.load_next;
        Some(sec)
    }
}
