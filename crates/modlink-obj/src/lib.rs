//! In-memory loader and linker front-end for relocatable ELF objects.
//!
//! [`load`] parses an ELF image from a seekable byte source, validates it
//! against a [`modlink_elf::TargetSpec`], materializes its sections, builds
//! a hashed global symbol table with ELF binding/merge rules, ranks
//! allocatable sections into a load order, and stamps relocation types onto
//! resolved symbols. Relocation application and section placement are the
//! caller's business; the returned [`ObjectFile`] carries everything needed
//! for them.

mod hooks;
mod load_order;
mod loader;
mod object;
mod reloc;
mod symtab;
#[cfg(test)]
mod testutil;

pub use hooks::{ProcSectionHandler, RejectProcSections};
pub use loader::{ObjectKind, load, load_with_handler};
pub use object::{LoadOrder, NameRef, ObjectFile, Section};
pub use symtab::{HASH_BUCKETS, SymId, Symbol, SymbolTable};

use modlink_elf::RelocFormat;
use thiserror::Error;

/// Fatal load errors. A failed load never yields a partial [`ObjectFile`].
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{file}: {source}")]
    Elf {
        file: String,
        #[source]
        source: modlink_elf::ElfError,
    },
    #[error("{file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{file}: {reason}")]
    Format { file: String, reason: String },
    #[error("{file}: ELF image not for this architecture")]
    ArchitectureMismatch { file: String },
    #[error("{file}: wrong object type: expected {expected:?}, found {found:#x}")]
    TypeMismatch {
        file: String,
        expected: ObjectKind,
        found: u16,
    },
    #[error("{file}: cannot handle section {index} of type {sh_type:#x}")]
    UnsupportedSectionType {
        file: String,
        index: usize,
        sh_type: u32,
    },
    #[error("{file}: {format:?} relocations not supported on this architecture")]
    UnsupportedRelocationFormat { file: String, format: RelocFormat },
}

pub type Result<T> = std::result::Result<T, LoadError>;

/// Recoverable conditions reported during symbol and relocation resolution.
///
/// The offending entry is discarded or skipped and loading continues; the
/// full list is available via [`ObjectFile::diagnostics`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    #[error("{name} multiply defined")]
    MultipleDefinition { name: String },
    #[error("bad symbol index in section {section}: {index:#x} >= {count:#x}")]
    BadSymbolIndex {
        section: usize,
        index: u64,
        count: u64,
    },
    #[error("local symbol {name} with index {index} exceeds local symbol table size {size}")]
    LocalIndexOutOfRange { name: String, index: u64, size: u64 },
}
