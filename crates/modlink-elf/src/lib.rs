//! ELF wire format for the module object loader.
//!
//! Raw, policy-free decoding of the ELF records the loader consumes: the
//! file header, section headers, symbol entries, and relocation entries,
//! for both ELF classes and both byte orders. Which class/order/relocation
//! shape applies is described by a [`TargetSpec`] chosen by the caller.

mod constants;
mod entry;
mod hash;
mod header;
mod target;

pub use constants::*;
pub use entry::*;
pub use hash::elf_hash;
pub use header::*;
pub use target::*;

use thiserror::Error;

/// Raw record decoding errors.
#[derive(Error, Debug)]
pub enum ElfError {
    #[error("truncated {record}: need {need} bytes, have {have}")]
    Truncated {
        record: &'static str,
        need: usize,
        have: usize,
    },
}

pub type Result<T> = std::result::Result<T, ElfError>;
