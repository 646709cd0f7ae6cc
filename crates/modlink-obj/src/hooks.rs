//! Processor-specific section handling, injected by the caller.

use crate::object::Section;
use crate::{LoadError, Result};

/// Capability for section types at or above `SHT_LOPROC`.
///
/// The loader hands over the section (header already decoded, contents not
/// read) and the cursor; the handler decides what, if anything, to read.
/// A handler error aborts the load.
pub trait ProcSectionHandler<R: ?Sized> {
    fn load_section(&mut self, file: &str, section: &mut Section, cursor: &mut R) -> Result<()>;
}

/// Default handler: no processor-specific sections are supported.
pub struct RejectProcSections;

impl<R: ?Sized> ProcSectionHandler<R> for RejectProcSections {
    fn load_section(&mut self, file: &str, section: &mut Section, _cursor: &mut R) -> Result<()> {
        Err(LoadError::UnsupportedSectionType {
            file: file.to_owned(),
            index: section.idx,
            sh_type: section.header.sh_type,
        })
    }
}
