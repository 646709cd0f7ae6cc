//! Global symbol table: fixed-bucket hash chains, the dense local-symbol
//! array, and the binding/redefinition resolution rules.

use modlink_elf::{
    SHN_COMMON, SHN_HIRESERVE, SHN_UNDEF, STB_GLOBAL, STB_LOCAL, STB_WEAK, STT_NOTYPE, STT_OBJECT,
    elf_hash, st_bind, st_type,
};
use tracing::warn;

use crate::Diagnostic;
use crate::object::{NameRef, Section, name_bytes};

/// Fixed hash bucket count.
pub const HASH_BUCKETS: usize = 521;

/// Stable handle into the symbol arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymId(u32);

/// One resolved name binding.
#[derive(Debug)]
pub struct Symbol {
    pub name: NameRef,
    pub value: u64,
    pub size: u64,
    /// Section index, including the reserved sentinels (`SHN_UNDEF`,
    /// `SHN_COMMON`, `SHN_ABS`). Wider than `u16` so callers can inject
    /// pseudo-indices above the reserved range.
    pub section: u32,
    /// Packed binding and type byte.
    pub info: u8,
    /// Relocation type stamped by the annotation pass; 0 means none.
    pub reloc_type: u32,
    /// Slot this symbol occupies in the local-symbol array, if any.
    pub local_index: Option<u64>,
    pub(crate) next: Option<SymId>,
}

impl Symbol {
    #[must_use]
    pub const fn binding(&self) -> u8 {
        st_bind(self.info)
    }

    #[must_use]
    pub const fn sym_type(&self) -> u8 {
        st_type(self.info)
    }
}

/// Symbol arena plus hash buckets and the local-symbol array.
///
/// Chains are index links into the arena; excising a node from a chain
/// leaves it alive in the arena, which is exactly what the local/global
/// coexistence rule needs.
#[derive(Debug)]
pub struct SymbolTable {
    arena: Vec<Symbol>,
    buckets: Vec<Option<SymId>>,
    locals: Vec<Option<SymId>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            buckets: vec![None; HASH_BUCKETS],
            locals: Vec::new(),
        }
    }

    /// Size the local-symbol array for a symbol table section's declared
    /// local count, discarding any previous one.
    pub fn reset_locals(&mut self, count: usize) {
        self.locals = vec![None; count];
    }

    #[must_use]
    pub fn get(&self, id: SymId) -> &Symbol {
        &self.arena[id.0 as usize]
    }

    pub(crate) fn get_mut(&mut self, id: SymId) -> &mut Symbol {
        &mut self.arena[id.0 as usize]
    }

    /// Handle recorded at a local symbol-table index.
    #[must_use]
    pub fn local(&self, index: usize) -> Option<SymId> {
        self.locals.get(index).copied().flatten()
    }

    #[must_use]
    pub fn local_count(&self) -> usize {
        self.locals.len()
    }

    /// Look up a globally visible symbol by exact name.
    #[must_use]
    pub fn find(&self, sections: &[Section], name: &[u8]) -> Option<SymId> {
        let bucket = elf_hash(name) as usize % HASH_BUCKETS;
        let mut cur = self.buckets[bucket];
        while let Some(id) = cur {
            let sym = self.get(id);
            if name_bytes(sections, sym.name) == name {
                return Some(id);
            }
            cur = sym.next;
        }
        None
    }

    /// Resolve a definition or reference against the table.
    ///
    /// Applies the ELF binding/redefinition rules: references resolve to
    /// prior definitions, definitions replace forward declarations, globals
    /// supersede same-named locals (which stay reachable through the local
    /// array), weak never overrides, common yields to typed definitions,
    /// and a genuine multiple definition keeps the first and reports a
    /// [`Diagnostic::MultipleDefinition`].
    #[allow(clippy::too_many_arguments)]
    pub fn resolve_or_insert(
        &mut self,
        sections: &[Section],
        name: NameRef,
        local_index: Option<u64>,
        info: u8,
        section_index: u32,
        value: u64,
        size: u64,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> SymId {
        let name_b = name_bytes(sections, name);
        let bucket = elf_hash(name_b) as usize % HASH_BUCKETS;
        let n_type = st_type(info);
        let n_bind = st_bind(info);

        // Walk the chain, remembering the predecessor for excision.
        let mut prev: Option<SymId> = None;
        let mut found: Option<SymId> = None;
        let mut cur = self.buckets[bucket];
        while let Some(id) = cur {
            let sym = self.get(id);
            if name_bytes(sections, sym.name) == name_b {
                found = Some(id);
                break;
            }
            prev = Some(id);
            cur = sym.next;
        }

        let target = if let Some(existing) = found {
            let o_section = self.get(existing).section;
            let o_info = self.get(existing).info;
            let o_type = st_type(o_info);
            let o_bind = st_bind(o_info);

            if section_index == SHN_UNDEF {
                // A reference; resolves to whatever is already there.
                return existing;
            } else if o_section == SHN_UNDEF {
                // Definition arrives for a forward declaration.
                existing
            } else if n_bind == STB_GLOBAL && o_bind == STB_LOCAL {
                // Same-named local and global, as `ld -r` produces. The
                // global takes over the chain position; the local node
                // stays alive for the local-symbol array.
                let fresh = self.alloc(self.get(existing).next);
                match prev {
                    None => self.buckets[bucket] = Some(fresh),
                    Some(p) => self.get_mut(p).next = Some(fresh),
                }
                fresh
            } else if n_bind == STB_LOCAL {
                // Another local under an already-taken name: keep it out of
                // the chains entirely, visible only through its index.
                let fresh = self.alloc(None);
                if let Some(index) = local_index {
                    self.store_local(index, fresh, name_b, diagnostics);
                }
                fresh
            } else if n_bind == STB_WEAK {
                return existing;
            } else if o_bind == STB_WEAK {
                existing
            } else if section_index == SHN_COMMON
                && (o_type == STT_NOTYPE || o_type == STT_OBJECT)
            {
                // A common declaration yields to the existing definition.
                return existing;
            } else if o_section == SHN_COMMON && (n_type == STT_NOTYPE || n_type == STT_OBJECT) {
                existing
            } else {
                // Multiple definition. Only report it for indices in the
                // normal range; pseudo-indices above the reserved range
                // come from outside this object and are expected.
                if section_index <= SHN_HIRESERVE {
                    let name = String::from_utf8_lossy(name_b).into_owned();
                    warn!(symbol = %name, "multiply defined");
                    diagnostics.push(Diagnostic::MultipleDefinition { name });
                }
                return existing;
            }
        } else {
            // Completely new symbol.
            let fresh = self.alloc(self.buckets[bucket]);
            self.buckets[bucket] = Some(fresh);
            if n_bind == STB_LOCAL {
                if let Some(index) = local_index {
                    self.store_local(index, fresh, name_b, diagnostics);
                }
            }
            fresh
        };

        let sym = self.get_mut(target);
        sym.name = name;
        sym.value = value;
        sym.size = size;
        sym.section = section_index;
        sym.info = info;
        sym.reloc_type = 0;
        target
    }

    fn alloc(&mut self, next: Option<SymId>) -> SymId {
        let id = SymId(u32::try_from(self.arena.len()).unwrap_or(u32::MAX));
        self.arena.push(Symbol {
            name: NameRef::EMPTY,
            value: 0,
            size: 0,
            section: 0,
            info: 0,
            reloc_type: 0,
            local_index: None,
            next,
        });
        id
    }

    fn store_local(
        &mut self,
        index: u64,
        id: SymId,
        name_b: &[u8],
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let size = self.locals.len() as u64;
        if index >= size {
            let name = String::from_utf8_lossy(name_b).into_owned();
            warn!(symbol = %name, index, size, "local symbol index out of range");
            diagnostics.push(Diagnostic::LocalIndexOutOfRange { name, index, size });
            return;
        }
        self.locals[index as usize] = Some(id);
        self.get_mut(id).local_index = Some(index);
    }
}
