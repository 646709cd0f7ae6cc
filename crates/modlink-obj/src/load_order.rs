//! Priority ranking of allocatable sections into the load-order chain.

use modlink_elf::{SHF_ALLOC, SHF_EXECINSTR, SHF_WRITE, SHT_NOBITS, TargetSpec};

use crate::object::{Section, name_bytes};

/// Load priority of a section; higher is placed earlier.
///
/// Desired order within writable data:
///
/// ```text
///          P S  prio & 7
///   .data  1 0  4
///   .got   1 1  3
///   .sdata 1 1  1
///   .sbss  0 1  1
///   .bss   0 0  0
/// ```
pub(crate) fn load_priority(target: &TargetSpec, sections: &[Section], idx: usize) -> u32 {
    let sec = &sections[idx];
    let name = name_bytes(sections, sec.name);
    let flags = sec.header.flags;

    let mut prio = 0;
    // Init sections (".xxxx.init") go last; they are discarded after load.
    let is_init = name.len() == 10 && name[0] == b'.' && &name[5..] == b".init";
    if !is_init {
        prio |= 64;
    }
    if flags & SHF_ALLOC != 0 {
        prio |= 32;
    }
    if flags & SHF_EXECINSTR != 0 {
        prio |= 16;
    }
    if flags & SHF_WRITE == 0 {
        prio |= 8;
    }
    if sec.header.sh_type != SHT_NOBITS {
        prio |= 4;
    }
    if name == b".got" {
        prio |= 2;
    }
    // Architecture short-data sections rank with zero-fill short data even
    // when they carry contents.
    if target.short_data_flag != 0 && flags & target.short_data_flag != 0 {
        prio = (prio & !4) | 1;
    }
    prio
}

/// Insert a section into the chain, ordered by descending priority; ties
/// break first-inserted-wins.
pub(crate) fn insert_load_order(
    head: &mut Option<usize>,
    sections: &mut [Section],
    priorities: &[u32],
    idx: usize,
) {
    let prio = priorities[idx];
    let mut prev: Option<usize> = None;
    let mut cur = *head;
    while let Some(c) = cur {
        if priorities[c] < prio {
            break;
        }
        prev = Some(c);
        cur = sections[c].load_next;
    }
    sections[idx].load_next = cur;
    match prev {
        None => *head = Some(idx),
        Some(p) => sections[p].load_next = Some(idx),
    }
}
