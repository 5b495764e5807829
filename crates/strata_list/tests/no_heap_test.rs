//! Integration tests: arena-backed lists never call the global allocator.
//!
//! The binary installs a global allocator that counts calls made while the
//! current thread is measuring, so parallel tests do not disturb each other.

// SAFETY: `CountingHeap` forwards every call unchanged to `System`; it only
// bumps a thread-local counter first.
#![allow(unsafe_code)]

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use strata_alloc::{Arena, ArenaAllocator};
use strata_list::{Bidirectional, List};

const BYTES: usize = 4096;

type Nodes<'a> = ArenaAllocator<'a, u64, BYTES>;

thread_local! {
    static MEASURING: Cell<bool> = const { Cell::new(false) };
    static HEAP_CALLS: Cell<usize> = const { Cell::new(0) };
}

fn note_heap_call() {
    if MEASURING.try_with(Cell::get).unwrap_or(false) {
        let _ = HEAP_CALLS.try_with(|calls| calls.set(calls.get() + 1));
    }
}

struct CountingHeap;

unsafe impl GlobalAlloc for CountingHeap {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        note_heap_call();
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        note_heap_call();
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        note_heap_call();
        unsafe { System.realloc(ptr, layout, new_size) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static HEAP: CountingHeap = CountingHeap;

/// Runs `work` and returns how many heap allocations it made on this thread.
fn heap_calls_during(work: impl FnOnce()) -> usize {
    HEAP_CALLS.with(|calls| calls.set(0));
    MEASURING.with(|on| on.set(true));
    work();
    MEASURING.with(|on| on.set(false));
    HEAP_CALLS.with(Cell::get)
}

/// Push, cursor edits, pops, clones and both assignment paths, all in arenas.
fn arena_workload(home: &Arena<BYTES>, away: &Arena<BYTES>) {
    let mut list = List::new_in(Nodes::new(home).propagating());
    for value in 1..=4 {
        list.push_back(value).unwrap();
    }
    list.push_front(0).unwrap();

    let mut cursor = list.cursor_front_mut();
    cursor.move_next();
    let removed = cursor.remove_current().unwrap();
    cursor.insert_before(removed).unwrap();
    cursor.insert_before(9).unwrap();
    assert_eq!(list.pop_back(), Some(4));
    assert!(list.iter().copied().eq([0, 1, 9, 2, 3]));

    let copy = list.clone();
    assert!(copy == list);

    let mut source = List::new_in(Nodes::new(away));
    source.extend([7, 8]);

    let mut stay_home = List::new_in(Nodes::new(home));
    stay_home.push_back(5).unwrap();
    stay_home.clone_from(&source);
    assert!(stay_home == source);

    list.clone_from(&source);
    assert!(list.allocator() == source.allocator());

    let mut assigned = List::new_in(Nodes::new(home));
    assigned.try_assign_from(&copy).unwrap();
    assert!(assigned == copy);
}

#[test]
fn test_arena_lists_make_no_heap_allocations() {
    // First pass registers any lazily initialised logging callsites.
    let (home, away) = (Arena::new(), Arena::new());
    arena_workload(&home, &away);

    let (home, away) = (Arena::new(), Arena::new());
    let calls = heap_calls_during(|| arena_workload(&home, &away));

    assert_eq!(calls, 0);
    assert!(home.used() > 0);
    assert!(away.used() > 0);
}

#[test]
fn test_heap_lists_are_counted() {
    let calls = heap_calls_during(|| {
        let mut list: List<u64> = List::new();
        list.extend(0..8);
        assert_eq!(list.len(), 8);
    });

    assert_eq!(calls, 8);
}
