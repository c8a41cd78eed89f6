//! Integration tests for the stack allocator

use ember_memory::allocator::{
    MemoryUsage, StackAllocator, StackConfig, StackFrame, StatisticsProvider,
};
use std::alloc::Layout;
use std::cell::RefCell;
use std::rc::Rc;

/// Records its name when dropped, for destructor-order assertions.
struct Logger {
    name: &'static str,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.log.borrow_mut().push(self.name);
    }
}

fn logger(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Logger {
    Logger {
        name,
        log: Rc::clone(log),
    }
}

#[test]
fn raw_allocation_and_alignment() {
    let alloc = StackAllocator::new(4096).unwrap();

    for align in [1usize, 8, 16, 32, 64] {
        let layout = Layout::from_size_align(24, align).unwrap();
        let ptr = alloc.allocate(layout).unwrap();
        assert_eq!(ptr.as_ptr() as usize % align, 0);
    }

    assert!(alloc.used() > 0);
    alloc.release_all();
    assert_eq!(alloc.used(), 0);
}

#[test]
fn rewind_runs_destructors_in_lifo_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let alloc = StackAllocator::new(4096).unwrap();

    let _x = alloc.alloc_value(logger("x", &log)).unwrap();
    let marker = alloc.marker();
    let _y = alloc.alloc_value(logger("y", &log)).unwrap();
    let _z = alloc.alloc_value(logger("z", &log)).unwrap();

    // Rewinding to the marker destroys Z then Y, and must not touch X.
    alloc.release_to_marker(marker).unwrap();
    assert_eq!(*log.borrow(), vec!["z", "y"]);

    alloc.release_all();
    assert_eq!(*log.borrow(), vec!["z", "y", "x"]);
}

#[test]
fn array_elements_drop_last_to_first() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let alloc = StackAllocator::new(4096).unwrap();

    let names = ["e0", "e1", "e2"];
    let _arr = alloc
        .alloc_array_with(3, |i| logger(names[i], &log))
        .unwrap();

    alloc.release_all();
    assert_eq!(*log.borrow(), vec!["e2", "e1", "e0"]);
}

#[test]
fn trivially_destructible_values_are_not_logged() {
    let alloc = StackAllocator::new(4096).unwrap();

    let _a = alloc.alloc_value(42u64).unwrap();
    let _b = alloc.alloc_array(16, 7u32).unwrap();
    assert_eq!(alloc.pending_finalizers(), 0);

    let _c = alloc.alloc_value(String::from("logged")).unwrap();
    assert_eq!(alloc.pending_finalizers(), 1);

    alloc.release_all();
}

#[test]
fn overflow_fails_without_mutating_state() {
    let alloc = StackAllocator::with_config(128, StackConfig::production()).unwrap();

    let ptr = alloc.allocate(Layout::from_size_align(96, 8).unwrap()).unwrap();
    assert!(!ptr.as_ptr().is_null());
    let used_before = alloc.used();

    let err = alloc.allocate(Layout::from_size_align(64, 8).unwrap()).unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(alloc.used(), used_before);

    alloc.release_all();
}

#[test]
fn forward_marker_is_a_misuse_error() {
    let alloc = StackAllocator::new(1024).unwrap();

    let base = alloc.marker();
    alloc.allocate(Layout::from_size_align(32, 8).unwrap()).unwrap();
    let late = alloc.marker();

    // Rewind to the base, then try to "rewind" forward to the later marker.
    alloc.release_to_marker(base).unwrap();
    let err = alloc.release_to_marker(late).unwrap_err();
    assert!(err.is_misuse());
    assert_eq!(alloc.used(), 0);
}

#[test]
fn frames_release_on_drop() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let alloc = StackAllocator::new(4096).unwrap();

    let _outer = alloc.alloc_value(logger("outer", &log)).unwrap();
    {
        let _frame = StackFrame::new(&alloc);
        let _inner = alloc.alloc_value(logger("inner", &log)).unwrap();
        assert_eq!(alloc.pending_finalizers(), 2);
    }
    // The frame rewound its scope: inner destroyed, outer untouched.
    assert_eq!(*log.borrow(), vec!["inner"]);
    assert_eq!(alloc.pending_finalizers(), 1);

    alloc.release_all();
    assert_eq!(*log.borrow(), vec!["inner", "outer"]);
}

#[test]
fn usage_and_statistics() {
    let alloc = StackAllocator::with_config(4096, StackConfig::debug()).unwrap();

    alloc.allocate(Layout::from_size_align(128, 8).unwrap()).unwrap();
    alloc.allocate(Layout::from_size_align(64, 8).unwrap()).unwrap();

    assert_eq!(alloc.used_memory(), alloc.used());
    assert_eq!(alloc.total_memory(), Some(4096));

    let stats = alloc.statistics();
    assert_eq!(stats.allocation_count, 2);
    assert!(stats.peak_allocated_bytes >= 192);

    alloc.release_all();
    assert_eq!(alloc.statistics().deallocation_count, 1);
}

#[test]
#[should_panic(expected = "still allocated")]
fn drop_with_open_scope_panics() {
    let alloc = StackAllocator::new(1024).unwrap();
    alloc.allocate(Layout::from_size_align(16, 8).unwrap()).unwrap();
    drop(alloc);
}
