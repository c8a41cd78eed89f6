//! Integration tests for the free-list allocator

use ember_memory::allocator::{FreeListAllocator, FreeListConfig, StatisticsProvider};
use ember_memory::MemoryError;
use std::alloc::Layout;

fn debug_allocator(capacity: usize, handles: usize) -> FreeListAllocator {
    FreeListAllocator::with_config(capacity, handles, FreeListConfig::debug())
        .expect("failed to create allocator")
}

#[test]
fn allocate_and_read_back() {
    let mut alloc = FreeListAllocator::new(1024, 8).unwrap();

    let h = alloc.insert(242u32).unwrap();
    let h2 = alloc.insert(300u32).unwrap();
    assert_eq!(*alloc.get(h).unwrap(), 242);
    assert_eq!(*alloc.get(h2).unwrap(), 300);

    *alloc.get_mut(h2).unwrap() = 400;
    assert_eq!(*alloc.get(h).unwrap(), 242);
    assert_eq!(*alloc.get(h2).unwrap(), 400);

    alloc.remove(h).unwrap();
    alloc.remove(h2).unwrap();
    assert_eq!(alloc.used_memory(), 0);
    assert_eq!(alloc.num_allocations(), 0);
}

#[test]
fn raw_allocation_is_filled_and_sliced() {
    let mut alloc = debug_allocator(1024, 8);

    let h = alloc.allocate(Layout::from_size_align(10, 1).unwrap()).unwrap();
    let bytes = alloc.get_slice(h).unwrap();
    assert_eq!(bytes.len(), 10);
    // debug config fills raw allocations with its allocation pattern
    assert!(bytes.iter().all(|&b| b == 0xCC));

    alloc.get_slice_mut(h).unwrap().copy_from_slice(b"Test Str\0\0");
    assert_eq!(&alloc.get_slice(h).unwrap()[..8], b"Test Str");

    alloc.remove(h).unwrap();
    assert_eq!(alloc.used_memory(), 0);
}

#[test]
fn conservation_and_two_sided_coalescing() {
    // Three adjacent equal-size allocations; freeing B then A merges the two
    // freed ranges; freeing C collapses everything into one region-wide
    // block.
    let mut alloc = debug_allocator(1024, 8);

    let a = alloc.insert_array(5, 0u64).unwrap();
    let b = alloc.insert_array(5, 1u64).unwrap();
    let c = alloc.insert_array(5, 2u64).unwrap();
    assert_eq!(alloc.free_block_count(), 1);

    alloc.remove(b).unwrap();
    // B's range and the trailing run do not touch
    assert_eq!(alloc.free_block_count(), 2);
    alloc.validate().unwrap();

    alloc.remove(a).unwrap();
    // A's range touches B's freed range; they must merge
    assert_eq!(alloc.free_block_count(), 2);
    alloc.validate().unwrap();

    alloc.remove(c).unwrap();
    // C touched both sides; exactly one block spans the whole region
    assert_eq!(alloc.free_block_count(), 1);
    assert_eq!(alloc.largest_free_block(), 1024);
    assert_eq!(alloc.used_memory(), 0);
    alloc.validate().unwrap();
}

#[test]
fn best_fit_prefers_exact_match_over_larger_block() {
    // Free blocks of sizes {104, 64, 64} (address order: 104 first). A
    // request needing exactly 64 bytes must take a 64 block, never the 104.
    let mut alloc = debug_allocator(1024, 16);

    let e = alloc.insert_array(88, 0u8).unwrap(); // block size 104
    let k1 = alloc.insert(0u64).unwrap();
    let a = alloc.insert_array(48, 0u8).unwrap(); // block size 64
    let k2 = alloc.insert(0u64).unwrap();
    let c = alloc.insert_array(48, 0u8).unwrap(); // block size 64
    let k3 = alloc.insert(0u64).unwrap();

    let a_addr = alloc.get_slice(a).unwrap().as_ptr() as usize;

    alloc.remove(e).unwrap();
    alloc.remove(a).unwrap();
    alloc.remove(c).unwrap();
    assert_eq!(alloc.free_block_count(), 4); // 104, 64, 64, trailing
    alloc.validate().unwrap();

    let h = alloc.insert_array(48, 7u8).unwrap();
    // The allocation landed in the first 64 block, not the 104 one.
    assert_eq!(alloc.get_slice(h).unwrap().as_ptr() as usize, a_addr);
    assert_eq!(alloc.free_block_count(), 3);
    alloc.validate().unwrap();

    for handle in [k1, k2, k3] {
        alloc.remove(handle).unwrap();
    }
    alloc.remove(h).unwrap();
    assert_eq!(alloc.free_block_count(), 1);
}

#[test]
fn handles_stay_valid_across_defragmentation() {
    let mut alloc = debug_allocator(512, 16);

    let a = alloc.insert(0xA1A2_A3A4u64).unwrap();
    let b = alloc.insert_array(3, 7u32).unwrap();
    let c = alloc.insert(String::from("ember-c")).unwrap();

    let c_addr_before = alloc.get(c).unwrap() as *const String as usize;

    alloc.remove(b).unwrap();
    assert!(alloc.needs_defragmentation());

    let steps = alloc.defragment_fully();
    assert!(steps >= 1);
    assert!(!alloc.needs_defragmentation());
    alloc.validate().unwrap();

    // Raw address moved, logical values did not.
    let c_addr_after = alloc.get(c).unwrap() as *const String as usize;
    assert!(c_addr_after < c_addr_before);
    assert_eq!(alloc.get(c).unwrap(), "ember-c");
    assert_eq!(*alloc.get(a).unwrap(), 0xA1A2_A3A4);

    assert_eq!(alloc.statistics().relocation_count, steps);

    alloc.remove(a).unwrap();
    alloc.remove(c).unwrap();
    assert_eq!(alloc.used_memory(), 0);
}

#[test]
fn defragmentation_converges_over_many_gaps() {
    let mut alloc = debug_allocator(2048, 16);

    let handles: Vec<_> = (0..6)
        .map(|i| alloc.insert_array(8, i as u64).unwrap())
        .collect();

    // Punch three gaps.
    alloc.remove(handles[0]).unwrap();
    alloc.remove(handles[2]).unwrap();
    alloc.remove(handles[4]).unwrap();
    assert!(alloc.needs_defragmentation());

    let steps = alloc.defragment_fully();
    assert!(steps >= 3, "each survivor above a gap must move: {steps}");
    assert!(!alloc.needs_defragmentation());
    assert_eq!(alloc.free_block_count(), 1);
    alloc.validate().unwrap();

    for (i, &handle) in handles.iter().enumerate() {
        if i % 2 == 1 {
            assert!(alloc.get_slice(handle).unwrap().iter().all(|&v| v == i as u64));
            alloc.remove(handle).unwrap();
        } else {
            assert!(!alloc.contains(handle));
        }
    }
    assert_eq!(alloc.used_memory(), 0);
}

#[test]
fn fragmented_allocation_compacts_and_retries_once() {
    let mut alloc = debug_allocator(1024, 16);

    let a = alloc.insert_array(200, 0u8).unwrap();
    let b = alloc.insert_array_with(200, |i| i as u8).unwrap();
    let c = alloc.insert_array(200, 0u8).unwrap();
    let d = alloc.insert_array_with(200, |i| 200 - i as u8).unwrap();

    alloc.remove(a).unwrap();
    alloc.remove(c).unwrap();

    // No single block can hold 560 bytes, but the free total can after
    // compaction; the allocator must defragment and retry internally.
    assert!(alloc.largest_free_block() < 560);
    let big = alloc.insert_array(560, 0xEEu8).unwrap();

    assert_eq!(alloc.get_slice(big).unwrap().len(), 560);
    assert!(alloc.get_slice(big).unwrap().iter().all(|&v| v == 0xEE));

    // Survivors were relocated, not corrupted.
    let b_values = alloc.get_slice(b).unwrap();
    assert!((0..200).all(|i| b_values[i] == i as u8));
    let d_values = alloc.get_slice(d).unwrap();
    assert!((0..200).all(|i| d_values[i] == 200 - i as u8));
    assert_eq!(alloc.statistics().relocation_count, 2);
    alloc.validate().unwrap();

    alloc.remove(b).unwrap();
    alloc.remove(d).unwrap();
    alloc.remove(big).unwrap();
    assert_eq!(alloc.free_block_count(), 1);
    assert_eq!(alloc.used_memory(), 0);
}

#[test]
fn exact_fit_boundary() {
    let mut alloc = debug_allocator(1024, 4);

    // 1008 payload bytes + 16 header = the whole region.
    let h = alloc.insert_array(1008, 1u8).unwrap();
    assert_eq!(alloc.used_memory(), 1024);
    assert!(!alloc.needs_defragmentation());
    assert_eq!(alloc.free_block_count(), 0);

    // One more byte must fail cleanly without mutating any state.
    let err = alloc.insert(1u8).unwrap_err();
    assert!(matches!(err, MemoryError::AllocationFailed { .. }));
    assert_eq!(alloc.used_memory(), 1024);
    assert_eq!(alloc.num_allocations(), 1);
    assert_eq!(alloc.available_handles(), 3);
    alloc.validate().unwrap();

    alloc.remove(h).unwrap();
    assert_eq!(alloc.free_block_count(), 1);
    assert_eq!(alloc.largest_free_block(), 1024);
}

#[test]
fn oversized_request_fails_without_mutation() {
    let mut alloc = debug_allocator(1024, 4);

    let err = alloc.insert_array(1009, 0u8).unwrap_err();
    assert!(matches!(err, MemoryError::AllocationFailed { .. }));
    assert_eq!(alloc.used_memory(), 0);
    assert_eq!(alloc.free_block_count(), 1);
    alloc.validate().unwrap();

    // The exact-fit request still succeeds afterwards.
    let h = alloc.insert_array(1008, 0u8).unwrap();
    alloc.remove(h).unwrap();
}

#[test]
fn handle_exhaustion_is_distinct_from_out_of_memory() {
    let mut alloc = FreeListAllocator::new(1024, 2).unwrap();

    let h1 = alloc.insert(1u64).unwrap();
    let h2 = alloc.insert(2u64).unwrap();

    let err = alloc.insert(3u64).unwrap_err();
    assert_eq!(err, MemoryError::HandlesExhausted { capacity: 2 });
    assert!(err.is_retryable());
    // Plenty of memory is still free; only handles ran out.
    assert!(alloc.total_free() > 512);

    alloc.remove(h1).unwrap();
    let h3 = alloc.insert(3u64).unwrap();
    assert_eq!(*alloc.get(h3).unwrap(), 3);

    alloc.remove(h2).unwrap();
    alloc.remove(h3).unwrap();
}

#[test]
fn stale_handles_are_rejected() {
    let mut alloc = FreeListAllocator::new(1024, 4).unwrap();

    let h = alloc.insert(5u64).unwrap();
    alloc.remove(h).unwrap();

    // Double free surfaces as an observable misuse error.
    let err = alloc.remove(h).unwrap_err();
    assert!(err.is_misuse());
    assert!(alloc.get(h).is_none());
    assert!(!alloc.contains(h));

    // The slot is reused under a new generation; the stale handle still
    // resolves to nothing.
    let h2 = alloc.insert(6u64).unwrap();
    assert!(alloc.get(h).is_none());
    assert!(alloc.remove(h).unwrap_err().is_misuse());
    assert_eq!(*alloc.get(h2).unwrap(), 6);

    alloc.remove(h2).unwrap();
}

#[test]
fn drops_run_on_remove() {
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Logger(Rc<RefCell<usize>>);
    impl Drop for Logger {
        fn drop(&mut self) {
            *self.0.borrow_mut() += 1;
        }
    }

    let drops = Rc::new(RefCell::new(0));
    let mut alloc = FreeListAllocator::new(4096, 8).unwrap();

    let h = alloc
        .insert_array_with(3, |_| Logger(Rc::clone(&drops)))
        .unwrap();
    assert_eq!(*drops.borrow(), 0);

    alloc.remove(h).unwrap();
    assert_eq!(*drops.borrow(), 3);
}

#[test]
fn overaligned_payloads_are_rejected() {
    #[repr(align(256))]
    struct TooAligned(#[allow(dead_code)] u8);

    let mut alloc = FreeListAllocator::new(4096, 8).unwrap();
    let err = alloc.insert(TooAligned(1)).unwrap_err();
    assert!(matches!(err, MemoryError::InvalidAlignment { .. }));

    let err = alloc
        .allocate(Layout::from_size_align(64, 256).unwrap())
        .unwrap_err();
    assert!(matches!(err, MemoryError::InvalidAlignment { .. }));
}

#[test]
fn high_alignment_survives_defragmentation() {
    #[repr(align(64))]
    #[derive(Clone, Copy, PartialEq, Debug)]
    struct Aligned([u8; 64]);

    let mut alloc = debug_allocator(4096, 16);

    let pad = alloc.insert_array(40, 0u8).unwrap();
    let value = alloc.insert(Aligned([0x5A; 64])).unwrap();

    alloc.remove(pad).unwrap();
    while alloc.defragment() {}

    let moved = alloc.get(value).unwrap();
    assert_eq!(moved as *const Aligned as usize % 64, 0);
    assert_eq!(*moved, Aligned([0x5A; 64]));
    alloc.validate().unwrap();

    alloc.remove(value).unwrap();
}

#[test]
fn caller_supplied_region() {
    let layout = Layout::from_size_align(2048, 16).unwrap();
    // SAFETY: freshly allocated, exclusively owned by the allocator below
    // until it is dropped.
    let raw = unsafe { std::alloc::alloc_zeroed(layout) };
    let ptr = std::ptr::NonNull::new(raw).unwrap();

    {
        let mut alloc = unsafe {
            FreeListAllocator::from_raw_parts(ptr, 2048, 8, FreeListConfig::default())
        }
        .unwrap();
        assert_eq!(alloc.size(), 2048);

        let h = alloc.insert([1u64, 2, 3]).unwrap();
        assert_eq!(alloc.get(h).unwrap(), &[1, 2, 3]);
        alloc.remove(h).unwrap();
    }

    // The allocator borrowed the region; it is still ours to free.
    unsafe { std::alloc::dealloc(raw, layout) };
}

#[test]
#[should_panic(expected = "outstanding allocations")]
fn drop_with_outstanding_allocations_panics() {
    let mut alloc = FreeListAllocator::new(1024, 4).unwrap();
    let _h = alloc.insert(5u64).unwrap();
    drop(alloc);
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Insert(usize),
        RemoveOldest,
        Defragment,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (1usize..24).prop_map(Op::Insert),
            2 => Just(Op::RemoveOldest),
            1 => Just(Op::Defragment),
        ]
    }

    proptest! {
        // Conservation and tiling over arbitrary allocate/free/compact
        // sequences: the region is always exactly tiled, and returning to
        // zero allocations returns every byte to the free list.
        #[test]
        fn conservation_over_random_sequences(ops in proptest::collection::vec(op_strategy(), 1..80)) {
            let mut alloc = FreeListAllocator::new(8192, 64).unwrap();
            let mut live: Vec<(ember_memory::allocator::Handle<u64>, u64, usize)> = Vec::new();
            let mut next_tag = 0u64;

            for op in ops {
                match op {
                    Op::Insert(len) => {
                        next_tag += 1;
                        if let Ok(handle) = alloc.insert_array(len, next_tag) {
                            live.push((handle, next_tag, len));
                        }
                    }
                    Op::RemoveOldest => {
                        if !live.is_empty() {
                            let (handle, _, _) = live.remove(0);
                            alloc.remove(handle).unwrap();
                        }
                    }
                    Op::Defragment => {
                        alloc.defragment();
                    }
                }
                alloc.validate().unwrap();
                for &(handle, tag, len) in &live {
                    let values = alloc.get_slice(handle).unwrap();
                    prop_assert_eq!(values.len(), len);
                    prop_assert!(values.iter().all(|&v| v == tag));
                }
            }

            for (handle, _, _) in live {
                alloc.remove(handle).unwrap();
            }
            prop_assert_eq!(alloc.used_memory(), 0);
            prop_assert_eq!(alloc.num_allocations(), 0);
            prop_assert_eq!(alloc.free_block_count(), 1);
            prop_assert_eq!(alloc.largest_free_block(), 8192);
        }
    }
}
