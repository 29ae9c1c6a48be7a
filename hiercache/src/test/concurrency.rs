use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use crate::cache::Cache;
use crate::device::MemorySystemDevice;
use crate::memory::MainMemory;
use crate::test::util::{addresses, geometry};

const THREADS: u64 = 4;
const CALLS_PER_THREAD: usize = 10_000;
const SETS_LOG2: u32 = 6;
const LINE_SIZE_LOG2: u32 = 6;

/// Addresses for one thread, confined to the sets congruent to `thread` modulo `THREADS`
fn thread_addresses(thread: u64) -> Vec<u64> {
    addresses(thread + 1, CALLS_PER_THREAD, 1 << 12)
        .into_iter()
        .map(|line| (line * THREADS + thread) << LINE_SIZE_LOG2)
        .collect()
}

#[test]
fn disjoint_sets_match_single_threaded_replay() {
    let memory = Arc::new(MainMemory::new());
    let cache = Arc::new(Cache::new("L1", geometry(4, SETS_LOG2, LINE_SIZE_LOG2), false, memory.clone()));
    thread::scope(|scope| {
        for t in 0..THREADS {
            let cache = &cache;
            scope.spawn(move || {
                for address in thread_addresses(t) {
                    cache.access(address, address % 3 == 0).unwrap();
                }
            });
        }
    });
    let stats = cache.stats();
    assert_eq!(stats.accesses, THREADS * CALLS_PER_THREAD as u64);
    assert_eq!(stats.accesses, stats.hits() + stats.misses);
    assert_eq!(memory.accesses(), stats.misses);

    // Each set only ever saw one thread, so a sequential replay lands on the same partition
    let replay = Cache::new("replay", geometry(4, SETS_LOG2, LINE_SIZE_LOG2), false, Arc::new(MainMemory::new()));
    for t in 0..THREADS {
        for address in thread_addresses(t) {
            replay.access(address, false).unwrap();
        }
    }
    assert_eq!(replay.stats(), stats);
}

#[test]
fn shared_cache_installs_each_line_once() {
    let memory = Arc::new(MainMemory::new());
    // Large enough that nothing is ever evicted
    let cache = Arc::new(Cache::new("LLC", geometry(16, 4, 6), true, memory.clone()));
    let lines: Vec<u64> = (0..64).map(|i| i << 6).collect();
    thread::scope(|scope| {
        for _ in 0..THREADS {
            let (cache, lines) = (&cache, &lines);
            scope.spawn(move || {
                for _ in 0..50 {
                    lines.iter().for_each(|a| cache.access(*a, false).unwrap());
                }
            });
        }
    });
    assert_eq!(cache.stats().accesses, THREADS * 50 * 64);
    assert_eq!(cache.stats().misses, 64);
    assert_eq!(memory.reads(), 64);
}

#[test]
fn hierarchy_survives_concurrent_traffic_and_clear() {
    let memory = Arc::new(MainMemory::new());
    let l2 = Arc::new(Cache::new("L2", geometry(8, 6, 6), true, memory.clone()));
    let l1s: Vec<_> = (0..THREADS).map(|_| Cache::new("L1", geometry(2, 3, 6), false, l2.clone())).collect();
    thread::scope(|scope| {
        for (t, l1) in l1s.iter().enumerate() {
            scope.spawn(move || {
                for address in addresses(t as u64, 5_000, 1 << 16) {
                    l1.access(address, t % 2 == 0).unwrap();
                    l1.invalidate(address ^ 0x40).unwrap();
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..20 {
                l2.clear();
            }
        });
    });
    // Counters are only touched under set locks, which clear holds all at once
    let stats = l2.stats();
    assert!(stats.misses <= stats.accesses);
    assert_eq!(l1s.iter().map(|l1| l1.stats().accesses).sum::<u64>(), THREADS * 5_000);
}

#[test]
fn stats_never_observe_a_partial_clear() {
    let cache = Cache::new("L1", geometry(1, 0, 6), false, Arc::new(MainMemory::new()));
    let done = AtomicBool::new(false);
    thread::scope(|scope| {
        scope.spawn(|| {
            for round in 0..2_000u64 {
                for i in 0..100 {
                    cache.access(((round + i) % 3) << 6, false).unwrap();
                }
                cache.clear();
            }
            done.store(true, Ordering::Release);
        });
        let mut snapshots = 0u64;
        while !done.load(Ordering::Acquire) || snapshots == 0 {
            let stats = cache.stats();
            assert!(stats.misses <= stats.accesses, "{stats:?}");
            assert_eq!(stats.accesses, stats.hits() + stats.misses);
            snapshots += 1;
        }
    });
    assert_eq!(cache.stats(), Default::default());
}
