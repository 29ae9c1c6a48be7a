use std::sync::Arc;
use parking_lot::Mutex;
use crate::cache::{Cache, Line};
use crate::coherence::{CoherenceProtocol, DirectoryMoesi, NullProtocol};
use crate::device::MemorySystemDevice;
use crate::group::CacheGroup;
use crate::test::util::{geometry, hit, RecordingDevice};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Lock(u64),
    Unlock(u64),
    Add(u64, usize),
    Remove(u64, usize),
    Hit(usize, u64, bool),
    Miss(usize, u64, bool),
    Evict(usize, u64),
}

#[derive(Default)]
struct RecordingProtocol {
    events: Mutex<Vec<Event>>,
}

impl RecordingProtocol {
    fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl CoherenceProtocol for RecordingProtocol {
    fn lock_addr(&self, address: u64) {
        self.events.lock().push(Event::Lock(address));
    }
    fn unlock_addr(&self, address: u64) {
        self.events.lock().push(Event::Unlock(address));
    }
    fn add_addr(&self, address: u64, id: usize) {
        self.events.lock().push(Event::Add(address, id));
    }
    fn remove_addr(&self, address: u64, id: usize) {
        self.events.lock().push(Event::Remove(address, id));
    }
    fn on_hit(&self, id: usize, address: u64, _line: &mut Line, is_write: bool) {
        self.events.lock().push(Event::Hit(id, address, is_write));
    }
    fn on_miss(&self, id: usize, address: u64, is_write: bool) {
        self.events.lock().push(Event::Miss(id, address, is_write));
    }
    fn on_evict(&self, id: usize, address: u64) {
        self.events.lock().push(Event::Evict(id, address));
    }
}

fn recorded_cache(ways: usize) -> (Cache, Arc<RecordingProtocol>) {
    let protocol = Arc::new(RecordingProtocol::default());
    let cache = Cache::new("L1", geometry(ways, 0, 6), false, Arc::new(RecordingDevice::default()))
        .with_protocol(protocol.clone());
    (cache, protocol)
}

#[test]
fn miss_then_hit_calls_hooks_in_order() {
    let (cache, protocol) = recorded_cache(2);
    cache.access(0x1004, true).unwrap();
    assert_eq!(
        protocol.take(),
        vec![Event::Lock(0x1000), Event::Miss(0, 0x1000, true), Event::Add(0x1000, 0), Event::Unlock(0x1000)]
    );
    cache.access(0x1008, false).unwrap();
    assert_eq!(protocol.take(), vec![Event::Lock(0x1000), Event::Hit(0, 0x1000, false), Event::Unlock(0x1000)]);
}

#[test]
fn eviction_reports_the_displaced_line() {
    let (cache, protocol) = recorded_cache(1);
    cache.access(0x40, false).unwrap();
    protocol.take();
    cache.access(0x80, false).unwrap();
    assert_eq!(
        protocol.take(),
        vec![
            Event::Lock(0x80),
            Event::Miss(0, 0x80, false),
            Event::Evict(0, 0x40),
            Event::Remove(0x40, 0),
            Event::Add(0x80, 0),
            Event::Unlock(0x80),
        ]
    );
}

#[test]
fn invalidate_removes_only_present_lines() {
    let (cache, protocol) = recorded_cache(2);
    cache.access(0x40, false).unwrap();
    protocol.take();
    cache.invalidate(0x40).unwrap();
    assert_eq!(protocol.take(), vec![Event::Lock(0x40), Event::Remove(0x40, 0), Event::Unlock(0x40)]);
    cache.invalidate(0x40).unwrap();
    assert_eq!(protocol.take(), vec![Event::Lock(0x40), Event::Unlock(0x40)]);
}

#[test]
fn group_peers_report_their_own_id() {
    let protocol = Arc::new(RecordingProtocol::default());
    let group = CacheGroup::new(3, "L1", geometry(2, 2, 6), false, Arc::new(RecordingDevice::default()), protocol.clone());
    group.cache(2).unwrap().access(0x40, false).unwrap();
    assert!(protocol.take().contains(&Event::Miss(2, 0x40, false)));
}

#[test]
fn protocol_can_drop_a_line_on_hit() {
    struct DropOnWrite;
    impl CoherenceProtocol for DropOnWrite {
        fn on_hit(&self, _id: usize, _address: u64, line: &mut Line, is_write: bool) {
            if is_write {
                line.invalidate();
            }
        }
    }
    let cache = Cache::new("L1", geometry(2, 2, 6), false, Arc::new(RecordingDevice::default()))
        .with_protocol(Arc::new(DropOnWrite));
    cache.access(0x40, false).unwrap();
    cache.access(0x40, true).unwrap();
    assert!(!cache.contains(0x40));
}

#[test]
fn bundled_protocols_change_nothing() {
    let lines = [0x0, 0x40, 0x1000, 0x40, 0x0, 0x2000, 0x1000];
    let results: Vec<Vec<bool>> = [
        Arc::new(NullProtocol) as Arc<dyn CoherenceProtocol>,
        Arc::new(DirectoryMoesi) as Arc<dyn CoherenceProtocol>,
    ]
    .into_iter()
    .map(|protocol| {
        let cache = Cache::new("L1", geometry(2, 2, 6), false, Arc::new(RecordingDevice::default()))
            .with_protocol(protocol);
        lines.iter().map(|a| hit(&cache, *a)).collect()
    })
    .collect();
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0], vec![false, false, false, true, true, false, false]);
}
