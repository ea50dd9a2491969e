//! Integration test for the simulation/render thread split.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lerper_core::{split, EntityId, LerperConfig};

const FRAMES: u32 = 500;
const ENTITIES: EntityId = 16;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Snapshot {
    id: EntityId,
    tick: u32,
}

#[test]
fn test_producer_and_consumer_on_separate_threads() {
    let config = LerperConfig::default()
        .with_target_queue_depth(1.5)
        .with_pool_capacity(4);
    let (mut producer, mut consumer) = split::<Snapshot>(&config).unwrap();
    consumer.seed_average(1.5, 2);

    let done = Arc::new(AtomicBool::new(false));
    let producer_done = Arc::clone(&done);

    let simulation = thread::spawn(move || {
        for tick in 0..FRAMES {
            for id in 0..ENTITIES {
                producer.add_entity(id, Snapshot { id, tick }).unwrap();
            }
            producer.end_frame(0.001).unwrap();
            if tick % 50 == 0 {
                thread::sleep(Duration::from_millis(1));
            }
        }
        producer_done.store(true, Ordering::Release);
        producer
    });

    let mut last_tick = 0;
    let mut draws_after_finish = 0;
    loop {
        let finished = done.load(Ordering::Acquire);
        consumer
            .draw_with(0.002, &mut |prev: &Snapshot, next: &Snapshot, t: f32| {
                assert_eq!(prev.id, next.id);
                assert!(next.tick >= prev.tick);
                assert!((0.0..=1.0).contains(&t));
                last_tick = last_tick.max(prev.tick);
            })
            .unwrap();

        if finished {
            if consumer.in_flight() == 0 && consumer.queue_len() == 0 {
                break;
            }
            draws_after_finish += 1;
            assert!(draws_after_finish < 100_000, "playback never drained");
        }
    }

    let producer = simulation.join().unwrap();
    assert_eq!(producer.frames_produced(), u64::from(FRAMES));

    // Every frame became current exactly once, in order
    let stats = consumer.stats();
    assert_eq!(stats.frames_consumed, u64::from(FRAMES));
    assert_eq!(last_tick, FRAMES - 1);
    assert_eq!(consumer.current_frame().get(0).map(|s| s.tick), Some(FRAMES - 1));

    // Collector + current frame are the only buffers still out
    let pool = consumer.pool_stats();
    assert_eq!(pool.acquired - pool.released, 2);
}

#[test]
fn test_dropping_consumer_disconnects_producer() {
    let (mut producer, consumer) = split::<u32>(&LerperConfig::default()).unwrap();

    let render = thread::spawn(move || drop(consumer));
    render.join().unwrap();

    producer.add_entity(0, 0).unwrap();
    assert!(producer.end_frame(0.1).is_err());
}
