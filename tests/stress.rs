//! Stress tests with fill-pattern corruption detection.
//!
//! Inspired by mimalloc's test-stress: allocate a block, fill with a known
//! pattern, pass it between threads, and verify the pattern right before
//! freeing. Any corruption (use-after-free, double-free, aliasing) shows
//! up as a pattern mismatch and assertion failure rather than silently
//! passing.

use rtalloc::{Pool, Slab};

const BLOCK_SIZE: usize = 128;

fn fill_pattern(ptr: *mut u8, size: usize) {
    let seed = ptr as usize;
    for i in 0..size {
        unsafe {
            *ptr.add(i) = ((seed.wrapping_add(i).wrapping_mul(0x9E37_79B9)) & 0xFF) as u8;
        }
    }
}

fn check_pattern(ptr: *mut u8, size: usize) -> bool {
    let seed = ptr as usize;
    for i in 0..size {
        let expected = ((seed.wrapping_add(i).wrapping_mul(0x9E37_79B9)) & 0xFF) as u8;
        if unsafe { *ptr.add(i) } != expected {
            return false;
        }
    }
    true
}

#[test]
fn slab_stress_fill_pattern_single_thread() {
    let slab = Slab::create(BLOCK_SIZE, 64).unwrap();
    let rounds = 50;
    let mut live = Vec::new();

    for round in 0..rounds {
        while let Some(p) = slab.alloc() {
            fill_pattern(p.as_ptr(), BLOCK_SIZE);
            live.push(p);
        }

        for &p in &live {
            assert!(
                check_pattern(p.as_ptr(), BLOCK_SIZE),
                "corruption detected at round {round}"
            );
        }

        let drain_count = live.len() / 2;
        for _ in 0..drain_count {
            let idx = (round * 7 + 3) % live.len();
            let p = live.swap_remove(idx);
            assert!(
                check_pattern(p.as_ptr(), BLOCK_SIZE),
                "corruption before free at round {round}"
            );
            slab.free(p).unwrap();
        }
    }

    for p in live {
        assert!(check_pattern(p.as_ptr(), BLOCK_SIZE));
        slab.free(p).unwrap();
    }
}

#[test]
fn slab_stress_fill_pattern_cross_thread() {
    use std::sync::{mpsc, Arc};

    let npairs = 4;
    let ops = 200;
    let slab = Arc::new(Slab::create(BLOCK_SIZE, npairs * 8).unwrap());

    let mut producers = Vec::new();
    let mut consumers = Vec::new();

    for pair_id in 0..npairs {
        let (tx, rx) = mpsc::channel::<usize>();
        let slab = Arc::clone(&slab);

        producers.push(std::thread::spawn(move || {
            for _ in 0..ops {
                let p = loop {
                    if let Some(p) = slab.alloc() {
                        break p;
                    }
                    std::thread::yield_now();
                };
                fill_pattern(p.as_ptr(), BLOCK_SIZE);
                tx.send(p.as_ptr() as usize).unwrap();
            }
        }));

        let slab = Arc::clone(&slab);
        consumers.push(std::thread::spawn(move || {
            let mut count = 0usize;
            for addr in rx {
                let ptr = addr as *mut u8;
                assert!(
                    check_pattern(ptr, BLOCK_SIZE),
                    "cross-thread corruption at pair {pair_id}, item {count}"
                );
                slab.free(core::ptr::NonNull::new(ptr).unwrap()).unwrap();
                count += 1;
            }
            count
        }));
    }

    for h in producers {
        h.join().unwrap();
    }
    let total: usize = consumers.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, npairs * ops);
}

#[test]
fn slab_stress_many_threads_concurrent() {
    use std::sync::Arc;

    let nthreads = 8;
    let ops_per_thread = 400;
    let slab = Arc::new(Slab::create(BLOCK_SIZE, nthreads * 16).unwrap());

    let handles: Vec<_> = (0..nthreads)
        .map(|tid| {
            let slab = Arc::clone(&slab);
            std::thread::spawn(move || {
                let mut live = Vec::with_capacity(16);

                for i in 0..ops_per_thread {
                    let Some(p) = slab.alloc() else {
                        continue;
                    };
                    fill_pattern(p.as_ptr(), BLOCK_SIZE);
                    live.push(p);

                    if live.len() > 8 {
                        for _ in 0..4 {
                            let p = live.pop().unwrap();
                            assert!(
                                check_pattern(p.as_ptr(), BLOCK_SIZE),
                                "thread {tid} corruption at op {i}"
                            );
                            slab.free(p).unwrap();
                        }
                    }
                }

                for p in live {
                    assert!(check_pattern(p.as_ptr(), BLOCK_SIZE));
                    slab.free(p).unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let stats = slab.stats();
    assert_eq!(stats.used, 0);
}

#[cfg(feature = "std")]
#[test]
fn pool_stress_many_threads_through_thread_cache() {
    use std::sync::Arc;

    let nthreads = 8;
    let ops_per_thread = 2_000;
    let pool = Arc::new(*Pool::create(BLOCK_SIZE, 32, nthreads * 64).unwrap());

    let handles: Vec<_> = (0..nthreads)
        .map(|_| {
            let pool = Arc::clone(&pool);
            std::thread::spawn(move || {
                for _ in 0..ops_per_thread {
                    let p = loop {
                        if let Some(p) = pool.alloc() {
                            break p;
                        }
                        std::thread::yield_now();
                    };
                    fill_pattern(p.as_ptr(), BLOCK_SIZE);
                    assert!(check_pattern(p.as_ptr(), BLOCK_SIZE));
                    pool.free(p).unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    let stats = pool.stats();
    assert_eq!(stats.used, 0);
}
