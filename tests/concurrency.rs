//! Concurrent access tests
//!
//! These tests verify that singletons and scoped services are created exactly
//! once under racing first use, and that the active scope never leaks between
//! threads.

use scopewire::{ConstructError, Injectable, Resolver, ServiceCollection};
use serial_test::serial;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const THREADS: usize = 16;

static SLOW_BUILDS: AtomicUsize = AtomicUsize::new(0);

struct SlowSingleton;

impl Injectable for SlowSingleton {
    type Deps = ();
    fn construct(_: ()) -> Result<Self, ConstructError> {
        SLOW_BUILDS.fetch_add(1, Ordering::SeqCst);
        // Widen the race window
        thread::sleep(Duration::from_millis(20));
        Ok(SlowSingleton)
    }
}

static SCOPED_BUILDS: AtomicUsize = AtomicUsize::new(0);

struct SlowScoped;

impl Injectable for SlowScoped {
    type Deps = ();
    fn construct(_: ()) -> Result<Self, ConstructError> {
        SCOPED_BUILDS.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        Ok(SlowScoped)
    }
}

#[test]
#[serial]
fn singleton_created_once_under_concurrent_first_use() {
    SLOW_BUILDS.store(0, Ordering::SeqCst);

    let mut sc = ServiceCollection::new();
    sc.add_singleton::<SlowSingleton>();
    let sp = sc.build();
    let barrier = Barrier::new(THREADS);

    let instances: Vec<Arc<SlowSingleton>> = crossbeam_utils::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|_| {
                    barrier.wait();
                    sp.get_required::<SlowSingleton>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert_eq!(SLOW_BUILDS.load(Ordering::SeqCst), 1);
    for instance in &instances {
        assert!(Arc::ptr_eq(instance, &instances[0]));
    }
}

#[test]
#[serial]
fn scoped_created_once_per_scope_under_race() {
    SCOPED_BUILDS.store(0, Ordering::SeqCst);

    let mut sc = ServiceCollection::new();
    sc.add_scoped::<SlowScoped>();
    let sp = sc.build();
    let scope = sp.new_scope();
    let barrier = Barrier::new(THREADS);

    let instances: Vec<Arc<SlowScoped>> = crossbeam_utils::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|_| {
                    barrier.wait();
                    scope.get_required::<SlowScoped>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert_eq!(SCOPED_BUILDS.load(Ordering::SeqCst), 1);
    for instance in &instances {
        assert!(Arc::ptr_eq(instance, &instances[0]));
    }
}

#[test]
#[serial]
fn concurrent_units_of_work_keep_their_own_scope() {
    SCOPED_BUILDS.store(0, Ordering::SeqCst);

    let mut sc = ServiceCollection::new();
    sc.add_scoped::<SlowScoped>();
    let sp = sc.build();
    let barrier = Barrier::new(THREADS);

    let per_thread: Vec<(Arc<SlowScoped>, Arc<SlowScoped>)> = crossbeam_utils::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|_| {
                    let _scope = sp.create_scope();
                    barrier.wait();
                    let first = sp.get_required::<SlowScoped>();
                    let second = sp.get_required::<SlowScoped>();
                    (first, second)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    assert_eq!(SCOPED_BUILDS.load(Ordering::SeqCst), THREADS);
    for (i, (first, second)) in per_thread.iter().enumerate() {
        assert!(Arc::ptr_eq(first, second));
        for (other, _) in per_thread.iter().skip(i + 1) {
            assert!(!Arc::ptr_eq(first, other));
        }
    }
}

#[test]
fn transients_resolve_in_parallel() {
    struct Cheap(usize);
    impl Injectable for Cheap {
        type Deps = ();
        fn construct(_: ()) -> Result<Self, ConstructError> {
            Ok(Cheap(7))
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_transient::<Cheap>();
    let sp = Arc::new(sc.build());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let sp = sp.clone();
            thread::spawn(move || (0..100).map(|_| sp.get_required::<Cheap>().0).sum::<usize>())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 700);
    }
}
