//! Benchmarks for the cycle-time handle access path.
//!
//! The strict read is the hot path of the control cycle; it must stay in
//! the tens-of-nanoseconds range and allocation-free.

use criterion::{Criterion, criterion_group, criterion_main};
use helix::consts::CYCLE_STATE_INTERFACE;
use helix_shm::interfaces::{CycleState, JointState};
use helix_shm::{SegmentRegistry, monotonic_ns};
use std::hint::black_box;

fn bench_handle_access(c: &mut Criterion) {
    let tempdir = tempfile::tempdir().unwrap();
    let dir = tempdir.path().to_string_lossy().into_owned();
    let module = format!("bench_{}", std::process::id());

    let mut owner = SegmentRegistry::create_in(&dir, &module).unwrap();
    owner
        .add_segment::<CycleState>(CYCLE_STATE_INTERFACE, true)
        .unwrap();
    owner.add_segment::<JointState>("joint_state", true).unwrap();

    let mut cycle = owner.get_mut::<CycleState>(CYCLE_STATE_INTERFACE).unwrap();
    let mut joints = owner.get_mut::<JointState>("joint_state").unwrap();
    cycle.value_mut().current_cycle = 1;
    cycle.updated_at(monotonic_ns(), 1);
    joints.value_mut().position[0] = 0.5;
    joints.updated_at(monotonic_ns(), 1);

    let plain = owner.get::<JointState>("joint_state").unwrap();
    let strict = owner.get_strict::<JointState>("joint_state").unwrap();

    c.bench_function("plain_read", |b| {
        b.iter(|| black_box(plain.value().position[0]));
    });

    c.bench_function("strict_read", |b| {
        b.iter(|| black_box(strict.value().unwrap().position[0]));
    });

    c.bench_function("write_and_stamp", |b| {
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            joints.value_mut().position[0] = n as f64;
            joints.updated_at(n, 1);
        });
    });
}

criterion_group!(benches, bench_handle_access);
criterion_main!(benches);
