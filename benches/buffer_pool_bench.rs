use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sensorwire::{
    buffers::{BufferPool, BufferPoolConfig},
    sync::{Mailbox, PutOutcome},
};
use std::{sync::Arc, thread};

fn benchmark_acquire_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("BufferPool");

    for buffer_size in [1024, 64 * 1024, 1024 * 1024].iter() {
        group.bench_with_input(
            BenchmarkId::new("acquire_fill_release", buffer_size),
            buffer_size,
            |b, &buffer_size| {
                let config = BufferPoolConfig::new(format!("bench_{}", buffer_size))
                    .with_initial_count(4)
                    .with_initial_capacity(buffer_size);
                let pool = BufferPool::new(config).unwrap();

                b.iter(|| {
                    let mut buffer = pool.acquire();
                    buffer.resize(buffer_size);
                    buffer[0] = 1;
                    drop(buffer);
                });
            },
        );
    }

    group.finish();
}

fn benchmark_cross_thread_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("Mailbox");

    group.bench_function("put_take_pooled_4k", |b| {
        let pool = BufferPool::with_name("handoff").unwrap();
        let mailbox = Arc::new(Mailbox::new());

        let consumer = {
            let mailbox = Arc::clone(&mailbox);
            thread::spawn(move || {
                let mut taken = 0u64;
                while let Some(buffer) = mailbox.take() {
                    taken += buffer.len() as u64;
                }
                taken
            })
        };

        b.iter(|| {
            let mut buffer = pool.acquire();
            buffer.resize(4096);
            if let PutOutcome::Closed(_) = mailbox.put(buffer) {
                panic!("mailbox closed during benchmark");
            }
        });

        mailbox.close();
        consumer.join().unwrap();
    });

    group.finish();
}

criterion_group!(benches, benchmark_acquire_release, benchmark_cross_thread_handoff);
criterion_main!(benches);
