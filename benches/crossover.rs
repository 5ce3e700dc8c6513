use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use triband::buffer::AudioBuffer;
use triband::dsp::crossover::Crossover;

mod common;
use common::{SAMPLE_RATE, noise_buffer};

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("Crossover Split");

    for &buffer_size in &[64usize, 128, 256, 512, 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(buffer_size),
            &buffer_size,
            |b, &buffer_size| {
                let mut crossover = Crossover::new(SAMPLE_RATE);
                crossover.set_frequencies(400.0, 4000.0);
                let input = noise_buffer(buffer_size);
                let mut low = AudioBuffer::new(2, buffer_size);
                let mut mid = AudioBuffer::new(2, buffer_size);
                let mut high = AudioBuffer::new(2, buffer_size);

                b.iter(|| {
                    crossover.split(black_box(&input), &mut low, &mut mid, &mut high);
                });
            },
        );
    }

    group.finish();
}

fn bench_frequency_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("Crossover Moving Frequencies");

    group.bench_function("256", |b| {
        let mut crossover = Crossover::new(SAMPLE_RATE);
        let input = noise_buffer(256);
        let mut low = AudioBuffer::new(2, 256);
        let mut mid = AudioBuffer::new(2, 256);
        let mut high = AudioBuffer::new(2, 256);
        let mut step = 0u32;

        b.iter(|| {
            step = (step + 1) % 500;
            crossover.set_frequencies(200.0 + step as f32, 3000.0 + step as f32 * 10.0);
            crossover.split(black_box(&input), &mut low, &mut mid, &mut high);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_split, bench_frequency_sweep);
criterion_main!(benches);
