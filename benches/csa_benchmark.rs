use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use csa_bench::csa::{batch_csa, par_batch_csa, single_csa, BatchMut, BatchRef};
use csa_bench::matrix::CsaParams;
use csa_bench::types::{Real, Transpose};
use ndarray::Array1;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

/// Batch members per run
const ELEMENTS: usize = 4096;

fn random(len: usize) -> Vec<Real> {
    Array1::<Real>::random(len, Uniform::new(-1.0, 1.0)).to_vec()
}

fn bench_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_csa");
    for &size in &[8usize, 32, 128] {
        let a = random(size * size);
        let mut b = random(size * size);
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bench, &size| {
            bench.iter(|| {
                single_csa(
                    Transpose::NoTrans,
                    Transpose::NoTrans,
                    size,
                    size,
                    black_box(1.5),
                    &a,
                    size,
                    &mut b,
                    size,
                    black_box(0.5),
                );
            });
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_csa");
    for &size in &[4usize, 8, 16] {
        let offset = size * size;
        let params = CsaParams::new(size, size, 1.5, 0.5);
        let a = random(offset * ELEMENTS);
        let mut b = random(offset * ELEMENTS);
        group.throughput(Throughput::Elements((offset * ELEMENTS) as u64));

        group.bench_with_input(BenchmarkId::new("strided", size), &size, |bench, _| {
            bench.iter(|| {
                batch_csa(&params, &BatchRef::strided(&a, offset), &mut BatchMut::strided(&mut b, offset), ELEMENTS);
            });
        });

        group.bench_with_input(BenchmarkId::new("indirect", size), &size, |bench, _| {
            bench.iter(|| {
                batch_csa(
                    &params,
                    &BatchRef::indirect_from_chunks(&a, offset, ELEMENTS),
                    &mut BatchMut::indirect_from_chunks(&mut b, offset, ELEMENTS),
                    ELEMENTS,
                );
            });
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &size, |bench, _| {
            bench.iter(|| {
                par_batch_csa(&params, &BatchRef::strided(&a, offset), &mut BatchMut::strided(&mut b, offset), ELEMENTS);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single, bench_batch);
criterion_main!(benches);
