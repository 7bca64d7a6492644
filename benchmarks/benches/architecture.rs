use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use tabular_nn::architecture::{recommend, LossKind};
use tabular_nn::dataset::TaskType;
use tabular_nn::reconcile::{reconcile, ModelShape};

fn bench_recommend(c: &mut Criterion) {
    c.bench_function("recommend", |b| {
        b.iter(|| {
            recommend(
                black_box(64),
                black_box(10_000),
                TaskType::Classification,
                black_box(7),
            )
        });
    });
}

fn bench_reconcile(c: &mut Criterion) {
    for n in [1_000usize, 10_000, 100_000].iter() {
        let one_hot = Array2::from_shape_fn((*n, 5), |(i, j)| if i % 5 == j { 1.0 } else { 0.0 });
        let scalar = Array2::from_shape_fn((*n, 1), |(i, _)| (i % 5) as f64);

        c.bench_with_input(BenchmarkId::new("reconcile_collapse", n), &one_hot, |b, y| {
            let model = ModelShape {
                input_width: 4,
                output_width: 1,
            };
            b.iter(|| reconcile(model, 4, y.clone(), LossKind::BinaryCrossentropy, &[]).expect("ok"));
        });

        c.bench_with_input(BenchmarkId::new("reconcile_expand", n), &scalar, |b, y| {
            let model = ModelShape {
                input_width: 4,
                output_width: 5,
            };
            let classes = [0.0, 1.0, 2.0, 3.0, 4.0];
            b.iter(|| {
                reconcile(model, 4, y.clone(), LossKind::CategoricalCrossentropy, &classes)
                    .expect("ok")
            });
        });
    }
}

criterion_group!(benches, bench_recommend, bench_reconcile);
criterion_main!(benches);
