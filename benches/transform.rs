use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polars::prelude::*;
use rand::prelude::*;
use tabprep::preprocessing::{ColumnProfiler, PipelineBuilder};

const PROTOCOLS: [&str; 4] = ["tcp", "udp", "icmp", "gre"];

fn create_traffic_data(n_rows: usize, n_numeric: usize, missing_rate: f64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(42);

    let mut columns: Vec<Column> = (0..n_numeric)
        .map(|i| {
            let values: Vec<Option<f64>> = (0..n_rows)
                .map(|_| {
                    if rng.gen::<f64>() < missing_rate {
                        None
                    } else if i % 2 == 0 {
                        Some(rng.gen::<f64>() * 10.0)
                    } else {
                        // heavy right tail
                        Some((rng.gen::<f64>() * 8.0).exp())
                    }
                })
                .collect();
            Column::new(format!("feature_{}", i).into(), values)
        })
        .collect();

    let protocol: Vec<&str> = (0..n_rows)
        .map(|_| PROTOCOLS[rng.gen_range(0..PROTOCOLS.len())])
        .collect();
    columns.push(Column::new("protocol".into(), protocol));

    DataFrame::new(columns).unwrap()
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    group.sample_size(10);

    for n_rows in [500, 2000, 5000].iter() {
        let df = create_traffic_data(*n_rows, 8, 0.05);

        group.bench_with_input(BenchmarkId::new("column_transformer", n_rows), &df, |b, df| {
            b.iter(|| {
                let profile = ColumnProfiler::default().profile(black_box(df)).unwrap();
                PipelineBuilder::new().build(&profile).unwrap().fit(df).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");

    let train_df = create_traffic_data(2000, 8, 0.05);
    let profile = ColumnProfiler::default().profile(&train_df).unwrap();
    let fitted = PipelineBuilder::new().build(&profile).unwrap().fit(&train_df).unwrap();

    for n_rows in [100, 1000, 5000].iter() {
        let test_df = create_traffic_data(*n_rows, 8, 0.05);

        group.bench_with_input(BenchmarkId::new("transform", n_rows), &test_df, |b, df| {
            b.iter(|| fitted.transform(black_box(df)).unwrap().into_dense())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fit, bench_apply);
criterion_main!(benches);
