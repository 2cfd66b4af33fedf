use criterion::{BatchSize, Criterion, criterion_group, criterion_main};

use backlink_metrics::join::{JoinKind, join};
use backlink_metrics::pipeline::{Mode, UploadBatch, run};
use backlink_metrics::table::Table;

fn generate_domains(rows: usize) -> UploadBatch {
    let referrer_rows = (0..rows)
        .map(|i| {
            vec![
                format!("https://www.site{i}.com/"),
                (i % 100).to_string(),
                (i % 37).to_string(),
                (i % 53).to_string(),
                (i * 10).to_string(),
            ]
        })
        .collect::<Vec<_>>();
    // Every other trust row targets a referrer domain; the rest never match.
    let trust_rows = (0..rows)
        .map(|i| {
            let host = if i % 2 == 0 {
                format!("site{i}.com")
            } else {
                format!("other{i}.net")
            };
            vec![host, (i % 60).to_string(), (i % 70 + 1).to_string()]
        })
        .collect::<Vec<_>>();
    UploadBatch {
        domain_referrer: Some(Table::from_strings(
            [
                "Target",
                "Domain Rating",
                "Ref domains Dofollow",
                "Linked Domains",
                "Total Traffic",
            ],
            referrer_rows,
        )),
        domain_trust: Some(Table::from_strings(
            ["Item", "TrustFlow", "CitationFlow"],
            trust_rows,
        )),
        ..UploadBatch::default()
    }
}

fn bench_join(c: &mut Criterion) {
    let left = Table::from_strings(
        ["k", "l"],
        (0..50_000).map(|i| vec![format!("key{}", i % 25_000), i.to_string()]),
    );
    let right = Table::from_strings(
        ["k", "r"],
        (0..50_000).map(|i| vec![format!("key{i}"), i.to_string()]),
    );

    let mut group = c.benchmark_group("join");
    group.bench_function("inner_50k", |b| {
        b.iter(|| join(&left, &right, "k", "k", JoinKind::Inner).expect("join"))
    });
    group.bench_function("left_50k", |b| {
        b.iter(|| join(&left, &right, "k", "k", JoinKind::Left).expect("join"))
    });
    group.finish();
}

fn bench_domain_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);
    group.bench_function("domain_20k", |b| {
        b.iter_batched(
            || generate_domains(20_000),
            |batch| run(Mode::Domain, &batch),
            BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_join, bench_domain_pipeline);
criterion_main!(benches);
