// Training and query benchmarks at dataset sizes the recommender targets
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use furnrec_core::{Record, RecordFilter, RecordTable};
use furnrec_similarity::{encode, EncoderConfig, Recommender, SimilarityMatrix};
use rand::prelude::*;

const APARTMENTS: &[&str] = &["Studio", "1BHK", "2BHK", "3BHK", "Loft", "Villa"];
const LOCATIONS: &[&str] = &["Downtown", "Suburbs", "Uptown", "Harbor", "Beachfront"];
const RENTERS: &[&str] = &["Student", "Professional", "Family", "Couple", "Retiree"];
const BUDGETS: &[&str] = &["Low", "Medium", "High", "Luxury"];
const STYLES: &[&str] = &["Minimalist", "Modern", "Scandinavian", "Industrial", "Rustic"];
const FURNITURE: &[&str] = &[
    "Sofa bed",
    "Dining table",
    "Office chair",
    "Bookshelf",
    "Bar stools",
    "Queen bed",
];

fn generate_table(rows: usize) -> RecordTable {
    let mut rng = StdRng::seed_from_u64(42);
    let mut pick = |values: &[&str]| {
        values
            .choose(&mut rng)
            .copied()
            .unwrap_or_default()
            .to_string()
    };
    (0..rows)
        .map(|i| Record {
            rental_id: format!("R{:04}", i),
            apartment_type: pick(APARTMENTS),
            location: pick(LOCATIONS),
            renter_type: pick(RENTERS),
            budget_range: pick(BUDGETS),
            preferred_style: pick(STYLES),
            recommended_furniture: pick(FURNITURE),
        })
        .collect()
}

fn benchmark_train(c: &mut Criterion) {
    let mut group = c.benchmark_group("train");

    for size in [100, 300, 1000].iter() {
        let table = generate_table(*size);
        group.bench_with_input(BenchmarkId::new("encode+similarity", size), &table, |b, table| {
            b.iter(|| {
                let encoded = encode(black_box(table), &EncoderConfig::default()).unwrap();
                SimilarityMatrix::build(&encoded.features)
            });
        });
    }

    group.finish();
}

fn benchmark_recommend(c: &mut Criterion) {
    let table = generate_table(300);
    let encoded = encode(&table, &EncoderConfig::default()).unwrap();
    let matrix = SimilarityMatrix::build(&encoded.features);
    let recommender = Recommender::new(&table, &matrix).unwrap();
    let filter = RecordFilter::new().apartment_type("Studio").search("bed");

    c.bench_function("recommend_filtered", |b| {
        b.iter(|| recommender.recommend_filtered(black_box(&filter), 5, None));
    });
}

criterion_group!(benches, benchmark_train, benchmark_recommend);
criterion_main!(benches);
