use packable_compact::CompactEncoderExt;
use packable_encoder::PackEncoder;
use packable_tests::{DataAdapter, ItemAdapter, ProfileAdapter, sample_data, sample_profile};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

fn bench_encode_small(c: &mut Criterion) {
    let data = sample_data();

    c.bench_function("encode_small", |b| {
        b.iter(|| PackEncoder::marshal(&data, &DataAdapter).unwrap());
    });
}

fn bench_encode_profile(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_profile");

    for n in [10, 100, 1000] {
        let profile = sample_profile(n);
        let len = PackEncoder::marshal(&profile, &ProfileAdapter).unwrap().len();
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::new("marshal", n), &profile, |b, profile| {
            b.iter(|| PackEncoder::marshal(profile, &ProfileAdapter).unwrap());
        });
    }

    group.finish();
}

fn bench_encoder_reuse(c: &mut Criterion) {
    let profile = sample_profile(100);
    let mut group = c.benchmark_group("encoder_reuse");

    group.bench_function("fresh_encoder", |b| {
        b.iter(|| {
            let mut encoder = PackEncoder::new();
            encoder.put_object(0, &profile, &ProfileAdapter).unwrap();
            encoder.finish()
        });
    });

    group.bench_function("cleared_encoder", |b| {
        let mut encoder = PackEncoder::new();
        b.iter(|| {
            encoder.clear();
            encoder.put_object(0, &profile, &ProfileAdapter).unwrap();
            encoder.len()
        });
    });

    group.finish();
}

fn bench_encode_arrays(c: &mut Criterion) {
    let sparse: Vec<i32> = (0..4096).map(|i| if i % 8 == 0 { i } else { 0 }).collect();
    let mut group = c.benchmark_group("encode_int_array");
    group.throughput(Throughput::Elements(sparse.len() as u64));

    group.bench_function("fixed_width", |b| {
        b.iter(|| {
            let mut encoder = PackEncoder::new();
            encoder.put_int_array(0, &sparse).unwrap();
            encoder.finish()
        });
    });

    group.bench_function("compact", |b| {
        b.iter(|| {
            let mut encoder = PackEncoder::new();
            encoder.put_compact_int_array(0, &sparse).unwrap();
            encoder.finish()
        });
    });

    group.bench_function("bare_list", |b| {
        b.iter(|| PackEncoder::encode_int_array(&sparse).unwrap());
    });

    group.finish();
}

fn bench_marshal_list(c: &mut Criterion) {
    let items: Vec<_> = (0..1000).map(|i| packable_tests::Item::new(i, i64::from(i) << 20)).collect();

    c.bench_function("marshal_list_1000", |b| {
        b.iter(|| PackEncoder::marshal_list(&items, &ItemAdapter).unwrap());
    });
}

criterion_group!(
    benches,
    bench_encode_small,
    bench_encode_profile,
    bench_encoder_reuse,
    bench_encode_arrays,
    bench_marshal_list
);
criterion_main!(benches);
