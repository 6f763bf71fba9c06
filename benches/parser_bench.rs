use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;
use transit_feed::*;

fn create_car_park_feed(count: usize) -> Vec<u8> {
    let situations: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"situationRecord": {{
                    "@attributes": {{"id": "CP{i}", "version": "1"}},
                    "groupOfLocations": {{"locationContainedInGroup": {{"tpegpointLocation": {{"point": {{
                        "pointCoordinates": {{"latitude": "55.8{i}", "longitude": "-4.2{i}"}}
                    }}}}}}}},
                    "carParkIdentity": "Car park {i}",
                    "carParkStatus": "spacesAvailable",
                    "occupiedSpaces": "{}",
                    "totalCapacity": "500"
                }}}}"#,
                i % 500
            )
        })
        .collect();
    format!(
        r#"{{"d2LogicalModel": {{"payloadPublication": {{"situation": [{}]}}}}}}"#,
        situations.join(",")
    )
    .into_bytes()
}

async fn parse_feed(data: &[u8], count: usize) {
    let mut parser = FeedParser::new();
    let mut records = Vec::with_capacity(count);
    let state = parser
        .run(
            data,
            &mut records,
            &CarParkRecord::default,
            &mut CarParkExtractor::new(),
        )
        .await;

    assert_eq!(state, RunState::Done);
    assert_eq!(records.len(), count);
}

fn feed_parsing_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("car_park_feed");
    group.sample_size(10);

    for count in [100, 1000, 10_000].iter() {
        let data = create_car_park_feed(*count);
        group.throughput(Throughput::Bytes(data.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &data, |b, data| {
            b.iter(|| {
                rt.block_on(async { parse_feed(data, *count).await });
            });
        });
    }

    group.finish();
}

fn buffer_size_benchmark(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let data = create_car_park_feed(1000);

    let mut group = c.benchmark_group("buffer_size");
    group.sample_size(10);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for buffer_size in [64, 1024, 8 * 1024, 64 * 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(buffer_size),
            &buffer_size,
            |b, &buffer_size| {
                b.iter(|| {
                    rt.block_on(async {
                        let mut parser = FeedParser::with_config(ParserConfig {
                            buffer_size,
                            ..Default::default()
                        });
                        let mut records = Vec::new();
                        parser
                            .run(
                                data.as_slice(),
                                &mut records,
                                &CarParkRecord::default,
                                &mut CarParkExtractor::new(),
                            )
                            .await
                    })
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, feed_parsing_benchmark, buffer_size_benchmark);
criterion_main!(benches);
