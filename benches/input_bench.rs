use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

use yfstream::{FileStreams, OpenMode, StreamOptions};

const BENCH_BUFFER_CAPACITY: usize = 32 * 1024 - 16;

fn create_test_file(len: usize) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("bench_file");
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    let mut file = File::create(&file_path).expect("Failed to create test file");
    file.write_all(&data).expect("Failed to write test data");
    (temp_dir, file_path)
}

fn mapped() -> FileStreams {
    FileStreams::new(StreamOptions {
        mmap_threshold: u64::MAX,
        buffer_capacity: BENCH_BUFFER_CAPACITY,
    })
    .unwrap()
}

fn buffered() -> FileStreams {
    FileStreams::new(StreamOptions {
        mmap_threshold: 0,
        buffer_capacity: BENCH_BUFFER_CAPACITY,
    })
    .unwrap()
}

// Drain a whole file under each strategy
fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("drain");

    let sizes = vec![
        4 * 1024,         // Small
        256 * 1024,       // Medium
        4 * 1024 * 1024,  // Large
        16 * 1024 * 1024, // Above the default threshold
    ];

    for size in sizes {
        let (_temp_dir, file_path) = create_test_file(size);
        group.throughput(Throughput::Bytes(size as u64));

        let streams = mapped();
        group.bench_with_input(BenchmarkId::new("mapped", size), &file_path, |b, path| {
            b.iter(|| {
                streams
                    .input(path, |s| {
                        let mut total = 0;
                        while let Some(chunk) = s.next_chunk()? {
                            total += black_box(chunk).len();
                        }
                        Ok::<_, yfstream::Error>(total)
                    })
                    .unwrap()
            })
        });

        let streams = buffered();
        group.bench_with_input(BenchmarkId::new("buffered", size), &file_path, |b, path| {
            b.iter(|| {
                streams
                    .input(path, |s| {
                        let mut total = 0;
                        while let Some(chunk) = s.next_chunk()? {
                            total += black_box(chunk).len();
                        }
                        Ok::<_, yfstream::Error>(total)
                    })
                    .unwrap()
            })
        });

        group.bench_with_input(BenchmarkId::new("reused", size), &file_path, |b, path| {
            b.iter(|| {
                streams
                    .input_at_reused(0, path, |s| {
                        let mut total = 0;
                        while let Some(chunk) = s.next_chunk()? {
                            total += black_box(chunk).len();
                        }
                        Ok::<_, yfstream::Error>(total)
                    })
                    .unwrap()
            })
        });
    }

    group.finish();
}

// Write a file in chunks of different sizes
fn bench_output(c: &mut Criterion) {
    let mut group = c.benchmark_group("output");

    let total = 1024 * 1024;
    let chunk_sizes = vec![512, 4096, 65536];

    for chunk_size in chunk_sizes {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let file_path = temp_dir.path().join("bench_out");
        let chunk = vec![b'v'; chunk_size];
        let streams = buffered();

        group.throughput(Throughput::Bytes(total as u64));
        group.bench_with_input(BenchmarkId::new("write", chunk_size), &chunk, |b, chunk| {
            b.iter(|| {
                streams
                    .output(&file_path, OpenMode::Write, |s| {
                        for _ in 0..total / chunk.len() {
                            s.push(Some(chunk.as_slice()))?;
                        }
                        Ok::<_, yfstream::Error>(())
                    })
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_drain, bench_output);
criterion_main!(benches);
