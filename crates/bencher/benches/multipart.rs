use std::hint::black_box;

use bencher::{UPLOAD_CASES, UploadCase};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use micro_multipart::MultipartWriter;

const BOUNDARY: &str = "--------------------5f3c9a1e7b2d4c60";

/// 16 bytes per text field value, matching `UploadCase::payload_size`
const FIELD_VALUE: &str = "0123456789abcdef";

fn encode(case: &UploadCase, file: &[u8], streamed: bool, body: &mut Vec<u8>) {
    body.clear();
    let mut writer = MultipartWriter::new(&mut *body, BOUNDARY).expect("boundary should be valid");
    for index in 0..case.text_fields() {
        writer.write_text(&format!("field{index}"), FIELD_VALUE).expect("text field should be written");
    }
    if !file.is_empty() {
        if streamed {
            writer.write_stream("file", Some("application/octet-stream"), "blob.bin", file).expect("stream should be copied");
        } else {
            writer.write_bytes("file", Some("application/octet-stream"), "blob.bin", file).expect("bytes should be written");
        }
    }
    writer.close().expect("form should be closed");
}

fn benchmark_multipart_writer(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("multipart_writer");

    for case in &UPLOAD_CASES {
        let file = case.file_content();
        group.throughput(Throughput::Bytes(case.payload_size()));

        for (mode, streamed) in [("bytes", false), ("stream", true)] {
            group.bench_with_input(BenchmarkId::new(mode, case.name()), case, |b, case| {
                let mut body = Vec::with_capacity(file.len() + 4096);
                b.iter(|| {
                    encode(case, &file, streamed, &mut body);
                    black_box(body.len());
                });
            });
        }
    }

    group.finish();
}

criterion_group!(multipart, benchmark_multipart_writer);
criterion_main!(multipart);
