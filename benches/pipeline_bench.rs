//! Request and response pipeline performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use workers_ai::models::*;
use workers_ai::services::transport::build_headers;
use workers_ai::services::{HttpRequest, HttpTransport, RawResponse, SseDecoder};
use workers_ai::{ClientConfig, WorkersAi};

/// Create test client
fn create_test_client() -> WorkersAi {
    let config = ClientConfig::new("bench-key", "bench-account").unwrap();
    let transport = HttpTransport::new(&config).unwrap();
    WorkersAi::with_transport(config, Arc::new(transport))
}

fn benchmark_request_building(c: &mut Criterion) {
    let client = create_test_client();

    c.bench_function("build_url", |b| {
        b.iter(|| black_box(client.build_url(black_box(TextGenerationModel::Mistral7b.model_id()))))
    });

    let mut group = c.benchmark_group("text_generation_payload");
    for size in [64usize, 1024, 4096] {
        let request = TextGenerationRequest::new(TextGenerationModel::Mistral7b, "You are helpful", "x".repeat(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &request, |b, request| {
            b.iter(|| {
                request.validate().unwrap();
                let http = HttpRequest::json(client.build_url(request.model.model_id()), &request.to_payload(false)).unwrap();
                black_box(http.encode_body().unwrap())
            })
        });
    }
    group.finish();

    c.bench_function("build_headers", |b| {
        let extra = vec![("Content-Type".to_string(), "application/json".to_string())];
        b.iter(|| black_box(build_headers(black_box("bench-key"), &extra).unwrap()))
    });
}

fn benchmark_response_views(c: &mut Criterion) {
    let body = r#"{"success":true,"result":[
        {"label":"TABBY","score":0.71},{"label":"TIGER CAT","score":0.18},
        {"label":"EGYPTIAN CAT","score":0.06},{"label":"LYNX","score":0.02}
    ],"errors":[],"messages":[]}"#;

    c.bench_function("image_classification_view", |b| {
        b.iter(|| {
            let raw = RawResponse::buffered(200, HeaderMap::new(), black_box(body));
            let view = ImageClassificationResponse::from_raw(raw).unwrap();
            black_box(view.predictions())
        })
    });

    let sse: String = (0..100)
        .map(|i| format!("data: {{\"response\":\"token{}\"}}\n\n", i))
        .chain(std::iter::once("data: [DONE]\n\n".to_string()))
        .collect();

    c.bench_function("sse_decode_100_events", |b| {
        b.iter(|| {
            let mut decoder = SseDecoder::new();
            let mut fragments = Vec::new();
            for chunk in sse.as_bytes().chunks(37) {
                fragments.extend(decoder.push(chunk));
            }
            black_box(fragments)
        })
    });
}

criterion_group!(benches, benchmark_request_building, benchmark_response_views);
criterion_main!(benches);
