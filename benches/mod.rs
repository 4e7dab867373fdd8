use criterion::{criterion_group, criterion_main};

mod cache;
mod service;

use cache::basic::benchmark_cache_basics;
use cache::register_benchmarks as register_cache_benchmarks;
use service::register_benchmarks as register_service_benchmarks;

criterion_group!(
    benches,
    benchmark_cache_basics,
    register_cache_benchmarks,
    register_service_benchmarks,
);

criterion_main!(benches);
