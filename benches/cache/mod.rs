pub mod basic;
mod contention;

pub fn register_benchmarks(c: &mut criterion::Criterion) {
    contention::register_contention_benchmarks(c);
}
