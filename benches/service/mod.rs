mod history;
mod orders;

pub fn register_benchmarks(c: &mut criterion::Criterion) {
    history::register_benchmarks(c);
    orders::register_benchmarks(c);
}
