use std::time::Instant;

pub const EPSILON: f64 = 1e-5;

/// Whether every pair of values differs by at most `EPSILON`
pub fn all_close<'a, I>(lhs: I, rhs: I) -> bool
where
    I: IntoIterator<Item = &'a f64>,
{
    lhs.into_iter()
        .zip(rhs)
        .all(|(a, b)| (a - b).abs() <= EPSILON)
}

/// Runs `f` and returns its result along with the wall-clock seconds it took
pub fn timed<T, F: FnOnce() -> T>(f: F) -> (T, f64) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed().as_secs_f64())
}
