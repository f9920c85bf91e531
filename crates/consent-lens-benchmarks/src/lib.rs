//! Benchmark crate; see `tests/nfr_smoke.rs`.
