//! Periodic background jobs spawned from `main`.

pub mod stale_top_ups;
