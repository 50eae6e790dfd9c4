pub mod support;

mod amm_tests;
mod cache_tests;
mod compute_tests;
mod ingest_tests;
mod route_tests;
mod timeseries_tests;
mod week_tests;
