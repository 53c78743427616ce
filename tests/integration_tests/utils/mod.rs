mod bench_tests;
mod config_tests;
mod logger_tests;
