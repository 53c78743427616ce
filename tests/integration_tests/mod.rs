// Aggregates per-area integration suites under integration_tests/*
pub(crate) mod _support;
mod dao;
mod dsl;
mod resource;
mod utils;
