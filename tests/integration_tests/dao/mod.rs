mod group_by_tests;
mod query_tests;
mod write_tests;
