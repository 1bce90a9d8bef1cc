mod builder_tests;
mod common;
mod pipeline_tests;
