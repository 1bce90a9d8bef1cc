mod common;
mod generate_tests;
mod template_tests;
