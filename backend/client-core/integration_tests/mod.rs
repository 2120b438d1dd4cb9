mod client_tests;
mod errors;
