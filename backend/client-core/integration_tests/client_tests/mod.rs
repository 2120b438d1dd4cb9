mod client;
pub mod helpers;
