mod connection;
mod patch;
mod runtime;
mod session;
mod snapshot;
mod support;
