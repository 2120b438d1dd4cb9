mod protocol;
mod transport;
