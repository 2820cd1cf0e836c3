use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

const PORT: &str = "PORT";

const DEFAULT_PORT: u16 = 4000;

const DEFAULT_ADDR: Ipv4Addr = Ipv4Addr::new(127, 0, 0, 1);

pub fn get_default_bind() -> SocketAddr {
    SocketAddr::from((DEFAULT_ADDR, DEFAULT_PORT))
}

pub fn get_port() -> Option<u16> {
    std::env::var(PORT).ok().and_then(|res| res.parse().ok())
}

const DB_PATH: &str = "COMMAND_CENTER_DB";

pub fn get_db_path() -> Option<PathBuf> {
    std::env::var(DB_PATH).ok().map(PathBuf::from)
}

/// Round to one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
