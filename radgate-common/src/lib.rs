//! Common utilities and types for radgate

pub mod config;
pub mod constants;
pub mod error;
pub mod secret;

pub use config::{load_config, parse_config, RelayConfig, Settings};
pub use constants::{
    DATAGRAM_BUFFER_SIZE, DEFAULT_ACCT_PORT, DEFAULT_AUTH_PORT, DEFAULT_CONFIG_PATH,
    DEFAULT_LIB_DIR, DEFAULT_UPSTREAM_HOST, DEFAULT_UPSTREAM_PORT, PRODUCT_TAG,
};
pub use error::{RelayError, Result};
pub use secret::{load_secret, parse_secret};
