//! Default ports, paths and sizes for radgate services.
//!
//! Use these constants instead of magic numbers so defaults stay consistent
//! across the relay, the CLI, and the test harness.

/// Default listen port for the relay (authentication) role.
pub const DEFAULT_AUTH_PORT: u16 = 1812;

/// Default listen port for the accounting role.
pub const DEFAULT_ACCT_PORT: u16 = 1813;

/// Default upstream authority port.
pub const DEFAULT_UPSTREAM_PORT: u16 = 1814;

/// Default upstream authority host.
pub const DEFAULT_UPSTREAM_HOST: &str = "localhost";

/// Default library directory (secrets, users, logs).
pub const DEFAULT_LIB_DIR: &str = "/var/lib/radgate/";

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/radgate/radgate.toml";

/// Datagram buffer size; at least the largest RADIUS packet (4096 bytes).
pub const DATAGRAM_BUFFER_SIZE: usize = 4096;

/// Product tag used as the prefix of every dated log/audit file.
pub const PRODUCT_TAG: &str = "radgate";

/// Line prefix in the secrets file that marks the shared secret entry.
pub const SECRET_MARKER: &str = "127.0.0.1";
