//! Shared secret resolution.
//!
//! The secrets file is plaintext and line oriented. The relay only supports a
//! single shared secret, keyed to the loopback marker:
//!
//! ```text
//! 127.0.0.1   my-shared-secret
//! ```

use crate::constants::SECRET_MARKER;
use crate::error::{RelayError, Result};
use std::path::Path;

/// Read the shared secret from `path`.
///
/// A missing file, or a file with no qualifying non-empty entry, is an error.
pub fn load_secret(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RelayError::Secret(format!(
            "secrets file {} does not exist",
            path.display()
        )));
    }
    let contents = std::fs::read_to_string(path)?;
    parse_secret(&contents)
}

/// Find the first `127.0.0.1 <secret>` line with a non-empty secret.
pub fn parse_secret(contents: &str) -> Result<String> {
    contents
        .lines()
        .filter_map(|line| line.strip_prefix(SECRET_MARKER))
        .filter(|rest| rest.starts_with(char::is_whitespace))
        .map(str::trim)
        .find(|secret| !secret.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| RelayError::Secret("no secret found".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_simple_secret() {
        assert_eq!(
            parse_secret("127.0.0.1 secretvalue").unwrap(),
            "secretvalue"
        );
    }

    #[test]
    fn test_marker_with_only_whitespace() {
        let err = parse_secret("127.0.0.1    \t ").unwrap_err();
        assert!(err.to_string().contains("no secret found"));
    }

    #[test]
    fn test_first_non_empty_entry_wins() {
        let contents = "# comment\n127.0.0.1   \n10.0.0.1 other\n127.0.0.1\tfirst secret \n127.0.0.1 second\n";
        assert_eq!(parse_secret(contents).unwrap(), "first secret");
    }

    #[test]
    fn test_marker_must_be_followed_by_whitespace() {
        assert!(parse_secret("127.0.0.10 nope").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "127.0.0.1 fromfile").unwrap();
        assert_eq!(load_secret(file.path()).unwrap(), "fromfile");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_secret(dir.path().join("secrets")).unwrap_err();
        assert!(matches!(err, RelayError::Secret(_)));
    }
}
