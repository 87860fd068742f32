//! Dated log/audit files written by a dedicated background worker.
//!
//! Plugins never touch the filesystem on the decision path. They hand entries
//! to a [`DatedLog`], whose worker task appends them in arrival order. Delivery
//! is best effort: entries still queued when the process exits are lost.
//!
//! File naming: `radgate.[<instance>.]<name>.<YYYY-MM-DD>`
//! Line format: `<YYYY-MM-DDTHH:MM:SS> [<TAG>] <message>`

use crate::traits::PluginError;
use chrono::{Local, NaiveDate, NaiveDateTime};
use radgate_common::PRODUCT_TAG;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

enum Command {
    Append {
        name: String,
        tag: String,
        lines: Vec<String>,
        at: NaiveDateTime,
    },
    Replace {
        name: String,
        contents: String,
    },
    Flush(oneshot::Sender<()>),
}

/// Handle to a log worker; cheap to clone
#[derive(Debug, Clone)]
pub struct DatedLog {
    tx: mpsc::UnboundedSender<Command>,
}

impl DatedLog {
    /// Start a worker writing into `dir`. Must be called from within a Tokio runtime.
    pub fn spawn(dir: impl Into<PathBuf>, instance: Option<String>) -> Result<Self, PluginError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| PluginError::Config(format!("log worker needs a runtime: {e}")))?;
        let (tx, rx) = mpsc::unbounded_channel();
        handle.spawn(run_worker(dir.into(), instance, rx));
        Ok(Self { tx })
    }

    /// Queue lines for today's `<name>` file, each prefixed with a timestamp and `tag`.
    pub fn append(&self, name: &str, tag: &str, lines: Vec<String>) {
        self.send(Command::Append {
            name: name.to_string(),
            tag: tag.to_string(),
            lines,
            at: Local::now().naive_local(),
        });
    }

    /// Queue a full rewrite of the undated `<name>` file.
    pub fn replace(&self, name: &str, contents: String) {
        self.send(Command::Replace {
            name: name.to_string(),
            contents,
        });
    }

    /// Wait until everything queued before this call has been written.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Flush(tx));
        let _ = rx.await;
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            debug!("log worker stopped, dropping entry");
        }
    }
}

/// `radgate.[<instance>.]<name>`
pub fn file_stem(name: &str, instance: Option<&str>) -> String {
    match instance.filter(|i| !i.is_empty()) {
        Some(instance) => format!("{PRODUCT_TAG}.{instance}.{name}"),
        None => format!("{PRODUCT_TAG}.{name}"),
    }
}

/// `radgate.[<instance>.]<name>.<YYYY-MM-DD>`
pub fn dated_file_name(name: &str, instance: Option<&str>, date: NaiveDate) -> String {
    format!("{}.{}", file_stem(name, instance), date.format("%Y-%m-%d"))
}

/// `<YYYY-MM-DDTHH:MM:SS> [<TAG>] <message>`
pub fn format_line(at: NaiveDateTime, tag: &str, message: &str) -> String {
    format!(
        "{} [{}] {}\n",
        at.format("%Y-%m-%dT%H:%M:%S"),
        tag.to_uppercase(),
        message
    )
}

async fn run_worker(
    dir: PathBuf,
    instance: Option<String>,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Append {
                name,
                tag,
                lines,
                at,
            } => {
                let path = dir.join(dated_file_name(&name, instance.as_deref(), at.date()));
                let text: String = lines
                    .iter()
                    .map(|line| format_line(at, &tag, line))
                    .collect();
                if let Err(e) = append(&path, text.as_bytes()).await {
                    warn!(path = %path.display(), error = %e, "unable to append log entry");
                }
            }
            Command::Replace { name, contents } => {
                let path = dir.join(file_stem(&name, instance.as_deref()));
                if let Err(e) = tokio::fs::write(&path, contents).await {
                    warn!(path = %path.display(), error = %e, "unable to write file");
                }
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

async fn append(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(dated_file_name("audit", None, date), "radgate.audit.2024-03-09");
        assert_eq!(
            dated_file_name("audit", Some("east"), date),
            "radgate.east.audit.2024-03-09"
        );
        assert_eq!(file_stem("stats.auth", Some("")), "radgate.stats.auth");
    }

    #[test]
    fn test_line_format() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 1)
            .unwrap();
        assert_eq!(
            format_line(at, "passed", "test (mac:112233445566)"),
            "2024-03-09T07:05:01 [PASSED] test (mac:112233445566)\n"
        );
    }

    #[tokio::test]
    async fn test_worker_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = DatedLog::spawn(dir.path(), Some("lab".into())).unwrap();
        log.append("auth", "auth", vec!["first".into()]);
        log.append("auth", "auth", vec!["second".into(), "third".into()]);
        log.replace("stats.auth", "count: 3\n".into());
        log.flush().await;

        let name = dated_file_name("auth", Some("lab"), Local::now().date_naive());
        let contents = std::fs::read_to_string(dir.path().join(name)).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("[AUTH] first"));
        assert!(lines[2].ends_with("[AUTH] third"));

        let stats = std::fs::read_to_string(dir.path().join("radgate.lab.stats.auth")).unwrap();
        assert_eq!(stats, "count: 3\n");
    }
}
