//! Fallback handling for questions no pipeline stage could answer.
//!
//! Unanswered questions are appended to a plain-text log so operators can
//! curate new FAQ entries from them later. The log is append-only; rotation
//! is left to external tooling.

use std::path::Path;
use std::path::PathBuf;

use chrono::Local;
use tokio::io::AsyncWriteExt;
use tracing::warn;

pub struct FallbackService {
    log_path: PathBuf,
    message: String,
}

impl FallbackService {
    pub fn new(log_path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            log_path: log_path.into(),
            message: message.into(),
        }
    }

    /// The canned message returned to the user.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Log the question and return the canned fallback message.
    pub async fn fallback_response(&self, question: &str) -> String {
        self.log_question(question).await;
        self.message.clone()
    }

    /// Append one timestamped line to the fallback log. A logging failure
    /// must never break the chat response, so errors are only warned about.
    pub async fn log_question(&self, question: &str) {
        if let Err(e) = self.append_line(question).await {
            warn!("Failed to log unanswered question: {e}");
        }
    }

    async fn append_line(&self, question: &str) -> std::io::Result<()> {
        if let Some(parent) = self.log_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let entry = format!("[{timestamp}] Question: {question}\n");

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        Ok(())
    }

    /// Return the most recent `limit` log lines, skipping blanks and
    /// `#`-prefixed comments. Missing log file reads as empty.
    pub async fn get_logs(&self, limit: Option<usize>) -> Vec<String> {
        let content = match tokio::fs::read_to_string(&self.log_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Failed to read fallback logs: {e}");
                return Vec::new();
            }
        };

        let lines: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(String::from)
            .collect();

        match limit {
            Some(limit) if lines.len() > limit => lines[lines.len() - limit..].to_vec(),
            _ => lines,
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_service(dir: &tempfile::TempDir) -> FallbackService {
        FallbackService::new(dir.path().join("fallback_logs.txt"), "no answer yet")
    }

    #[tokio::test]
    async fn test_fallback_logs_and_returns_message() {
        let dir = tempfile::tempdir().unwrap();
        let service = temp_service(&dir);

        let reply = service.fallback_response("what is xyzzy?").await;
        assert_eq!(reply, "no answer yet");

        let logs = service.get_logs(None).await;
        assert_eq!(logs.len(), 1);
        assert!(logs[0].contains("Question: what is xyzzy?"));
        assert!(logs[0].starts_with('['));
    }

    #[tokio::test]
    async fn test_get_logs_filters_comments_and_limits() {
        let dir = tempfile::tempdir().unwrap();
        let service = temp_service(&dir);

        tokio::fs::write(
            service.log_path(),
            "# header comment\n\n[t1] Question: a\n[t2] Question: b\n[t3] Question: c\n",
        )
        .await
        .unwrap();

        let logs = service.get_logs(Some(2)).await;
        assert_eq!(logs, vec!["[t2] Question: b", "[t3] Question: c"]);
    }

    #[tokio::test]
    async fn test_missing_log_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let service = temp_service(&dir);
        assert!(service.get_logs(Some(10)).await.is_empty());
    }
}
