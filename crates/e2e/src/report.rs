//! Result and attachment files for the report generator
//!
//! Everything is written into one results directory in the layout Allure
//! reads: a `<uuid>-result.json` per test, `<uuid>-attachment.<ext>` per
//! attachment, plus `environment.properties` and `executor.json` once per
//! run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;
use xyzbank_common::Settings;

use crate::error::{E2eError, E2eResult};
use crate::lifecycle::TestInfo;

/// Body of a diagnostic attachment
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentContent {
    Text(String),
    Binary(Vec<u8>),
}

/// A named artifact attached to a test's report entry
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticAttachment {
    pub name: String,
    pub mime_type: String,
    pub content: AttachmentContent,
}

impl DiagnosticAttachment {
    pub fn text(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mime_type: "text/plain".to_string(),
            content: AttachmentContent::Text(body.into()),
        }
    }

    pub fn png(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: "image/png".to_string(),
            content: AttachmentContent::Binary(bytes),
        }
    }

    fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "text/plain" => "txt",
            "image/png" => "png",
            "application/json" => "json",
            _ => "bin",
        }
    }

    fn bytes(&self) -> &[u8] {
        match &self.content {
            AttachmentContent::Text(text) => text.as_bytes(),
            AttachmentContent::Binary(bytes) => bytes,
        }
    }
}

/// Destination for diagnostic attachments
pub trait AttachmentSink: Send + Sync {
    fn attach(&self, attachment: DiagnosticAttachment) -> E2eResult<()>;
}

/// Final state of one test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    /// Setup failed before the body ran
    Broken,
    /// Disabled
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDetails {
    pub message: String,
    pub trace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub name: String,
    pub source: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// One `<uuid>-result.json` document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResult {
    pub uuid: String,
    pub history_id: String,
    pub name: String,
    pub full_name: String,
    pub status: TestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_details: Option<StatusDetails>,
    pub stage: String,
    pub start: i64,
    pub stop: i64,
    pub labels: Vec<Label>,
    pub attachments: Vec<AttachmentRef>,
}

/// Writes result and attachment files into the results directory
#[derive(Debug, Clone)]
pub struct AllureWriter {
    dir: PathBuf,
}

impl AllureWriter {
    pub fn new(dir: impl Into<PathBuf>) -> E2eResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open a report entry for a test that is about to start
    pub fn begin(&self, info: &TestInfo) -> ReportEntry {
        ReportEntry {
            uuid: Uuid::new_v4().to_string(),
            info: info.clone(),
            start: chrono::Utc::now().timestamp_millis(),
            dir: self.dir.clone(),
            attachments: Mutex::new(Vec::new()),
        }
    }

    /// Close an entry and write its result document
    pub fn finish(
        &self,
        entry: ReportEntry,
        status: TestStatus,
        details: Option<StatusDetails>,
    ) -> E2eResult<PathBuf> {
        let mut labels = vec![Label {
            name: "suite".to_string(),
            value: entry.info.suite.clone(),
        }];
        labels.extend(entry.info.tags.iter().map(|tag| Label {
            name: "tag".to_string(),
            value: tag.clone(),
        }));

        let full_name = entry.info.full_name();
        let result = ReportResult {
            history_id: history_id(&full_name),
            name: entry.info.name.clone(),
            full_name,
            status,
            status_details: details,
            stage: "finished".to_string(),
            start: entry.start,
            stop: chrono::Utc::now().timestamp_millis(),
            labels,
            attachments: entry.attachments.into_inner(),
            uuid: entry.uuid,
        };

        let path = self.dir.join(format!("{}-result.json", result.uuid));
        std::fs::write(&path, serde_json::to_string_pretty(&result)?)?;
        debug!("Result written to {}", path.display());
        Ok(path)
    }
}

/// Stable id that links runs of the same test across reports
fn history_id(full_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(full_name.as_bytes());
    hex::encode(hasher.finalize())
}

/// Report bookkeeping for one running test
pub struct ReportEntry {
    uuid: String,
    info: TestInfo,
    start: i64,
    dir: PathBuf,
    attachments: Mutex<Vec<AttachmentRef>>,
}

impl ReportEntry {
    pub fn attachment_count(&self) -> usize {
        self.attachments.lock().len()
    }
}

impl AttachmentSink for ReportEntry {
    fn attach(&self, attachment: DiagnosticAttachment) -> E2eResult<()> {
        let source = format!("{}-attachment.{}", Uuid::new_v4(), attachment.extension());
        std::fs::write(self.dir.join(&source), attachment.bytes()).map_err(|e| {
            E2eError::Attachment(format!("cannot write '{}': {}", attachment.name, e))
        })?;

        debug!("Attached '{}' as {}", attachment.name, source);
        self.attachments.lock().push(AttachmentRef {
            name: attachment.name,
            source,
            mime_type: attachment.mime_type,
        });
        Ok(())
    }
}

/// CI build that produced the run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_order: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
}

/// Descriptive facts about a run, folded into the published report
#[derive(Debug, Clone)]
pub struct RunMetadata {
    pub environment: BTreeMap<String, String>,
    pub executor: ExecutorInfo,
}

impl RunMetadata {
    pub fn collect(settings: &Settings, executor: ExecutorInfo) -> Self {
        let mut environment = BTreeMap::new();
        environment.insert("Base.URL".to_string(), settings.base_url.clone());
        environment.insert("Headless".to_string(), settings.headless.to_string());
        environment.insert("Browser".to_string(), "Chromium".to_string());
        environment.insert(
            "Explicit.Wait".to_string(),
            format!("{}s", settings.explicit_wait.as_secs()),
        );
        environment.insert("OS".to_string(), std::env::consts::OS.to_string());
        environment.insert("Arch".to_string(), std::env::consts::ARCH.to_string());
        environment.insert("Suite.Version".to_string(), xyzbank_common::VERSION.to_string());

        Self {
            environment,
            executor,
        }
    }

    /// Write `environment.properties` and `executor.json` into `dir`
    pub fn export(&self, dir: &Path) -> E2eResult<()> {
        std::fs::create_dir_all(dir)?;

        let properties: String = self
            .environment
            .iter()
            .map(|(key, value)| {
                format!("{}={}\n", escape_property(key, true), escape_property(value, false))
            })
            .collect();
        std::fs::write(dir.join("environment.properties"), properties)?;

        std::fs::write(
            dir.join("executor.json"),
            serde_json::to_string_pretty(&self.executor)?,
        )?;

        info!("Run metadata written to {}", dir.display());
        Ok(())
    }
}

/// Escape text for a `.properties` line the way `java.util.Properties`
/// stores it. Spaces are escaped everywhere in a key but only leading in a value.
fn escape_property(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn info() -> TestInfo {
        TestInfo::new("CustomerTests", "deposit_updates_balance").with_tags(["customer", "smoke"])
    }

    #[test]
    fn test_entry_writes_attachments_and_result() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AllureWriter::new(dir.path()).unwrap();
        let entry = writer.begin(&info());

        entry
            .attach(DiagnosticAttachment::text("Error overview", "boom"))
            .unwrap();
        entry
            .attach(DiagnosticAttachment::png("Failure screenshot", vec![0x89, b'P']))
            .unwrap();
        assert_eq!(entry.attachment_count(), 2);

        let path = writer
            .finish(
                entry,
                TestStatus::Failed,
                Some(StatusDetails {
                    message: "boom".to_string(),
                    trace: "trace".to_string(),
                }),
            )
            .unwrap();

        let result: ReportResult =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(result.status, TestStatus::Failed);
        assert_eq!(result.full_name, "CustomerTests.deposit_updates_balance");
        assert_eq!(result.attachments.len(), 2);
        assert_eq!(result.attachments[0].mime_type, "text/plain");
        assert!(result.attachments[1].source.ends_with(".png"));
        assert_eq!(result.labels.iter().filter(|l| l.name == "tag").count(), 2);

        let text = std::fs::read_to_string(dir.path().join(&result.attachments[0].source)).unwrap();
        assert_eq!(text, "boom");
    }

    #[test]
    fn test_history_id_is_stable() {
        assert_eq!(history_id("A.b"), history_id("A.b"));
        assert_ne!(history_id("A.b"), history_id("A.c"));
        assert_eq!(history_id("A.b").len(), 64);
    }

    #[test]
    fn test_export_run_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            base_url: "http://bank.test/#/login".to_string(),
            headless: true,
            implicit_wait: std::time::Duration::from_secs(5),
            explicit_wait: std::time::Duration::from_secs(15),
            page_load_timeout: std::time::Duration::from_secs(30),
            maximize_window: true,
            screenshot_on_failure: true,
            results_dir: dir.path().to_path_buf(),
        };
        let metadata = RunMetadata::collect(
            &settings,
            ExecutorInfo {
                name: "GitHub Actions".to_string(),
                kind: "github".to_string(),
                build_order: Some(42),
                ..Default::default()
            },
        );
        metadata.export(dir.path()).unwrap();

        let props = std::fs::read_to_string(dir.path().join("environment.properties")).unwrap();
        assert!(props.contains("Base.URL=http\\://bank.test/\\#/login\n"));
        assert!(props.contains("Headless=true\n"));

        let executor: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("executor.json")).unwrap())
                .unwrap();
        assert_eq!(executor["buildOrder"], 42);
        assert_eq!(executor["type"], "github");
        assert!(executor.get("buildUrl").is_none());
    }

    #[test_case("C:\\results", false, "C\\:\\\\results" ; "backslash and colon")]
    #[test_case("line one\nline two", false, "line one\\nline two" ; "newline")]
    #[test_case(" padded value", false, "\\ padded value" ; "leading space in value")]
    #[test_case("Build Name", true, "Build\\ Name" ; "space in key")]
    #[test_case("a=b", true, "a\\=b" ; "separator in key")]
    #[test_case("Chromium", false, "Chromium" ; "plain")]
    fn test_escape_property(text: &str, is_key: bool, expected: &str) {
        assert_eq!(escape_property(text, is_key), expected);
    }

    #[test]
    fn test_export_escapes_environment_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut environment = BTreeMap::new();
        environment.insert("Results Dir".to_string(), "C:\\results\\run 1".to_string());
        environment.insert("Notes".to_string(), "first\nsecond".to_string());
        let metadata = RunMetadata {
            environment,
            executor: ExecutorInfo::default(),
        };
        metadata.export(dir.path()).unwrap();

        let props = std::fs::read_to_string(dir.path().join("environment.properties")).unwrap();
        let lines: Vec<&str> = props.lines().collect();
        assert_eq!(
            lines,
            vec!["Notes=first\\nsecond", "Results\\ Dir=C\\:\\\\results\\\\run 1"]
        );
    }
}
