//! Analysis orchestration.
//!
//! One analysis run loads and inspects the file, then launches the three insight tasks
//! (extraction, vulnerability scan, summary) concurrently. Each task calls the capability
//! under its own timeout, parses the response, and streams items into a single collector
//! which is the only writer of the `AnalysisResult`. A task that fails, times out or is
//! cancelled contributes nothing; the run still succeeds. Only file access and size-cap
//! errors are fatal.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub use crate::analysis::AnalysisError;
use crate::analysis::{describe_file_type, Inspector};
use crate::config::{AnalysisSettings, DEFAULT_SAMPLE_LEN, DEFAULT_TASK_TIMEOUT_SECS};
use crate::model::{AnalysisResult, FileInfo, Finding, Vulnerability};
use crate::services::insight::{CapabilityRegistry, InsightCapability, InsightError};
use crate::services::responses;

/// The insight tasks run for every file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Extraction,
    VulnerabilityScan,
    Summary,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] =
        [TaskKind::Extraction, TaskKind::VulnerabilityScan, TaskKind::Summary];

    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Extraction => "extraction",
            TaskKind::VulnerabilityScan => "vulnerability_scan",
            TaskKind::Summary => "summary",
        }
    }

    /// Prompt for this task over the given file type, architecture and content sample.
    pub fn prompt(&self, file_type: &str, arch: Option<&str>, sample: &str) -> String {
        let arch_line = arch.map(|a| format!("Architecture: {a}\n")).unwrap_or_default();
        match self {
            TaskKind::Extraction => format!(
                "Analyze this {file_type} file and extract key information:\n\
                 {arch_line}\
                 Content sample: {sample}\n\n\
                 Provide detailed findings about the structure, imports, dependencies, \
                 or other notable elements.\n\
                 Write one finding per line using the format:\n\
                 TYPE: DESCRIPTION: LOCATION: SEVERITY\n\
                 where SEVERITY is Low, Medium or High.\n"
            ),
            TaskKind::VulnerabilityScan => format!(
                "Analyze this {file_type} file for potential security vulnerabilities:\n\
                 {arch_line}\
                 Content sample: {sample}\n\n\
                 Identify any security vulnerabilities, weaknesses, or concerns.\n\
                 Write one vulnerability per line using the format:\n\
                 TYPE: DESCRIPTION: LOCATION: SEVERITY: CVSS: REMEDIATION\n\
                 where SEVERITY is Low, Medium or High and CVSS is a score from 0.0 to 10.0.\n"
            ),
            TaskKind::Summary => format!(
                "Provide a concise summary of this {file_type} file:\n\
                 {arch_line}\
                 Content sample: {sample}\n\n\
                 Summarize its purpose, functionality, and any notable characteristics.\n"
            ),
        }
    }

    fn parse(&self, response: &str) -> Result<Vec<TaskItem>, InsightError> {
        let items: Vec<TaskItem> = match self {
            TaskKind::Extraction => {
                responses::parse_findings(response).into_iter().map(TaskItem::Finding).collect()
            }
            TaskKind::VulnerabilityScan => responses::parse_vulnerabilities(response)
                .into_iter()
                .map(TaskItem::Vulnerability)
                .collect(),
            TaskKind::Summary => {
                responses::parse_summary(response).map(TaskItem::Summary).into_iter().collect()
            }
        };
        if items.is_empty() {
            return Err(InsightError::Unparseable(format!(
                "no {} items in a {} byte response",
                self.label(),
                response.len()
            )));
        }
        Ok(items)
    }
}

/// Item streamed from a task to the collector.
#[derive(Debug, Clone)]
enum TaskItem {
    Finding(Finding),
    Vulnerability(Vulnerability),
    Summary(String),
}

/// How a task ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Succeeded { items: usize },
    Failed { reason: String },
    TimedOut,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task: TaskKind,
    #[serde(flatten)]
    pub status: TaskStatus,
}

impl TaskOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, TaskStatus::Succeeded { .. })
    }
}

/// Everything one run produced: the merged result plus per-task outcomes.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub info: FileInfo,
    pub result: AnalysisResult,
    pub outcomes: Vec<TaskOutcome>,
    /// Content the run analyzed, as loaded once at the start.
    pub bytes: Arc<[u8]>,
}

/// Requests cancellation of the runs holding its tokens.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken { rx: self.tx.subscribe() }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Pends forever if the source is dropped
    /// without cancelling.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Runs the insight tasks for a file against one capability.
#[derive(Clone)]
pub struct Orchestrator {
    capability: Arc<dyn InsightCapability>,
    inspector: Arc<Inspector>,
    task_timeout: Duration,
    sample_len: usize,
    // Present when the capability is not reentrant.
    gate: Option<Arc<Mutex<()>>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("capability", &self.capability.name())
            .field("inspector", &self.inspector)
            .field("task_timeout", &self.task_timeout)
            .field("sample_len", &self.sample_len)
            .field("serialized", &self.gate.is_some())
            .finish()
    }
}

impl Orchestrator {
    pub fn new(capability: Arc<dyn InsightCapability>) -> Self {
        let gate = (!capability.is_reentrant()).then(|| Arc::new(Mutex::new(())));
        Self {
            capability,
            inspector: Arc::new(Inspector::default()),
            task_timeout: Duration::from_secs(DEFAULT_TASK_TIMEOUT_SECS),
            sample_len: DEFAULT_SAMPLE_LEN,
            gate,
        }
    }

    /// Build the capability named by `settings.model` and apply the remaining settings.
    pub fn from_settings(
        registry: &CapabilityRegistry,
        settings: &AnalysisSettings,
    ) -> Result<Self, InsightError> {
        let capability = registry.build(&settings.model, settings)?;
        Ok(Self::new(capability)
            .with_inspector(settings.inspector())
            .with_task_timeout(settings.task_timeout())
            .with_sample_len(settings.sample_len))
    }

    pub fn with_inspector(mut self, inspector: Inspector) -> Self {
        self.inspector = Arc::new(inspector);
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_sample_len(mut self, len: usize) -> Self {
        self.sample_len = len;
        self
    }

    pub fn capability_name(&self) -> &str {
        self.capability.name()
    }

    /// True when capability calls are serialized.
    pub fn serializes_calls(&self) -> bool {
        self.gate.is_some()
    }

    /// Analyze a file, returning the merged result.
    pub async fn analyze(&self, path: &Path) -> Result<AnalysisResult, AnalysisError> {
        Ok(self.analyze_detailed(path, CancelToken::never()).await?.result)
    }

    /// Analyze a file, reporting how each task ended. Cancelling `cancel` stops the tasks
    /// still running; items already collected are kept.
    pub async fn analyze_detailed(
        &self,
        path: &Path,
        cancel: CancelToken,
    ) -> Result<AnalysisRun, AnalysisError> {
        let inspector = Arc::clone(&self.inspector);
        let owned = path.to_path_buf();
        let (file, info) = tokio::task::spawn_blocking(move || {
            let file = inspector.load(&owned)?;
            let info = inspector.inspect_loaded(&file);
            Ok::<_, AnalysisError>((file, info))
        })
        .await
        .map_err(|e| AnalysisError::Internal(e.to_string()))??;

        let file_type = describe_file_type(&info, &file.bytes);
        info!(
            file = %file.name,
            size = file.size,
            file_type = %file_type,
            capability = self.capability.name(),
            "starting analysis"
        );

        let sample_end = file.bytes.len().min(self.sample_len);
        let sample = String::from_utf8_lossy(&file.bytes[..sample_end]).into_owned();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();
        for kind in TaskKind::ALL {
            let prompt = kind.prompt(&file_type, info.arch.as_deref(), &sample);
            tasks.spawn(run_task(TaskContext {
                kind,
                prompt,
                capability: Arc::clone(&self.capability),
                gate: self.gate.clone(),
                timeout: self.task_timeout,
                cancel: cancel.clone(),
                tx: tx.clone(),
            }));
        }
        drop(tx);

        let mut result = AnalysisResult::new(file.name.clone(), file_type, file.size);
        while let Some(item) = rx.recv().await {
            match item {
                TaskItem::Finding(finding) => result.findings.push(finding),
                TaskItem::Vulnerability(vuln) => result.vulnerabilities.push(vuln),
                TaskItem::Summary(summary) => result.summary = summary,
            }
        }

        let mut outcomes = Vec::with_capacity(TaskKind::ALL.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => warn!(error = %err, "analysis task aborted"),
            }
        }
        for kind in TaskKind::ALL {
            if !outcomes.iter().any(|o| o.task == kind) {
                outcomes.push(TaskOutcome {
                    task: kind,
                    status: TaskStatus::Failed { reason: "task aborted".into() },
                });
            }
        }
        outcomes.sort_by_key(|o| o.task);

        if outcomes.iter().any(TaskOutcome::succeeded) {
            info!(
                file = %result.filename,
                findings = result.findings.len(),
                vulnerabilities = result.vulnerabilities.len(),
                has_summary = !result.summary.is_empty(),
                "analysis complete"
            );
        } else {
            warn!(file = %result.filename, "no analysis task succeeded; result is inconclusive");
        }

        Ok(AnalysisRun { info, result, outcomes, bytes: file.bytes })
    }
}

struct TaskContext {
    kind: TaskKind,
    prompt: String,
    capability: Arc<dyn InsightCapability>,
    gate: Option<Arc<Mutex<()>>>,
    timeout: Duration,
    cancel: CancelToken,
    tx: mpsc::UnboundedSender<TaskItem>,
}

async fn run_task(ctx: TaskContext) -> TaskOutcome {
    let TaskContext { kind, prompt, capability, gate, timeout, mut cancel, tx } = ctx;

    let call = async {
        // The timeout covers the call itself, not the wait for the gate.
        let _permit = match &gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };
        debug!(task = kind.label(), "calling capability");
        match tokio::time::timeout(timeout, capability.generate(&prompt)).await {
            Ok(response) => response,
            Err(_) => Err(InsightError::Timeout(timeout)),
        }
    };

    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(InsightError::Cancelled),
        response = call => response,
    };

    let status = match response.and_then(|text| kind.parse(&text)) {
        Ok(items) => {
            let count = items.len();
            for item in items {
                // The collector outlives every task; a closed channel means the run was dropped.
                if tx.send(item).is_err() {
                    break;
                }
            }
            debug!(task = kind.label(), items = count, "task finished");
            TaskStatus::Succeeded { items: count }
        }
        Err(InsightError::Timeout(limit)) => {
            warn!(task = kind.label(), timeout = ?limit, "analysis task timed out");
            TaskStatus::TimedOut
        }
        Err(InsightError::Cancelled) => {
            debug!(task = kind.label(), "analysis task cancelled");
            TaskStatus::Cancelled
        }
        Err(err) => {
            warn!(task = kind.label(), error = %err, "analysis task failed");
            TaskStatus::Failed { reason: err.to_string() }
        }
    };
    TaskOutcome { task: kind, status }
}
