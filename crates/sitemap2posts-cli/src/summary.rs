//! Sync report rendering and GitHub Actions step outputs

use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Result of syncing one feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Submitted {
        posts_count: usize,
        job_id: Option<String>,
        message: String,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOutcome {
    pub feed_id: String,
    pub status: FeedStatus,
}

impl FeedOutcome {
    pub fn submitted(
        feed_id: impl Into<String>,
        posts_count: usize,
        job_id: Option<String>,
    ) -> Self {
        let message = if posts_count == 0 {
            "No posts found".to_string()
        } else {
            format!("Submitted {posts_count} posts")
        };
        Self {
            feed_id: feed_id.into(),
            status: FeedStatus::Submitted {
                posts_count,
                job_id,
                message,
            },
        }
    }

    pub fn failed(feed_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            feed_id: feed_id.into(),
            status: FeedStatus::Failed {
                error: error.into(),
            },
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self.status, FeedStatus::Submitted { .. })
    }

    const fn posts_count(&self) -> usize {
        match self.status {
            FeedStatus::Submitted { posts_count, .. } => posts_count,
            FeedStatus::Failed { .. } => 0,
        }
    }
}

/// Outcomes of one sync run, in feed order
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<FeedOutcome>,
}

impl SyncReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: FeedOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn total_feeds(&self) -> usize {
        self.outcomes.len()
    }

    pub fn total_posts(&self) -> usize {
        self.outcomes.iter().map(FeedOutcome::posts_count).sum()
    }

    pub fn successful_feeds(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed_feeds(&self) -> usize {
        self.total_feeds() - self.successful_feeds()
    }

    /// Step outputs as `(name, value)` pairs
    pub fn outputs(&self) -> [(&'static str, String); 4] {
        [
            ("total_posts", self.total_posts().to_string()),
            ("successful_feeds", self.successful_feeds().to_string()),
            ("failed_feeds", self.failed_feeds().to_string()),
            ("total_feeds", self.total_feeds().to_string()),
        ]
    }

    /// Render the Markdown job summary.
    pub fn to_markdown(&self) -> String {
        let total = self.total_feeds();
        let mut md = String::new();
        let _ = writeln!(md, "# 🔄 Obstracts Feed Sync Report\n");
        let _ = writeln!(
            md,
            "**Sync Time:** {}\n",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(md, "**Total Feeds:** {total}\n");
        let _ = writeln!(md, "---\n");

        for outcome in &self.outcomes {
            match &outcome.status {
                FeedStatus::Submitted {
                    posts_count,
                    job_id,
                    message,
                } => {
                    let _ = writeln!(md, "## ✅ Feed: `{}`\n", outcome.feed_id);
                    let _ = writeln!(md, "- **Posts Submitted:** {posts_count}");
                    if let Some(job_id) = job_id {
                        let _ = writeln!(md, "- **Job ID:** `{job_id}`");
                    }
                    let _ = writeln!(md, "- **Message:** {message}\n");
                },
                FeedStatus::Failed { error } => {
                    let _ = writeln!(md, "## ❌ Feed: `{}`\n", outcome.feed_id);
                    let _ = writeln!(md, "- **Status:** Failed");
                    let _ = writeln!(md, "- **Error:** {error}\n");
                },
            }
        }

        let _ = writeln!(md, "---\n");
        let _ = writeln!(md, "## 📊 Summary\n");
        let _ = writeln!(md, "- **Total Posts Submitted:** {}", self.total_posts());
        let _ = writeln!(
            md,
            "- **Successful Feeds:** {}/{total}",
            self.successful_feeds()
        );
        let _ = writeln!(md, "- **Failed Feeds:** {}/{total}", self.failed_feeds());
        md
    }
}

/// Markdown section reported when a sync cannot start
pub fn error_section(title: &str, message: &str) -> String {
    format!("## ❌ {title}\n\n{message}\n")
}

/// GitHub Actions environment files.
///
/// Writes are no-ops outside of Actions (`GITHUB_ACTIONS` unset or not
/// `true`) and when the corresponding file variable is missing.
#[derive(Debug, Clone, Default)]
pub struct GitHubActions {
    enabled: bool,
    step_summary: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl GitHubActions {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true"),
            step_summary: std::env::var_os("GITHUB_STEP_SUMMARY").map(PathBuf::from),
            output: std::env::var_os("GITHUB_OUTPUT").map(PathBuf::from),
        }
    }

    /// Append Markdown to the job summary.
    pub fn write_summary(&self, markdown: &str) {
        if !self.enabled {
            return;
        }
        if let Some(path) = &self.step_summary {
            match append(path, markdown) {
                Ok(()) => info!("GitHub Actions summary written"),
                Err(e) => error!("Failed to write GitHub Actions summary: {}", e),
            }
        }
    }

    /// Append `name=value` lines to the step outputs.
    pub fn set_outputs(&self, outputs: &[(&str, String)]) {
        if !self.enabled {
            return;
        }
        if let Some(path) = &self.output {
            let lines: String = outputs
                .iter()
                .map(|(name, value)| format!("{name}={value}\n"))
                .collect();
            if let Err(e) = append(path, &lines) {
                error!("Failed to set GitHub output: {}", e);
            }
        }
    }
}

fn append(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    Ok(())
}
