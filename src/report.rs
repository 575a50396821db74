use crate::suite::CaseOutcome;
use anyhow::Context;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

pub const REPORT_FILE: &str = "report.md";
pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary<'a> {
    started_at: String,
    finished_at: String,
    total: usize,
    passed: usize,
    failed: usize,
    cases: &'a [CaseOutcome],
}

#[derive(Debug)]
pub struct Report {
    started_at: DateTime<Local>,
    finished_at: DateTime<Local>,
    outcomes: Vec<CaseOutcome>,
}

impl Report {
    pub fn new(started_at: DateTime<Local>, outcomes: Vec<CaseOutcome>) -> Self {
        Self {
            started_at,
            finished_at: Local::now(),
            outcomes,
        }
    }

    pub fn outcomes(&self) -> &[CaseOutcome] {
        &self.outcomes
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| !outcome.passed).count()
    }

    pub fn passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Writes `report.md` and `summary.json` under `<root>/<start timestamp>/`
    /// and returns that directory.
    pub fn write<P: AsRef<Path>>(&self, root: P) -> anyhow::Result<PathBuf> {
        let directory = root
            .as_ref()
            .join(self.started_at.format("%Y-%m-%d_%H-%M-%S").to_string());
        fs::create_dir_all(&directory)
            .with_context(|| format!("creating report directory {}", directory.display()))?;

        self.write_markdown(&directory.join(REPORT_FILE))?;
        self.write_summary(&directory.join(SUMMARY_FILE))?;

        Ok(directory)
    }

    fn write_markdown(&self, path: &Path) -> anyhow::Result<()> {
        let mut file = File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;

        write!(
            file,
            "# Booking API suite\n\nStarted {}, finished {}: {} of {} cases passed.\n\n",
            self.started_at.to_rfc3339(),
            self.finished_at.to_rfc3339(),
            self.outcomes.len() - self.failed_count(),
            self.outcomes.len()
        )?;

        for (number, outcome) in self.outcomes.iter().enumerate() {
            write!(
                file,
                "## Case {}: [{}] {} ({})\n\n",
                number,
                outcome.group,
                outcome.name,
                if outcome.passed { "PASSED" } else { "FAILED" }
            )?;

            if let Some(body) = &outcome.request_body {
                write!(file, "### Request body:\n\n```\n{}\n```\n\n", body)?;
            }

            if let (Some(status_code), Some(body)) = (outcome.status_code, &outcome.response_body) {
                write!(
                    file,
                    "### Response body ({}, {} ms):\n\n```\n{}\n```\n\n",
                    status_code,
                    outcome.elapsed_ms.unwrap_or_default(),
                    body
                )?;
            }

            if outcome.slow {
                write!(file, "Response time exceeded the threshold.\n\n")?;
            }

            if let Some(failure) = &outcome.failure {
                write!(file, "### Failure:\n\n```\n{}\n```\n\n", failure)?;
            }
        }

        Ok(())
    }

    fn write_summary(&self, path: &Path) -> anyhow::Result<()> {
        let failed = self.failed_count();
        let summary = Summary {
            started_at: self.started_at.to_rfc3339(),
            finished_at: self.finished_at.to_rfc3339(),
            total: self.outcomes.len(),
            passed: self.outcomes.len() - failed,
            failed,
            cases: &self.outcomes,
        };

        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(file, &summary)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn writes_markdown_and_summary() {
        let dir = tempfile::tempdir().unwrap();
        let mut ping = CaseOutcome::new("system", "Ping").expecting(201);
        ping.slow = true;
        let outcomes = vec![
            ping,
            CaseOutcome::new("invalidBookingData", "Missing first name")
                .with_request(&serde_json::json!({"lastname": "Doe"}))
                .expecting(400)
                .failed("expected status 400 but got 200"),
        ];
        let report = Report::new(Local::now(), outcomes);

        let written = report.write(dir.path()).unwrap();

        let markdown = fs::read_to_string(written.join(REPORT_FILE)).unwrap();
        assert!(markdown.contains("## Case 0: [system] Ping (PASSED)"));
        assert!(markdown.contains("## Case 1: [invalidBookingData] Missing first name (FAILED)"));
        assert!(markdown.contains("\"lastname\": \"Doe\""));
        assert_eq!(markdown.matches("Response time exceeded the threshold.").count(), 1);

        let summary: Value =
            serde_json::from_str(&fs::read_to_string(written.join(SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(summary["total"], 2);
        assert_eq!(summary["failed"], 1);
        assert_eq!(summary["cases"][1]["expectedStatusCode"], 400);
        assert_eq!(summary["cases"][0]["slow"], true);
        assert!(summary["cases"][1].get("slow").is_none());
        assert!(!report.passed());
    }
}
