//! Output formatting and progress reporting

use crate::error::CliResult;
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use reqlist_e2e::{Scenario, ScenarioResult, SelectorRegistry, SuiteResults, TestStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

/// Output format for suite results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text on stderr
    #[default]
    Text,
    /// JSON document on stdout
    Json,
    /// TAP (Test Anything Protocol) on stdout
    Tap,
}

/// Progress reporter for scenario execution
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    /// Print a line without clobbering the progress bar
    fn line(&self, text: &str) {
        match self.progress_bar {
            Some(ref pb) if !pb.is_finished() && !pb.is_hidden() => pb.println(text),
            _ => {
                let _ = self.term.write_line(text);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };

        self.line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // failures print even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };

        self.line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "SKIP".to_string()
        };

        self.line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        self.line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.line("");
        self.line(&styled);
    }

    /// Report one finished scenario
    pub fn scenario(&self, result: &ScenarioResult) {
        self.increment(1);
        match result.status {
            TestStatus::Passed => {
                self.success(&format!("{} ({} ms)", result.id, result.duration_ms));
            }
            TestStatus::Failed => {
                let kind = result
                    .failure_kind
                    .map_or_else(String::new, |k| format!(" [{k}]"));
                self.failure(&format!(
                    "{}{kind}: {}",
                    result.id,
                    result.error.as_deref().unwrap_or("unknown error")
                ));
                if let Some(ref shot) = result.screenshot {
                    self.info(&format!("screenshot: {}", shot.display()));
                }
            }
            TestStatus::Skipped => self.warning(&format!("{} skipped", result.id)),
        }
    }

    /// Print suite summary
    pub fn summary(&self, passed: usize, failed: usize, skipped: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }

        let _ = self.term.write_line("");

        let total = passed + failed + skipped;
        let duration_secs = duration.as_secs_f64();
        let succeeded = failed == 0 && skipped == 0;

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let skipped_style = Style::new().yellow();

            let status = if succeeded {
                passed_style.apply_to("PASSED")
            } else {
                failed_style.apply_to("FAILED")
            };

            let _ = self.term.write_line(&format!(
                "{} {} scenarios in {:.2}s ({} passed, {} failed, {} skipped)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                skipped_style.apply_to(skipped)
            ));
        } else {
            let status = if succeeded { "PASSED" } else { "FAILED" };
            let _ = self.term.write_line(&format!(
                "{status} {total} scenarios in {duration_secs:.2}s ({passed} passed, {failed} failed, {skipped} skipped)"
            ));
        }
    }
}

/// Render results in a machine-readable format; `None` for text, which the
/// reporter prints as it goes
pub fn render(results: &SuiteResults, format: OutputFormat) -> CliResult<Option<String>> {
    match format {
        OutputFormat::Text => Ok(None),
        OutputFormat::Json => Ok(Some(serde_json::to_string_pretty(results)?)),
        OutputFormat::Tap => Ok(Some(render_tap(results))),
    }
}

/// TAP version 13 stream, one test point per scenario
#[must_use]
pub fn render_tap(results: &SuiteResults) -> String {
    let mut out = String::from("TAP version 13\n");
    let _ = writeln!(out, "1..{}", results.total());
    let _ = writeln!(out, "# {} ({} driver)", results.suite_name, results.driver);
    for (index, r) in results.results.iter().enumerate() {
        let number = index + 1;
        match r.status {
            TestStatus::Passed => {
                let _ = writeln!(out, "ok {number} - {}", r.id);
            }
            TestStatus::Skipped => {
                let _ = writeln!(out, "ok {number} - {} # SKIP fail-fast", r.id);
            }
            TestStatus::Failed => {
                let _ = writeln!(out, "not ok {number} - {}", r.id);
                out.push_str("  ---\n");
                if let Some(kind) = r.failure_kind {
                    let _ = writeln!(out, "  kind: {kind}");
                }
                let message = r.error.as_deref().unwrap_or("unknown error");
                let _ = writeln!(out, "  message: {}", serde_json::Value::from(message));
                let _ = writeln!(out, "  state: {}", r.final_state);
                out.push_str("  ...\n");
            }
        }
    }
    out
}

/// One block per scenario: id and tags, title, listing heuristic, outcome
#[must_use]
pub fn render_scenarios(scenarios: &[Arc<dyn Scenario>]) -> String {
    let mut out = String::new();
    for s in scenarios {
        let _ = writeln!(out, "{} {}", s.id(), s.tags().join(" "));
        let _ = writeln!(out, "    {}", s.name());
        let _ = writeln!(out, "    via {}, expects {}", s.source(), s.expected());
    }
    out
}

/// Effective registry as aligned `name  css` lines, or as a `selectors:`
/// block for a configuration file
pub fn render_selectors(registry: &SelectorRegistry, yaml: bool) -> CliResult<String> {
    if yaml {
        let entries: BTreeMap<&str, &str> = registry.iter().collect();
        let mut doc = BTreeMap::new();
        doc.insert("selectors", entries);
        return Ok(serde_yaml_ng::to_string(&doc)?);
    }
    let width = registry.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, css) in registry.iter() {
        let _ = writeln!(out, "{name:<width$}  {css}");
    }
    Ok(out)
}
