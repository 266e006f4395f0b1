//! Results collector for the external test harness
//!
//! The harness that exercises the forward kernels treats each test unit as
//! opaque: all it needs back is a pass/fail/error/skip classification and an
//! elapsed time per unit, which it aggregates into a tabular log. This module
//! is that collaborator surface, kept as an explicit object passed through
//! each invocation rather than process-global state. It has no coupling to
//! the kernel data model.

use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

/// Classification of one finished test unit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CaseStatus {
    /// Unit completed and its checks held
    Passed,
    /// Unit completed but a check failed
    Failed,
    /// Unit aborted before its checks ran
    Error,
    /// Unit was not run
    Skipped,
}

impl CaseStatus {
    /// Severity used when one case reports multiple results: the worst
    /// status wins (Error > Failed > Skipped > Passed).
    fn priority(self) -> u8 {
        match self {
            Self::Error => 4,
            Self::Failed => 3,
            Self::Skipped => 2,
            Self::Passed => 1,
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Error => "ERROR",
            Self::Skipped => "SKIPPED",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one test unit.
#[derive(Clone, Debug)]
pub struct CaseResult {
    /// Suite the unit belongs to
    pub suite: String,
    /// Unit name
    pub case: String,
    /// Classification
    pub status: CaseStatus,
    /// Wall-clock time the unit took
    pub elapsed: Duration,
    /// Warnings emitted while running
    pub warnings: u32,
    /// Errors emitted while running
    pub errors: u32,
}

/// Aggregate over everything a collector has recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Cases whose worst status is Passed
    pub passed: usize,
    /// Cases whose worst status is Failed or Error
    pub failed: usize,
    /// Cases whose worst status is Skipped
    pub skipped: usize,
    /// Sum of per-result warning counts
    pub warnings: u64,
    /// Sum of per-result error counts
    pub errors: u64,
    /// Sum of elapsed times
    pub elapsed: Duration,
}

/// Explicit, owned accumulator of test-unit results.
///
/// One collector per harness run; results are recorded as they arrive and
/// reduced on demand. A case recorded several times (retries, repeated
/// parametrizations) resolves to its worst recorded status.
#[derive(Clone, Debug, Default)]
pub struct ReportCollector {
    results: Vec<CaseResult>,
}

impl ReportCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one finished unit.
    pub fn record(&mut self, result: CaseResult) {
        self.results.push(result);
    }

    /// Everything recorded so far, in arrival order.
    pub fn results(&self) -> &[CaseResult] {
        &self.results
    }

    /// Reduce to per-case worst status and aggregate counters.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        let mut seen: Vec<(&str, &str, CaseStatus)> = Vec::new();

        for r in &self.results {
            summary.warnings += u64::from(r.warnings);
            summary.errors += u64::from(r.errors);
            summary.elapsed += r.elapsed;

            match seen
                .iter_mut()
                .find(|(s, c, _)| *s == r.suite && *c == r.case)
            {
                Some(entry) => {
                    if r.status.priority() > entry.2.priority() {
                        entry.2 = r.status;
                    }
                }
                None => seen.push((&r.suite, &r.case, r.status)),
            }
        }

        for (_, _, status) in seen {
            match status {
                CaseStatus::Passed => summary.passed += 1,
                CaseStatus::Failed | CaseStatus::Error => summary.failed += 1,
                CaseStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    /// Write the tabular log the external report generator consumes.
    ///
    /// One row per recorded result, then one `Suite Summary` sentinel row per
    /// suite carrying that suite's aggregates.
    pub fn write_csv<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(w, "Test Suite,Test Case,Status,Time,Warnings,Errors,Skipped")?;
        for r in &self.results {
            writeln!(
                w,
                "{},{},{},{:.3}s,{},{},{}",
                r.suite,
                r.case,
                r.status,
                r.elapsed.as_secs_f64(),
                r.warnings,
                r.errors,
                u8::from(r.status == CaseStatus::Skipped),
            )?;
        }

        let mut suites: Vec<&str> = Vec::new();
        for r in &self.results {
            if !suites.contains(&r.suite.as_str()) {
                suites.push(&r.suite);
            }
        }
        for suite in suites {
            let rows = self.results.iter().filter(|r| r.suite == suite);
            let mut elapsed = Duration::ZERO;
            let mut warnings = 0u64;
            let mut errors = 0u64;
            let mut skipped = 0u64;
            let mut worst = CaseStatus::Passed;
            for r in rows {
                elapsed += r.elapsed;
                warnings += u64::from(r.warnings);
                errors += u64::from(r.errors);
                skipped += u64::from(r.status == CaseStatus::Skipped);
                if r.status.priority() > worst.priority() {
                    worst = r.status;
                }
            }
            let verdict = match worst {
                CaseStatus::Passed => "PASS",
                CaseStatus::Skipped => "SKIPPED",
                CaseStatus::Failed | CaseStatus::Error => "FAIL",
            };
            writeln!(
                w,
                "{},Suite Summary,{},{:.3}s,{},{},{}",
                suite,
                verdict,
                elapsed.as_secs_f64(),
                warnings,
                errors,
                skipped,
            )?;
        }
        Ok(())
    }
}
