//! Cutflow reporting for named filters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Accounting of one named filter over the last pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutflowEntry {
    /// Filter name, as booked.
    pub name: String,
    /// Rows the predicate accepted.
    pub accepted: u64,
    /// Rows the predicate observed (accepted plus rejected).
    pub observed: u64,
}

impl CutflowEntry {
    /// Accept percentage; zero when nothing was observed.
    pub fn percentage(&self) -> f64 {
        if self.observed > 0 {
            self.accepted as f64 / self.observed as f64 * 100.0
        } else {
            0.0
        }
    }
}

impl fmt::Display for CutflowEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: pass={} all={} -- {:.3} %",
            self.name,
            self.accepted,
            self.observed,
            self.percentage()
        )
    }
}

/// Cutflow over every named filter of one root, in booking order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutflowReport {
    entries: Vec<CutflowEntry>,
}

impl CutflowReport {
    pub(crate) fn new(entries: Vec<CutflowEntry>) -> Self {
        Self { entries }
    }

    /// Entries in booking order.
    pub fn entries(&self) -> &[CutflowEntry] {
        &self.entries
    }

    /// Check whether any named filter was booked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Print one line per named filter to stdout.
    pub fn print(&self) {
        for entry in &self.entries {
            println!("{entry}");
        }
    }
}

impl fmt::Display for CutflowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_format() {
        let entry = CutflowEntry {
            name: "gt1".into(),
            accepted: 2,
            observed: 3,
        };
        assert_eq!(entry.to_string(), "gt1: pass=2 all=3 -- 66.667 %");
    }

    #[test]
    fn test_zero_observed_is_zero_percent() {
        let entry = CutflowEntry {
            name: "never".into(),
            accepted: 0,
            observed: 0,
        };
        assert_eq!(entry.to_string(), "never: pass=0 all=0 -- 0.000 %");
    }

    #[test]
    fn test_report_lines_in_order() {
        let report = CutflowReport::new(vec![
            CutflowEntry {
                name: "gt1".into(),
                accepted: 2,
                observed: 3,
            },
            CutflowEntry {
                name: "lt3".into(),
                accepted: 1,
                observed: 2,
            },
        ]);
        assert_eq!(
            report.to_string(),
            "gt1: pass=2 all=3 -- 66.667 %\nlt3: pass=1 all=2 -- 50.000 %"
        );
    }
}
