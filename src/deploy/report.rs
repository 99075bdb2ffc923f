//! Operator-facing progress output.

use std::io::Write;

use crate::deploy::model::{ComponentFailure, DeployState, StatusRecord};

const FAILURE_COLUMNS: [&str; 4] = ["componentType", "fullName", "problemType", "problem"];

/// Renders poll updates as human-readable lines. Consecutive identical
/// records are emitted once; a failure listing is never suppressed just
/// because the deployed count advanced.
pub struct ProgressReporter<W: Write> {
    out: W,
    last: Option<StatusRecord>,
}

impl ProgressReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ProgressReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    /// Handles one freshly parsed status record.
    pub fn observe(&mut self, record: &StatusRecord) {
        if self.last.as_ref() == Some(record) {
            return;
        }

        let mut line = format!("Deployment {}", record.state);
        if record.state == DeployState::InProgress && !record.done {
            line.push_str(&format!(
                " ({}/{})",
                record.components_deployed, record.components_total
            ));
            if let Some(detail) = &record.state_detail {
                line.push_str(&format!(" {detail}"));
            }
        }
        let _ = writeln!(self.out, "{line}");

        if record.is_terminal() && !record.state.is_success() {
            let _ = writeln!(self.out, "\nFailed with {} errors.\n", record.error_count);
            if !record.component_failures.is_empty() {
                let _ = write!(self.out, "{}", failure_table(&record.component_failures));
            }
        }

        self.last = Some(record.clone());
    }

    /// Surfaces a transient mid-poll problem without ending the run.
    pub fn note(&mut self, message: &str) {
        let _ = writeln!(self.out, "{message}");
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Renders component failures as an aligned table with a fixed column order.
pub fn failure_table(failures: &[ComponentFailure]) -> String {
    let mut widths: Vec<usize> = FAILURE_COLUMNS.iter().map(|c| c.chars().count()).collect();
    let rows: Vec<[&str; 4]> = failures
        .iter()
        .map(|f| {
            [
                f.component_type.as_str(),
                f.full_name.as_str(),
                f.problem_type.as_str(),
                f.problem.as_str(),
            ]
        })
        .collect();
    for row in &rows {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let mut table = String::new();
    table.push_str(&render_row(&FAILURE_COLUMNS, &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let rule_refs: Vec<&str> = rule.iter().map(String::as_str).collect();
    table.push_str(&render_row(&rule_refs, &widths));
    for row in &rows {
        table.push_str(&render_row(row, &widths));
    }
    table
}

fn render_row(cells: &[&str], widths: &[usize]) -> String {
    let mut line = String::new();
    for (index, cell) in cells.iter().enumerate() {
        if index > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        // Pad all but the last column.
        if index + 1 < cells.len() {
            let pad = widths[index].saturating_sub(cell.chars().count());
            line.push_str(&" ".repeat(pad));
        }
    }
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_progress(deployed: u64, total: u64, detail: &str) -> StatusRecord {
        StatusRecord {
            done: false,
            state: DeployState::InProgress,
            components_deployed: deployed,
            components_total: total,
            state_detail: Some(detail.to_string()),
            error_count: 0,
            component_failures: Vec::new(),
        }
    }

    fn failed(failures: Vec<ComponentFailure>) -> StatusRecord {
        StatusRecord {
            done: true,
            state: DeployState::Failed,
            components_deployed: 0,
            components_total: 0,
            state_detail: None,
            error_count: failures.len() as u64,
            component_failures: failures,
        }
    }

    fn rendered(reporter: ProgressReporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn progress_line_shows_counts_and_detail() {
        let mut reporter = ProgressReporter::new(Vec::new());
        reporter.observe(&in_progress(3, 10, "Running tests"));
        assert_eq!(
            rendered(reporter),
            "Deployment InProgress (3/10) Running tests\n"
        );
    }

    #[test]
    fn identical_ticks_are_emitted_once() {
        let mut reporter = ProgressReporter::new(Vec::new());
        reporter.observe(&in_progress(3, 10, "Running tests"));
        reporter.observe(&in_progress(3, 10, "Running tests"));
        reporter.observe(&in_progress(4, 10, "Running tests"));
        let output = rendered(reporter);
        assert_eq!(output.matches("(3/10)").count(), 1);
        assert_eq!(output.matches("(4/10)").count(), 1);
    }

    #[test]
    fn terminal_failure_prints_count_and_table() {
        let failures = vec![ComponentFailure {
            component_type: "ApexClass".to_string(),
            full_name: "Foo".to_string(),
            problem_type: "Error".to_string(),
            problem: "Compile error".to_string(),
        }];
        let mut reporter = ProgressReporter::new(Vec::new());
        reporter.observe(&failed(failures));
        let output = rendered(reporter);
        assert!(output.contains("Deployment Failed"));
        assert!(output.contains("Failed with 1 errors."));
        assert!(output.contains("componentType"));
        assert!(output.contains("ApexClass  Foo  Error  Compile error"));
    }

    #[test]
    fn failure_listing_survives_progress_having_advanced() {
        let mut reporter = ProgressReporter::new(Vec::new());
        reporter.observe(&in_progress(9, 10, "Deploying"));
        reporter.observe(&failed(vec![ComponentFailure {
            component_type: "ApexClass".to_string(),
            full_name: "Foo".to_string(),
            problem_type: "Error".to_string(),
            problem: "boom".to_string(),
        }]));
        let output = rendered(reporter);
        assert!(output.contains("(9/10)"));
        assert!(output.contains("Failed with 1 errors."));
        assert!(output.contains("boom"));
    }

    #[test]
    fn table_has_one_row_per_failure_plus_header() {
        let failures: Vec<ComponentFailure> = (0..3)
            .map(|index| ComponentFailure {
                component_type: "ApexClass".to_string(),
                full_name: format!("Class{index}"),
                problem_type: "Error".to_string(),
                problem: String::new(),
            })
            .collect();
        let table = failure_table(&failures);
        // header + rule + 3 rows
        assert_eq!(table.lines().count(), 5);
    }

    #[test]
    fn table_columns_align_on_longest_cell() {
        let failures = vec![
            ComponentFailure {
                component_type: "ApexClass".to_string(),
                full_name: "AVeryLongClassName".to_string(),
                problem_type: "Error".to_string(),
                problem: "x".to_string(),
            },
            ComponentFailure {
                component_type: "Layout".to_string(),
                full_name: "L".to_string(),
                problem_type: "Warning".to_string(),
                problem: "y".to_string(),
            },
        ];
        let table = failure_table(&failures);
        let lines: Vec<&str> = table.lines().collect();
        let column = |line: &str| line.find("Error").or_else(|| line.find("Warning"));
        assert_eq!(column(lines[2]), column(lines[3]));
    }

    #[test]
    fn note_passes_through_raw_text() {
        let mut reporter = ProgressReporter::new(Vec::new());
        reporter.note("ERROR: connection reset");
        assert_eq!(rendered(reporter), "ERROR: connection reset\n");
    }
}
