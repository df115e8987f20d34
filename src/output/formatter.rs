use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::grading::StudentRecord;
use super::render::format_number;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format graded students as a summary table, one line per student:
/// index, primary key, total, grade, secondary key.
///
/// Total falls back to the overall percentage when grand totals are
/// disabled; grade shows `-` when overall grades are disabled. Passing
/// grades are green and failing grades red when colors are on.
pub fn format_summary(students: &[&StudentRecord], places: usize, use_colors: bool) -> String {
    if students.is_empty() {
        return "No students graded.".to_string();
    }

    let key_width = students
        .iter()
        .map(|s| s.primary_key.chars().count())
        .max()
        .unwrap_or(0);
    let total_width = 9;
    let grade_width = students
        .iter()
        .filter_map(|s| s.overall_grade.as_deref())
        .map(|g| g.chars().count())
        .max()
        .unwrap_or(1)
        .max(1);
    let separator = "  ";

    let term_width = get_terminal_width();

    students
        .iter()
        .enumerate()
        .map(|(idx, student)| {
            let index_str = format!("{:>3}.", idx + 1);
            let key = format!("{:<width$}", student.primary_key, width = key_width);
            let total = student.grand_total.unwrap_or(student.overall_percentage);
            let total_str = format!("{:>width$}", format_number(total, places), width = total_width);
            let grade = student.overall_grade.as_deref().unwrap_or("-");
            let grade_str = format!("{:<width$}", grade, width = grade_width);

            let fixed_width = 4 + 1 + key_width + total_width + grade_width + separator.len() * 3;
            let name = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_name(&student.secondary_key, width - fixed_width)
                }
                // Very narrow terminal, show truncated
                Some(_) => truncate_name(&student.secondary_key, 20),
                // No terminal (pipe), don't truncate
                None => student.secondary_key.clone(),
            };

            let flag = if student.warnings.is_empty() { "" } else { " *" };

            if use_colors {
                let grade_colored = match student.passing {
                    Some(true) => grade_str.green().bold().to_string(),
                    Some(false) => grade_str.red().bold().to_string(),
                    None => grade_str,
                };
                format!(
                    "{} {}{}{}{}{}{}{}{}",
                    index_str.dimmed(),
                    key.cyan(),
                    separator,
                    total_str.bold(),
                    separator,
                    grade_colored,
                    separator,
                    name,
                    flag.yellow()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}{}",
                    index_str, key, separator, total_str, separator, grade_str, separator, name, flag
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
