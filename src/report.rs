use serde::Serialize;

use crate::grading::{ReportSettings, StudentRecord};

/// A renderable set of student records with the settings that style it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub settings: ReportSettings,
    /// Component names in first-seen order across the records
    pub components: Vec<String>,
    pub students: Vec<StudentRecord>,
}

impl Report {
    pub fn new(settings: ReportSettings, students: Vec<StudentRecord>) -> Self {
        let components = component_names(&students);
        Self {
            settings,
            components,
            students,
        }
    }
}

/// An isolated report holding exactly one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentReport {
    pub primary_key: String,
    pub report: Report,
}

/// Final output of a batch run, handed to the renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "report", rename_all = "snake_case")]
pub enum ReportModel {
    /// report_for_all: one combined report
    Combined(Report),
    /// report_per_student: one report per primary key
    PerStudent(Vec<StudentReport>),
}

impl ReportModel {
    pub fn students(&self) -> Vec<&StudentRecord> {
        match self {
            ReportModel::Combined(report) => report.students.iter().collect(),
            ReportModel::PerStudent(reports) => reports
                .iter()
                .flat_map(|r| r.report.students.iter())
                .collect(),
        }
    }

    pub fn student_count(&self) -> usize {
        match self {
            ReportModel::Combined(report) => report.students.len(),
            ReportModel::PerStudent(reports) => reports.len(),
        }
    }
}

fn component_names(students: &[StudentRecord]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for component in students
        .iter()
        .flat_map(|s| s.rows.iter())
        .flat_map(|r| r.components.iter())
    {
        if !names.contains(&component.name) {
            names.push(component.name.clone());
        }
    }
    names
}
