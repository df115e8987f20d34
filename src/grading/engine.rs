use serde::Serialize;

use super::model::ConfigModel;
use super::validation::ValidatedRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredComponent {
    pub name: String,
    pub obtained: f64,
    pub total_marks: f64,
    pub weight: f64,
    pub weighted: f64, // obtained / total_marks * weight, unrounded
    pub substituted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowScore {
    pub components: Vec<ScoredComponent>,
    pub total: f64,
}

/// Compute weighted component scores for a validated row.
///
/// Values are kept at full precision; rounding belongs to the renderers.
pub fn calculate_row(row: &ValidatedRow, config: &ConfigModel) -> RowScore {
    let components: Vec<ScoredComponent> = config
        .components()
        .iter()
        .zip(&row.marks)
        .map(|(spec, mark)| ScoredComponent {
            name: spec.name.clone(),
            obtained: mark.obtained,
            total_marks: spec.total_marks,
            weight: spec.weight,
            weighted: mark.obtained / spec.total_marks * spec.weight,
            substituted: mark.substituted,
        })
        .collect();

    let total = components.iter().map(|c| c.weighted).sum();

    RowScore { components, total }
}
