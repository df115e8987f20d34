pub mod aggregate;
pub mod engine;
pub mod grade;
pub mod model;
pub mod raw;
pub mod settings;
pub mod validation;

pub use aggregate::{ScoredRow, StudentAggregator, StudentRecord, SubjectRow};
pub use engine::{calculate_row, RowScore, ScoredComponent};
pub use grade::{GradeScale, GradeThreshold};
pub use model::{ComponentSpec, ConfigModel};
pub use raw::{RawRow, RawValue};
pub use settings::{Color, ReportSettings};
pub use validation::{primary_key_of, validate_row, ComponentMark, ValidatedRow};
