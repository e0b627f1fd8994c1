//! Row Transformer - remote rows to local rows, per table.

pub mod coerce;
mod mapped_transformer;
mod registry;
mod result_transformer;
mod student_transformer;
mod transform_model;
mod transform_traits;


pub use mapped_transformer::MappedTransformer;
pub use registry::{ResolvedTransformer, TransformerRegistry};
pub use result_transformer::{ResultTransformer, RESULTS_TABLE};
pub use student_transformer::{StudentTransformer, STUDENTS_TABLE};
pub use transform_model::{LocalRow, RowKey, TransformError};
pub use transform_traits::RowTransformer;
