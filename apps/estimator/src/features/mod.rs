//! Feature assembly: the one code path that turns a posting and its extracted
//! details into the record the salary models consume.

pub mod assembler;
pub mod dataset;
pub mod schema;

pub use assembler::{assemble_features, FeatureError, FeatureRecord, FeatureValue};
pub use dataset::{build_dataset_features, DatasetRow};
pub use schema::FeatureSchema;
