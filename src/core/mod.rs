pub mod etl;
pub mod format;
pub mod mapping;
pub mod path;
pub mod registry;

pub use crate::domain::model::{
    IntermediateRepresentation, OutputFormat, RawDocument, Record, ScenarioRequest,
    SerializedResult, Table,
};
pub use crate::domain::ports::{ScenarioSource, Storage};
pub use crate::utils::error::Result;
