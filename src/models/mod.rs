// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod document;
pub mod object;
pub mod result;

pub use document::{CsvDocument, DataRow, Dialect, LineTerminator};
pub use object::ObjectRef;
pub use result::{InvocationResult, InvocationStatus, ProcessingResult, ProcessingStatus};
