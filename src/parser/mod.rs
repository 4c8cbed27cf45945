// file: src/parser/mod.rs
// description: parser module exports
// reference: internal module structure

pub mod framer;

pub use framer::CsvFramer;
