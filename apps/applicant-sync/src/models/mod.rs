pub mod document;
pub mod report;
pub mod tables;
