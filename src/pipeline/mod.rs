pub mod analyzer;
pub mod header;
pub mod reconcile;
pub mod sections;
pub mod tables;
pub mod types;
pub mod worker;
