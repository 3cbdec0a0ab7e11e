mod document;
mod note;
mod patient;
mod section_record;

pub mod enums;

pub use document::*;
pub use enums::*;
pub use note::*;
pub use patient::*;
pub use section_record::*;
