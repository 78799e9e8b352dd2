pub mod completion;
pub mod select;
pub mod series;
