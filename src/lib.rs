pub mod load;
pub mod merge;
pub mod pipeline;
pub mod schema;
pub mod write;
