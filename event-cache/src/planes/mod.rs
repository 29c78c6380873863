pub mod data;
pub mod sync;
