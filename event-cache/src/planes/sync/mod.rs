pub mod merge;
pub mod reconciler;

pub use merge::apply_delta;
pub use reconciler::Reconciler;
