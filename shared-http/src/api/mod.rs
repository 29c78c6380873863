pub mod requests;
pub mod responses;

pub use requests::DeltaRequest;
pub use responses::{DeltaResponse, ErrorResponse, FullFetchResponse};
