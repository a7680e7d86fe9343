pub mod identity;
pub mod response;

pub use identity::resolve_identity;
pub use response::{ApiResponse, ApiResult};
