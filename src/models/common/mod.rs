pub mod pagination;
pub mod response;
pub mod scope;

pub use pagination::{PaginatedResponse, PaginationInfo, PaginationQuery};
pub use response::ApiResponse;
pub use scope::AccessScope;
