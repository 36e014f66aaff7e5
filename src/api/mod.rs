mod client;
mod error;
mod types;

pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
pub use types::{
    AuthResponse, CourseProgressResponse, ProgressUpsert, PurchaseRecord, PurchaseResponse,
};
