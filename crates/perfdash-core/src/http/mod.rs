pub mod client;
pub mod request;
pub mod response;
pub mod token;

pub use client::{ApiClient, ApiClientBuilder, LOGIN_REDIRECT};
pub use request::{normalize_path, ApiRequest, HttpMethod, RequestBody};
pub use response::ApiResponse;
pub use token::TokenStore;
