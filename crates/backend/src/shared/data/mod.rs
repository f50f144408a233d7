pub mod error;
pub mod postgrest;
pub mod query;
pub mod retry;

pub use error::BackendError;
pub use postgrest::PostgrestClient;
pub use query::TableQuery;
