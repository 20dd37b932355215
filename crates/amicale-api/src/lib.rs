// amicale-api: async client for the Amicale campus-services envelope API

pub mod client;
pub mod credentials;
pub mod envelope;
pub mod error;
pub mod session;
pub mod transport;

pub use client::{ApiClient, Method};
pub use credentials::{CredentialStore, KeyringStore, MemoryStore};
pub use envelope::{ApiResponse, is_api_response_valid};
pub use error::{ApiCode, ApiRejection, RequestStatus, StoreError};
pub use session::SessionManager;
pub use transport::TransportConfig;
