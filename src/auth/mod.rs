//! Password login, Sheriff identity verification and credential storage.

pub mod credential;
pub mod device;
pub mod error;
pub mod response;
pub mod service;
pub mod store;
pub mod verification;

pub use credential::Credential;
pub use device::DeviceToken;
pub use error::{AuthError, VerificationError};
pub use response::{LoginOutcome, TokenGrant};
pub use service::AuthService;
pub use store::{CredentialStore, CredentialStoreConfig, FileCredentialStore};
pub use verification::{ChallengeStatus, SheriffVerifier, VerificationStage};
