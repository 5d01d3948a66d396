//! Client for the external core API (OAuth login and registration).

pub mod client;
pub mod error;
pub mod models;

pub use client::{CoreApiClient, CoreApiConfig};
pub use error::{CoreApiError, CoreApiResult};
pub use models::{
    KakaoLoginRequest, OauthLoginResponse, OauthRegistrationComplete, OauthRegistrationRequired,
    RegisterOauthRequest,
};
