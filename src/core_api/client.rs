use anyhow::Context;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{instrument, warn};

use crate::core_api::error::{CoreApiError, CoreApiResult};
use crate::core_api::models::{
    KakaoLoginRequest, OauthLoginResponse, OauthRegistrationComplete, RegisterOauthRequest,
};
use crate::util::env::{env_parse, env_req};

const MAX_ERROR_BODY: usize = 2000;

fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl CoreApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 15,
        }
    }

    /// `CORE_API_URL` (required) and `CORE_API_TIMEOUT_SECS` (default 15).
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = env_req("CORE_API_URL").context("CORE_API_URL is required")?;
        Ok(Self {
            base_url,
            timeout_secs: env_parse("CORE_API_TIMEOUT_SECS", 15u64),
        })
    }
}

/// Stateless client for the core API's OAuth endpoints.
#[derive(Debug, Clone)]
pub struct CoreApiClient {
    base_url: String,
    http: Client,
}

impl CoreApiClient {
    pub fn new(config: &CoreApiConfig) -> CoreApiResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("game-price-tracker/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::with_http(&config.base_url, http))
    }

    /// Reuse an existing HTTP client (shared connection pool).
    pub fn with_http(base_url: &str, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange a Kakao authorization code for core API tokens.
    #[instrument(skip(self, code))]
    pub async fn login_by_kakao(&self, code: &str) -> CoreApiResult<OauthLoginResponse> {
        let body = KakaoLoginRequest {
            code: code.to_string(),
        };
        self.post_json("/auth/kakao", &body, None).await
    }

    /// Finish registration of an OAuth user by choosing a nickname.
    ///
    /// `access_token` is the registration-pending token from [`Self::login_by_kakao`],
    /// forwarded as a bearer token when present.
    #[instrument(skip(self, body, access_token), fields(nickname = %body.nickname))]
    pub async fn register_oauth_user(
        &self,
        body: &RegisterOauthRequest,
        access_token: Option<&str>,
    ) -> CoreApiResult<OauthRegistrationComplete> {
        self.post_json("/auth/registration/oauth-user", body, access_token)
            .await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B, bearer: Option<&str>) -> CoreApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.post(&url).json(body);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), MAX_ERROR_BODY);
            warn!(%status, %url, "core API call failed");
            return Err(CoreApiError::from_status(status, body));
        }

        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| CoreApiError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CoreApiClient {
        CoreApiClient::new(&CoreApiConfig::new(format!("{}/", server.uri()))).unwrap()
    }

    #[tokio::test]
    async fn kakao_login_completed_registration() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/kakao"))
            .and(body_json(json!({"code": "abc"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isRegistrationCompleted": true,
                "accessToken": "at",
                "accessTokenExpireAt": "2024-05-01T00:00:00Z",
                "refreshToken": "rt",
                "refreshTokenExpireAt": "2024-06-01T00:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = client_for(&server).login_by_kakao("abc").await.unwrap();
        match resp {
            OauthLoginResponse::Completed(done) => {
                assert_eq!(done.access_token, "at");
                assert_eq!(done.refresh_token, "rt");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn kakao_login_registration_required() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/kakao"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "isRegistrationCompleted": false,
                "accessToken": "pending",
                "accessTokenExpireAt": "2024-05-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let resp = client_for(&server).login_by_kakao("abc").await.unwrap();
        assert!(!resp.is_registration_completed());
        assert_eq!(resp.access_token(), "pending");
    }

    #[tokio::test]
    async fn rejected_code_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/kakao"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired code"))
            .mount(&server)
            .await;

        let err = client_for(&server).login_by_kakao("old").await.unwrap_err();
        assert!(
            matches!(err, CoreApiError::InvalidCode { status: 401, ref body } if body == "expired code")
        );
    }

    #[tokio::test]
    async fn server_failure_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/kakao"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).login_by_kakao("abc").await.unwrap_err();
        assert!(matches!(err, CoreApiError::Server { status: 503, .. }));
    }

    #[tokio::test]
    async fn malformed_success_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/kakao"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).login_by_kakao("abc").await.unwrap_err();
        assert!(matches!(err, CoreApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn register_forwards_nickname_and_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/registration/oauth-user"))
            .and(header("authorization", "Bearer pending"))
            .and(body_json(json!({"nickname": "tarnished"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "accessToken": "at",
                "accessTokenExpireAt": "2024-05-01T00:00:00Z",
                "refreshToken": "rt",
                "refreshTokenExpireAt": "2024-06-01T00:00:00Z"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let body = RegisterOauthRequest {
            nickname: "tarnished".into(),
        };
        let done = client_for(&server)
            .register_oauth_user(&body, Some("pending"))
            .await
            .unwrap();
        assert_eq!(done.refresh_token, "rt");
    }

    #[tokio::test]
    async fn taken_nickname_is_a_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/registration/oauth-user"))
            .respond_with(ResponseTemplate::new(409).set_body_string("nickname taken"))
            .mount(&server)
            .await;

        let body = RegisterOauthRequest {
            nickname: "dup".into(),
        };
        let err = client_for(&server)
            .register_oauth_user(&body, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreApiError::Conflict(_)));
    }

    #[test]
    fn base_url_is_normalized_and_long_bodies_truncated() {
        let client = CoreApiClient::with_http("https://core.example.com///", Client::new());
        assert_eq!(client.base_url(), "https://core.example.com");

        let truncated = truncate_for_log("가".repeat(10), 4);
        assert_eq!(truncated, "가…");
    }
}
