// Wire types of the core API's OAuth endpoints.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KakaoLoginRequest {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterOauthRequest {
    pub nickname: String,
}

/// Tokens issued to a user whose registration is complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OauthRegistrationComplete {
    pub access_token: String,
    pub access_token_expire_at: String,
    pub refresh_token: String,
    pub refresh_token_expire_at: String,
}

/// Short-lived access token handed out until the user picks a nickname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OauthRegistrationRequired {
    pub access_token: String,
    pub access_token_expire_at: String,
}

/// Result of an OAuth login, discriminated on the wire by `isRegistrationCompleted`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOauthLoginResponse", into = "RawOauthLoginResponse")]
pub enum OauthLoginResponse {
    Completed(OauthRegistrationComplete),
    RegistrationRequired(OauthRegistrationRequired),
}

impl OauthLoginResponse {
    pub fn is_registration_completed(&self) -> bool {
        matches!(self, OauthLoginResponse::Completed(_))
    }

    pub fn access_token(&self) -> &str {
        match self {
            OauthLoginResponse::Completed(done) => &done.access_token,
            OauthLoginResponse::RegistrationRequired(pending) => &pending.access_token,
        }
    }
}

// Flat wire shape. serde's tagged enums only key on strings, so the boolean tag
// is resolved here.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOauthLoginResponse {
    is_registration_completed: bool,
    access_token: String,
    access_token_expire_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token_expire_at: Option<String>,
}

impl TryFrom<RawOauthLoginResponse> for OauthLoginResponse {
    type Error = String;

    fn try_from(raw: RawOauthLoginResponse) -> Result<Self, Self::Error> {
        if !raw.is_registration_completed {
            return Ok(OauthLoginResponse::RegistrationRequired(
                OauthRegistrationRequired {
                    access_token: raw.access_token,
                    access_token_expire_at: raw.access_token_expire_at,
                },
            ));
        }
        match (raw.refresh_token, raw.refresh_token_expire_at) {
            (Some(refresh_token), Some(refresh_token_expire_at)) => {
                Ok(OauthLoginResponse::Completed(OauthRegistrationComplete {
                    access_token: raw.access_token,
                    access_token_expire_at: raw.access_token_expire_at,
                    refresh_token,
                    refresh_token_expire_at,
                }))
            }
            _ => Err("completed registration without refresh token".to_string()),
        }
    }
}

impl From<OauthLoginResponse> for RawOauthLoginResponse {
    fn from(response: OauthLoginResponse) -> Self {
        match response {
            OauthLoginResponse::Completed(done) => RawOauthLoginResponse {
                is_registration_completed: true,
                access_token: done.access_token,
                access_token_expire_at: done.access_token_expire_at,
                refresh_token: Some(done.refresh_token),
                refresh_token_expire_at: Some(done.refresh_token_expire_at),
            },
            OauthLoginResponse::RegistrationRequired(pending) => RawOauthLoginResponse {
                is_registration_completed: false,
                access_token: pending.access_token,
                access_token_expire_at: pending.access_token_expire_at,
                refresh_token: None,
                refresh_token_expire_at: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn completed_login_carries_all_four_tokens() {
        let parsed: OauthLoginResponse = serde_json::from_value(json!({
            "isRegistrationCompleted": true,
            "accessToken": "at",
            "accessTokenExpireAt": "2024-05-01T00:00:00Z",
            "refreshToken": "rt",
            "refreshTokenExpireAt": "2024-06-01T00:00:00Z"
        }))
        .unwrap();
        let OauthLoginResponse::Completed(done) = &parsed else {
            panic!("expected completed registration, got {parsed:?}");
        };
        assert_eq!(done.refresh_token, "rt");
        assert_eq!(done.refresh_token_expire_at, "2024-06-01T00:00:00Z");
        assert!(parsed.is_registration_completed());
    }

    #[test]
    fn pending_registration_drops_refresh_fields() {
        let parsed: OauthLoginResponse = serde_json::from_value(json!({
            "isRegistrationCompleted": false,
            "accessToken": "at",
            "accessTokenExpireAt": "2024-05-01T00:00:00Z",
            "refreshToken": "ignored"
        }))
        .unwrap();
        assert_eq!(
            parsed,
            OauthLoginResponse::RegistrationRequired(OauthRegistrationRequired {
                access_token: "at".into(),
                access_token_expire_at: "2024-05-01T00:00:00Z".into(),
            })
        );
        assert_eq!(parsed.access_token(), "at");

        let out = serde_json::to_value(&parsed).unwrap();
        assert_eq!(out["isRegistrationCompleted"], false);
        assert!(out.get("refreshToken").is_none());
        assert!(out.get("refreshTokenExpireAt").is_none());
    }

    #[test]
    fn completed_flag_without_refresh_token_is_rejected() {
        let err = serde_json::from_value::<OauthLoginResponse>(json!({
            "isRegistrationCompleted": true,
            "accessToken": "at",
            "accessTokenExpireAt": "2024-05-01T00:00:00Z"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("without refresh token"));
    }

    #[test]
    fn missing_tag_is_rejected() {
        assert!(serde_json::from_value::<OauthLoginResponse>(json!({
            "accessToken": "at",
            "accessTokenExpireAt": "2024-05-01T00:00:00Z"
        }))
        .is_err());
    }
}
