// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::AuthError;
use crate::http::{ApiRequest, HttpClient, request_json};

/// Opaque bearer token, held in memory for one session only
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Accept a token typed in directly by the user
    pub fn from_input(input: &str) -> Result<Self, AuthError> {
        let token = input.trim();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A token plus the header set sent with every authenticated v3 call.
///
/// The `randomid` header is generated once per session.
#[derive(Clone)]
pub struct AuthContext {
    token: Token,
    headers: Vec<(String, String)>,
}

impl AuthContext {
    pub fn new(config: &ApiConfig, token: Token) -> Self {
        let random_id = uuid::Uuid::new_v4().simple().to_string()[..16].to_string();
        let headers = [
            ("authorization", format!("Bearer {}", token.as_str())),
            ("client-id", config.organization_id.clone()),
            ("client-version", config.mobile_client_version.clone()),
            ("user-agent", "Android".to_string()),
            ("randomid", random_id),
            ("client-type", "MOBILE".to_string()),
            ("content-type", "application/json; charset=UTF-8".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self { token, headers }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OtpRequest<'a> {
    username: &'a str,
    country_code: &'a str,
    organization_id: &'a str,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    otp: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    #[serde(rename = "organizationId")]
    organization_id: &'a str,
    latitude: u8,
    longitude: u8,
}

fn web_headers(config: &ApiConfig) -> Vec<(String, String)> {
    [
        ("Content-Type", "application/json"),
        ("Client-Id", config.organization_id.as_str()),
        ("Client-Type", "WEB"),
        ("Client-Version", config.web_client_version.as_str()),
        ("Integration-With", "Origin"),
        ("User-Agent", "Mozilla/5.0"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Ask the platform to send a one-time code to `phone`
pub async fn request_otp<C: HttpClient + ?Sized>(
    client: &C,
    config: &ApiConfig,
    phone: &str,
) -> Result<(), AuthError> {
    let payload = OtpRequest {
        username: phone,
        country_code: &config.country_code,
        organization_id: &config.organization_id,
    };
    let body = serde_json::to_value(&payload)?;

    let request = ApiRequest::post(config.v1("users/get-otp"))
        .query([("smsType", "0")])
        .json(body)
        .headers(&web_headers(config))
        .timeout(config.timeout);

    request_json(client, &request)
        .await
        .map_err(AuthError::OtpRequest)?;

    tracing::debug!("one-time code requested");
    Ok(())
}

/// Exchange phone number and one-time code for a bearer token
pub async fn exchange_token<C: HttpClient + ?Sized>(
    client: &C,
    config: &ApiConfig,
    phone: &str,
    code: &str,
) -> Result<Token, AuthError> {
    let payload = TokenRequest {
        username: phone,
        otp: code,
        client_id: &config.client_id,
        client_secret: &config.client_secret,
        grant_type: "password",
        organization_id: &config.organization_id,
        latitude: 0,
        longitude: 0,
    };
    let body = serde_json::to_value(&payload)?;

    let mut headers = web_headers(config);
    headers.retain(|(name, _)| name != "Integration-With");

    let request = ApiRequest::post(config.v3("oauth/token"))
        .json(body)
        .headers(&headers)
        .timeout(config.timeout);

    let data = request_json(client, &request)
        .await
        .map_err(AuthError::TokenRequest)?;

    extract_token(&data).ok_or(AuthError::TokenMissing)
}

/// Pull the access token out of a token response.
///
/// Checked in order: `data.access_token`, `data.accessToken`, then a
/// top-level `access_token`.
pub fn extract_token(data: &Value) -> Option<Token> {
    let nested = data.get("data").filter(|d| d.is_object());

    nested
        .and_then(|d| non_empty_str(d, "access_token").or_else(|| non_empty_str(d, "accessToken")))
        .or_else(|| non_empty_str(data, "access_token"))
        .map(Token::new)
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
