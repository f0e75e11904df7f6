use std::time::Duration;

/// Fixed identifiers and endpoints used for every upstream call.
///
/// Supplied once at process start and shared by reference with the auth,
/// catalog and extraction layers.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Organization identifier sent with every request
    pub organization_id: String,
    /// OAuth client id used for the token exchange
    pub client_id: String,
    /// OAuth client secret used for the token exchange
    pub client_secret: String,
    /// Player URL template containing `{url}` and `{token}` placeholders
    pub player_template: String,
    /// Base URL of the v1 API (OTP requests)
    pub api_base_v1: String,
    /// Base URL of the v3 API (token, batches, topics)
    pub api_base_v3: String,
    /// Client version advertised by web-style requests
    pub web_client_version: String,
    /// Client version advertised by mobile-style requests
    pub mobile_client_version: String,
    /// Country calling code prefixed to phone numbers
    pub country_code: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            organization_id: "5eb393ee95fab7468a79d189".to_string(),
            client_id: "system-admin".to_string(),
            client_secret: "KjPXuAVfC5xbmgreETNMaL7z".to_string(),
            player_template:
                "https://anonymouspwplayer-25261acd1521.herokuapp.com/pw?url={url}&token={token}"
                    .to_string(),
            api_base_v1: "https://api.penpencil.co/v1".to_string(),
            api_base_v3: "https://api.penpencil.co/v3".to_string(),
            web_client_version: "2.6.12".to_string(),
            mobile_client_version: "12.84".to_string(),
            country_code: "+91".to_string(),
            timeout: Duration::from_secs(20),
        }
    }
}

impl ApiConfig {
    /// Join a path onto the v1 base URL
    pub fn v1(&self, path: &str) -> String {
        join_url(&self.api_base_v1, path)
    }

    /// Join a path onto the v3 base URL
    pub fn v3(&self, path: &str) -> String {
        join_url(&self.api_base_v3, path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
