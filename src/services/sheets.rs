use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::config::SinkConfig;
use crate::error::{GatewayError, Result};

/// Append-only tabular store addressed by table name.
///
/// The gateway only ever inserts; reading the store back is someone else's
/// problem. Implementations must append rows, never overwrite.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn append(&self, table: &str, row: &[(&'static str, String)]) -> Result<()>;
}

/// Google Sheets adapter: one worksheet per table, one row per append,
/// authenticated with a service-account JWT exchanged for a bearer token.
#[derive(Clone)]
pub struct SheetsSink {
    client: Client,
    config: SinkConfig,
}

/// Service-account assertion claims for the OAuth token exchange.
#[derive(Debug, Serialize)]
struct TokenClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl SheetsSink {
    pub fn new(config: SinkConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    /// Credentials are validated here, at sink acquisition, not at startup.
    fn credentials(&self) -> Result<(&str, &str, &str)> {
        let spreadsheet_id = self
            .config
            .spreadsheet_id
            .as_deref()
            .ok_or_else(|| GatewayError::Configuration("SPREADSHEET_ID is not set".into()))?;
        let client_email = self
            .config
            .client_email
            .as_deref()
            .ok_or_else(|| GatewayError::Configuration("GOOGLE_CLIENT_EMAIL is not set".into()))?;
        let private_key = self
            .config
            .private_key
            .as_deref()
            .ok_or_else(|| GatewayError::Configuration("GOOGLE_PRIVATE_KEY is not set".into()))?;

        Ok((spreadsheet_id, client_email, private_key))
    }

    async fn fetch_access_token(&self, client_email: &str, private_key: &str) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = TokenClaims {
            iss: client_email.to_string(),
            scope: "https://www.googleapis.com/auth/spreadsheets".to_string(),
            aud: self.config.token_url.clone(),
            iat: now,
            exp: now + 3600,
        };

        let assertion = encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &EncodingKey::from_rsa_pem(private_key.as_bytes())?,
        )?;

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::SinkWrite(format!(
                "token exchange failed with status {status}: {body}"
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl RecordSink for SheetsSink {
    async fn append(&self, table: &str, row: &[(&'static str, String)]) -> Result<()> {
        let (spreadsheet_id, client_email, private_key) = self.credentials()?;
        let token = self.fetch_access_token(client_email, private_key).await?;

        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}!A1:append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
            self.config.api_url, spreadsheet_id, table
        );
        let cells: Vec<&String> = row.iter().map(|(_, value)| value).collect();

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "values": [cells] }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(table, "appended row to sheet");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        // The Sheets API answers an unknown worksheet with a range-parse error.
        if (status == reqwest::StatusCode::BAD_REQUEST
            || status == reqwest::StatusCode::NOT_FOUND)
            && body.contains("Unable to parse range")
        {
            return Err(GatewayError::SinkNotFound(table.to_string()));
        }

        Err(GatewayError::SinkWrite(format!(
            "append to {table} failed with status {status}: {body}"
        )))
    }
}
