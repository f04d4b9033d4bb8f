use anyhow::{Context, Result};
use serde::Deserialize;

/// Outbound message channel. One operation: deliver a body to one
/// recipient and hand back the provider's message id.
///
/// The scheduler is generic over this so tests can substitute a
/// recording stub.
pub trait Messenger {
    async fn send_message(&self, to: &str, body: &str) -> Result<String>;
}

/// Twilio Messages API client. Credentials and the fixed WhatsApp
/// sender id come from configuration.
pub struct TwilioClient {
    http: reqwest::Client,
    url: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

#[derive(Deserialize)]
struct MessageCreated {
    sid: String,
}

impl TwilioClient {
    pub fn new(account_sid: &str, auth_token: &str, from: &str) -> Self {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{account_sid}/Messages.json"
        );
        Self {
            http: reqwest::Client::new(),
            url,
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            from: from.to_string(),
        }
    }
}

impl Messenger for TwilioClient {
    async fn send_message(&self, to: &str, body: &str) -> Result<String> {
        let params = [
            ("From", self.from.as_str()),
            ("To", to),
            ("Body", body),
        ];

        let resp = self
            .http
            .post(&self.url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .context("Twilio request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Twilio send failed: HTTP {status} - {text}");
        }

        let created: MessageCreated = resp
            .json()
            .await
            .context("failed to parse Twilio response")?;
        Ok(created.sid)
    }
}
