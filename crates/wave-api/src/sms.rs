use anyhow::{Context, Result};
use rand::Rng;
use tracing::{info, warn};

/// Six decimal digits, 100000–999999.
pub fn generate_verification_code() -> String {
    let mut rng = rand::rng();
    format!("{}", rng.random_range(100_000..1_000_000))
}

#[derive(Clone)]
struct ProviderCreds {
    account_sid: String,
    auth_token: String,
    from_number: String,
}

/// Sends verification codes through the SMS provider when credentials are
/// configured, and logs them in simulation mode otherwise.
#[derive(Clone)]
pub struct SmsClient {
    http: reqwest::Client,
    creds: Option<ProviderCreds>,
}

impl SmsClient {
    /// Reads `WAVE_SMS_ACCOUNT_SID`, `WAVE_SMS_AUTH_TOKEN`, `WAVE_SMS_FROM`.
    pub fn from_env() -> Self {
        let creds = match (
            std::env::var("WAVE_SMS_ACCOUNT_SID"),
            std::env::var("WAVE_SMS_AUTH_TOKEN"),
            std::env::var("WAVE_SMS_FROM"),
        ) {
            (Ok(account_sid), Ok(auth_token), Ok(from_number)) => Some(ProviderCreds {
                account_sid,
                auth_token,
                from_number,
            }),
            _ => {
                warn!("SMS provider credentials not configured; verification will be simulated");
                None
            }
        };

        Self {
            http: reqwest::Client::new(),
            creds,
        }
    }

    /// Test constructor: always simulates.
    pub fn simulated() -> Self {
        Self {
            http: reqwest::Client::new(),
            creds: None,
        }
    }

    pub async fn send_verification(&self, phone_number: &str, code: &str) -> Result<()> {
        let Some(creds) = &self.creds else {
            info!(
                phone = phone_number,
                code, "SMS simulation mode: verification code valid for 10 minutes"
            );
            return Ok(());
        };

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            creds.account_sid
        );
        let body = format!(
            "Your Wave verification code is: {}. This code will expire in 10 minutes.",
            code
        );

        self.http
            .post(&url)
            .basic_auth(&creds.account_sid, Some(&creds.auth_token))
            .form(&[
                ("To", phone_number),
                ("From", creds.from_number.as_str()),
                ("Body", body.as_str()),
            ])
            .send()
            .await
            .context("SMS dispatch request failed")?
            .error_for_status()
            .context("SMS provider rejected the message")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert!(!code.starts_with('0'));
        }
    }

    #[tokio::test]
    async fn simulation_mode_always_succeeds() {
        let client = SmsClient::simulated();
        assert!(client.send_verification("+15551234567", "123456").await.is_ok());
    }
}
