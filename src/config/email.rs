use std::env;

#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Clone)]
pub struct EmailConfig {
    /// None when SMTP is not configured (graceful degradation).
    pub smtp: Option<SmtpConfig>,
    pub from_address: String,
    /// Absolute base URL used to build links in outgoing mail.
    pub site_url: String,
}

impl EmailConfig {
    pub fn from_env() -> Self {
        let smtp = Self::smtp_from_env();
        let from_address = env::var("SMTP_FROM").unwrap_or_else(|_| match &smtp {
            Some(s) => format!("Forum <{}>", s.username),
            None => "Forum <noreply@localhost>".to_string(),
        });
        let site_url = env::var("SITE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            smtp,
            from_address,
            site_url,
        }
    }

    fn smtp_from_env() -> Option<SmtpConfig> {
        let host = env::var("SMTP_HOST").ok()?;
        let port = env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);
        let username = env::var("SMTP_USERNAME").ok()?;
        let password = env::var("SMTP_PASSWORD").ok()?;

        Some(SmtpConfig {
            host,
            port,
            username,
            password,
        })
    }
}
