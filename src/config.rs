use std::{env, path::PathBuf};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Signs session tokens and email confirmation links.
    pub secret_key: String,
    /// Externally reachable base URL, used for provider redirects and mailed links.
    pub public_url: String,
    /// Where the email confirmation link lands the user, with a flash message.
    pub login_redirect_url: String,
    pub upload_dir: PathBuf,
    pub stripe: StripeConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub server: String,
    pub port: u16,
    pub sender: String,
    /// `None` disables SMTP; confirmation links are then only logged.
    pub credentials: Option<(String, String)>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let secret_key = env::var("SECRET_KEY").context("SECRET_KEY is not set")?;
        let public_url = env::var("APP_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();
        let login_redirect_url =
            env::var("LOGIN_REDIRECT_URL").unwrap_or_else(|_| format!("{public_url}/login"));
        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("static/uploads"));

        let stripe = StripeConfig {
            secret_key: env::var("STRIPE_SECRET_KEY").context("STRIPE_SECRET_KEY is not set")?,
            webhook_secret: env::var("STRIPE_WEBHOOK_SECRET")
                .context("STRIPE_WEBHOOK_SECRET is not set")?,
            api_base: env::var("STRIPE_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
        };

        let credentials = match (env::var("MAIL_USERNAME"), env::var("MAIL_PASSWORD")) {
            (Ok(user), Ok(password)) => Some((user, password)),
            _ => None,
        };
        let mail = MailConfig {
            server: env::var("MAIL_SERVER").unwrap_or_else(|_| "smtp.googlemail.com".to_string()),
            port: env::var("MAIL_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(587),
            sender: env::var("MAIL_SENDER")
                .or_else(|_| env::var("MAIL_USERNAME"))
                .unwrap_or_else(|_| "Storefront <no-reply@localhost>".to_string()),
            credentials,
        };

        Ok(Self {
            port,
            database_url,
            host,
            secret_key,
            public_url,
            login_redirect_url,
            upload_dir,
            stripe,
            mail,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.public_url, path)
    }
}
