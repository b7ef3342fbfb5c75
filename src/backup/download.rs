use anyhow::Context;
use log::{debug, info};
use reqwest::blocking::Client;
use crate::credentials::Credentials;

/// HTTP session against drebedengi.ru. Cookies set by the login request are kept for the
/// following export requests.
pub(crate) struct BackupClient {
    http: Client,
    base_url: String,
}

impl BackupClient {
    pub(crate) fn new(base_url: &str) -> anyhow::Result<BackupClient> {
        let http = Client::builder()
            .cookie_store(true)
            .build()
            .context("Unable to create HTTP client")?;
        Ok(BackupClient { http, base_url: base_url.to_string() })
    }

    /// Run the login / archive / download sequence and return the zip archive bytes.
    pub(crate) fn download(&self, credentials: &Credentials) -> anyhow::Result<Vec<u8>> {
        self.login(credentials)?;
        self.request_archive(credentials)?;
        self.fetch_archive()
    }

    fn login(&self, credentials: &Credentials) -> anyhow::Result<()> {
        info!("Logging in as {}", credentials.login);
        self.http
            .post(format!("{}/?module=v2_start&action=login", self.base_url))
            .form(&[
                ("o", "1"),
                ("email", credentials.login.as_str()),
                ("password", credentials.password.as_str()),
                ("ssl", "on"),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .context("Login request failed")?;
        Ok(())
    }

    fn request_archive(&self, credentials: &Credentials) -> anyhow::Result<()> {
        info!("Requesting backup archive");
        self.http
            .post(format!("{}/?module=v2_homeBuhPrivateExport", self.base_url))
            .form(&[
                ("action", "do_archive"),
                ("password", credentials.password.as_str()),
                ("exportType", "1"),
                ("is_sent_backup", "true"),
            ])
            .send()
            .and_then(|r| r.error_for_status())
            .context("Archive request failed")?;
        Ok(())
    }

    fn fetch_archive(&self) -> anyhow::Result<Vec<u8>> {
        info!("Downloading backup archive");
        let bytes = self.http
            .get(format!("{}/?module=v2_homeBuhPrivateExport&action=dwnld", self.base_url))
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .context("Archive download failed")?;
        debug!("Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}
