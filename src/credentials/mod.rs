use std::fmt;
use std::fs;
use std::path::Path;
use anyhow::Context;

/// Login and password for drebedengi.ru
pub(crate) struct Credentials {
    pub(crate) login: String,
    pub(crate) password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    /// Read credentials file: login on the first line, password in the rest of the file.
    pub(crate) fn load(file_path: &Path) -> anyhow::Result<Credentials> {
        let content = fs::read_to_string(file_path)
            .with_context(|| format!("Unable to read credentials file {}", file_path.display()))?;
        Credentials::parse(&content)
            .with_context(|| format!("Invalid credentials file {}", file_path.display()))
    }

    pub(crate) fn parse(content: &str) -> anyhow::Result<Credentials> {
        match content.split_once('\n') {
            Some((login, password)) => Ok(Credentials {
                login: login.to_string(),
                password: password.trim_end_matches('\n').to_string(),
            }),
            None => Err(anyhow::anyhow!("invalid credentials file")),
        }
    }
}
