//! Terminal side of the identity login

use async_trait::async_trait;
use perch_session::{IdentityFlow, SessionError};
use tokio::io::{AsyncBufReadExt, BufReader};
use url::Url;

/// Prints the authorization URL and reads the redirect back from stdin
pub struct ConsoleIdentityFlow;

#[async_trait]
impl IdentityFlow for ConsoleIdentityFlow {
    async fn authorize(&self, authorization_url: &Url) -> Result<Url, SessionError> {
        println!("Open this URL and authorize Perch:\n\n  {}\n", authorization_url);
        println!("Paste the URL you were redirected to:");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| SessionError::Login(format!("reading redirect: {}", e)))?;

        parse_redirect(&line)
    }
}

fn parse_redirect(line: &str) -> Result<Url, SessionError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(SessionError::Login("no redirect URL entered".to_string()));
    }
    Url::parse(trimmed).map_err(|e| SessionError::Login(format!("redirect URL: {}", e)))
}
