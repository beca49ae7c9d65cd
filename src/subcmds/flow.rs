use anyhow::{Context, Result};
use tracing::warn;

use crate::launcher::{self, Request};
use crate::provider::CredentialProvider;

/// Flow Launcher shows whatever JSON we print; failures are printed as a
/// result item instead of failing the process.
pub fn flow(provider: &dyn CredentialProvider, request: String) -> Result<()> {
    let response = serde_json::from_str::<Request>(&request)
        .with_context(|| "Malformed launcher request")
        .and_then(|request| launcher::handle(provider, &request));

    let response = match response {
        Ok(Some(response)) => response,
        Ok(None) => return Ok(()),
        Err(e) => {
            warn!("{:#}", e);
            launcher::error_response(&e)
        }
    };
    println!("{}", serde_json::to_string(&response)?);

    Ok(())
}
