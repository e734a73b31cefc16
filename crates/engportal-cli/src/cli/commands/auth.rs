//! Auth command handlers.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};
use engportal_core::Portal;
use engportal_core::config::paths;
use engportal_core::gate::AuthState;
use engportal_types::Credentials;

pub async fn login(portal: &Portal, email: &str, password: Option<String>) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        anyhow::bail!("Email cannot be empty");
    }

    if let AuthState::Unauthenticated {
        server_online: false,
    } = portal.gate.initialize().await
    {
        anyhow::bail!("Server is offline ({})", portal.prober.health_url());
    }

    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    let credentials = Credentials {
        email: email.to_string(),
        password,
    };
    let identity = portal
        .gate
        .login(&credentials)
        .await
        .context("Login failed")?;

    println!("Logged in as {}", identity.display_name());
    tracing::debug!(path = %paths::session_path().display(), "session stored");
    Ok(())
}

fn read_password() -> Result<String> {
    if io::stdin().is_terminal() {
        print!("Password: ");
        io::stdout().flush()?;
    }

    let mut input = String::new();
    io::stdin()
        .lock()
        .read_line(&mut input)
        .context("read password from stdin")?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

pub async fn logout(portal: &Portal) -> Result<()> {
    if portal.gate.logout().await? {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}
