use anyhow::Result;
use engportal_core::Portal;
use engportal_core::gate::AuthState;

pub async fn run(portal: &Portal) -> Result<()> {
    let state = portal.gate.initialize().await;

    let online = !matches!(
        state,
        AuthState::Unauthenticated {
            server_online: false
        }
    );
    println!("Server: {}", if online { "online" } else { "offline" });

    match state {
        AuthState::Authenticated { identity } => {
            if identity.email.is_empty() {
                println!("Logged in as {}", identity.display_name());
            } else {
                println!(
                    "Logged in as {} <{}>",
                    identity.display_name(),
                    identity.email
                );
            }
        }
        AuthState::Unauthenticated { .. } | AuthState::Initializing => {
            println!("Not logged in");
            if !online && portal.store.load().is_some() {
                println!("A stored session will be used once the server is reachable.");
            }
        }
    }
    Ok(())
}
