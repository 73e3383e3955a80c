use crate::cli::ParsedHost;
use crate::error::{RelayError, Result};
use crate::ssh::handler::ClientHandler;
use dialoguer::Password;
use russh::client::{self, Handle};
use russh::keys::{load_secret_key, PrivateKey, PrivateKeyWithHashAlg};
use std::net::ToSocketAddrs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// An authenticated SSH session.
///
/// The relay only consumes the opaque [`Handle`]; how the session was
/// established and authenticated is this module's concern alone.
pub struct SshClient {
    handle: Arc<Handle<ClientHandler>>,
}

impl SshClient {
    pub async fn connect(
        parsed_host: &ParsedHost,
        ssh_port: u16,
        identity_file: Option<PathBuf>,
    ) -> Result<Self> {
        let user = parsed_host
            .user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "root".to_string());

        let identity_files = identity_files(identity_file);

        info!("Connecting to {}@{}:{}", user, parsed_host.host, ssh_port);

        let handle =
            Self::establish_connection(&parsed_host.host, ssh_port, &user, &identity_files)
                .await?;

        Ok(Self {
            handle: Arc::new(handle),
        })
    }

    pub fn handle(&self) -> Arc<Handle<ClientHandler>> {
        self.handle.clone()
    }

    async fn establish_connection(
        host: &str,
        port: u16,
        user: &str,
        identity_files: &[PathBuf],
    ) -> Result<Handle<ClientHandler>> {
        let addr = format!("{}:{}", host, port)
            .to_socket_addrs()
            .map_err(|e| RelayError::SshConnection(format!("Failed to resolve host: {}", e)))?
            .next()
            .ok_or_else(|| {
                RelayError::SshConnection("Could not resolve host address".to_string())
            })?;

        let russh_config = Arc::new(client::Config {
            inactivity_timeout: Some(Duration::from_secs(30)),
            keepalive_interval: Some(Duration::from_secs(15)),
            keepalive_max: 3,
            nodelay: true,
            ..Default::default()
        });

        let handler = ClientHandler::new();

        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| RelayError::SshConnection(format!("TCP connection failed: {}", e)))?;

        let mut handle = client::connect_stream(russh_config, stream, handler)
            .await
            .map_err(|e| RelayError::SshConnection(e.to_string()))?;

        // Try SSH agent first
        if let Ok(authenticated) = try_agent_auth(&mut handle, user).await {
            if authenticated {
                info!("Authenticated via SSH agent");
                return Ok(handle);
            }
        }

        // Try identity files
        for identity_path in identity_files {
            if identity_path.exists() {
                debug!("Trying identity file: {:?}", identity_path);
                match try_key_auth(&mut handle, user, identity_path).await {
                    Ok(true) => {
                        info!("Authenticated via key: {:?}", identity_path);
                        return Ok(handle);
                    }
                    Ok(false) => {
                        debug!("Key auth failed for {:?}", identity_path);
                    }
                    Err(e) => {
                        debug!("Key auth error for {:?}: {}", identity_path, e);
                    }
                }
            }
        }

        // Fall back to password auth
        warn!("Key authentication failed, falling back to password");
        let password: String = Password::new()
            .with_prompt(format!("Password for {}@{}", user, host))
            .interact()
            .map_err(|e| RelayError::SshAuth(format!("Password input failed: {}", e)))?;

        let auth_result = handle
            .authenticate_password(user, &password)
            .await
            .map_err(|e| RelayError::SshAuth(e.to_string()))?;

        if auth_result.success() {
            info!("Authenticated via password");
            Ok(handle)
        } else {
            Err(RelayError::SshAuth(
                "Password authentication failed".to_string(),
            ))
        }
    }
}

fn identity_files(explicit: Option<PathBuf>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if let Some(path) = explicit {
        files.push(path);
    }

    files.extend(default_identity_files());
    files
}

fn default_identity_files() -> Vec<PathBuf> {
    let home = match dirs::home_dir() {
        Some(h) => h,
        None => return vec![],
    };

    let ssh_dir = home.join(".ssh");

    vec![
        ssh_dir.join("id_ed25519"),
        ssh_dir.join("id_rsa"),
        ssh_dir.join("id_ecdsa"),
        ssh_dir.join("id_dsa"),
    ]
}

#[cfg(unix)]
async fn try_agent_auth(handle: &mut Handle<ClientHandler>, user: &str) -> Result<bool> {
    let agent_sock = std::env::var("SSH_AUTH_SOCK").ok();

    if agent_sock.is_none() {
        return Ok(false);
    }

    let mut agent = russh::keys::agent::client::AgentClient::connect_env()
        .await
        .map_err(|e| RelayError::SshAuth(format!("Failed to connect to agent: {}", e)))?;

    let identities = agent
        .request_identities()
        .await
        .map_err(|e| RelayError::SshAuth(format!("Failed to get agent identities: {}", e)))?;

    for identity in identities {
        // Fresh agent connection per auth attempt since AgentClient doesn't implement Clone
        let mut agent_for_auth = russh::keys::agent::client::AgentClient::connect_env()
            .await
            .map_err(|e| RelayError::SshAuth(format!("Failed to connect to agent: {}", e)))?;

        let auth_result = handle
            .authenticate_publickey_with(user, identity, None, &mut agent_for_auth)
            .await;
        match auth_result {
            Ok(result) if result.success() => return Ok(true),
            _ => continue,
        }
    }

    Ok(false)
}

#[cfg(windows)]
async fn try_agent_auth(_handle: &mut Handle<ClientHandler>, _user: &str) -> Result<bool> {
    // SSH agent authentication via Unix socket is not supported on Windows
    Ok(false)
}

async fn try_key_auth(
    handle: &mut Handle<ClientHandler>,
    user: &str,
    key_path: &PathBuf,
) -> Result<bool> {
    let key = load_key_with_passphrase(key_path)?;
    let key_with_alg = PrivateKeyWithHashAlg::new(Arc::new(key), None);

    let auth_result = handle
        .authenticate_publickey(user, key_with_alg)
        .await
        .map_err(|e| RelayError::SshAuth(e.to_string()))?;

    Ok(auth_result.success())
}

fn load_key_with_passphrase(path: &PathBuf) -> Result<PrivateKey> {
    // First try without passphrase
    match load_secret_key(path, None) {
        Ok(key) => return Ok(key),
        Err(e) => {
            // Check if it's an encrypted key
            if !e.to_string().contains("encrypted")
                && !e.to_string().contains("passphrase")
                && !e.to_string().contains("decrypt")
            {
                return Err(RelayError::SshKey(format!(
                    "Failed to load key {:?}: {}",
                    path, e
                )));
            }
        }
    }

    // Key is encrypted, prompt for passphrase
    let passphrase: String = Password::new()
        .with_prompt(format!("Passphrase for {:?}", path))
        .allow_empty_password(true)
        .interact()
        .map_err(|e| RelayError::SshKey(format!("Passphrase input failed: {}", e)))?;

    load_secret_key(path, Some(&passphrase))
        .map_err(|e| RelayError::SshKey(format!("Failed to load key {:?}: {}", path, e)))
}
