use crate::error::{RelayError, Result};
use crate::forward::ForwardSpec;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "ssh-relay")]
#[command(
    author,
    version,
    about = "Forward a single local TCP connection to a remote host over SSH"
)]
pub struct Cli {
    /// Remote SSH host in format `[user@]host`
    #[arg(value_name = "HOST")]
    pub host: String,

    /// Local TCP port to listen on
    #[arg(value_name = "LOCAL_PORT")]
    pub local_port: u16,

    /// Forwarding destination in format `host:port`, resolved from the remote side
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Path to SSH identity file
    #[arg(short = 'i', long = "identity")]
    pub identity_file: Option<PathBuf>,

    /// SSH port
    #[arg(short = 'P', long = "port", default_value = "22")]
    pub ssh_port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct ParsedHost {
    pub user: Option<String>,
    pub host: String,
}

impl Cli {
    pub fn parse_host(&self) -> ParsedHost {
        if let Some((user, host)) = self.host.split_once('@') {
            ParsedHost {
                user: Some(user.to_string()),
                host: host.to_string(),
            }
        } else {
            ParsedHost {
                user: None,
                host: self.host.clone(),
            }
        }
    }

    /// Build the forwarding spec from the positional arguments.
    ///
    /// The target uses `rsplit_once` so IPv6-ish targets like `::1:80` keep
    /// everything before the last colon as the host part.
    pub fn forward_spec(&self) -> Result<ForwardSpec> {
        let (host, port) = self
            .target
            .rsplit_once(':')
            .ok_or_else(|| RelayError::TargetParse(format!("expected host:port, got `{}`", self.target)))?;

        if host.is_empty() {
            return Err(RelayError::TargetParse(format!(
                "empty host in `{}`",
                self.target
            )));
        }

        let remote_port: u16 = port.parse().map_err(|_| {
            RelayError::TargetParse(format!("invalid port `{port}` in `{}`", self.target))
        })?;

        Ok(ForwardSpec {
            local_port: self.local_port,
            remote_host: host.to_string(),
            remote_port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("ssh-relay").chain(args.iter().copied()))
    }

    #[test]
    fn parses_user_and_host() {
        let parsed = cli(&["alice@devbox", "9000", "example.internal:80"]).parse_host();
        assert_eq!(parsed.user.as_deref(), Some("alice"));
        assert_eq!(parsed.host, "devbox");
    }

    #[test]
    fn parses_bare_host() {
        let parsed = cli(&["devbox", "9000", "example.internal:80"]).parse_host();
        assert!(parsed.user.is_none());
        assert_eq!(parsed.host, "devbox");
    }

    #[test]
    fn builds_forward_spec() {
        let spec = cli(&["devbox", "9000", "example.internal:80"])
            .forward_spec()
            .unwrap();
        assert_eq!(spec.local_port, 9000);
        assert_eq!(spec.remote_host, "example.internal");
        assert_eq!(spec.remote_port, 80);
    }

    #[test]
    fn rejects_target_without_port() {
        let err = cli(&["devbox", "9000", "example.internal"])
            .forward_spec()
            .unwrap_err();
        assert!(matches!(err, RelayError::TargetParse(_)));
    }

    #[test]
    fn rejects_non_numeric_port() {
        let err = cli(&["devbox", "9000", "example.internal:http"])
            .forward_spec()
            .unwrap_err();
        assert!(matches!(err, RelayError::TargetParse(_)));
    }
}
