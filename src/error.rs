use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("SSH connection failed: {0}")]
    SshConnection(String),

    #[error("SSH authentication failed: {0}")]
    SshAuth(String),

    #[error("SSH key error: {0}")]
    SshKey(String),

    #[error("failed to open forwarding channel to {host}:{port}: {message}")]
    ChannelOpen {
        host: String,
        port: u16,
        message: String,
    },

    #[error("SSH channel error: {0}")]
    Channel(String),

    #[error("system failure during {operation}: {source}")]
    System {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("local port {0} is already in use")]
    PortInUse(u16),

    #[error("invalid forward target: {0}")]
    TargetParse(String),
}

impl RelayError {
    /// A fatal system-level failure, tagged with the operation that failed.
    ///
    /// Callers must rule out would-block outcomes first (see
    /// [`crate::forward::socket::is_would_block`]); in non-blocking mode the
    /// absence of data is the normal steady state, not a fault.
    pub fn system(operation: &'static str, source: std::io::Error) -> Self {
        Self::System { operation, source }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_error_names_the_failing_operation() {
        let err = RelayError::system(
            "accept connection",
            std::io::Error::new(std::io::ErrorKind::Other, "boom"),
        );
        let msg = err.to_string();
        assert!(msg.contains("accept connection"), "{msg}");
        assert!(msg.contains("boom"), "{msg}");
    }
}
