//! Would-block classification.
//!
//! Tokio sockets are non-blocking at the OS level, so a read or write on an
//! idle connection fails with a transient "no data right now" error rather
//! than suspending the task. Everything above this module depends only on
//! this predicate, never on platform error codes.

use std::io;

/// True iff the error means "try again later" rather than a real failure.
///
/// Covers `EAGAIN`/`EWOULDBLOCK` (`WouldBlock`) and `EINTR` (`Interrupted`).
pub fn is_would_block(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn would_block_is_transient() {
        let err = io::Error::new(io::ErrorKind::WouldBlock, "no data");
        assert!(is_would_block(&err));
    }

    #[test]
    fn interrupted_is_transient() {
        let err = io::Error::new(io::ErrorKind::Interrupted, "eintr");
        assert!(is_would_block(&err));
    }

    #[test]
    fn real_failures_are_not_transient() {
        for kind in [
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::Other,
        ] {
            let err = io::Error::new(kind, "fatal");
            assert!(!is_would_block(&err), "{kind:?} misclassified as transient");
        }
    }
}
