pub mod client;
pub mod handler;

pub use client::SshClient;
pub use handler::ClientHandler;
