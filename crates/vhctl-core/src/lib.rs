#![deny(unsafe_code)]

//! vhctl core library.
//!
//! Drives the VirtualHere USB client daemon: delivers commands over one of
//! three transports, classifies and parses the replies, and optionally keeps
//! the daemon running as a supervised background process.
//!
//! ```text
//! Client ──▶ Command ──▶ Transport ──▶ RawReply ──▶ classify ──▶ parser
//!   │
//!   └──▶ ServiceSupervisor (spawn, monitor, EXIT/kill)
//! ```

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send` boxed future, used as the return type of
/// [`Transport::send`] so transports can live behind `dyn Transport`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Reply classification into success, failure, or daemon error.
pub mod classify;
/// The command facade.
pub mod client;
/// Command line construction.
pub mod command;
/// Error types.
pub mod error;
/// Subscriber installation.
pub mod logging;
/// Text and XML reply parsers.
pub mod parser;
/// Managed daemon process.
pub mod service;
/// Subprocess, Unix socket, and named pipe transports.
pub mod transport;
/// Domain types built from replies.
pub mod types;

pub use classify::{CommandError, CommandResult};
pub use client::{Client, ClientBuilder};
pub use command::Command;
pub use error::{ClientError, Stage, TransportError};
pub use service::{ServiceSupervisor, TerminationCallback};
pub use transport::{RawReply, Transport, select_transport};
pub use types::{
    ClientState, Device, DeviceInfo, Hub, ReverseClient, ServerInfo, XmlClientState, XmlDevice,
    XmlServer, XmlServerConnection,
};
