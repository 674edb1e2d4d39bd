//! Domain models shared by the discovery and invocation clients.

pub mod tool;
