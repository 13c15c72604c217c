//! Local image relay for browser-based overlays.
//!
//! Overlays loaded from a file or another origin cannot read pixels from
//! arbitrary cover URLs. `GET /relay?url=<target>` fetches the target (HTTP or
//! a local `file://` path) and streams it back with a permissive CORS header.

mod handler;
mod server;

pub use server::RelayServer;
