//! Local media bridge over the MPRIS D-Bus interface.
//!
//! A background thread reads the session bus on a short period and keeps the
//! latest `LocalMedia` record in a shared slot. The tick driver reads that
//! slot through the `MediaSource` trait and never touches D-Bus itself.

mod bridge;
mod metadata;

pub use bridge::{MediaSource, MprisBridge, NoMedia};
