//! Normalized now-playing record and the adapters that produce it.
//!
//! Both feeds (the local MPRIS bridge and the polled HTTP endpoint) are
//! converted into a single `TrackStatus` here. Everything in this module is
//! pure: no I/O beyond resolving local cover paths.

mod cover;
mod model;
mod normalize;
mod time;

pub use cover::normalize_cover_url;
pub use model::*;
pub use normalize::{LocalMedia, normalize_local, normalize_polled};
pub use time::{TimeValue, format_mmss, parse_seconds};
