//! Fusion core: the shared snapshot slots, the arbitration policy and the
//! progress extrapolator for the polled feed.

mod arbiter;
mod extrapolate;
mod store;

pub use arbiter::select_active;
pub use extrapolate::Extrapolator;
pub use store::SnapshotStore;
