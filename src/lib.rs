//! menusync workspace root
//!
//! Re-exports the member crates and hosts the end-to-end tests that drive a
//! reconciliation all the way down to encoded frames.

pub use menusync_menu as menu;
pub use menusync_proto as proto;
pub use menusync_sync as sync;
