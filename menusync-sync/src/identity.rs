//! Remote identity transfer onto kept nodes

use menusync_menu::MenuNode;
use tracing::trace;

use crate::errors::{Result, SyncError};
use crate::matcher::MatchResult;

/// Copy the remote id of every kept old node onto its new counterpart
///
/// The caller replaces nodes wholesale on each update; this is what lets a
/// later host event carrying an old id still resolve to the new node.
/// Returns the number of ids transferred.
pub fn transfer_identities(
    old: &[MenuNode],
    new: &mut [MenuNode],
    matched: &MatchResult,
) -> Result<usize> {
    if matched.old_states.len() != old.len() || matched.new_states.len() != new.len() {
        return Err(SyncError::MatchMismatch(format!(
            "result covers {}/{} nodes, menus have {}/{}",
            matched.old_states.len(),
            matched.new_states.len(),
            old.len(),
            new.len()
        )));
    }

    let pairs = matched.kept_pairs()?;
    for &(old_index, new_index) in pairs {
        let id = old[old_index].remote_id;
        trace!("Transferring id {} to '{}'", id, new[new_index].title);
        new[new_index].remote_id = id;
    }
    Ok(pairs.len())
}
