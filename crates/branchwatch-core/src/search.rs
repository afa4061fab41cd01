// ── Branch search ──

use std::borrow::Borrow;

use crate::model::Branch;

/// Case-insensitive substring match on the branch name.
///
/// An empty (or whitespace-only) term keeps every branch.
pub fn filter_branches<B>(branches: &[B], term: &str) -> Vec<B>
where
    B: Borrow<Branch> + Clone,
{
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return branches.to_vec();
    }
    branches
        .iter()
        .filter(|b| {
            Borrow::<Branch>::borrow(*b)
                .name
                .to_lowercase()
                .contains(&needle)
        })
        .cloned()
        .collect()
}
