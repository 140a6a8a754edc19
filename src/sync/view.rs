// View ordering
// Active tasks precede done tasks; newest first within each group.

use crate::models::Task;

/// Compute the display ordering of the cache.
///
/// All `done == false` entries precede all `done == true` entries; within
/// each group, descending `created_at`. The result is a fresh projection,
/// never stored state.
pub(crate) fn sorted(tasks: &[Task]) -> Vec<Task> {
    let mut view = tasks.to_vec();
    view.sort_by(|a, b| a.done.cmp(&b.done).then(b.created_at.cmp(&a.created_at)));
    view
}
