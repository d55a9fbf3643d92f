//! Optimistic update with rollback.
//!
//! `apply` mutates local state synchronously and returns an undo record (or
//! `None` when there is nothing to change, in which case no remote write is
//! issued). `commit` performs the remote write. On failure `revert` receives
//! the undo record and restores the previous value before the error is
//! returned. The state lock is never held across the `commit` await.

#[cfg(test)]
#[path = "optimistic_test.rs"]
mod optimistic_test;

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<S>(state: &Mutex<S>) -> MutexGuard<'_, S> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run one optimistic mutation against `state`.
///
/// Returns `Ok(Some(undo))` when committed, `Ok(None)` for a no-op.
///
/// # Errors
///
/// Returns the `commit` error after `revert` has been applied.
pub async fn optimistic<S, P, E, A, R, C, Fut>(state: &Mutex<S>, apply: A, revert: R, commit: C) -> Result<Option<P>, E>
where
    A: FnOnce(&mut S) -> Option<P>,
    R: FnOnce(&mut S, &P),
    C: FnOnce(&P) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    let pending = apply(&mut lock(state));
    let Some(pending) = pending else {
        return Ok(None);
    };

    match commit(&pending).await {
        Ok(()) => Ok(Some(pending)),
        Err(err) => {
            revert(&mut lock(state), &pending);
            Err(err)
        }
    }
}
