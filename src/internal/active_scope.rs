//! Per-execution-context tracking of the active scope.
//!
//! Every thread has its own stack of active scopes; with the `async` feature
//! every task additionally carries one through `tokio::task_local!`. Entries
//! are tagged with the provider that created them so that two providers
//! living on the same thread never see each other's scopes. When both stacks
//! hold an entry for a provider, the most recently activated one wins.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::provider::scope::{ScopeId, ScopeInner};

static NEXT_ACTIVATION: AtomicU64 = AtomicU64::new(1);

#[derive(Clone)]
pub(crate) struct ActiveEntry {
    pub(crate) provider: u64,
    pub(crate) scope: Arc<ScopeInner>,
    /// Activation order across thread and task stacks.
    #[cfg_attr(not(feature = "async"), allow(dead_code))]
    seq: u64,
}

impl ActiveEntry {
    pub(crate) fn new(provider: u64, scope: Arc<ScopeInner>) -> Self {
        Self {
            provider,
            scope,
            seq: NEXT_ACTIVATION.fetch_add(1, Ordering::Relaxed),
        }
    }
}

fn innermost<'a>(
    stack: impl DoubleEndedIterator<Item = &'a ActiveEntry>,
    provider: u64,
) -> Option<ActiveEntry> {
    stack.rev().find(|e| e.provider == provider).cloned()
}

thread_local! {
    static THREAD_SCOPES: RefCell<Vec<ActiveEntry>> = const { RefCell::new(Vec::new()) };
}

#[cfg(feature = "async")]
tokio::task_local! {
    static TASK_SCOPES: Vec<ActiveEntry>;
}

/// Makes `scope` the innermost active scope on this thread.
pub(crate) fn push(entry: ActiveEntry) {
    THREAD_SCOPES.with(|stack| stack.borrow_mut().push(entry));
}

/// Removes the innermost entry for `id`. Searching by id keeps the stack
/// correct even when guards are dropped out of order.
pub(crate) fn remove(id: ScopeId) {
    THREAD_SCOPES.with(|stack| {
        let mut stack = stack.borrow_mut();
        if let Some(pos) = stack.iter().rposition(|e| e.scope.id == id) {
            stack.remove(pos);
        }
    });
}

/// The active scope of `provider` for the current execution context.
pub(crate) fn current(provider: u64) -> Option<Arc<ScopeInner>> {
    let active = THREAD_SCOPES.with(|stack| innermost(stack.borrow().iter(), provider));

    #[cfg(feature = "async")]
    let active = {
        let from_task = TASK_SCOPES
            .try_with(|stack| innermost(stack.iter(), provider))
            .ok()
            .flatten();
        match (active, from_task) {
            (Some(t), Some(k)) => Some(if t.seq > k.seq { t } else { k }),
            (t, k) => t.or(k),
        }
    };

    active.map(|e| e.scope)
}

/// Runs `fut` with `entry` pushed on top of the current task's scope stack.
/// The previous stack is restored when the future completes or is dropped.
#[cfg(feature = "async")]
pub(crate) async fn run_in_task_scope<F>(entry: ActiveEntry, fut: F) -> F::Output
where
    F: std::future::Future,
{
    let mut stack = TASK_SCOPES.try_with(|s| s.clone()).unwrap_or_default();
    stack.push(entry);
    TASK_SCOPES.scope(stack, fut).await
}

#[cfg(test)]
pub(crate) fn thread_depth() -> usize {
    THREAD_SCOPES.with(|stack| stack.borrow().len())
}
