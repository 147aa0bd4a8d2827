//! Headless view components. Each owns its subscriptions and releases them
//! in `destroy`.

pub mod header;
pub mod post_list;
pub mod product_list;

pub use header::{HeaderComponent, HeaderState};
pub use post_list::{PostListComponent, PostListState};
pub use product_list::ProductListComponent;

use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Abort every subscription task and wait until none can run again.
async fn unsubscribe_all(subscriptions: &mut Vec<JoinHandle<()>>) {
    for handle in subscriptions.drain(..) {
        handle.abort();
        let _ = handle.await;
    }
}
