//! The cart store.
//!
//! [`CartStore`] keeps the current [`CartState`] snapshot in memory and
//! mirrors it to a [`KeyValueStorage`] key.
//!
//! # Lifecycle
//!
//! 1. [`CartStore::initialize`] hydrates the snapshot from storage once. An
//!    absent key, an unreadable backend, or a malformed blob all start the
//!    cart empty.
//! 2. Each mutation commits a new snapshot immediately and queues it for the
//!    background writer. Callers never wait on storage.
//! 3. The writer persists snapshots in commit order, skipping any that were
//!    superseded before it got to them. Write failures are logged and the
//!    in-memory snapshot stays authoritative.
//!
//! Dropping the last handle closes the queue; the writer drains what is left
//! and exits.

use std::convert::Infallible;
use std::sync::Arc;

use gomarket_core::{CartProduct, CartState, ProductId};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, instrument, warn};

use crate::config::CartConfig;
use crate::error::{CartError, Result};
use crate::storage::KeyValueStorage;

/// Messages for the persistence writer.
enum WriterCommand {
    Persist(Arc<CartState>),
    Flush(oneshot::Sender<()>),
}

/// Handle to a cart store.
///
/// Cheaply cloneable via `Arc`; all clones share one snapshot and one writer.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    storage_key: String,
    state: watch::Sender<Arc<CartState>>,
    writer: mpsc::UnboundedSender<WriterCommand>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("storage_key", &self.inner.storage_key)
            .field("items", &self.inner.state.borrow().len())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a store and hydrate it from storage.
    ///
    /// Spawns the persistence writer, so this must run inside a tokio runtime.
    #[instrument(skip_all, fields(key = %config.storage_key))]
    pub async fn initialize(storage: Arc<dyn KeyValueStorage>, config: &CartConfig) -> Self {
        let initial = hydrate(storage.as_ref(), &config.storage_key).await;
        info!(
            items = initial.len(),
            units = initial.total_quantity(),
            "Cart hydrated"
        );

        let (state, _) = watch::channel(Arc::new(initial));
        let (writer, commands) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(storage, config.storage_key.clone(), commands));

        Self {
            inner: Arc::new(CartStoreInner {
                storage_key: config.storage_key.clone(),
                state,
                writer,
            }),
        }
    }

    /// Current cart contents.
    #[must_use]
    pub fn products(&self) -> Arc<CartState> {
        Arc::clone(&self.inner.state.borrow())
    }

    /// Storage key this store writes to.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.inner.storage_key
    }

    /// Watch for committed snapshots.
    ///
    /// The receiver is marked changed after every successful mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<CartState>> {
        self.inner.state.subscribe()
    }

    /// Add one unit of `product` to the cart.
    ///
    /// A product already in the cart gains one unit; the descriptor passed
    /// here is ignored in favour of the stored line.
    #[instrument(skip_all, fields(product_id = %product.id))]
    pub fn add_to_cart(&self, product: CartProduct) {
        let Ok(()) = self.commit(move |state| Ok::<_, Infallible>(state.with_added(product)));
        debug!("Added to cart");
    }

    /// Add one unit to the line for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::State`] with `ItemNotFound` if the cart has no
    /// line for `id`. The cart and its storage are left unchanged.
    #[instrument(skip_all, fields(product_id = %id))]
    pub fn increment(&self, id: &ProductId) -> Result<()> {
        self.commit(|state| state.with_incremented(id))?;
        debug!("Incremented cart item");
        Ok(())
    }

    /// Remove one unit from the line for `id`, dropping the line at zero.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::State`] with `ItemNotFound` if the cart has no
    /// line for `id`. The cart and its storage are left unchanged.
    #[instrument(skip_all, fields(product_id = %id))]
    pub fn decrement(&self, id: &ProductId) -> Result<()> {
        self.commit(|state| state.with_decremented(id))?;
        debug!("Decremented cart item");
        Ok(())
    }

    /// Wait until every snapshot committed so far has been handed to storage.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::WriterClosed`] if the writer task has stopped.
    pub async fn flush(&self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.inner
            .writer
            .send(WriterCommand::Flush(done))
            .map_err(|_| CartError::WriterClosed)?;
        wait.await.map_err(|_| CartError::WriterClosed)
    }

    /// Apply `mutate` to the current snapshot and commit the result.
    ///
    /// The watch lock is held across the mutation and the enqueue, so
    /// concurrent callers serialize and the writer sees snapshots in commit
    /// order.
    fn commit<F, E>(&self, mutate: F) -> std::result::Result<(), E>
    where
        F: FnOnce(&CartState) -> std::result::Result<CartState, E>,
    {
        let mut outcome = Ok(());
        self.inner
            .state
            .send_if_modified(|current| match mutate(current.as_ref()) {
                Ok(next) => {
                    *current = Arc::new(next);
                    if self
                        .inner
                        .writer
                        .send(WriterCommand::Persist(Arc::clone(current)))
                        .is_err()
                    {
                        warn!("Cart writer stopped, snapshot not persisted");
                    }
                    true
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            });
        outcome
    }
}

/// Load the initial snapshot, falling back to an empty cart.
async fn hydrate(storage: &dyn KeyValueStorage, key: &str) -> CartState {
    match storage.get_item(key).await {
        Ok(Some(blob)) => CartState::from_json(&blob).unwrap_or_else(|e| {
            warn!(error = %e, "Stored cart is malformed, starting empty");
            CartState::new()
        }),
        Ok(None) => {
            debug!("No stored cart");
            CartState::new()
        }
        Err(e) => {
            warn!(error = %e, "Failed to read stored cart, starting empty");
            CartState::new()
        }
    }
}

/// Persist snapshots until every store handle is dropped.
async fn run_writer(
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    mut commands: mpsc::UnboundedReceiver<WriterCommand>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            WriterCommand::Persist(mut snapshot) => {
                // Only the newest queued snapshot matters, but a flush marks a
                // point that must be written before it is acknowledged.
                let mut flush = None;
                while let Ok(next) = commands.try_recv() {
                    match next {
                        WriterCommand::Persist(newer) => snapshot = newer,
                        WriterCommand::Flush(done) => {
                            flush = Some(done);
                            break;
                        }
                    }
                }

                persist(storage.as_ref(), &key, &snapshot).await;

                if let Some(done) = flush {
                    let _ = done.send(());
                }
            }
            WriterCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!(key = %key, "Cart writer stopped");
}

async fn persist(storage: &dyn KeyValueStorage, key: &str, snapshot: &CartState) {
    let json = match snapshot.to_json() {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "Failed to serialize cart");
            return;
        }
    };

    match storage.set_item(key, &json).await {
        Ok(()) => debug!(key = %key, items = snapshot.len(), "Cart persisted"),
        Err(e) => warn!(error = %e, key = %key, "Failed to persist cart"),
    }
}
