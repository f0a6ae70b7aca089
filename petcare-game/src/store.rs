//! The pet store: single owner of the active pet.
//!
//! Every operation updates the in-memory record synchronously and then queues
//! a write to the persistence gateway. Writes run on one background task in
//! the order they were issued; a failed write is logged and never rolls back
//! the in-memory change. The next successful write carries the current record
//! forward.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::KeyValueStorage;
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, StoreConfig};
use crate::decay::DecayTimer;
use crate::pet::{ClothingSlot, NewPet, Pet};
use crate::persistence::{PersistError, PetRepository};

/// Lifecycle of the store as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    /// Stored record not read yet; every operation is ignored.
    Loading,
    Empty,
    Active,
}

#[derive(Debug)]
enum PetSlot {
    Loading,
    Empty,
    Active(Pet),
}

impl PetSlot {
    const fn status(&self) -> StoreStatus {
        match self {
            Self::Loading => StoreStatus::Loading,
            Self::Empty => StoreStatus::Empty,
            Self::Active(_) => StoreStatus::Active,
        }
    }
}

#[derive(Debug)]
enum WriteOp {
    Save(Pet),
    Remove,
}

impl WriteOp {
    const fn label(&self) -> &'static str {
        match self {
            Self::Save(_) => "save",
            Self::Remove => "remove",
        }
    }
}

type WriteResult = Result<(), PersistError>;

#[derive(Debug)]
struct WriteJob {
    op: WriteOp,
    done: oneshot::Sender<WriteResult>,
}

/// Completion handle for a queued write.
///
/// Dropping the ticket leaves the write to finish in the background. Awaiting
/// [`WriteTicket::persisted`] lets a caller sequence follow-up work after the
/// record hits storage.
#[derive(Debug)]
#[must_use = "drop the ticket explicitly if the write outcome does not matter"]
pub struct WriteTicket {
    receiver: Option<oneshot::Receiver<WriteResult>>,
}

impl WriteTicket {
    const fn noop() -> Self {
        Self { receiver: None }
    }

    const fn pending(receiver: oneshot::Receiver<WriteResult>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// True when the operation was ignored and nothing was queued.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.receiver.is_none()
    }

    /// Wait for the queued write. Ignored operations resolve immediately.
    ///
    /// # Errors
    ///
    /// Returns the storage failure, or [`PersistError::WriterClosed`] if the
    /// write-behind task was gone before the write ran.
    pub async fn persisted(self) -> WriteResult {
        match self.receiver {
            None => Ok(()),
            Some(receiver) => receiver
                .await
                .unwrap_or_else(|_| Err(PersistError::WriterClosed)),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct StoreInner<S> {
    slot: Mutex<PetSlot>,
    queue: Mutex<Option<mpsc::UnboundedSender<WriteJob>>>,
    repo: Arc<PetRepository<S>>,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
    // Taken after `slot`, never before it. Decay ticks only take `slot`.
    decay: Mutex<Option<DecayTimer>>,
}

impl<S: KeyValueStorage> StoreInner<S> {
    /// Read-modify-write against whatever is current at call time.
    fn mutate(&self, op: &'static str, transition: impl FnOnce(&Pet) -> Pet) -> WriteTicket {
        let mut slot = lock(&self.slot);
        let PetSlot::Active(current) = &*slot else {
            log::debug!("{op} ignored: no active pet");
            return WriteTicket::noop();
        };
        let next = transition(current);
        // Queue under the slot lock so write order matches mutation order.
        let ticket = self.enqueue(WriteOp::Save(next.clone()));
        *slot = PetSlot::Active(next);
        ticket
    }

    fn enqueue(&self, op: WriteOp) -> WriteTicket {
        let (done, receiver) = oneshot::channel();
        let label = op.label();
        match lock(&self.queue).as_ref() {
            Some(sender) => {
                if sender.send(WriteJob { op, done }).is_err() {
                    log::warn!("write-behind task stopped; pet {label} kept in memory only");
                }
            }
            None => log::warn!("store is shut down; pet {label} kept in memory only"),
        }
        WriteTicket::pending(receiver)
    }

    /// One decay step. Returns `false` once there is no pet left to decay.
    fn apply_decay(&self) -> bool {
        let step = self.config.decay_step;
        let ticket = self.mutate("decay", |pet| {
            let next = pet.decayed(step);
            log::debug!(
                "decay tick: hunger {} -> {}, hygiene {} -> {}",
                pet.hunger,
                next.hunger,
                pet.hygiene,
                next.hygiene
            );
            next
        });
        !ticket.is_noop()
    }

    fn arm_decay(self: &Arc<Self>) {
        if !self.config.decay_enabled {
            return;
        }
        let weak = Arc::downgrade(self);
        let timer = DecayTimer::arm(self.config.decay_interval(), move || {
            weak.upgrade().is_some_and(|inner| inner.apply_decay())
        });
        // Replacing an older timer drops and aborts it.
        *lock(&self.decay) = Some(timer);
    }

    fn disarm_decay(&self) {
        if let Some(timer) = lock(&self.decay).take() {
            timer.cancel();
        }
    }
}

/// Owns the single pet and every write to storage.
///
/// Must be constructed inside a Tokio runtime: construction spawns the
/// write-behind task, and activation spawns the decay timer.
pub struct PetStore<S> {
    inner: Arc<StoreInner<S>>,
    writer: Option<JoinHandle<()>>,
}

impl<S: KeyValueStorage> PetStore<S> {
    /// Store in the `Loading` state, stamping times from the system clock.
    ///
    /// # Errors
    ///
    /// Returns the first invariant `config` violates.
    pub fn new(storage: S, config: StoreConfig) -> Result<Self, ConfigError> {
        Self::with_clock(storage, config, Arc::new(SystemClock))
    }

    /// # Errors
    ///
    /// Returns the first invariant `config` violates.
    pub fn with_clock(
        storage: S,
        config: StoreConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let repo = Arc::new(PetRepository::new(storage, config.storage_key.clone()));
        let (sender, jobs) = mpsc::unbounded_channel();
        let writer = tokio::spawn(run_writer(Arc::clone(&repo), jobs));
        let inner = Arc::new(StoreInner {
            slot: Mutex::new(PetSlot::Loading),
            queue: Mutex::new(Some(sender)),
            repo,
            clock,
            config,
            decay: Mutex::new(None),
        });
        Ok(Self {
            inner,
            writer: Some(writer),
        })
    }

    /// Construct and hydrate in one step.
    ///
    /// # Errors
    ///
    /// Returns the first invariant `config` violates.
    pub async fn open(storage: S, config: StoreConfig) -> Result<Self, ConfigError> {
        let store = Self::new(storage, config)?;
        store.hydrate().await;
        Ok(store)
    }

    /// Leave `Loading` by reading the stored record. Later calls are no-ops.
    pub async fn hydrate(&self) -> StoreStatus {
        if !self.is_loading() {
            return self.status();
        }

        let repo = Arc::clone(&self.inner.repo);
        let loaded = match tokio::task::spawn_blocking(move || repo.load()).await {
            Ok(pet) => pet,
            Err(err) => {
                log::error!("pet load task failed: {err}");
                None
            }
        };

        let mut slot = lock(&self.inner.slot);
        if !matches!(*slot, PetSlot::Loading) {
            return slot.status();
        }
        match loaded {
            Some(pet) => {
                log::info!("loaded pet {} ({})", pet.name, pet.id);
                *slot = PetSlot::Active(pet);
                self.inner.arm_decay();
            }
            None => {
                log::info!("no stored pet");
                *slot = PetSlot::Empty;
            }
        }
        slot.status()
    }

    #[must_use]
    pub fn status(&self) -> StoreStatus {
        lock(&self.inner.slot).status()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status() == StoreStatus::Loading
    }

    /// Snapshot of the current pet.
    #[must_use]
    pub fn pet(&self) -> Option<Pet> {
        match &*lock(&self.inner.slot) {
            PetSlot::Active(pet) => Some(pet.clone()),
            PetSlot::Loading | PetSlot::Empty => None,
        }
    }

    /// Age of the current pet by the store's clock.
    #[must_use]
    pub fn age(&self) -> Option<u8> {
        let now = self.inner.clock.now_millis();
        self.pet().map(|pet| pet.age(now))
    }

    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn repository(&self) -> &PetRepository<S> {
        &self.inner.repo
    }

    /// Hatch a new pet, replacing any current one. Ignored while loading.
    ///
    /// Decay is re-armed under the slot lock, so a racing `remove_pet` either
    /// runs first and is overwritten, or runs after and disarms this pet.
    ///
    /// The name is not validated here; the creation form refuses blank names.
    pub fn create_pet(&self, spec: NewPet) -> WriteTicket {
        let mut slot = lock(&self.inner.slot);
        match &*slot {
            PetSlot::Loading => {
                log::debug!("create ignored: store still loading");
                return WriteTicket::noop();
            }
            PetSlot::Active(old) => {
                log::warn!("replacing pet {} without removing it first", old.id);
            }
            PetSlot::Empty => {}
        }
        let pet = Pet::hatch(
            Uuid::new_v4().to_string(),
            spec,
            self.inner.clock.now_millis(),
        );
        log::info!("created pet {} ({})", pet.name, pet.id);
        let ticket = self.inner.enqueue(WriteOp::Save(pet.clone()));
        *slot = PetSlot::Active(pet);
        self.inner.arm_decay();
        ticket
    }

    pub fn feed(&self, amount: u8) -> WriteTicket {
        self.inner.mutate("feed", |pet| pet.fed(amount))
    }

    pub fn play(&self) -> WriteTicket {
        self.inner.mutate("play", Pet::played)
    }

    pub fn bathe(&self, amount: u8) -> WriteTicket {
        self.inner.mutate("bathe", |pet| pet.bathed(amount))
    }

    /// Equip or clear one slot. Item ids are not checked against the catalog.
    pub fn set_clothing(&self, slot: ClothingSlot, item: Option<String>) -> WriteTicket {
        self.inner
            .mutate("set_clothing", |pet| pet.wearing(slot, item))
    }

    pub fn set_background(&self, background: Option<String>) -> WriteTicket {
        self.inner
            .mutate("set_background", |pet| pet.with_background(background))
    }

    pub fn earn_money(&self, amount: u64) -> WriteTicket {
        self.inner.mutate("earn_money", |pet| pet.earned(amount))
    }

    /// Forget the pet in memory and delete the stored record.
    pub fn remove_pet(&self) -> WriteTicket {
        let mut slot = lock(&self.inner.slot);
        let PetSlot::Active(pet) = &*slot else {
            log::debug!("remove ignored: no active pet");
            return WriteTicket::noop();
        };
        log::info!("removing pet {} ({})", pet.name, pet.id);
        let ticket = self.inner.enqueue(WriteOp::Remove);
        *slot = PetSlot::Empty;
        self.inner.disarm_decay();
        ticket
    }

    /// Stop decay, then wait for every queued write to finish.
    pub async fn shutdown(mut self) {
        self.inner.disarm_decay();
        drop(lock(&self.inner.queue).take());
        if let Some(writer) = self.writer.take()
            && let Err(err) = writer.await
        {
            log::error!("write-behind task ended abnormally: {err}");
        }
    }

    #[cfg(test)]
    fn decay_running(&self) -> bool {
        lock(&self.inner.decay)
            .as_ref()
            .is_some_and(DecayTimer::is_running)
    }
}

async fn run_writer<S: KeyValueStorage>(
    repo: Arc<PetRepository<S>>,
    mut jobs: mpsc::UnboundedReceiver<WriteJob>,
) {
    while let Some(WriteJob { op, done }) = jobs.recv().await {
        let label = op.label();
        let repo = Arc::clone(&repo);
        let result = tokio::task::spawn_blocking(move || match op {
            WriteOp::Save(pet) => repo.save(&pet),
            WriteOp::Remove => repo.remove(),
        })
        .await
        .unwrap_or_else(|err| Err(PersistError::Storage(Box::new(err))));

        if let Err(err) = &result {
            log::warn!("pet {label} failed, keeping in-memory state: {err}");
        }
        // The caller may have dropped its ticket.
        let _ = done.send(result);
    }
    log::debug!("write-behind queue closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::pet::{Gender, PetColor, PetKind};
    use crate::storage::MemoryStorage;

    fn spec() -> NewPet {
        NewPet::new("Rex", PetKind::Dog, Gender::Male, PetColor::Brown)
    }

    fn store(storage: &MemoryStorage) -> PetStore<MemoryStorage> {
        PetStore::with_clock(
            storage.clone(),
            StoreConfig::default(),
            Arc::new(ManualClock::at(1_000)),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn operations_are_ignored_while_loading() {
        let storage = MemoryStorage::new();
        let store = store(&storage);
        assert!(store.is_loading());
        assert!(store.create_pet(spec()).is_noop());
        assert!(store.feed(10).is_noop());
        assert!(store.remove_pet().is_noop());
        assert!(store.pet().is_none());
        assert_eq!(store.hydrate().await, StoreStatus::Empty);
    }

    #[tokio::test]
    async fn hydrate_is_idempotent() {
        let storage = MemoryStorage::new();
        let store = store(&storage);
        store.hydrate().await;
        store.create_pet(spec()).persisted().await.unwrap();
        assert_eq!(store.hydrate().await, StoreStatus::Active);
        assert_eq!(store.pet().map(|p| p.name), Some("Rex".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn decay_follows_active_transitions() {
        let storage = MemoryStorage::new();
        let store = store(&storage);
        store.hydrate().await;
        assert!(!store.decay_running());

        store.create_pet(spec()).persisted().await.unwrap();
        assert!(store.decay_running());

        store.remove_pet().persisted().await.unwrap();
        assert!(!store.decay_running());
        store.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_after_remove_keeps_decay_armed() {
        let storage = MemoryStorage::new();
        let store = store(&storage);
        store.hydrate().await;
        let _ = store.create_pet(spec());
        let _ = store.remove_pet();
        let _ = store.create_pet(spec());
        assert!(store.decay_running());

        let _ = store.remove_pet();
        assert!(!store.decay_running());
        store.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_spawning() {
        let clock = Arc::new(ManualClock::at(0));
        let zero_interval = StoreConfig {
            decay_interval_ms: 0,
            ..StoreConfig::default()
        };
        assert!(matches!(
            PetStore::with_clock(MemoryStorage::new(), zero_interval, clock.clone()),
            Err(ConfigError::ZeroDecayInterval)
        ));

        let zero_step = StoreConfig {
            decay_step: 0,
            ..StoreConfig::default()
        };
        assert!(matches!(
            PetStore::with_clock(MemoryStorage::new(), zero_step, clock),
            Err(ConfigError::DecayStepRange { value: 0, .. })
        ));

        let empty_key = StoreConfig::default().with_storage_key("");
        assert!(matches!(
            PetStore::open(MemoryStorage::new(), empty_key).await,
            Err(ConfigError::EmptyStorageKey)
        ));
    }

    #[tokio::test]
    async fn disabled_decay_never_arms() {
        let storage = MemoryStorage::new();
        let store = PetStore::with_clock(
            storage,
            StoreConfig::default().without_decay(),
            Arc::new(ManualClock::at(0)),
        )
        .unwrap();
        store.hydrate().await;
        let _ = store.create_pet(spec());
        assert!(!store.decay_running());
    }

    #[tokio::test]
    async fn writes_after_shutdown_report_closed_queue() {
        let storage = MemoryStorage::new();
        let store = store(&storage);
        store.hydrate().await;
        store.create_pet(spec()).persisted().await.unwrap();
        let inner = Arc::clone(&store.inner);
        store.shutdown().await;

        let ticket = inner.mutate("feed", |pet| pet.fed(5));
        assert!(matches!(
            ticket.persisted().await,
            Err(PersistError::WriterClosed)
        ));
    }
}
