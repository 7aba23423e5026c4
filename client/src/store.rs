//! Cart, favorites, notifications and tickets for the signed-in user.
//!
//! [`ClientStore`] is the only writer. Each mutation works on a uniquely
//! owned copy of the state (see [`Arc::make_mut`]), so a snapshot handed out
//! by [`ClientStore::state`] never changes underneath its holder. After every
//! mutation the whole state is written to storage under [`STORE_KEY`].

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{CartItem, EventId, NewNotification, Notification, Ticket};
use crate::storage::{load_json, save_json, Storage, STORE_KEY};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreState {
    pub cart: Vec<CartItem>,
    pub favorites: Vec<EventId>,
    pub notifications: Vec<Notification>,
    pub tickets: Vec<Ticket>,
}

pub struct ClientStore {
    state: Arc<StoreState>,
    storage: Arc<dyn Storage>,
    last_notification_id: i64,
    persist_error: Option<String>,
}

impl ClientStore {
    /// Hydrates from the persisted snapshot. A missing or unreadable
    /// snapshot yields the empty state.
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        let state = match load_json::<StoreState>(storage.as_ref(), STORE_KEY) {
            Ok(Some(state)) => state,
            Ok(None) => StoreState::default(),
            Err(e) => {
                warn!(error = %e, key = STORE_KEY, "discarding unreadable store snapshot");
                StoreState::default()
            }
        };

        let last_notification_id = state
            .notifications
            .iter()
            .filter_map(|n| n.id.parse::<i64>().ok())
            .max()
            .unwrap_or_default();

        Self {
            state: Arc::new(state),
            storage,
            last_notification_id,
            persist_error: None,
        }
    }

    pub fn state(&self) -> Arc<StoreState> {
        Arc::clone(&self.state)
    }

    pub fn cart(&self) -> &[CartItem] {
        &self.state.cart
    }

    pub fn favorites(&self) -> &[EventId] {
        &self.state.favorites
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.state.notifications
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.state.tickets
    }

    pub fn is_favorite(&self, event_id: EventId) -> bool {
        self.state.favorites.contains(&event_id)
    }

    pub fn unread_count(&self) -> usize {
        self.state.notifications.iter().filter(|n| !n.read).count()
    }

    /// Total tickets across cart entries.
    pub fn cart_count(&self) -> u32 {
        self.state
            .cart
            .iter()
            .fold(0, |count, item| count.saturating_add(item.quantity))
    }

    /// False after a snapshot write failed, until the next write succeeds.
    pub fn is_durable(&self) -> bool {
        self.persist_error.is_none()
    }

    pub fn last_persist_error(&self) -> Option<&str> {
        self.persist_error.as_deref()
    }

    /// Adds `item`, or grows the existing entry for the same event by
    /// `item.quantity`.
    pub fn add_to_cart(&mut self, item: CartItem) {
        self.mutate(|state| {
            match state.cart.iter_mut().find(|c| c.event_id == item.event_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                }
                None => state.cart.push(item),
            }
        });
    }

    pub fn remove_from_cart(&mut self, event_id: EventId) {
        self.mutate(|state| state.cart.retain(|item| item.event_id != event_id));
    }

    /// Callers bound `quantity` with [`crate::models::clamp_quantity`].
    pub fn update_cart_quantity(&mut self, event_id: EventId, quantity: u32) {
        self.mutate(|state| {
            if let Some(item) = state.cart.iter_mut().find(|c| c.event_id == event_id) {
                item.quantity = quantity;
            }
        });
    }

    pub fn clear_cart(&mut self) {
        self.mutate(|state| state.cart.clear());
    }

    pub fn toggle_favorite(&mut self, event_id: EventId) {
        self.mutate(|state| {
            if state.favorites.contains(&event_id) {
                state.favorites.retain(|id| *id != event_id);
            } else {
                state.favorites.push(event_id);
            }
        });
    }

    /// Prepends the notification and returns its id.
    pub fn add_notification(&mut self, notification: NewNotification) -> String {
        let now = Utc::now();
        let id = now.timestamp_millis().max(self.last_notification_id + 1);
        self.last_notification_id = id;

        let id = id.to_string();
        let entry = Notification {
            id: id.clone(),
            title: notification.title,
            message: notification.message,
            kind: notification.kind,
            read: notification.read,
            timestamp: now,
        };
        self.mutate(|state| state.notifications.insert(0, entry));
        id
    }

    pub fn mark_notification_as_read(&mut self, id: &str) {
        self.mutate(|state| {
            if let Some(n) = state.notifications.iter_mut().find(|n| n.id == id) {
                n.read = true;
            }
        });
    }

    pub fn clear_notifications(&mut self) {
        self.mutate(|state| state.notifications.clear());
    }

    /// Appends without checking for an existing ticket with the same id.
    pub fn add_ticket(&mut self, ticket: Ticket) {
        self.mutate(|state| state.tickets.push(ticket));
    }

    pub fn update_ticket_rating(&mut self, ticket_id: &str, rating: u8, feedback: Option<String>) {
        self.mutate(|state| {
            if let Some(ticket) = state.tickets.iter_mut().find(|t| t.id == ticket_id) {
                ticket.rating = Some(rating);
                ticket.feedback = feedback;
            }
        });
    }

    pub fn clear_user_data(&mut self) {
        self.mutate(|state| *state = StoreState::default());
    }

    /// Drops the persisted snapshot. In-memory state is left as is.
    pub fn discard_persisted(&mut self) {
        match self.storage.remove(STORE_KEY) {
            Ok(()) => self.persist_error = None,
            Err(e) => {
                warn!(error = %e, key = STORE_KEY, "failed to remove store snapshot");
                self.persist_error = Some(e.to_string());
            }
        }
    }

    fn mutate(&mut self, apply: impl FnOnce(&mut StoreState)) {
        apply(Arc::make_mut(&mut self.state));
        self.persist();
    }

    fn persist(&mut self) {
        match save_json(self.storage.as_ref(), STORE_KEY, &*self.state) {
            Ok(()) => {
                if self.persist_error.take().is_some() {
                    debug!(key = STORE_KEY, "store snapshot durable again");
                }
            }
            Err(e) => {
                warn!(error = %e, key = STORE_KEY, "store snapshot not persisted");
                self.persist_error = Some(e.to_string());
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::models::{NotificationKind, TicketStatus};
    use crate::storage::{MemoryStorage, StorageError};

    pub(crate) fn cart_item(event_id: EventId, price: i64, quantity: u32) -> CartItem {
        CartItem {
            event_id,
            title: format!("Event {event_id}"),
            price: Decimal::new(price, 0),
            date: "March 25, 2024".to_string(),
            time: "10:00 AM - 6:00 PM".to_string(),
            location: "Engineering Block A, Main Auditorium".to_string(),
            building: "Engineering Block A".to_string(),
            room: "Main Auditorium".to_string(),
            category: "Technology".to_string(),
            image: "/event.jpg".to_string(),
            organizer: "Tech Club".to_string(),
            quantity,
            max_attendees: 500,
            attendees: 120,
        }
    }

    pub(crate) fn ticket(id: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            event_id: 1,
            title: "Annual Tech Summit".to_string(),
            category: "Technology".to_string(),
            date: "March 25, 2024".to_string(),
            time: "10:00 AM - 6:00 PM".to_string(),
            location: "Engineering Block A, Main Auditorium".to_string(),
            building: "Engineering Block A".to_string(),
            room: "Main Auditorium".to_string(),
            price: Decimal::new(399, 0),
            purchase_date: "March 10, 2024".to_string(),
            status: TicketStatus::Confirmed,
            image: "/event.jpg".to_string(),
            organizer: "Tech Club".to_string(),
            organizer_contact: "+91 98765 43210".to_string(),
            organizer_email: "techclub@college.edu".to_string(),
            qr_code: "data:image/svg+xml;base64,".to_string(),
            seat_number: "A-15".to_string(),
            ticket_type: "Regular".to_string(),
            order_number: "ORD2024001".to_string(),
            payment_method: "UPI".to_string(),
            refundable: true,
            transferable: true,
            description: "Technology discussions".to_string(),
            quantity: 1,
            rating: None,
            feedback: None,
            cancellation_reason: None,
            refund_amount: None,
            refund_status: None,
        }
    }

    fn store() -> (Arc<MemoryStorage>, ClientStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = ClientStore::open(storage.clone());
        (storage, store)
    }

    /// Fails every write while `failing` is set.
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        failing: AtomicBool,
    }

    impl Storage for FlakyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded").into());
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn adding_same_event_twice_merges_quantities() {
        let (_, mut store) = store();
        store.add_to_cart(cart_item(3, 50, 2));
        store.add_to_cart(cart_item(3, 50, 1));

        assert_eq!(store.cart().len(), 1);
        assert_eq!(store.cart()[0].quantity, 3);
        assert_eq!(store.cart_count(), 3);
    }

    #[test]
    fn merged_quantity_saturates_instead_of_overflowing() {
        let (_, mut store) = store();
        store.add_to_cart(cart_item(3, 50, u32::MAX - 1));
        store.add_to_cart(cart_item(3, 50, 5));
        store.add_to_cart(cart_item(4, 50, 2));

        assert_eq!(store.cart()[0].quantity, u32::MAX);
        assert_eq!(store.cart_count(), u32::MAX);
    }

    #[test]
    fn cart_quantity_update_and_removal() {
        let (_, mut store) = store();
        store.add_to_cart(cart_item(7, 100, 2));
        assert_eq!(store.cart().len(), 1);
        assert_eq!(store.cart()[0].quantity, 2);

        store.update_cart_quantity(7, 1);
        assert_eq!(store.cart()[0].quantity, 1);

        store.remove_from_cart(7);
        assert!(store.cart().is_empty());
    }

    #[test]
    fn absent_ids_are_no_ops() {
        let (_, mut store) = store();
        store.add_to_cart(cart_item(1, 10, 1));
        let before = store.state();

        store.remove_from_cart(99);
        store.remove_from_cart(99);
        store.update_cart_quantity(99, 4);
        store.mark_notification_as_read("missing");
        store.update_ticket_rating("missing", 5, None);

        assert_eq!(*store.state(), *before);
    }

    #[test]
    fn toggle_favorite_is_self_inverse() {
        let (_, mut store) = store();
        store.toggle_favorite(2);
        let original = store.favorites().to_vec();

        store.toggle_favorite(5);
        assert!(store.is_favorite(5));
        store.toggle_favorite(5);

        assert_eq!(store.favorites(), original.as_slice());
        assert!(!store.is_favorite(5));
    }

    #[test]
    fn notifications_are_prepended_with_unique_ids() {
        let (_, mut store) = store();
        let first = store.add_notification(NewNotification::success("one", "first"));
        let second = store.add_notification(NewNotification::error("two", "second"));
        let third = store.add_notification(NewNotification::new(
            "three",
            "third",
            NotificationKind::Info,
        ));

        let ids: Vec<&str> = store.notifications().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec![third.as_str(), second.as_str(), first.as_str()]);
        assert!(third.parse::<i64>().unwrap() > second.parse::<i64>().unwrap());
        assert!(store.notifications().iter().all(|n| !n.read));
        assert_eq!(store.unread_count(), 3);
    }

    #[test]
    fn read_flag_override_is_kept() {
        let (_, mut store) = store();
        store.add_notification(NewNotification::success("seen", "already").already_read());
        assert!(store.notifications()[0].read);
    }

    #[test]
    fn mark_as_read_touches_only_target() {
        let (_, mut store) = store();
        let a = store.add_notification(NewNotification::success("a", "a"));
        let b = store.add_notification(NewNotification::success("b", "b"));

        store.mark_notification_as_read(&a);

        let find = |id: &str| store.notifications().iter().find(|n| n.id == id).unwrap().read;
        assert!(find(&a));
        assert!(!find(&b));
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn ticket_rating_keeps_status() {
        let (_, mut store) = store();
        store.add_ticket(ticket("TKT001"));
        store.update_ticket_rating("TKT001", 5, Some("great".to_string()));

        let rated = &store.tickets()[0];
        assert_eq!(rated.rating, Some(5));
        assert_eq!(rated.feedback.as_deref(), Some("great"));
        assert_eq!(rated.status, TicketStatus::Confirmed);
    }

    #[test]
    fn tickets_are_not_deduplicated() {
        let (_, mut store) = store();
        store.add_ticket(ticket("TKT001"));
        store.add_ticket(ticket("TKT001"));
        assert_eq!(store.tickets().len(), 2);
    }

    #[test]
    fn clear_user_data_empties_every_collection() {
        let (_, mut store) = store();
        store.add_to_cart(cart_item(1, 10, 1));
        store.toggle_favorite(1);
        store.add_notification(NewNotification::success("x", "y"));
        store.add_ticket(ticket("TKT001"));

        store.clear_user_data();

        assert_eq!(*store.state(), StoreState::default());
    }

    #[test]
    fn snapshots_are_not_mutated_by_later_writes() {
        let (_, mut store) = store();
        store.add_to_cart(cart_item(1, 10, 1));
        let snapshot = store.state();

        store.update_cart_quantity(1, 4);
        store.toggle_favorite(9);

        assert_eq!(snapshot.cart[0].quantity, 1);
        assert!(snapshot.favorites.is_empty());
        assert_eq!(store.cart()[0].quantity, 4);
    }

    #[test]
    fn state_survives_reopen() -> TestResult {
        let dir = tempfile::tempdir()?;
        let storage: Arc<dyn Storage> = Arc::new(crate::storage::FileStorage::new(dir.path()));

        let mut store = ClientStore::open(storage.clone());
        store.add_to_cart(cart_item(4, 250, 2));
        store.toggle_favorite(4);
        let id = store.add_notification(NewNotification::success("saved", "ok"));

        let mut reopened = ClientStore::open(storage);
        assert_eq!(*reopened.state(), *store.state());

        let next = reopened.add_notification(NewNotification::success("later", "ok"));
        assert!(next.parse::<i64>()? > id.parse::<i64>()?);
        Ok(())
    }

    #[test]
    fn corrupt_snapshot_opens_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(STORE_KEY, "[1, 2").unwrap();

        let store = ClientStore::open(storage);
        assert_eq!(*store.state(), StoreState::default());
    }

    #[test]
    fn failed_write_keeps_memory_and_flags_durability() -> TestResult {
        let storage = Arc::new(FlakyStorage::default());
        let mut store = ClientStore::open(storage.clone());
        store.add_to_cart(cart_item(1, 10, 1));
        assert!(store.is_durable());

        storage.failing.store(true, Ordering::SeqCst);
        store.add_to_cart(cart_item(2, 20, 1));

        assert_eq!(store.cart().len(), 2);
        assert!(!store.is_durable());
        assert!(store.last_persist_error().unwrap().contains("quota exceeded"));

        let persisted: StoreState = load_json(&*storage, STORE_KEY)?.unwrap();
        assert_eq!(persisted.cart.len(), 1);

        storage.failing.store(false, Ordering::SeqCst);
        store.toggle_favorite(2);
        assert!(store.is_durable());

        let persisted: StoreState = load_json(&*storage, STORE_KEY)?.unwrap();
        assert_eq!(persisted.cart.len(), 2);
        assert_eq!(persisted.favorites, vec![2]);
        Ok(())
    }

    #[test]
    fn discard_removes_the_namespace() {
        let (storage, mut store) = store();
        store.add_to_cart(cart_item(1, 10, 1));
        assert_eq!(storage.keys(), vec![STORE_KEY.to_string()]);

        store.clear_user_data();
        store.discard_persisted();
        assert!(storage.keys().is_empty());
    }
}
