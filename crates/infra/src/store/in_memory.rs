use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use evently_auth::{StoredCredentials, authorize_owner_action};
use evently_core::{Entity, EventId, UserId};
use evently_events::{Event, EventDetails, EventPatch, Registration};

use super::{EventStore, NewUser, RegistrationLedger, StoreError, StoreResult, UserStore};

#[derive(Debug, Default)]
struct Tables {
    last_user_id: i64,
    last_event_id: i64,
    users: BTreeMap<UserId, StoredCredentials>,
    events: BTreeMap<EventId, Event>,
    registrations: BTreeSet<(EventId, UserId)>,
}

impl Tables {
    fn event(&self, id: EventId) -> StoreResult<&Event> {
        self.events.get(&id).ok_or(StoreError::NotFound)
    }

    /// Owner check against the row as it is now, under the same lock as the write.
    fn owned_event_mut(&mut self, id: EventId, actor: UserId) -> StoreResult<&mut Event> {
        let event = self.events.get_mut(&id).ok_or(StoreError::NotFound)?;
        authorize_owner_action(actor, event.owner_user_id)?;
        Ok(event)
    }
}

/// In-memory store for tests/dev.
///
/// Users, events and registrations share one lock, so foreign-key cascade and
/// pair uniqueness hold without any extra coordination.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    #[cfg(test)]
    fn registration_count(&self, event_id: EventId) -> StoreResult<usize> {
        let tables = self.read()?;
        Ok(tables
            .registrations
            .iter()
            .filter(|(event, _)| *event == event_id)
            .count())
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn create(&self, owner: UserId, details: EventDetails) -> StoreResult<Event> {
        let mut tables = self.write()?;
        if !tables.users.contains_key(&owner) {
            return Err(StoreError::UnknownUser);
        }

        tables.last_event_id += 1;
        let event = Event::new(EventId::new(tables.last_event_id), owner, details);

        tables.events.insert(event.id(), event.clone());
        tables.registrations.insert((event.id(), owner));
        Ok(event)
    }

    async fn get_by_id(&self, id: EventId) -> StoreResult<Event> {
        self.read()?.event(id).cloned()
    }

    async fn list_all(&self) -> StoreResult<Vec<Event>> {
        Ok(self.read()?.events.values().cloned().collect())
    }

    async fn update(&self, id: EventId, actor: UserId, details: EventDetails) -> StoreResult<Event> {
        let mut tables = self.write()?;
        let event = tables.owned_event_mut(id, actor)?;
        event.replace_details(details);
        Ok(event.clone())
    }

    async fn patch(&self, id: EventId, actor: UserId, patch: EventPatch) -> StoreResult<Event> {
        let mut tables = self.write()?;
        let event = tables.owned_event_mut(id, actor)?;
        if !patch.is_empty() {
            patch.apply_to(event);
        }
        Ok(event.clone())
    }

    async fn delete(&self, id: EventId, actor: UserId) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.owned_event_mut(id, actor)?;

        tables.events.remove(&id);
        tables.registrations.retain(|(event_id, _)| *event_id != id);
        Ok(())
    }
}

#[async_trait]
impl RegistrationLedger for InMemoryStore {
    async fn is_registered(&self, event_id: EventId, user_id: UserId) -> StoreResult<bool> {
        Ok(self.read()?.registrations.contains(&(event_id, user_id)))
    }

    async fn register(&self, event_id: EventId, user_id: UserId) -> StoreResult<Registration> {
        let mut tables = self.write()?;
        tables.event(event_id)?;
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::UnknownUser);
        }

        if !tables.registrations.insert((event_id, user_id)) {
            return Err(StoreError::Conflict(
                "user is already registered for this event".to_string(),
            ));
        }
        Ok(Registration::new(event_id, user_id))
    }

    async fn cancel(&self, event_id: EventId, user_id: UserId) -> StoreResult<()> {
        let mut tables = self.write()?;
        tables.event(event_id)?;

        if !tables.registrations.remove(&(event_id, user_id)) {
            return Err(StoreError::NotRegistered);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<UserId> {
        let mut tables = self.write()?;
        if tables
            .users
            .values()
            .any(|existing| existing.email == user.email.as_str())
        {
            return Err(StoreError::Conflict("email is already registered".to_string()));
        }

        tables.last_user_id += 1;
        let user_id = UserId::new(tables.last_user_id);
        tables.users.insert(
            user_id,
            StoredCredentials {
                user_id,
                email: user.email.as_str().to_string(),
                password_digest: user.password_digest,
            },
        );
        Ok(user_id)
    }

    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<StoredCredentials>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|record| record.email == email)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use evently_auth::AuthzError;
    use evently_core::Email;
    use std::sync::Arc;

    fn test_details(name: &str) -> EventDetails {
        EventDetails::new(
            name,
            "daily sync",
            "room 4",
            Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
        )
        .unwrap()
    }

    async fn test_user(store: &InMemoryStore, email: &str) -> UserId {
        store
            .create_user(NewUser {
                email: Email::parse(email).unwrap(),
                password_digest: "digest".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_assigns_ids_and_registers_owner() {
        let store = InMemoryStore::new();
        let owner = test_user(&store, "a@example.com").await;

        let first = store.create(owner, test_details("Standup")).await.unwrap();
        let second = store.create(owner, test_details("Retro")).await.unwrap();

        assert_eq!(first.id, EventId::new(1));
        assert_eq!(second.id, EventId::new(2));
        assert_eq!(first.owner_user_id, owner);
        assert!(store.is_registered(first.id, owner).await.unwrap());
        assert_eq!(store.list_all().await.unwrap(), vec![first.clone(), second]);
        assert_eq!(store.get_by_id(first.id).await.unwrap(), first);
    }

    #[tokio::test]
    async fn create_for_unknown_owner_writes_nothing() {
        let store = InMemoryStore::new();

        let result = store.create(UserId::new(99), test_details("Standup")).await;

        assert_eq!(result, Err(StoreError::UnknownUser));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn register_for_unknown_user_is_not_an_unknown_event() {
        let store = InMemoryStore::new();
        let owner = test_user(&store, "a@example.com").await;
        let event = store.create(owner, test_details("Standup")).await.unwrap();

        assert_eq!(
            store.register(event.id, UserId::new(99)).await,
            Err(StoreError::UnknownUser)
        );
        assert!(!store.is_registered(event.id, UserId::new(99)).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let store = InMemoryStore::new();
        let user = test_user(&store, "a@example.com").await;
        let missing = EventId::new(404);

        assert_eq!(store.get_by_id(missing).await, Err(StoreError::NotFound));
        assert_eq!(
            store.update(missing, user, test_details("x")).await,
            Err(StoreError::NotFound)
        );
        assert_eq!(
            store.patch(missing, user, EventPatch::default()).await,
            Err(StoreError::NotFound)
        );
        assert_eq!(store.delete(missing, user).await, Err(StoreError::NotFound));
        assert_eq!(store.register(missing, user).await, Err(StoreError::NotFound));
        assert_eq!(store.cancel(missing, user).await, Err(StoreError::NotFound));
    }

    #[tokio::test]
    async fn non_owner_writes_are_forbidden_and_leave_row_unchanged() {
        let store = InMemoryStore::new();
        let owner = test_user(&store, "a@example.com").await;
        let intruder = test_user(&store, "b@example.com").await;
        let event = store.create(owner, test_details("Standup")).await.unwrap();

        let forbidden = Err(StoreError::Forbidden(AuthzError::NotOwner));
        let patch = EventPatch {
            name: Some("Hijacked".to_string()),
            ..EventPatch::default()
        };

        assert_eq!(store.update(event.id, intruder, test_details("Hijacked")).await, forbidden);
        assert_eq!(store.patch(event.id, intruder, patch).await, forbidden);
        assert_eq!(
            store.delete(event.id, intruder).await,
            Err(StoreError::Forbidden(AuthzError::NotOwner))
        );
        assert_eq!(store.get_by_id(event.id).await.unwrap(), event);
    }

    #[tokio::test]
    async fn update_replaces_fields_but_keeps_owner() {
        let store = InMemoryStore::new();
        let owner = test_user(&store, "a@example.com").await;
        let event = store.create(owner, test_details("Standup")).await.unwrap();

        let updated = store
            .update(event.id, owner, test_details("Planning"))
            .await
            .unwrap();

        assert_eq!(updated.name, "Planning");
        assert_eq!(updated.id, event.id);
        assert_eq!(updated.owner_user_id, owner);
        assert_eq!(store.get_by_id(event.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn patch_touches_only_supplied_fields() {
        let store = InMemoryStore::new();
        let owner = test_user(&store, "a@example.com").await;
        let event = store.create(owner, test_details("Standup")).await.unwrap();

        let unchanged = store
            .patch(event.id, owner, EventPatch::default())
            .await
            .unwrap();
        assert_eq!(unchanged, event);

        let patched = store
            .patch(
                event.id,
                owner,
                EventPatch {
                    location: Some("room 9".to_string()),
                    ..EventPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(patched.location, "room 9");
        assert_eq!(patched.name, event.name);
        assert_eq!(patched.description, event.description);
        assert_eq!(patched.date_time, event.date_time);
        assert_eq!(store.get_by_id(event.id).await.unwrap(), patched);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let store = InMemoryStore::new();
        let owner = test_user(&store, "a@example.com").await;
        let guest = test_user(&store, "b@example.com").await;
        let event = store.create(owner, test_details("Standup")).await.unwrap();

        assert_eq!(
            store.register(event.id, guest).await,
            Ok(Registration::new(event.id, guest))
        );
        assert!(matches!(
            store.register(event.id, guest).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            store.register(event.id, owner).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.registration_count(event.id).unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_duplicate_registrations_leave_one_row() {
        let store = Arc::new(InMemoryStore::new());
        let owner = test_user(&store, "a@example.com").await;
        let guest = test_user(&store, "b@example.com").await;
        let event = store.create(owner, test_details("Standup")).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.register(event.id, guest).await })
            })
            .collect();

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(StoreError::Conflict(_)) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(store.registration_count(event.id).unwrap(), 2);
    }

    #[tokio::test]
    async fn cancel_requires_existing_registration() {
        let store = InMemoryStore::new();
        let owner = test_user(&store, "a@example.com").await;
        let guest = test_user(&store, "b@example.com").await;
        let event = store.create(owner, test_details("Standup")).await.unwrap();

        assert_eq!(store.cancel(event.id, guest).await, Err(StoreError::NotRegistered));

        store.register(event.id, guest).await.unwrap();
        assert_eq!(store.cancel(event.id, guest).await, Ok(()));
        assert!(!store.is_registered(event.id, guest).await.unwrap());
    }

    #[tokio::test]
    async fn delete_cascades_to_its_registrations_only() {
        let store = InMemoryStore::new();
        let owner = test_user(&store, "a@example.com").await;
        let guest = test_user(&store, "b@example.com").await;
        let doomed = store.create(owner, test_details("Standup")).await.unwrap();
        let kept = store.create(owner, test_details("Retro")).await.unwrap();
        store.register(doomed.id, guest).await.unwrap();
        store.register(kept.id, guest).await.unwrap();

        store.delete(doomed.id, owner).await.unwrap();

        assert_eq!(store.get_by_id(doomed.id).await, Err(StoreError::NotFound));
        assert_eq!(store.registration_count(doomed.id).unwrap(), 0);
        assert!(store.is_registered(kept.id, guest).await.unwrap());
        assert_eq!(store.registration_count(kept.id).unwrap(), 2);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = InMemoryStore::new();
        test_user(&store, "a@example.com").await;

        let result = store
            .create_user(NewUser {
                email: Email::parse("a@example.com").unwrap(),
                password_digest: "other".to_string(),
            })
            .await;

        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn credentials_are_found_by_exact_email() {
        let store = InMemoryStore::new();
        let id = test_user(&store, "a@example.com").await;

        let found = store.find_credentials_by_email("a@example.com").await.unwrap();
        assert_eq!(found.map(|c| c.user_id), Some(id));
        assert_eq!(store.find_credentials_by_email("b@example.com").await.unwrap(), None);
    }
}
