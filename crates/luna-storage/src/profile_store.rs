//! Profile store.
//!
//! Holds the optional [`UserProfile`] and writes it through to the
//! `luna-user-storage` document on every change. Listeners run after the
//! write succeeds.

use chrono::Utc;
use luna_core::model::{OnboardingData, ProfilePatch, UserProfile};
use tracing::{debug, info, warn};

use crate::database::Database;
use crate::error::{Result, StorageError};
use crate::ids::generate_id;
use crate::listeners::{ListenerId, Listeners};
use crate::models::{DocumentWrite, UserDocument, USER_DOCUMENT_KEY, USER_DOCUMENT_VERSION};

/// Mutable user profile with write-through persistence.
pub struct ProfileStore {
    db: Database,
    user: Option<UserProfile>,
    listeners: Listeners<Option<UserProfile>>,
}

impl ProfileStore {
    /// Loads the profile document. An unreadable document loads as unset.
    pub fn load(db: Database) -> Result<Self> {
        let user = match db.read_document(USER_DOCUMENT_KEY) {
            Ok(Some(doc)) => match serde_json::from_value::<UserDocument>(doc.value) {
                Ok(document) => document.user,
                Err(e) => {
                    warn!(error = %e, "Profile document is unreadable, starting without a profile");
                    None
                }
            },
            Ok(None) => None,
            Err(StorageError::Json(e)) => {
                warn!(error = %e, "Profile document is not valid JSON, starting without a profile");
                None
            }
            Err(e) => return Err(e),
        };

        debug!(has_profile = user.is_some(), "Loaded profile store");

        Ok(Self {
            db,
            user,
            listeners: Listeners::default(),
        })
    }

    /// Current profile, if onboarding has produced one.
    pub fn get(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// True once onboarding has completed.
    pub fn is_onboarded(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.onboarding_completed)
    }

    /// Creates the profile from onboarding input.
    pub fn complete_onboarding(&mut self, data: &OnboardingData) -> Result<UserProfile> {
        let profile = UserProfile::new(
            generate_id(),
            &data.name,
            data.last_period_date,
            data.average_cycle_length,
            Utc::now(),
        );

        self.replace(Some(profile.clone()))?;
        info!(last_period = %data.last_period_date, cycle_length = data.average_cycle_length, "Onboarding completed");
        Ok(profile)
    }

    /// Applies a partial update. Does nothing while no profile exists.
    pub fn update(&mut self, patch: &ProfilePatch) -> Result<()> {
        let Some(mut profile) = self.user.clone() else {
            debug!("Ignoring profile update without a profile");
            return Ok(());
        };

        profile.apply(patch);
        self.replace(Some(profile))
    }

    /// Returns to the unset state.
    pub fn clear(&mut self) -> Result<()> {
        self.replace(None)?;
        info!("Profile cleared");
        Ok(())
    }

    pub fn subscribe<F>(&mut self, callback: F) -> ListenerId
    where
        F: Fn(&Option<UserProfile>) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Serialized document for `user`.
    pub(crate) fn document_write(user: &Option<UserProfile>) -> Result<DocumentWrite> {
        let document = UserDocument { user: user.clone() };
        Ok(DocumentWrite {
            key: USER_DOCUMENT_KEY,
            version: USER_DOCUMENT_VERSION,
            value: serde_json::to_value(&document)?,
        })
    }

    /// Installs an already persisted value and notifies.
    pub(crate) fn commit(&mut self, user: Option<UserProfile>) {
        self.user = user;
        self.listeners.notify(&self.user);
    }

    fn replace(&mut self, user: Option<UserProfile>) -> Result<()> {
        let write = Self::document_write(&user)?;
        self.db.write_document(write.key, write.version, &write.value)?;
        self.commit(user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use luna_core::model::DEFAULT_USER_NAME;
    use std::sync::{Arc, Mutex};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn onboarding(name: &str) -> OnboardingData {
        OnboardingData {
            name: name.to_string(),
            last_period_date: date(2025, 3, 1),
            average_cycle_length: 30,
        }
    }

    // ==================== Lifecycle Tests ====================

    #[test]
    fn test_starts_unset() {
        let store = ProfileStore::load(Database::in_memory().unwrap()).unwrap();
        assert!(store.get().is_none());
        assert!(!store.is_onboarded());
    }

    #[test]
    fn test_complete_onboarding() {
        let mut store = ProfileStore::load(Database::in_memory().unwrap()).unwrap();
        let profile = store.complete_onboarding(&onboarding("  Мария ")).unwrap();

        assert_eq!(profile.name, "Мария");
        assert!(profile.onboarding_completed);
        assert_eq!(profile.last_period_date, Some(date(2025, 3, 1)));
        assert!(!profile.id.is_empty());
        assert_eq!(store.get(), Some(&profile));
    }

    #[test]
    fn test_blank_name_defaults() {
        let mut store = ProfileStore::load(Database::in_memory().unwrap()).unwrap();
        let profile = store.complete_onboarding(&onboarding("")).unwrap();
        assert_eq!(profile.name, DEFAULT_USER_NAME);
    }

    #[test]
    fn test_update_merges_and_keeps_created_at() {
        let mut store = ProfileStore::load(Database::in_memory().unwrap()).unwrap();
        let created = store.complete_onboarding(&onboarding("Maria")).unwrap();

        store
            .update(&ProfilePatch {
                average_cycle_length: Some(26),
                ..ProfilePatch::default()
            })
            .unwrap();

        let profile = store.get().unwrap();
        assert_eq!(profile.average_cycle_length, 26);
        assert_eq!(profile.name, "Maria");
        assert_eq!(profile.created_at, created.created_at);
    }

    #[test]
    fn test_update_without_profile_is_noop() {
        let db = Database::in_memory().unwrap();
        let mut store = ProfileStore::load(db.clone()).unwrap();

        store
            .update(&ProfilePatch {
                last_period_date: Some(date(2025, 1, 1)),
                ..ProfilePatch::default()
            })
            .unwrap();
        assert!(store.get().is_none());
        assert!(db.read_document(USER_DOCUMENT_KEY).unwrap().is_none());
    }

    #[test]
    fn test_clear() {
        let mut store = ProfileStore::load(Database::in_memory().unwrap()).unwrap();
        store.complete_onboarding(&onboarding("Maria")).unwrap();
        store.clear().unwrap();
        assert!(store.get().is_none());
    }

    // ==================== Persistence Tests ====================

    #[test]
    fn test_profile_survives_reload() {
        let db = Database::in_memory().unwrap();
        let profile = {
            let mut store = ProfileStore::load(db.clone()).unwrap();
            store.complete_onboarding(&onboarding("Maria")).unwrap()
        };

        let store = ProfileStore::load(db).unwrap();
        assert_eq!(store.get(), Some(&profile));
    }

    #[test]
    fn test_document_shape() {
        let db = Database::in_memory().unwrap();
        let mut store = ProfileStore::load(db.clone()).unwrap();
        store.complete_onboarding(&onboarding("Maria")).unwrap();

        let doc = db.read_document(USER_DOCUMENT_KEY).unwrap().unwrap();
        assert_eq!(doc.version, USER_DOCUMENT_VERSION);
        assert_eq!(doc.value["user"]["lastPeriodDate"], "2025-03-01");
        assert_eq!(doc.value["user"]["averageCycleLength"], 30);
    }

    #[test]
    fn test_corrupt_document_loads_unset() {
        let db = Database::in_memory().unwrap();
        db.write_document(USER_DOCUMENT_KEY, 1, &serde_json::json!({"user": {"name": 5}}))
            .unwrap();

        let store = ProfileStore::load(db).unwrap();
        assert!(store.get().is_none());
    }

    // ==================== Listener Tests ====================

    #[test]
    fn test_listeners_see_changes() {
        let mut store = ProfileStore::load(Database::in_memory().unwrap()).unwrap();
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let id = store.subscribe(move |user| {
            sink.lock().unwrap().push(user.as_ref().map(|u| u.name.clone()));
        });

        store.complete_onboarding(&onboarding("Maria")).unwrap();
        store.clear().unwrap();
        assert!(store.unsubscribe(id));
        store.complete_onboarding(&onboarding("Anna")).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("Maria".to_string()), None]
        );
    }
}
