//! Patient record store.
//!
//! Holds every [`PatientRecord`] in memory, keyed by `user_id`, and mirrors the collection to a
//! single JSON file. It supports:
//!
//! - Registration as an upsert keyed on `user_id` (never a uniqueness error)
//! - PIN-gated partial updates
//! - Lookup and listing in insertion order
//!
//! ## Concurrency
//!
//! Mutations take `write_lock` for the whole "locate record, apply change, serialise
//! collection, write file, publish" sequence, so two concurrent updates can never lose each
//! other's changes. The change is applied to a copy of the collection; only after the file has
//! been replaced is the copy swapped into `records`. Readers therefore see either the previous
//! or the next collection, never a half-applied record, and a failed write leaves memory as it
//! was.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   patients.json    # JSON array of PatientRecord, rewritten on every mutation
//! ```

use crate::error::{PatientError, PatientResult};
use crate::patient::{PatientPatch, PatientRecord};
use crate::storage::{load_json_array, now_millis, write_json_array};
use citycare_types::NonEmptyText;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

/// Result of [`PatientStore::register`].
#[derive(Clone, Debug, PartialEq)]
pub struct Registration {
    pub record: PatientRecord,
    /// `true` when no record existed for the identifier before this call.
    pub created: bool,
}

/// Result of [`PatientStore::update`].
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateOutcome {
    pub record: PatientRecord,
    /// `true` when at least one stored field now holds a different value.
    pub changed: bool,
}

/// Keyed, PIN-gated store of patient records backed by one JSON file.
#[derive(Debug)]
pub struct PatientStore {
    path: PathBuf,
    records: RwLock<Vec<PatientRecord>>,
    write_lock: Mutex<()>,
}

impl PatientStore {
    /// Loads the store from `path`. A missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if the file exists but cannot be read or parsed.
    pub fn load(path: PathBuf) -> PatientResult<Self> {
        let records: Vec<PatientRecord> = load_json_array(&path)?;
        tracing::info!(
            "loaded {} patient records from {}",
            records.len(),
            path.display()
        );

        Ok(Self {
            path,
            records: RwLock::new(records),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registers a patient, or refreshes the PIN and linkage of an existing one.
    ///
    /// For an existing identifier the PIN is replaced, any supplied linkage field replaces the
    /// stored one, and every profile, medical and sharing field is kept.
    ///
    /// Identifiers are trimmed here and in every lookup. The PIN is stored exactly as given.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if:
    /// - `user_id` or `pin` is blank ([`PatientError::InvalidInput`])
    /// - the collection cannot be written
    pub fn register(
        &self,
        user_id: &str,
        pin: &str,
        assigned_doctor_id: Option<String>,
        facility_id: Option<String>,
    ) -> PatientResult<Registration> {
        let user_id = NonEmptyText::new(user_id)
            .map_err(|_| PatientError::InvalidInput("user_id is required".into()))?;
        if pin.trim().is_empty() {
            return Err(PatientError::InvalidInput("pin is required".into()));
        }
        let pin = pin.to_string();
        let assigned_doctor_id = blank_to_none(assigned_doctor_id);
        let facility_id = blank_to_none(facility_id);

        self.mutate(|records| {
            match records.iter().position(|r| r.user_id == user_id.as_str()) {
                Some(idx) => {
                    let existing = &mut records[idx];
                    existing.pin = pin;
                    if assigned_doctor_id.is_some() {
                        existing.assigned_doctor_id = assigned_doctor_id;
                    }
                    if facility_id.is_some() {
                        existing.facility_id = facility_id;
                    }
                    existing.updated_at = next_timestamp(existing.updated_at);

                    Ok(Registration {
                        record: existing.clone(),
                        created: false,
                    })
                }
                None => {
                    let record = PatientRecord::new(
                        user_id.into_inner(),
                        pin,
                        assigned_doctor_id,
                        facility_id,
                        now_millis(),
                    );
                    records.push(record.clone());

                    Ok(Registration {
                        record,
                        created: true,
                    })
                }
            }
        })
        .inspect(|reg| {
            tracing::info!(
                "patient {} {}",
                reg.record.user_id,
                if reg.created { "registered" } else { "re-registered" }
            );
        })
    }

    /// Applies a partial update to an existing record after checking its PIN.
    ///
    /// `updated_at` is refreshed on success even when no field value changed.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if:
    /// - no record has `user_id` ([`PatientError::NotFound`])
    /// - `pin` does not match the stored PIN ([`PatientError::Unauthorized`])
    /// - the collection cannot be written
    pub fn update(
        &self,
        user_id: &str,
        pin: &str,
        patch: PatientPatch,
    ) -> PatientResult<UpdateOutcome> {
        let user_id = user_id.trim();

        self.mutate(|records| {
            let existing = records
                .iter_mut()
                .find(|r| r.user_id == user_id)
                .ok_or_else(|| PatientError::NotFound(format!("patient {user_id}")))?;

            if !pins_match(&existing.pin, pin) {
                tracing::warn!("rejected update for patient {}: PIN mismatch", user_id);
                return Err(PatientError::Unauthorized(format!(
                    "invalid PIN for patient {user_id}"
                )));
            }

            let before = existing.clone();
            patch.apply_to(existing);
            existing.updated_at = next_timestamp(before.updated_at);

            Ok(UpdateOutcome {
                changed: !before.same_content(existing),
                record: existing.clone(),
            })
        })
        .inspect(|outcome| {
            tracing::info!(
                "patient {} updated (changed: {})",
                outcome.record.user_id,
                outcome.changed
            );
        })
    }

    /// Looks up a record by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::NotFound`] for an unknown identifier.
    pub fn get(&self, user_id: &str) -> PatientResult<PatientRecord> {
        let user_id = user_id.trim();
        let records = self.records.read().map_err(|_| PatientError::LockPoisoned)?;
        records
            .iter()
            .find(|r| r.user_id == user_id)
            .cloned()
            .ok_or_else(|| PatientError::NotFound(format!("patient {user_id}")))
    }

    /// Returns all records in insertion order.
    pub fn list(&self) -> PatientResult<Vec<PatientRecord>> {
        let records = self.records.read().map_err(|_| PatientError::LockPoisoned)?;
        Ok(records.clone())
    }

    pub fn len(&self) -> PatientResult<usize> {
        let records = self.records.read().map_err(|_| PatientError::LockPoisoned)?;
        Ok(records.len())
    }

    pub fn is_empty(&self) -> PatientResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Runs `change` against a copy of the collection under the writer lock, persists the
    /// copy, then publishes it. If `change` or the write fails, nothing is published.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<PatientRecord>) -> PatientResult<T>,
    ) -> PatientResult<T> {
        let _writer = self
            .write_lock
            .lock()
            .map_err(|_| PatientError::LockPoisoned)?;

        let mut next = self
            .records
            .read()
            .map_err(|_| PatientError::LockPoisoned)?
            .clone();

        let result = change(&mut next)?;

        if let Err(e) = write_json_array(&self.path, &next) {
            tracing::error!(
                "failed to persist patients to {}: {}",
                self.path.display(),
                e
            );
            return Err(e);
        }

        *self
            .records
            .write()
            .map_err(|_| PatientError::LockPoisoned)? = next;

        Ok(result)
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Now, but never earlier than one millisecond after `previous`.
fn next_timestamp(previous: i64) -> i64 {
    now_millis().max(previous.saturating_add(1))
}

/// Exact PIN comparison whose running time does not depend on where the inputs differ.
pub fn pins_match(stored: &str, supplied: &str) -> bool {
    let (a, b) = (stored.as_bytes(), supplied.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PATIENTS_FILENAME;
    use crate::patient::Consent;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_store(dir: &Path) -> PatientStore {
        PatientStore::load(dir.join(PATIENTS_FILENAME)).expect("load should succeed")
    }

    fn name_patch(name: &str) -> PatientPatch {
        PatientPatch {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_register_creates_record_with_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let reg = store
            .register("p1", "0000", None, None)
            .expect("register should succeed");

        assert!(reg.created);
        assert_eq!(reg.record.user_id, "p1");
        assert_eq!(reg.record.pin, "0000");
        assert_eq!(reg.record.name, None);
        assert_eq!(reg.record.consent, Consent::None);
        assert!(reg.record.share_with.is_empty());
        assert_eq!(reg.record.created_at, reg.record.updated_at);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_register_rejects_missing_identifier_or_pin() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let err = store.register("  ", "0000", None, None).unwrap_err();
        assert!(matches!(err, PatientError::InvalidInput(_)));
        let err = store.register("p1", "", None, None).unwrap_err();
        assert!(matches!(err, PatientError::InvalidInput(_)));

        assert!(store.is_empty().unwrap());
        assert!(
            !temp_dir.path().join(PATIENTS_FILENAME).exists(),
            "rejected register must not write"
        );
    }

    #[test]
    fn test_re_register_preserves_profile_and_refreshes_pin_and_linkage() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let first = store
            .register("p1", "0000", Some("DOC_1".into()), Some("IND_HSP_001".into()))
            .unwrap();
        store
            .update(
                "p1",
                "0000",
                PatientPatch {
                    name: Some("Asha".into()),
                    allergies: Some("penicillin".into()),
                    consent: Some(Consent::Doctors),
                    ..Default::default()
                },
            )
            .unwrap();

        let second = store
            .register("p1", "4321", Some("DOC_2".into()), None)
            .unwrap();

        assert!(!second.created);
        assert_eq!(store.len().unwrap(), 1, "upsert never duplicates");
        assert_eq!(second.record.pin, "4321");
        assert_eq!(second.record.assigned_doctor_id.as_deref(), Some("DOC_2"));
        assert_eq!(second.record.facility_id.as_deref(), Some("IND_HSP_001"));
        assert_eq!(second.record.name.as_deref(), Some("Asha"));
        assert_eq!(second.record.allergies.as_deref(), Some("penicillin"));
        assert_eq!(second.record.consent, Consent::Doctors);
        assert_eq!(second.record.created_at, first.record.created_at);
        assert!(second.record.updated_at > first.record.updated_at);
    }

    #[test]
    fn test_update_changes_only_supplied_fields() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        store.register("p1", "0000", None, None).unwrap();
        store
            .update(
                "p1",
                "0000",
                PatientPatch {
                    phone: Some("+91-731-0000".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let before = store.get("p1").unwrap();

        let outcome = store
            .update(
                "p1",
                "0000",
                PatientPatch {
                    name: Some("Asha".into()),
                    age: Some(34),
                    ..Default::default()
                },
            )
            .expect("update should succeed");

        assert!(outcome.changed);
        assert_eq!(outcome.record.name.as_deref(), Some("Asha"));
        assert_eq!(outcome.record.age, Some(34));
        assert_eq!(outcome.record.phone.as_deref(), Some("+91-731-0000"));
        assert_eq!(outcome.record.created_at, before.created_at);
        assert!(outcome.record.updated_at > before.updated_at);
        assert_eq!(store.get("p1").unwrap(), outcome.record);
    }

    #[test]
    fn test_update_without_value_change_still_refreshes_timestamp() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        store.register("p1", "0000", None, None).unwrap();
        let first = store.update("p1", "0000", name_patch("Asha")).unwrap();

        let again = store.update("p1", "0000", name_patch("Asha")).unwrap();
        assert!(!again.changed);
        assert!(again.record.updated_at > first.record.updated_at);

        let empty = store.update("p1", "0000", PatientPatch::default()).unwrap();
        assert!(!empty.changed);
        assert!(empty.record.updated_at > again.record.updated_at);
    }

    #[test]
    fn test_update_with_wrong_pin_is_unauthorized_and_changes_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        store.register("p1", "0000", None, None).unwrap();
        store.update("p1", "0000", name_patch("Asha")).unwrap();

        let path = temp_dir.path().join(PATIENTS_FILENAME);
        let on_disk_before = fs::read(&path).unwrap();
        let before = store.get("p1").unwrap();

        for pin in ["9999", "", "00000", "000"] {
            let err = store.update("p1", pin, name_patch("X")).unwrap_err();
            assert!(
                matches!(err, PatientError::Unauthorized(_)),
                "pin {pin:?} should be unauthorized"
            );
        }

        assert_eq!(store.get("p1").unwrap(), before);
        assert_eq!(fs::read(&path).unwrap(), on_disk_before);
    }

    #[test]
    fn test_unknown_identifier_is_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        store.register("p1", "0000", None, None).unwrap();

        assert!(matches!(
            store.update("p2", "0000", name_patch("X")).unwrap_err(),
            PatientError::NotFound(_)
        ));
        assert!(matches!(
            store.get("p2").unwrap_err(),
            PatientError::NotFound(_)
        ));
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        for id in ["zeta", "alpha", "mid"] {
            store.register(id, "0000", None, None).unwrap();
        }
        store.register("alpha", "1111", None, None).unwrap();

        let ids: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.user_id)
            .collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_reload_reproduces_record_set() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        store
            .register("p1", "0000", Some("DOC_1".into()), None)
            .unwrap();
        store.register("p2", "1111", None, None).unwrap();
        store
            .update(
                "p2",
                "1111",
                PatientPatch {
                    height_cm: Some(170.0),
                    weight_kg: Some(65.0),
                    consent: Some(Consent::Custom),
                    share_with: Some(vec!["DOC_1".into(), "DOC_9".into()]),
                    ..Default::default()
                },
            )
            .unwrap();

        let reloaded = test_store(temp_dir.path());
        assert_eq!(reloaded.list().unwrap(), store.list().unwrap());
    }

    #[test]
    fn test_persisted_file_writes_optional_fields_as_null() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        store.register("p1", "0000", None, None).unwrap();

        let raw = fs::read_to_string(temp_dir.path().join(PATIENTS_FILENAME)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(json[0].get("emergency_contact").is_some());
        assert!(json[0]["emergency_contact"].is_null());
    }

    #[test]
    fn test_failed_write_leaves_memory_untouched() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());
        store.register("p1", "0000", None, None).unwrap();
        let before = store.list().unwrap();

        // A directory where the temp file should go makes the write fail.
        fs::create_dir(temp_dir.path().join(format!(
            "{PATIENTS_FILENAME}{}",
            crate::constants::TEMP_FILE_SUFFIX
        )))
        .unwrap();

        assert!(store.update("p1", "0000", name_patch("Asha")).is_err());
        assert!(store.register("p2", "0000", None, None).is_err());
        assert_eq!(store.list().unwrap(), before);
    }

    #[test]
    fn test_concurrent_updates_to_different_patients_both_persist() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(test_store(temp_dir.path()));
        store.register("p1", "0000", None, None).unwrap();
        store.register("p2", "1111", None, None).unwrap();

        std::thread::scope(|s| {
            for round in 0..20 {
                let a = store.clone();
                let b = store.clone();
                s.spawn(move || {
                    a.update(
                        "p1",
                        "0000",
                        PatientPatch {
                            age: Some(round),
                            meds: Some("aspirin".into()),
                            ..Default::default()
                        },
                    )
                    .unwrap();
                });
                s.spawn(move || {
                    b.update(
                        "p2",
                        "1111",
                        PatientPatch {
                            age: Some(round),
                            allergies: Some("dust".into()),
                            ..Default::default()
                        },
                    )
                    .unwrap();
                });
            }
        });

        let reloaded = test_store(temp_dir.path());
        assert_eq!(
            reloaded.get("p1").unwrap().meds.as_deref(),
            Some("aspirin")
        );
        assert_eq!(
            reloaded.get("p2").unwrap().allergies.as_deref(),
            Some("dust")
        );
        assert_eq!(reloaded.list().unwrap(), store.list().unwrap());
    }

    #[test]
    fn test_pin_is_stored_verbatim_and_matched_exactly() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let reg = store.register("p1", " 0000 ", None, None).unwrap();
        assert_eq!(reg.record.pin, " 0000 ");

        let outcome = store
            .update("p1", " 0000 ", name_patch("Asha"))
            .expect("update with the registered PIN should succeed");
        assert!(outcome.changed);

        assert!(matches!(
            store.update("p1", "0000", name_patch("X")).unwrap_err(),
            PatientError::Unauthorized(_)
        ));
        assert!(matches!(
            store.register("p2", "   ", None, None).unwrap_err(),
            PatientError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_identifiers_are_trimmed_on_every_operation() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = test_store(temp_dir.path());

        let reg = store.register(" p1 ", "0000", None, None).unwrap();
        assert_eq!(reg.record.user_id, "p1");

        assert!(store.update(" p1 ", "0000", name_patch("Asha")).is_ok());
        assert_eq!(store.get(" p1 ").unwrap().name.as_deref(), Some("Asha"));
        assert_eq!(store.get("p1").unwrap().name.as_deref(), Some("Asha"));

        let again = store.register("p1 ", "1111", None, None).unwrap();
        assert!(!again.created);
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_pins_match_is_exact() {
        assert!(pins_match("0000", "0000"));
        assert!(!pins_match("0000", "0001"));
        assert!(!pins_match("0000", "000"));
        assert!(!pins_match("0000", ""));
    }
}
