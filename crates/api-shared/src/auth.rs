use crate::dto::{Role, SessionUser};
use citycare_core::{pins_match, NonEmptyText, PatientError, PatientResult};

/// Demo login.
///
/// Identifiers starting with `doc` (any case) are doctors and must present the shared doctor
/// PIN, compared exactly. Anyone else is treated as a patient without a PIN check; patient PINs
/// are only enforced when a record is updated.
pub fn login(doctor_pin: &NonEmptyText, user_id: &str, pin: &str) -> PatientResult<SessionUser> {
    let id = NonEmptyText::new(user_id)
        .map_err(|_| PatientError::InvalidInput("user_id is required".into()))?;

    let is_doctor = id
        .as_str()
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("doc"));

    if !is_doctor {
        return Ok(SessionUser {
            id: id.into_inner(),
            role: Role::Patient,
        });
    }

    if pins_match(doctor_pin.as_str(), pin) {
        Ok(SessionUser {
            id: id.into_inner(),
            role: Role::Doctor,
        })
    } else {
        tracing::warn!("doctor login rejected for {}", id);
        Err(PatientError::Unauthorized("Invalid Doctor PIN.".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin() -> NonEmptyText {
        NonEmptyText::new("1234").unwrap()
    }

    #[test]
    fn doctor_with_correct_pin_logs_in() {
        let user = login(&pin(), "DOC_001", "1234").unwrap();
        assert_eq!(user.role, Role::Doctor);
        assert_eq!(user.id, "DOC_001");

        let user = login(&pin(), "doctor-7", "1234").unwrap();
        assert_eq!(user.role, Role::Doctor);
    }

    #[test]
    fn doctor_with_wrong_pin_is_unauthorized() {
        let err = login(&pin(), "Doc_1", "0000").unwrap_err();
        assert!(matches!(err, PatientError::Unauthorized(_)));
    }

    #[test]
    fn doctor_pin_is_not_trimmed() {
        for padded in [" 1234", "1234 ", " 1234 "] {
            assert!(matches!(
                login(&pin(), "DOC_001", padded),
                Err(PatientError::Unauthorized(_))
            ));
        }
    }

    #[test]
    fn everyone_else_is_a_patient() {
        let user = login(&pin(), "USR_PAT_001", "whatever").unwrap();
        assert_eq!(user.role, Role::Patient);

        let user = login(&pin(), "do", "").unwrap();
        assert_eq!(user.role, Role::Patient);
    }

    #[test]
    fn blank_user_is_invalid() {
        assert!(matches!(
            login(&pin(), " ", "1234"),
            Err(PatientError::InvalidInput(_))
        ));
    }
}
