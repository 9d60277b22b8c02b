mod common;

use common::Harness;
use licensy_license::{generate_key, validate_key_format, LicenseError, MAX_KEY_LEN};
use licensy_storage::{StoreError, LICENSES_NAMESPACE};
use licensy_types::{LicenseKey, LicenseStatus, OwnerId};
use std::collections::HashSet;
use std::sync::Arc;

// ── Key generation ───────────────────────────────────────────────

#[test]
fn generated_key_shape() {
    let key = generate_key();
    let groups: Vec<&str> = key.as_str().split('-').collect();
    assert_eq!(groups.len(), 4);
    for group in groups {
        assert_eq!(group.len(), 5);
        assert!(group
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert!(!group.contains(['0', 'O', '1', 'I']));
    }
}

#[test]
fn generated_keys_are_unique() {
    let keys: HashSet<_> = (0..1_000).map(|_| generate_key()).collect();
    assert_eq!(keys.len(), 1_000);
}

#[test]
fn generated_keys_pass_format_check() {
    assert!(validate_key_format(generate_key().as_str()).is_ok());
}

// ── Format checks ────────────────────────────────────────────────

#[test]
fn empty_key_rejected() {
    assert!(matches!(
        validate_key_format(""),
        Err(LicenseError::InvalidKeyFormat(_))
    ));
}

#[test]
fn overlong_key_rejected() {
    let long = "x".repeat(MAX_KEY_LEN + 1);
    assert!(validate_key_format(&long).is_err());
    assert!(validate_key_format(&"x".repeat(MAX_KEY_LEN)).is_ok());
}

#[test]
fn control_characters_rejected() {
    assert!(validate_key_format("abc\n").is_err());
    assert!(validate_key_format("a\u{0}b").is_err());
}

#[test]
fn surrounding_whitespace_is_kept_not_rejected() {
    assert!(validate_key_format(" padded ").is_ok());
}

// ── Issue ────────────────────────────────────────────────────────

#[test]
fn issue_with_explicit_key() {
    let h = Harness::new();
    let license = h
        .issuer
        .issue(&OwnerId::new("acct-9"), Some("CUSTOM-KEY"))
        .unwrap();
    assert_eq!(license.key.as_str(), "CUSTOM-KEY");
    assert_eq!(license.owner.as_str(), "acct-9");
    assert_eq!(license.status, LicenseStatus::Active);
}

#[test]
fn issue_with_generated_key() {
    let h = Harness::new();
    let license = h.issuer.issue(&OwnerId::new("acct-9"), None).unwrap();
    assert_eq!(license.key.as_str().len(), 23);
    assert_eq!(h.issuer.get(&license.key).unwrap(), license);
}

#[test]
fn issue_duplicate_is_surfaced() {
    let h = Harness::new();
    h.active("DUP");
    let err = h
        .issuer
        .issue(&OwnerId::new("acct-2"), Some("DUP"))
        .unwrap_err();
    assert!(matches!(err, LicenseError::Store(StoreError::DuplicateKey(_))));
}

#[test]
fn issue_rejects_blank_owner() {
    let h = Harness::new();
    assert!(matches!(
        h.issuer.issue(&OwnerId::new("  "), Some("K")),
        Err(LicenseError::InvalidOwner(_))
    ));
}

#[test]
fn issue_surfaces_storage_failure() {
    let h = Harness::new();
    h.store.fail_writes(LICENSES_NAMESPACE);
    let err = h.issuer.issue(&OwnerId::new("acct"), None).unwrap_err();
    assert!(matches!(err, LicenseError::Store(e) if e.is_unavailable()));
}

// ── Revoke ───────────────────────────────────────────────────────

#[test]
fn revoke_twice() {
    let h = Harness::new();
    let key = h.active("R");
    assert_eq!(h.issuer.revoke(&key).unwrap().status, LicenseStatus::Revoked);
    assert!(matches!(
        h.issuer.revoke(&key),
        Err(LicenseError::Store(StoreError::AlreadyRevoked(_)))
    ));
}

#[test]
fn revoke_unknown() {
    let h = Harness::new();
    assert!(matches!(
        h.issuer.revoke(&LicenseKey::from("ghost")),
        Err(LicenseError::Store(StoreError::NotFound(_)))
    ));
}

#[test]
fn hundred_concurrent_revokes_one_success() {
    let h = Harness::new();
    let key = h.active("CONTESTED");
    let issuer = Arc::new(h.issuer.clone());

    let handles: Vec<_> = (0..100)
        .map(|_| {
            let issuer = issuer.clone();
            let key = key.clone();
            std::thread::spawn(move || issuer.revoke(&key))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|t| t.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(LicenseError::Store(StoreError::AlreadyRevoked(_)))))
            .count(),
        99
    );
}

// ── Reads ────────────────────────────────────────────────────────

#[test]
fn list_by_owner() {
    let h = Harness::new();
    h.issuer.issue(&OwnerId::new("a"), Some("K1")).unwrap();
    h.issuer.issue(&OwnerId::new("b"), Some("K2")).unwrap();
    h.issuer.issue(&OwnerId::new("a"), Some("K3")).unwrap();

    assert_eq!(h.issuer.list(None).unwrap().len(), 3);
    let owned = h.issuer.list(Some(&OwnerId::new("a"))).unwrap();
    assert_eq!(owned.len(), 2);
    assert!(owned.iter().all(|l| l.owner.as_str() == "a"));
}
