use auth::*;
use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial]
fn file_store_survives_new_store_instances() {
    let dir = TempDir::new().unwrap();
    std::env::set_var("HOME", dir.path());
    std::env::set_var(USE_FILE_STORE_ENV, "1");

    SessionStore::new()
        .sign_in(User::with_email("owner@example.com"), &AdminPolicy::allow_all())
        .unwrap();
    let path = dir.path().join(".photo_gallery").join("session.json");
    assert!(path.exists());

    let ctx = SessionStore::new().load().unwrap();
    assert_eq!(ctx.user.unwrap().email, "owner@example.com");

    SessionStore::new().sign_out().unwrap();
    assert!(!path.exists());
    assert!(!SessionStore::new().load().unwrap().is_authenticated);
    // Signing out twice is not an error.
    SessionStore::new().sign_out().unwrap();

    std::env::remove_var(USE_FILE_STORE_ENV);
}

#[test]
#[serial]
fn file_store_takes_precedence_over_mock_keyring() {
    let dir = TempDir::new().unwrap();
    std::env::set_var("HOME", dir.path());
    std::env::set_var(USE_FILE_STORE_ENV, "1");
    std::env::set_var("MOCK_KEYRING", "1");

    SessionStore::new()
        .sign_in(User::with_email("a@example.com"), &AdminPolicy::allow_all())
        .unwrap();
    assert!(dir.path().join(".photo_gallery").join("session.json").exists());

    std::env::remove_var(USE_FILE_STORE_ENV);
    std::env::remove_var("MOCK_KEYRING");
}
