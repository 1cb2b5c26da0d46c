use std::time::Duration;

use memorial_core::ClaimSet;
use memorial_core::Directory;
use memorial_core::ErrorKind;
use memorial_core::MakeAdminRequest;
use memorial_core::TokenKeys;
use memorial_state::StateRuntime;
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn bootstrap_then_gated_grant_through_file_stores() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runtime = StateRuntime::open(dir.path(), true);
    let keys = TokenKeys::from_secret(b"integration-secret");
    let ttl = Duration::from_secs(300);

    let first = runtime
        .directory
        .create_account("first@example.com", "First Admin")
        .expect("first account");
    let target = runtime
        .directory
        .create_account("user@example.com", "Regular User")
        .expect("target account");
    runtime
        .directory
        .set_custom_claims(&target.uid, ClaimSet::from_iter([("tier", json!("gold"))]))
        .await
        .expect("seed claims");

    let grant = runtime.admin_grant();

    // Before bootstrap nobody can grant.
    let stale = keys
        .verify(&keys.issue(&first, ttl).expect("issue"))
        .expect("verify");
    let err = grant
        .make_admin(&stale, MakeAdminRequest::for_email("user@example.com"))
        .await
        .expect_err("no admin yet");
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let promoted = grant.bootstrap("FIRST@example.com").await.expect("bootstrap");
    assert!(promoted.custom_claims.is_admin());

    // The token minted before the bootstrap is still a non-admin token.
    assert!(!stale.is_admin());
    let err = grant
        .make_admin(&stale, MakeAdminRequest::for_email("user@example.com"))
        .await
        .expect_err("stale token");
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    // After a refresh the new token carries the claim.
    let refreshed = keys
        .verify(&keys.issue(&promoted, ttl).expect("issue"))
        .expect("verify");
    let response = grant
        .make_admin(&refreshed, MakeAdminRequest::for_email("user@example.com"))
        .await
        .expect("grant");
    assert_eq!(
        response.message,
        "Success! user@example.com has been made an admin."
    );

    let target_after = runtime
        .directory
        .get_account_by_email("user@example.com")
        .await
        .expect("lookup");
    assert_eq!(
        serde_json::to_value(&target_after.custom_claims).expect("serialize"),
        json!({"tier": "gold", "isAdmin": true})
    );

    let mirror = runtime.mirror.as_ref().expect("mirror enabled");
    let uids: Vec<String> = mirror
        .list()
        .expect("list")
        .into_iter()
        .map(|record| record.uid)
        .collect();
    let mut expected = vec![first.uid.clone(), target.uid.clone()];
    expected.sort();
    assert_eq!(uids, expected);
}

#[tokio::test]
async fn grant_without_mirror_writes_no_roles_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runtime = StateRuntime::open(dir.path(), false);
    runtime
        .directory
        .create_account("user@example.com", "Regular User")
        .expect("account");

    runtime
        .admin_grant()
        .bootstrap("user@example.com")
        .await
        .expect("bootstrap");

    assert!(runtime.mirror.is_none());
    assert!(!dir.path().join(memorial_state::ROLES_ADMIN_FILE).exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_grants_all_land() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runtime = StateRuntime::open(dir.path(), true);
    let keys = TokenKeys::from_secret(b"integration-secret");

    let root = runtime
        .directory
        .create_account("root@example.com", "Root Admin")
        .expect("root account");
    let root = runtime.admin_grant().bootstrap(&root.email).await.expect("bootstrap");
    let caller = keys
        .verify(&keys.issue(&root, Duration::from_secs(300)).expect("issue"))
        .expect("verify");

    let mut targets = Vec::new();
    for email in ["shared@example.com", "a@example.com", "b@example.com"] {
        let account = runtime
            .directory
            .create_account(email, "Some Person")
            .expect("account");
        runtime
            .directory
            .set_custom_claims(&account.uid, ClaimSet::from_iter([("tier", json!("gold"))]))
            .await
            .expect("seed claims");
        targets.push(account);
    }

    let grant = runtime.admin_grant();
    let (same_a, same_b, other_a, other_b) = tokio::join!(
        grant.make_admin(&caller, MakeAdminRequest::for_email("shared@example.com")),
        grant.make_admin(&caller, MakeAdminRequest::for_email("shared@example.com")),
        grant.make_admin(&caller, MakeAdminRequest::for_email("a@example.com")),
        grant.make_admin(&caller, MakeAdminRequest::for_email("b@example.com")),
    );
    for outcome in [same_a, same_b, other_a, other_b] {
        outcome.expect("grant succeeds");
    }

    for target in &targets {
        let account = runtime
            .directory
            .get_account(&target.uid)
            .expect("account");
        assert_eq!(
            serde_json::to_value(&account.custom_claims).expect("serialize"),
            json!({"tier": "gold", "isAdmin": true}),
            "claims for {}",
            target.email
        );
    }

    let mirror = runtime.mirror.as_ref().expect("mirror enabled");
    assert_eq!(mirror.list().expect("list").len(), 4);
}
