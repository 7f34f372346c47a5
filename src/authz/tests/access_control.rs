//! End-to-end access control pipeline tests
//!
//! Drives the full path a request takes: resolve the requestor from
//! the directory, decide, filter a fetched resource set, and record
//! the mutation in the audit trail.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal_macros::dec;

use incentive_authz::{
    decide, filter_visible, resolve_requestor, AnonymousPolicy, AuditRecord, AuditSink,
    AuditTrail, InMemoryAuditLog, Requestor, ScopeFilter,
};
use incentive_core::directory::{IdentityDirectory, InMemoryDirectory};
use incentive_core::types::{AdminScope, Deal, DealStatus, Identity, Owned, Role};

async fn seeded_directory() -> InMemoryDirectory {
    let dir = InMemoryDirectory::new();
    dir.save(
        Identity::new(0, "Root", "root@hq.test", Role::Admin).with_scope(AdminScope::Global),
    )
    .await
    .unwrap();
    dir.save(Identity::new(0, "Ana", "ana@acme.test", Role::Admin).with_organization("Acme"))
        .await
        .unwrap();
    dir.save(Identity::new(0, "Sam", "sam@acme.test", Role::Sales).with_organization("Acme"))
        .await
        .unwrap();
    dir.save(Identity::new(0, "Gia", "gia@globex.test", Role::Sales).with_organization("Globex"))
        .await
        .unwrap();
    dir
}

fn seeded_deals() -> Vec<Deal> {
    vec![
        Deal::new(1, 3, "Client A", dec!(1000), dec!(50), Utc::now())
            .with_organization("Acme")
            .with_status(DealStatus::Approved),
        Deal::new(2, 4, "Client B", dec!(2000), dec!(100), Utc::now())
            .with_organization("Globex"),
        Deal::new(3, 3, "Client C", dec!(3000), dec!(150), Utc::now())
            .with_organization("Acme")
            .with_status(DealStatus::Approved),
    ]
}

#[tokio::test]
async fn test_global_admin_sees_all_deals() {
    let dir = seeded_directory().await;
    let requestor = resolve_requestor(&dir, Some(1)).await;

    let decision = decide(&requestor, None, AnonymousPolicy::DenyAll);
    let visible = filter_visible(&decision, seeded_deals());
    assert_eq!(visible.len(), 3);
}

#[tokio::test]
async fn test_org_admin_sees_own_org_deals() {
    let dir = seeded_directory().await;
    let requestor = resolve_requestor(&dir, Some(2)).await;

    let decision = decide(&requestor, None, AnonymousPolicy::DenyAll);
    assert_eq!(decision.scope, ScopeFilter::Org("Acme".into()));

    let visible = filter_visible(&decision, seeded_deals());
    assert_eq!(visible.len(), 2);
    assert!(visible
        .iter()
        .all(|d| d.organization.as_deref() == Some("Acme")));
}

#[tokio::test]
async fn test_member_reaches_own_deal_but_not_peers() {
    let dir = seeded_directory().await;
    let sam = resolve_requestor(&dir, Some(3)).await;
    let deals = seeded_deals();

    let own = decide(&sam, Some(&deals[0].ownership()), AnonymousPolicy::DenyAll);
    assert!(own.allowed);

    let foreign = decide(&sam, Some(&deals[1].ownership()), AnonymousPolicy::DenyAll);
    assert!(!foreign.allowed);
}

#[tokio::test]
async fn test_deleted_requestor_is_denied() {
    let dir = seeded_directory().await;
    dir.delete(3).await.unwrap();

    let requestor = resolve_requestor(&dir, Some(3)).await;
    assert_eq!(requestor, Requestor::Unknown(3));

    let decision = decide(&requestor, None, AnonymousPolicy::AllowUnfiltered);
    assert!(!decision.allowed);
}

#[tokio::test]
async fn test_anonymous_policies_split_by_operation() {
    let deals = seeded_deals();

    // Legacy open read
    let open = decide(&Requestor::Anonymous, None, AnonymousPolicy::AllowUnfiltered);
    assert_eq!(filter_visible(&open, deals.clone()).len(), 3);

    // Locked-down read
    let strict = decide(&Requestor::Anonymous, None, AnonymousPolicy::DenyAll);
    assert!(filter_visible(&strict, deals).is_empty());
}

#[tokio::test]
async fn test_audit_trail_scoping_end_to_end() {
    let dir = seeded_directory().await;
    let log = Arc::new(InMemoryAuditLog::new());

    let ana = resolve_requestor(&dir, Some(2)).await;
    let record = AuditRecord::new("DEAL_MARKED_PAID", "DEAL")
        .by_requestor(&ana)
        .entity(1)
        .detail("payout released");
    log.record(record).await.unwrap();

    let gia_record = AuditRecord::new("TARGET_UPDATED", "TARGET").in_org("Globex");
    log.record(gia_record).await.unwrap();

    let trail = AuditTrail::new(log);

    // Org admin sees only their organization's slice
    let acme_view = trail.list(&ana).await.unwrap();
    assert_eq!(acme_view.len(), 1);
    assert_eq!(acme_view[0].actor_email, "ana@acme.test");

    // Global admin sees everything
    let root = resolve_requestor(&dir, Some(1)).await;
    assert_eq!(trail.list(&root).await.unwrap().len(), 2);
}
