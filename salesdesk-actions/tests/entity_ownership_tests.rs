//! The ownership rules, re-checked for every owned entity.

mod support;

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use salesdesk_actions::entities::{
    Activity, ActivityFilters, ActivityKind, Contact, Deal, DealStatus, Icp, Lead, LeadFilters,
    LeadStatus, Organization, Partner, PartnerFilters,
};
use salesdesk_actions::{ActionError, ListQuery, OwnedCrud, OwnedEntity, RecordId};
use serde_json::{Value, json};
use support::{CountingRepository, admin, alice, bob, carol, counted};

struct Fixture<E: OwnedEntity> {
    crud: OwnedCrud<E>,
    repo: CountingRepository<E>,
    id: RecordId,
}

fn assert_not_found<E: OwnedEntity>(err: &ActionError) {
    assert!(
        matches!(err, ActionError::NotFound(msg) if *msg == E::NOT_FOUND),
        "{}: {err:?}",
        E::ENTITY_TYPE
    );
}

/// Create as Alice with a smuggled owner, then check that Bob can neither
/// see nor change the record and that an admin can.
async fn ownership_rules<E: OwnedEntity + std::fmt::Debug>(payload: Value) -> Fixture<E> {
    let (crud, repo) = counted::<E>();
    let mut smuggled = payload.clone();
    smuggled["ownerId"] = json!("user-b");
    smuggled["owner_id"] = json!("user-b");

    let created = crud.create_json(Some(&alice()), smuggled.clone()).await.unwrap();
    assert_eq!(created.owner_id(), Some(&alice().user_id), "{}", E::ENTITY_TYPE);
    let id = created.id().clone();

    assert!(crud.get_by_id(Some(&bob()), &id).await.unwrap().is_none());
    assert!(crud.get_by_id(Some(&alice()), &id).await.unwrap().is_some());
    for raw in ["all", "user-a"] {
        let query = ListQuery::<E::Filters>::new().owner_param(Some(raw));
        assert!(crud.list(Some(&bob()), &query).await.unwrap().is_empty());
    }

    let writes = repo.writes();
    let err = crud
        .update_json(Some(&bob()), &id, payload.clone())
        .await
        .unwrap_err();
    assert_not_found::<E>(&err);
    let err = crud.delete(Some(&carol()), &id).await.unwrap_err();
    assert_not_found::<E>(&err);
    assert_eq!(repo.writes(), writes);

    let updated = crud.update_json(Some(&admin()), &id, smuggled).await.unwrap();
    assert_eq!(updated.owner_id(), Some(&alice().user_id));

    let missing = crud
        .update_json(Some(&alice()), &RecordId::from("missing"), payload)
        .await
        .unwrap_err();
    assert_not_found::<E>(&missing);

    Fixture { crud, repo, id }
}

// ── Deal ────────────────────────────────────────────────────────

#[tokio::test]
async fn deal_ownership() {
    let f = ownership_rules::<Deal>(json!({"title": "Acme", "value": 10000})).await;
    let writes = f.repo.writes();
    let err = f
        .crud
        .update_status(Some(&bob()), &f.id, DealStatus::Won)
        .await
        .unwrap_err();
    assert_not_found::<Deal>(&err);
    assert_eq!(f.repo.writes(), writes);
}

// ── Contact ─────────────────────────────────────────────────────

#[tokio::test]
async fn contact_ownership_and_organization_link() {
    let f = ownership_rules::<Contact>(json!({"name": "Ana Souza", "email": "ana@acme.com"})).await;
    let org = RecordId::from("org-1");

    let calls = f.repo.calls();
    let err = f
        .crud
        .set_organization(None, &f.id, Some(org.clone()))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(f.repo.calls(), calls);

    let writes = f.repo.writes();
    let err = f
        .crud
        .set_organization(Some(&bob()), &f.id, Some(org.clone()))
        .await
        .unwrap_err();
    assert_not_found::<Contact>(&err);
    assert_eq!(f.repo.writes(), writes);

    let linked = f
        .crud
        .set_organization(Some(&alice()), &f.id, Some(org.clone()))
        .await
        .unwrap();
    assert_eq!(linked.organization_id, Some(org));

    let unlinked = f.crud.set_organization(Some(&admin()), &f.id, None).await.unwrap();
    assert_eq!(unlinked.organization_id, None);
}

// ── Lead ────────────────────────────────────────────────────────

#[tokio::test]
async fn lead_ownership_and_status() {
    let f = ownership_rules::<Lead>(json!({"name": "Globex", "source": "event"})).await;

    let calls = f.repo.calls();
    let err = f
        .crud
        .update_status(None, &f.id, LeadStatus::Qualified)
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(f.repo.calls(), calls);

    let err = f
        .crud
        .update_status(Some(&bob()), &f.id, LeadStatus::Qualified)
        .await
        .unwrap_err();
    assert_not_found::<Lead>(&err);

    let qualified = f
        .crud
        .update_status(Some(&alice()), &f.id, LeadStatus::Qualified)
        .await
        .unwrap();
    assert_eq!(qualified.status, LeadStatus::Qualified);

    let query = ListQuery::filtered(LeadFilters {
        status: Some(LeadStatus::Qualified),
        ..LeadFilters::default()
    });
    assert_eq!(f.crud.count(Some(&alice()), &query).await.unwrap(), 1);
    assert_eq!(f.crud.count(Some(&bob()), &query).await.unwrap(), 0);
}

// ── Organization ────────────────────────────────────────────────

#[tokio::test]
async fn organization_ownership_and_tech_profile() {
    let f = ownership_rules::<Organization>(json!({"name": "Acme Ltda", "size": "medium"})).await;
    let crm = RecordId::from("tech-crm");
    let erp = RecordId::from("tech-erp");

    let calls = f.repo.calls();
    let err = f
        .crud
        .update_tech_profile(None, &f.id, vec![crm.clone()])
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(f.repo.calls(), calls);

    let err = f
        .crud
        .update_tech_profile(Some(&bob()), &f.id, vec![crm.clone()])
        .await
        .unwrap_err();
    assert_not_found::<Organization>(&err);

    let profiled = f
        .crud
        .update_tech_profile(Some(&alice()), &f.id, vec![crm.clone(), erp.clone(), crm.clone()])
        .await
        .unwrap();
    assert_eq!(profiled.tech_option_ids, vec![crm, erp]);

    // A regular update leaves the tech profile alone
    let renamed = f
        .crud
        .update_json(Some(&alice()), &f.id, json!({"name": "Acme S.A."}))
        .await
        .unwrap();
    assert_eq!(renamed.tech_option_ids.len(), 2);
}

// ── Partner ─────────────────────────────────────────────────────

#[tokio::test]
async fn partner_ownership_and_toggle() {
    let f = ownership_rules::<Partner>(json!({"name": "Canal Sul", "commission_rate": 10})).await;

    let calls = f.repo.calls();
    let err = f.crud.toggle_active(None, &f.id).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(f.repo.calls(), calls);

    let err = f.crud.toggle_active(Some(&bob()), &f.id).await.unwrap_err();
    assert_not_found::<Partner>(&err);

    let inactive = f.crud.toggle_active(Some(&alice()), &f.id).await.unwrap();
    assert!(!inactive.active);

    let query = ListQuery::filtered(PartnerFilters {
        active: Some(false),
        ..PartnerFilters::default()
    });
    assert_eq!(f.crud.count(Some(&alice()), &query).await.unwrap(), 1);

    let active = f.crud.toggle_active(Some(&admin()), &f.id).await.unwrap();
    assert!(active.active);
}

#[tokio::test]
async fn partner_commission_is_a_percentage() {
    let (partners, repo) = counted::<Partner>();
    let err = partners
        .create_json(Some(&alice()), json!({"name": "Canal", "commission_rate": 150}))
        .await
        .unwrap_err();
    assert!(err.validation().unwrap().message_for("commission_rate").is_some());
    assert_eq!(repo.writes(), 0);
}

// ── Activity ────────────────────────────────────────────────────

#[tokio::test]
async fn activity_ownership_and_mutators() {
    let f = ownership_rules::<Activity>(json!({"subject": "Ligar para Ana", "kind": "call"})).await;
    let due = Utc.with_ymd_and_hms(2026, 11, 3, 14, 0, 0).unwrap();

    let calls = f.repo.calls();
    let toggled = f.crud.toggle_completed(None, &f.id).await.unwrap_err();
    let rescheduled = f.crud.update_due_date(None, &f.id, Some(due)).await.unwrap_err();
    assert!(toggled.is_unauthorized());
    assert!(rescheduled.is_unauthorized());
    assert_eq!(f.repo.calls(), calls);

    let writes = f.repo.writes();
    let toggled = f.crud.toggle_completed(Some(&bob()), &f.id).await.unwrap_err();
    let rescheduled = f
        .crud
        .update_due_date(Some(&bob()), &f.id, Some(due))
        .await
        .unwrap_err();
    assert_not_found::<Activity>(&toggled);
    assert_not_found::<Activity>(&rescheduled);
    assert_eq!(f.repo.writes(), writes);

    let done = f.crud.toggle_completed(Some(&alice()), &f.id).await.unwrap();
    assert!(done.completed);
    assert!(done.completed_at.is_some());

    let moved = f
        .crud
        .update_due_date(Some(&admin()), &f.id, Some(due))
        .await
        .unwrap();
    assert_eq!(moved.due_at, Some(due));
    assert!(moved.completed);
}

#[tokio::test]
async fn activities_list_soonest_first() {
    let (activities, _repo) = counted::<Activity>();
    let a = alice();
    let at = |day: u32| Utc.with_ymd_and_hms(2026, 11, day, 9, 0, 0).unwrap().timestamp_millis();
    for (subject, due) in [
        ("later", json!(at(20))),
        ("undated", Value::Null),
        ("sooner", json!(at(5))),
    ] {
        activities
            .create_json(Some(&a), json!({"subject": subject, "due_at": due}))
            .await
            .unwrap();
    }

    let listed = activities.list(Some(&a), &ListQuery::new()).await.unwrap();
    let subjects: Vec<&str> = listed.iter().map(|x| x.subject.as_str()).collect();
    assert_eq!(subjects, vec!["sooner", "later", "undated"]);

    let window = ListQuery::filtered(ActivityFilters {
        due_from: Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).single(),
        due_to: Utc.with_ymd_and_hms(2026, 11, 10, 0, 0, 0).single(),
        kind: Some(ActivityKind::Task),
        ..ActivityFilters::default()
    });
    let found = activities.list(Some(&a), &window).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].subject, "sooner");
}

// ── ICP ─────────────────────────────────────────────────────────

#[tokio::test]
async fn icp_ownership() {
    let f = ownership_rules::<Icp>(json!({
        "name": "Mid-market SaaS",
        "company_sizes": ["medium", "large"],
        "min_employees": 50,
        "max_employees": 500
    }))
    .await;
    f.crud.delete(Some(&alice()), &f.id).await.unwrap();
    assert!(f.crud.get_by_id(Some(&admin()), &f.id).await.unwrap().is_none());
}

#[tokio::test]
async fn icp_rejects_inverted_ranges() {
    let (icps, _repo) = counted::<Icp>();
    let err = icps
        .create_json(
            Some(&alice()),
            json!({"name": "Broken", "min_employees": 500, "max_employees": 50}),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.validation().unwrap().message_for("max_employees"),
        Some("Mínimo não pode ser maior que o máximo")
    );
}
