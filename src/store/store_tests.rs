use super::*;
use crate::acl::{AccessControlEntry, AccessControlList};
use crate::identity::{Organization, User};
use serde_json::json;

fn org() -> Organization {
    Organization::new("org1", "ROLE_ORG1_ADMIN")
}

fn owner_ctx() -> SecurityContext {
    // No roles: fine against unrestricted records
    SecurityContext::new(User::new("owner", Vec::<String>::new()), org())
}

fn admin_ctx() -> SecurityContext {
    SecurityContext::new(User::new("admin", ["ROLE_ADMIN"]), org())
}

fn catalog(id: &str, title: &str) -> SeriesCatalog {
    SeriesCatalog::new(id).with_field("title", title)
}

#[test]
fn store_then_get_roundtrip() {
    let tmp = tempfile::tempdir().unwrap();
    let db = SeriesDatabase::open(tmp.path()).unwrap();
    let ctx = owner_ctx();
    let created = db.store_series(&ctx, &catalog("S1", "Lecture 1")).unwrap();
    assert!(created.is_some(), "first store must report a new series");
    let got = db.get_series(&ctx, "S1").unwrap();
    assert_eq!(got, catalog("S1", "Lecture 1"));
}

#[test]
fn store_on_live_record_reports_update() {
    let tmp = tempfile::tempdir().unwrap();
    let db = SeriesDatabase::open(tmp.path()).unwrap();
    let ctx = owner_ctx();
    db.store_series(&ctx, &catalog("S1", "v1")).unwrap();
    let second = db.store_series(&ctx, &catalog("S1", "v2")).unwrap();
    assert!(second.is_none(), "overwrite must not report a new series");
    assert_eq!(db.get_series(&ctx, "S1").unwrap().field("title"), Some(&json!("v2")));
    assert_eq!(db.count_series(), 1);
}

#[test]
fn blank_identifier_is_invalid_argument() {
    let tmp = tempfile::tempdir().unwrap();
    let db = SeriesDatabase::open(tmp.path()).unwrap();
    let err = db.store_series(&owner_ctx(), &SeriesCatalog::new("  ")).unwrap_err();
    assert_eq!(err.kind(), "invalid_argument");
}

#[test]
fn delete_hides_from_normal_reads_but_not_admin_reader() {
    let tmp = tempfile::tempdir().unwrap();
    let db = SeriesDatabase::open(tmp.path()).unwrap();
    let ctx = owner_ctx();
    db.store_series(&ctx, &catalog("S1", "Lecture 1")).unwrap();
    db.delete_series(&ctx, "S1").unwrap();

    assert_eq!(db.get_series(&ctx, "S1").unwrap_err().kind(), "not_found");
    assert_eq!(db.get_series_properties(&ctx, "S1").unwrap_err().kind(), "not_found");
    assert_eq!(db.get_access_control_list(&ctx, "S1").unwrap_err().kind(), "not_found");
    assert_eq!(db.delete_series(&ctx, "S1").unwrap_err().kind(), "not_found");

    // The tombstone stays visible to the administrative reader
    let rows = db.get_all_for_administrative_read(&admin_ctx(), 0, None, 10).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "S1");
    assert!(rows[0].deleted_ms.is_some());
    assert_eq!(rows[0].modified_ms, rows[0].deleted_ms.unwrap());
    assert_eq!(db.count_series(), 1, "tombstones are counted");
}

#[test]
fn recreate_after_delete_carries_nothing_forward() {
    let tmp = tempfile::tempdir().unwrap();
    let db = SeriesDatabase::open(tmp.path()).unwrap();
    let ctx = SecurityContext::new(User::new("owner", ["ROLE_OWNER"]), org());
    db.store_series(&ctx, &catalog("S1", "Lecture 1")).unwrap();
    db.update_series_property(&ctx, "S1", "theme", "blue").unwrap();
    assert!(db.store_series_element(&ctx, "S1", "image", b"png").unwrap());
    let acl = AccessControlList::new(vec![AccessControlEntry::allow("ROLE_OWNER", "write")]);
    assert!(!db.store_access_control_list(&ctx, "S1", &acl).unwrap());

    db.delete_series(&ctx, "S1").unwrap();

    let recreated = db.store_series(&ctx, &catalog("S1", "Lecture 1 v2")).unwrap();
    assert!(recreated.is_some(), "re-creation over a tombstone is a new series");
    assert_eq!(db.count_series(), 1, "the tombstone was reclaimed, not kept alongside");
    assert_eq!(db.get_series(&ctx, "S1").unwrap().field("title"), Some(&json!("Lecture 1 v2")));
    assert!(db.get_access_control_list(&ctx, "S1").unwrap().is_none());
    assert!(db.get_series_properties(&ctx, "S1").unwrap().is_empty());
    assert!(db.get_series_element(&ctx, "S1", "image").unwrap().is_none());
}

#[test]
fn property_roundtrip_and_blank_value_reads_absent() {
    let tmp = tempfile::tempdir().unwrap();
    let db = SeriesDatabase::open(tmp.path()).unwrap();
    let ctx = owner_ctx();
    db.store_series(&ctx, &catalog("S1", "t")).unwrap();
    db.update_series_property(&ctx, "S1", "theme", "blue").unwrap();
    assert_eq!(db.get_series_property(&ctx, "S1", "theme").unwrap(), "blue");
    assert_eq!(db.get_series_properties(&ctx, "S1").unwrap().len(), 1);

    db.update_series_property(&ctx, "S1", "theme", "  ").unwrap();
    assert_eq!(db.get_series_property(&ctx, "S1", "theme").unwrap_err().kind(), "not_found");

    db.delete_series_property(&ctx, "S1", "theme").unwrap();
    assert_eq!(
        db.delete_series_property(&ctx, "S1", "theme").unwrap_err().kind(),
        "not_found"
    );
}

#[test]
fn element_ops_signal_missing_series_without_error() {
    let tmp = tempfile::tempdir().unwrap();
    let db = SeriesDatabase::open(tmp.path()).unwrap();
    let ctx = owner_ctx();
    assert!(!db.store_series_element(&ctx, "ghost", "image", b"x").unwrap());
    assert!(!db.delete_series_element(&ctx, "ghost", "image").unwrap());
    assert!(db.get_series_element(&ctx, "ghost", "image").unwrap().is_none());
    assert!(db.get_series_elements(&ctx, "ghost").unwrap().is_none());
    assert!(!db.series_element_exists(&ctx, "ghost", "image").unwrap());

    db.store_series(&ctx, &catalog("S1", "t")).unwrap();
    assert!(db.store_series_element(&ctx, "S1", "image", b"png").unwrap());
    assert!(db.series_element_exists(&ctx, "S1", "image").unwrap());
    assert_eq!(db.get_series_element(&ctx, "S1", "image").unwrap().unwrap(), b"png");
    assert!(db.get_series_element(&ctx, "S1", "theme").unwrap().is_none());
    assert!(!db.delete_series_element(&ctx, "S1", "theme").unwrap());
    assert!(db.delete_series_element(&ctx, "S1", "image").unwrap());
    assert!(db.get_series_elements(&ctx, "S1").unwrap().unwrap().is_empty());
}

#[test]
fn modified_date_is_monotonic_across_mutations() {
    let tmp = tempfile::tempdir().unwrap();
    let db = SeriesDatabase::open(tmp.path()).unwrap();
    let ctx = owner_ctx();
    db.store_series(&ctx, &catalog("S1", "t")).unwrap();
    let t0 = db.get_all_for_administrative_read(&admin_ctx(), 0, None, 10).unwrap()[0].modified_ms;
    db.update_series_property(&ctx, "S1", "k", "v").unwrap();
    let t1 = db.get_all_for_administrative_read(&admin_ctx(), 0, None, 10).unwrap()[0].modified_ms;
    db.delete_series(&ctx, "S1").unwrap();
    let t2 = db.get_all_for_administrative_read(&admin_ctx(), 0, None, 10).unwrap()[0].modified_ms;
    assert!(t0 <= t1 && t1 <= t2);
}

#[test]
fn snapshot_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let ctx = owner_ctx();
    {
        let db = SeriesDatabase::open(tmp.path()).unwrap();
        db.store_series(&ctx, &catalog("S1", "persisted")).unwrap();
        db.update_series_property(&ctx, "S1", "theme", "blue").unwrap();
        assert!(db.store_series_element(&ctx, "S1", "image", b"png").unwrap());
    }
    let db = SeriesDatabase::open(tmp.path()).unwrap();
    crate::tprintln!("reopened store with {} records", db.count_series());
    assert_eq!(db.count_series(), 1);
    assert_eq!(db.get_series(&ctx, "S1").unwrap().field("title"), Some(&json!("persisted")));
    assert_eq!(db.get_series_property(&ctx, "S1", "theme").unwrap(), "blue");
    assert_eq!(db.get_series_element(&ctx, "S1", "image").unwrap().unwrap(), b"png");
}

#[test]
fn settings_file_can_disable_flush_on_commit() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join("store.json"),
        r#"{"name":"scratch","flush_on_commit":false}"#,
    )
    .unwrap();
    let ctx = owner_ctx();
    {
        let db = SeriesDatabase::open(tmp.path()).unwrap();
        assert!(!db.settings().flush_on_commit);
        db.store_series(&ctx, &catalog("S1", "volatile")).unwrap();
        assert_eq!(db.count_series(), 1);
    }
    // Nothing was flushed, so a reopen starts empty
    let db = SeriesDatabase::open(tmp.path()).unwrap();
    assert_eq!(db.count_series(), 0);
}

#[test]
fn get_all_series_spans_tenants_and_tombstones() {
    let tmp = tempfile::tempdir().unwrap();
    let db = SeriesDatabase::open(tmp.path()).unwrap();
    let ctx1 = owner_ctx();
    let ctx2 = SecurityContext::new(
        User::new("other", Vec::<String>::new()),
        Organization::new("org2", "ROLE_ORG2_ADMIN"),
    );
    db.store_series(&ctx1, &catalog("S1", "a")).unwrap();
    db.store_series(&ctx2, &catalog("S1", "b")).unwrap();
    db.delete_series(&ctx2, "S1").unwrap();

    let all = db.get_all_series();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].organization, "org1");
    assert_eq!(all[1].organization, "org2");
    assert!(all[1].is_deleted());
}

#[test]
fn database_registry_caches_per_root() {
    let tmp = tempfile::tempdir().unwrap();
    let a = database_for_root(tmp.path()).unwrap();
    let b = database_for_root(tmp.path()).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}
