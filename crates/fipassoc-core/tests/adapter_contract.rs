//! Contract Test: Floating IP association adapter
//!
//! Verifies how create / read / delete translate into compute API calls
//! and how not-found answers are absorbed or surfaced.
//!
//! Constraints verified:
//! - Create makes one associate call, then reads back through the id
//! - Read marks the association absent when the floating IP is gone or
//!   detached, and surfaces every other failure unchanged
//! - Delete is idempotent against not-found
//! - A malformed id fails before any network call

mod common;

use common::*;
use fipassoc_core::{AssociationConfig, AssociationState, Error, FloatingIpAssociation};
use std::sync::Arc;

fn adapter(cloud: &MockCloud) -> FloatingIpAssociation {
    FloatingIpAssociation::new(Arc::new(cloud.clone()))
}

fn config() -> AssociationConfig {
    AssociationConfig::new(FLOATING_IP, INSTANCE_ID).with_region(REGION)
}

fn present_state() -> AssociationState {
    AssociationState {
        id: Some(format!("{FLOATING_IP}/{INSTANCE_ID}/")),
        region: REGION.to_string(),
        floating_ip: FLOATING_IP.to_string(),
        instance_id: INSTANCE_ID.to_string(),
        fixed_ip: String::new(),
    }
}

#[tokio::test]
async fn create_sets_composite_id_and_reads_back() {
    let cloud = MockCloud::new();
    cloud.allocate(FLOATING_IP);

    let state = adapter(&cloud).create(&config()).await.unwrap();

    assert_eq!(state.id.as_deref(), Some("203.0.113.5/vm-123/"));
    assert_eq!(state.floating_ip, "203.0.113.5");
    assert_eq!(state.instance_id, "vm-123");
    assert_eq!(state.fixed_ip, "");
    assert_eq!(state.region, REGION);

    assert_eq!(cloud.associate_calls(), 1);
    assert_eq!(cloud.get_calls(), 1, "create must read back exactly once");
    assert_eq!(
        cloud.floating_ip(FLOATING_IP).unwrap().instance_id,
        INSTANCE_ID
    );
}

#[tokio::test]
async fn create_keeps_fixed_ip_from_config_not_live_record() {
    let cloud = MockCloud::new();
    cloud.allocate(FLOATING_IP);

    let state = adapter(&cloud)
        .create(&config().with_fixed_ip("192.168.1.20"))
        .await
        .unwrap();

    assert_eq!(state.id.as_deref(), Some("203.0.113.5/vm-123/192.168.1.20"));
    assert_eq!(state.fixed_ip, "192.168.1.20");
}

#[tokio::test]
async fn create_failure_wraps_cause_and_stops() {
    let cloud = MockCloud::new();
    cloud.allocate(FLOATING_IP);
    cloud.fail_next_associate(Failure::Server);

    let err = adapter(&cloud).create(&config()).await.unwrap_err();

    assert!(matches!(err, Error::Association { .. }), "got {err}");
    assert!(err.to_string().contains("500"));
    assert_eq!(cloud.associate_calls(), 1, "no retry");
    assert_eq!(cloud.get_calls(), 0, "no read after a failed associate");
}

#[tokio::test]
async fn create_not_found_is_still_fatal() {
    let cloud = MockCloud::new();
    // Floating IP never allocated

    let err = adapter(&cloud).create(&config()).await.unwrap_err();
    assert!(matches!(err, Error::Association { .. }));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn create_rejects_missing_required_fields() {
    let cloud = MockCloud::new();
    let cfg = AssociationConfig::new(FLOATING_IP, "").with_region(REGION);

    let err = adapter(&cloud).create(&cfg).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(cloud.api_calls(), 0);
}

#[tokio::test]
async fn read_parses_fields_from_id() {
    let cloud = MockCloud::new();
    cloud.allocate(FLOATING_IP);
    let resource = adapter(&cloud);
    resource.create(&config()).await.unwrap();

    let state = resource.read("203.0.113.5/vm-123/", REGION).await.unwrap();
    assert_eq!(state, present_state());
}

#[tokio::test]
async fn read_marks_absent_when_detached_out_of_band() {
    let cloud = MockCloud::new();
    cloud.allocate(FLOATING_IP);
    let resource = adapter(&cloud);
    resource.create(&config()).await.unwrap();

    cloud.detach_out_of_band(FLOATING_IP);

    let state = resource.read("203.0.113.5/vm-123/", REGION).await.unwrap();
    assert!(!state.is_present());
    // Fields are still populated from the id
    assert_eq!(state.floating_ip, FLOATING_IP);
    assert_eq!(state.instance_id, INSTANCE_ID);
}

#[tokio::test]
async fn read_marks_absent_when_floating_ip_released() {
    let cloud = MockCloud::new();
    cloud.allocate(FLOATING_IP);
    let resource = adapter(&cloud);
    resource.create(&config()).await.unwrap();

    cloud.release(FLOATING_IP);

    let state = resource.read("203.0.113.5/vm-123/", REGION).await.unwrap();
    assert!(!state.is_present());
}

#[tokio::test]
async fn read_surfaces_other_errors_unchanged() {
    let cloud = MockCloud::new();
    cloud.allocate(FLOATING_IP);
    cloud.fail_next_get(Failure::Auth);

    let err = adapter(&cloud)
        .read("203.0.113.5/vm-123/", REGION)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Authentication(_)), "got {err}");
}

#[tokio::test]
async fn read_trusts_id_over_live_record() {
    let cloud = MockCloud::new();
    cloud.allocate(FLOATING_IP);
    let resource = adapter(&cloud);
    resource.create(&config()).await.unwrap();

    // Live record reports a different fixed IP; read does not reconcile it.
    let live = cloud.floating_ip(FLOATING_IP).unwrap();
    assert_ne!(live.fixed_ip, "");

    let state = resource.read("203.0.113.5/vm-123/", REGION).await.unwrap();
    assert!(state.is_present());
    assert_eq!(state.fixed_ip, "");
}

#[tokio::test]
async fn read_rejects_malformed_id_before_network() {
    let cloud = MockCloud::new();
    let resource = adapter(&cloud);

    for bad in ["onlyonepart", "two/parts"] {
        let err = resource.read(bad, REGION).await.unwrap_err();
        assert!(matches!(err, Error::MalformedId(_)), "{bad}: {err}");
    }
    assert_eq!(cloud.api_calls(), 0);
    assert_eq!(cloud.client_calls(), 0);
}

#[tokio::test]
async fn read_fails_when_region_has_no_client() {
    let cloud = MockCloud::with_regions(&["RegionTwo"]);
    cloud.allocate(FLOATING_IP);

    let err = adapter(&cloud)
        .read("203.0.113.5/vm-123/", REGION)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ClientInit(_)), "got {err}");
    assert_eq!(cloud.api_calls(), 0);
}

#[tokio::test]
async fn delete_detaches_floating_ip() {
    let cloud = MockCloud::new();
    cloud.allocate(FLOATING_IP);
    let resource = adapter(&cloud);
    let state = resource.create(&config()).await.unwrap();

    resource.delete(&state).await.unwrap();

    assert_eq!(cloud.disassociate_calls(), 1);
    assert!(!cloud.floating_ip(FLOATING_IP).unwrap().is_associated());
}

#[tokio::test]
async fn delete_twice_is_idempotent() {
    let cloud = MockCloud::new();
    cloud.allocate(FLOATING_IP);
    let resource = adapter(&cloud);
    let state = resource.create(&config()).await.unwrap();

    resource.delete(&state).await.unwrap();
    // The second call reports not-found from the compute service
    resource.delete(&state).await.unwrap();

    assert_eq!(cloud.disassociate_calls(), 2);
}

#[tokio::test]
async fn delete_not_found_is_success() {
    let cloud = MockCloud::new();
    cloud.fail_next_disassociate(Failure::NotFound);

    adapter(&cloud).delete(&present_state()).await.unwrap();
    assert_eq!(cloud.disassociate_calls(), 1);
}

#[tokio::test]
async fn delete_other_failures_are_fatal() {
    let cloud = MockCloud::new();
    cloud.allocate(FLOATING_IP);
    cloud.fail_next_disassociate(Failure::Server);

    let err = adapter(&cloud)
        .delete(&present_state())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Disassociation { .. }), "got {err}");
    assert_eq!(cloud.disassociate_calls(), 1, "no retry");
}

#[tokio::test]
async fn import_hydrates_all_fields_from_id() {
    let cloud = MockCloud::new();
    cloud.allocate(FLOATING_IP);
    let resource = adapter(&cloud);
    resource.create(&config()).await.unwrap();

    let state = resource.import("203.0.113.5/vm-123/", REGION).await.unwrap();
    assert_eq!(state, present_state());
}
