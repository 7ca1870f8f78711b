use _formcraft_core::ids::{IdGenerator, SequentialIds, TimestampIds, UuidIds};
use _formcraft_core::model::NodeId;
use std::collections::HashSet;

#[test]
fn test_ids_sequential_share_one_counter() -> anyhow::Result<()> {
    let mut ids = SequentialIds::new();
    assert_eq!(ids.next_id("section"), NodeId::from("section-1"));
    assert_eq!(ids.next_id("row"), NodeId::from("row-2"));

    let mut resumed = SequentialIds::starting_after(10);
    assert_eq!(resumed.next_id("col"), NodeId::from("col-11"));
    Ok(())
}

#[test]
fn test_ids_timestamp_never_repeats_in_a_burst() -> anyhow::Result<()> {
    let mut ids = TimestampIds::new();
    let burst: HashSet<NodeId> = (0..500).map(|_| ids.next_id("text")).collect();
    assert_eq!(burst.len(), 500);
    assert!(burst
        .iter()
        .all(|id| id.to_string().starts_with("text-")));
    Ok(())
}

#[test]
fn test_ids_uuid_are_prefixed_and_unique() -> anyhow::Result<()> {
    let mut ids = UuidIds;
    let a = ids.next_id("date");
    let b = ids.next_id("date");
    assert_ne!(a, b);
    assert!(!a.is_server());
    assert!(a.to_string().starts_with("date-"));
    Ok(())
}
