// Integration tests for the spend-status backup and its in-progress guard

mod common;

use common::{grant, insert_grant, insert_token, new_engine, token, FailingEngine};
use vgrant_core::errors::ExErrorKind;
use vgrant_core::model::{SpendStatus, TriggerType};
use vgrant_store::vg::{backup_spend_statuses, SpendStatusBackup};

#[tokio::test]
async fn test_returns_every_token_when_nothing_in_flight() {
    // Given: Two batches, one token redeemed
    let engine = new_engine();
    insert_grant(&engine, &grant("b1", "promo-1", &[1, 2]));
    let mut redeemed = token(3, "b2");
    redeemed.redeemed_at = 1_650_000_000;
    redeemed.redeem_id = "contribution-1".into();
    redeemed.redeem_type = TriggerType::OneOffTip;
    insert_grant(&engine, &grant("b2", "promo-2", &[]));
    insert_token(&engine, &redeemed);

    // When: Spend statuses are backed up
    let backup = backup_spend_statuses(&engine).await.unwrap();

    // Then: Every token is listed
    assert_eq!(
        backup,
        SpendStatusBackup::Complete(vec![
            SpendStatus::new(1, 0, TriggerType::None),
            SpendStatus::new(2, 0, TriggerType::None),
            SpendStatus::new(3, 1_650_000_000, TriggerType::OneOffTip),
        ])
    );
}

#[tokio::test]
async fn test_refuses_while_redemption_in_progress() {
    // Given: Many tokens, one of them mid-redemption
    let engine = new_engine();
    insert_grant(&engine, &grant("b1", "promo-1", &[1, 2, 3, 4, 5]));
    let mut in_flight = token(6, "b1");
    in_flight.redeem_id = "order-7".into();
    insert_token(&engine, &in_flight);

    // When: Spend statuses are backed up
    let backup = backup_spend_statuses(&engine).await.unwrap();

    // Then: The backup is refused without any statuses
    assert_eq!(backup, SpendStatusBackup::InProgress);
    let err = backup.into_result().unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::InProgress);
}

#[tokio::test]
async fn test_committed_redemption_does_not_block() {
    let engine = new_engine();
    let mut spent = token(1, "b1");
    spent.redeem_id = "order-7".into();
    spent.redeemed_at = 1_650_000_000;
    insert_grant(&engine, &grant("b1", "promo-1", &[]));
    insert_token(&engine, &spent);

    let statuses = backup_spend_statuses(&engine)
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(statuses.len(), 1);
}

#[tokio::test]
async fn test_empty_table_is_complete_and_empty() {
    let engine = new_engine();

    let backup = backup_spend_statuses(&engine).await.unwrap();

    assert_eq!(backup, SpendStatusBackup::Complete(Vec::new()));
}

#[tokio::test]
async fn test_engine_failure_is_storage_unavailable() {
    let err = backup_spend_statuses(&FailingEngine).await.unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::StorageUnavailable);
}
