use rewards_ledger::concurrent_ledger::ShardedLedger;
use rewards_ledger::error::LedgerError;

/// Concurrent earns for one user all land
#[tokio::test]
async fn test_concurrent_earns_same_user() {
    let ledger = ShardedLedger::new(4);

    let mut handles = vec![];
    for i in 0..100 {
        let ledger = ledger.clone_handle();
        handles.push(tokio::spawn(async move {
            let date = format!("2020-11-01T00:00:{:02}Z", i % 60);
            ledger.earn("user-1", "DANNON", 10, &date).await.unwrap();
        }));
    }

    for h in handles {
        h.await.unwrap();
    }

    let balances = ledger.balances("user-1").await.unwrap();
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].points, 1000); // 100 × 10
}

/// Racing spends never take more than the user holds
#[tokio::test]
async fn test_concurrent_spends_never_double_spend() {
    let ledger = ShardedLedger::new(4);
    for day in 1..=10 {
        let date = format!("2020-11-{:02}T00:00:00Z", day);
        ledger.earn("user-1", "DANNON", 10, &date).await.unwrap();
    }

    let mut handles = vec![];
    for _ in 0..30 {
        let ledger = ledger.clone_handle();
        handles.push(tokio::spawn(
            async move { ledger.spend("user-1", None, 5).await },
        ));
    }

    let mut succeeded = 0;
    let mut rejected = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(receipt) => {
                succeeded += 1;
                let taken: i64 = receipt.iter().map(|l| -l.points_deducted).sum();
                assert_eq!(taken, 5);
            }
            Err(LedgerError::InsufficientPoints { .. }) => rejected += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, 20);
    assert_eq!(rejected, 10);
    let balances = ledger.balances("user-1").await.unwrap();
    assert_eq!(balances[0].points, 0);
}

/// Users spread over shards are all reported, sorted by id
#[tokio::test]
async fn test_all_balances_across_shards() {
    let ledger = ShardedLedger::new(8);

    let mut handles = vec![];
    for n in 0..50 {
        let ledger = ledger.clone_handle();
        handles.push(tokio::spawn(async move {
            let user = format!("user-{:02}", n);
            ledger
                .earn(&user, "DANNON", 100, "2020-11-01T00:00:00Z")
                .await
                .unwrap();
            ledger
                .earn(&user, "UNILEVER", n, "2020-11-02T00:00:00Z")
                .await
                .unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let all = ledger.all_balances().await.unwrap();

    assert_eq!(all.len(), 50);
    for (n, (user, balances)) in all.iter().enumerate() {
        assert_eq!(user, &format!("user-{:02}", n));
        assert_eq!(balances[0].payer, "DANNON");
        assert_eq!(balances[0].points, 100);
        assert_eq!(balances[1].points, n as i64);
    }
}

/// Mixed earns and spends for different users proceed independently
#[tokio::test]
async fn test_concurrent_mixed_operations() {
    let ledger = ShardedLedger::new(4);
    for user in ["alice", "bob"] {
        ledger
            .earn(user, "DANNON", 1000, "2020-11-01T00:00:00Z")
            .await
            .unwrap();
    }

    let mut handles = vec![];
    for i in 0..20 {
        let ledger = ledger.clone_handle();
        let user = if i % 2 == 0 { "alice" } else { "bob" };
        handles.push(tokio::spawn(async move {
            ledger
                .earn(user, "UNILEVER", 10, "2020-11-02T00:00:00Z")
                .await
                .unwrap();
            ledger.spend(user, None, 15).await.unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    // Each user: 1000 + 10×10 - 10×15 = 950
    for user in ["alice", "bob"] {
        let total: i64 = ledger
            .balances(user)
            .await
            .unwrap()
            .iter()
            .map(|b| b.points)
            .sum();
        assert_eq!(total, 950);
    }
}

#[tokio::test]
async fn test_purge_consumed_through_shards() {
    let ledger = ShardedLedger::new(2);
    ledger
        .earn("user-1", "DANNON", 50, "2020-11-01T00:00:00Z")
        .await
        .unwrap();

    ledger.spend("user-1", None, 50).await.unwrap();
    assert_eq!(ledger.purge_consumed("user-1").await.unwrap(), 1);

    assert_eq!(
        ledger.balances("user-1").await,
        Err(LedgerError::NoRecords)
    );
    assert!(ledger.all_balances().await.unwrap().is_empty());
}

#[test]
fn test_clone_handle_shares_shards() {
    let ledger = ShardedLedger::new(3);
    let handle = ledger.clone_handle();
    assert_eq!(handle.num_shards(), 3);
}

#[test]
#[should_panic(expected = "num_shards must be at least 1")]
fn test_zero_shards_rejected() {
    let _ = ShardedLedger::new(0);
}
