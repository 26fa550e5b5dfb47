//! Integration test: baton exclusivity under racing publications.
//!
//! The ledger's single-spend rule is the only serialization mechanism:
//! two publications built against the same baton race at broadcast time,
//! exactly one confirms, and the loser must rebuild against the new tip.

use pyxis_feed::FeedError;
use pyxis_integration_tests::{network, publish, setup_feed};

#[test]
fn exactly_one_of_two_racing_publications_wins() {
    let mut client = network();
    let (oracle, registration, _) = setup_feed(&mut client, "C", 100_000);

    // Both submitters read the same tip and build independently.
    let first = client.publish(&registration, &[0x01]).expect("first build");
    let second = client
        .publish(&registration, &[0x02])
        .expect("second build");
    assert_eq!(
        first.tx.inputs[0], second.tx.inputs[0],
        "both templates spend the same baton"
    );

    let winner = client.broadcast(&first).expect("winner confirms");

    // The loser's broadcast is the compare-and-swap failure.
    assert!(matches!(
        client.broadcast(&second),
        Err(FeedError::StaleBaton)
    ));

    // Rebuilding against the refreshed tip succeeds.
    let rebuilt = client
        .publish(&registration, &[0x02])
        .expect("rebuild against new baton");
    assert_eq!(rebuilt.tx.inputs[0].txid, winner);
    let loser_retry = client.broadcast(&rebuilt).expect("retry confirms");

    // Both readings ended up in the chain, in commit order.
    let samples = client.samples(&oracle, &loser_retry, 10).expect("query");
    let rendered: Vec<&str> = samples
        .iter()
        .map(|s| s.values.as_ref().expect("decode")[0].as_str())
        .collect();
    assert_eq!(rendered, vec!["2", "1"]);
}

#[test]
fn winner_rebroadcast_is_idempotent() {
    let mut client = network();
    let (_, registration, _) = setup_feed(&mut client, "C", 100_000);

    let prepared = client.publish(&registration, &[0x2a]).expect("build");
    let first = client.broadcast(&prepared).expect("confirm");
    // A retried submission of the identical transaction is not a race loss.
    let second = client.broadcast(&prepared).expect("rebroadcast");
    assert_eq!(first, second);
}

#[test]
fn chain_stays_totally_ordered_under_interleaving() {
    let mut client = network();
    let (oracle, registration, _) = setup_feed(&mut client, "C", 500_000);

    let mut tip = registration;
    for reading in 1u8..=20 {
        // Every other round, a stale competitor loses first.
        if reading % 2 == 0 {
            let stale = client.publish(&registration, &[0xEE]).expect("stale build");
            let fresh = client.publish(&registration, &[reading]).expect("build");
            client.broadcast(&fresh).expect("fresh confirms");
            assert!(matches!(
                client.broadcast(&stale),
                Err(FeedError::StaleBaton)
            ));
            tip = fresh.id;
        } else {
            tip = publish(&mut client, &registration, &[reading]);
        }
    }

    let samples = client.samples(&oracle, &tip, 100).expect("query");
    assert_eq!(samples.len(), 20);
    let rendered: Vec<String> = samples
        .iter()
        .rev()
        .map(|s| s.values.as_ref().expect("decode")[0].clone())
        .collect();
    let expected: Vec<String> = (1u8..=20).map(|n| n.to_string()).collect();
    assert_eq!(rendered, expected);
}
