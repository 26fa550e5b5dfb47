//! Shared helpers for the integration tests.

use pyxis_feed::FeedClient;
use pyxis_ledger::{MemoryLedger, Outpoint, Owner};
use pyxis_types::{OracleId, PubKey, RegistrationId};

/// Minimum relay fee used by the test ledger.
pub const MIN_FEE: u64 = 1_000;

/// Datafee used by registrations throughout the tests.
pub const DATAFEE: i64 = 10_000;

/// A feed client over a fresh single-node ledger.
pub fn network() -> FeedClient<MemoryLedger> {
    FeedClient::new(MemoryLedger::new(MIN_FEE))
}

/// A random participant key.
pub fn random_key() -> PubKey {
    rand::random()
}

/// Grant funds to a key and return the spendable outpoint.
pub fn fund(client: &mut FeedClient<MemoryLedger>, key: PubKey, value: u64) -> Outpoint {
    let (outpoint, _) = client.ledger_mut().fund(Owner::Key(key), value);
    outpoint
}

/// Create an oracle and confirm it.
pub fn create_oracle(
    client: &mut FeedClient<MemoryLedger>,
    name: &str,
    format: &str,
) -> OracleId {
    let creator = random_key();
    let funding = fund(client, creator, 100_000);
    let prepared = client
        .create(&funding, name, "integration test feed", format)
        .expect("prepare create");
    client.broadcast(&prepared).expect("broadcast create")
}

/// Create an oracle, register a publisher, and deposit escrow.
///
/// Returns the oracle, the registration, and the publisher key.
pub fn setup_feed(
    client: &mut FeedClient<MemoryLedger>,
    format: &str,
    escrow: i64,
) -> (OracleId, RegistrationId, PubKey) {
    let oracle = create_oracle(client, "Test", format);

    let publisher = random_key();
    let funding = fund(client, publisher, 100_000);
    let prepared = client
        .register(&funding, &oracle, publisher, DATAFEE)
        .expect("prepare register");
    let registration = client.broadcast(&prepared).expect("broadcast register");

    let subscriber = random_key();
    let funding = fund(client, subscriber, 10_000_000);
    let prepared = client
        .subscribe(&funding, &oracle, subscriber, escrow)
        .expect("prepare subscribe");
    client.broadcast(&prepared).expect("broadcast subscribe");

    (oracle, registration, publisher)
}

/// Publish one reading and return the data-point id (the new baton).
pub fn publish(
    client: &mut FeedClient<MemoryLedger>,
    registration: &RegistrationId,
    payload: &[u8],
) -> pyxis_types::TxId {
    let prepared = client.publish(registration, payload).expect("prepare publish");
    client.broadcast(&prepared).expect("broadcast publish")
}
