//! The publication engine.
//!
//! One publication is one atomic ledger transaction: it spends the
//! registration's current baton and one escrow output, pays the publisher
//! the datafee margin, mints the successor baton, and embeds the reading.
//! Failure at any step leaves registry, subscription, and baton state
//! untouched.

use pyxis_codec::FormatSpec;
use pyxis_ledger::{Ledger, Owner, Transaction, TxOut};
use pyxis_types::{RegistrationId, BATON_VALUE};
use tracing::debug;

use crate::commit::Commit;
use crate::{FeedClient, FeedError, Prepared, Result};

impl<L: Ledger> FeedClient<L> {
    /// Prepare a publication transaction for a reading.
    ///
    /// Steps, all-or-nothing:
    /// 1. the payload must decode cleanly against the oracle's format;
    /// 2. the registration must hold an unspent baton;
    /// 3. an escrow output with balance >= datafee must exist;
    /// 4. the template spends baton + escrow and mints the successor
    ///    baton, the publisher payment, and the escrow change.
    ///
    /// The publisher nets `datafee - min_fee`; the ledger keeps the relay
    /// fee. A concurrent publication racing for the same baton surfaces
    /// as [`FeedError::StaleBaton`] at broadcast time; rebuild against
    /// the new baton and retry.
    pub fn publish(&self, registration: &RegistrationId, payload: &[u8]) -> Result<Prepared> {
        let registration = self.registration(registration)?;
        let oracle = self.info(&registration.oracle)?;
        FormatSpec::parse(&oracle.format)?.decode(payload)?;

        let baton = self.current_baton(&registration.id)?;

        let datafee = registration.datafee;
        let (escrow_outpoint, escrow) = self
            .unspent_escrows(&registration.oracle)
            .into_iter()
            .find(|(_, out)| out.value >= datafee)
            .ok_or(FeedError::InsufficientEscrow { needed: datafee })?;

        let min_fee = self.ledger().min_fee();
        let mut outputs = vec![
            TxOut {
                value: BATON_VALUE,
                owner: Owner::Baton {
                    oracle: registration.oracle,
                    publisher: registration.publisher,
                },
            },
            TxOut {
                value: datafee - min_fee,
                owner: Owner::Key(registration.publisher),
            },
        ];
        let escrow_change = escrow.value - datafee;
        if escrow_change > 0 {
            outputs.push(TxOut {
                value: escrow_change,
                owner: escrow.owner,
            });
        }

        let tx = Transaction {
            inputs: vec![baton, escrow_outpoint],
            outputs,
            commit: Some(
                Commit::DataPoint {
                    oracle: registration.oracle,
                    registration: registration.id,
                    prev_baton: baton.txid,
                    payload: payload.to_vec(),
                }
                .encode()?,
            ),
        };
        let id = tx.txid()?;
        debug!(
            data_point = %hex::encode(id),
            registration = %hex::encode(registration.id),
            prev_baton = %hex::encode(baton.txid),
            "publication prepared"
        );
        Ok(Prepared { id, tx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{client, fund, key, MIN_FEE};
    use pyxis_ledger::MemoryLedger;
    use pyxis_types::{OracleId, TxId};

    const DATAFEE: i64 = 10_000;

    /// Oracle + registration + one subscription, ready to publish.
    fn feed(
        client: &mut FeedClient<MemoryLedger>,
        format: &str,
        escrow: i64,
    ) -> (OracleId, TxId) {
        let funding = fund(client, key(1), 100_000);
        let prepared = client
            .create(&funding, "Test", "Test", format)
            .expect("prepare create");
        let oracle = client.broadcast(&prepared).expect("broadcast create");

        let funding = fund(client, key(2), 100_000);
        let prepared = client
            .register(&funding, &oracle, key(2), DATAFEE)
            .expect("prepare register");
        let registration = client.broadcast(&prepared).expect("broadcast register");

        let funding = fund(client, key(3), 1_000_000);
        let prepared = client
            .subscribe(&funding, &oracle, key(3), escrow)
            .expect("prepare subscribe");
        client.broadcast(&prepared).expect("broadcast subscribe");

        (oracle, registration)
    }

    fn publisher_balance(client: &FeedClient<MemoryLedger>) -> u64 {
        client
            .ledger()
            .unspent_outputs()
            .iter()
            .filter(|(_, out)| out.owner == Owner::Key(key(2)))
            .map(|(_, out)| out.value)
            .sum()
    }

    #[test]
    fn test_publish_advances_baton_and_pays_publisher() {
        let mut client = client();
        let (oracle, registration) = feed(&mut client, "s", 50_000);
        let before = publisher_balance(&client);

        let payload = hex::decode("05416e746f6e").expect("hex");
        let prepared = client.publish(&registration, &payload).expect("prepare");
        let data_point = client.broadcast(&prepared).expect("broadcast");

        // Successor baton lives in the publication transaction.
        let baton = client.current_baton(&registration).expect("baton");
        assert_eq!(baton.txid, data_point);

        // Publisher nets the datafee minus the relay fee.
        assert_eq!(
            publisher_balance(&client) - before,
            DATAFEE as u64 - MIN_FEE
        );
        // Escrow decreased by exactly one datafee.
        assert_eq!(client.escrow_balance(&oracle), 50_000 - DATAFEE as u64);
    }

    #[test]
    fn test_publish_rejects_bad_payload_without_ledger_effect() {
        let mut client = client();
        let (oracle, registration) = feed(&mut client, "I", 50_000);
        let confirmed_before = client.ledger().confirmed().len();

        // Truncated for a 4-byte field.
        assert!(matches!(
            client.publish(&registration, &[0xff, 0xff]),
            Err(FeedError::Codec(_))
        ));
        // Trailing bytes are rejected too.
        assert!(matches!(
            client.publish(&registration, &[0xff; 5]),
            Err(FeedError::Codec(_))
        ));

        assert_eq!(client.ledger().confirmed().len(), confirmed_before);
        assert_eq!(client.escrow_balance(&oracle), 50_000);
    }

    #[test]
    fn test_publish_unknown_registration() {
        let client = client();
        assert!(matches!(
            client.publish(&[9u8; 32], &[0x00]),
            Err(FeedError::NotFound(_))
        ));
    }

    #[test]
    fn test_publish_insufficient_escrow() {
        let mut client = client();
        // Escrow below one datafee.
        let (_, registration) = feed(&mut client, "C", DATAFEE - 1);
        assert!(matches!(
            client.publish(&registration, &[0xff]),
            Err(FeedError::InsufficientEscrow {
                needed
            }) if needed == DATAFEE as u64
        ));
    }

    #[test]
    fn test_publish_exhausts_escrow_then_fails() {
        let mut client = client();
        // Exactly two readings' worth of escrow.
        let (oracle, registration) = feed(&mut client, "C", 2 * DATAFEE);

        for _ in 0..2 {
            let prepared = client.publish(&registration, &[0x2a]).expect("prepare");
            client.broadcast(&prepared).expect("broadcast");
        }
        assert_eq!(client.escrow_balance(&oracle), 0);
        assert!(matches!(
            client.publish(&registration, &[0x2a]),
            Err(FeedError::InsufficientEscrow { .. })
        ));
    }

    #[test]
    fn test_concurrent_publish_exactly_one_wins() {
        let mut client = client();
        let (_, registration) = feed(&mut client, "C", 100_000);

        // Two submitters read the same baton and build independently.
        let first = client.publish(&registration, &[0x01]).expect("first");
        let second = client.publish(&registration, &[0x02]).expect("second");
        assert_eq!(first.tx.inputs[0], second.tx.inputs[0]);

        client.broadcast(&first).expect("winner commits");
        assert!(matches!(
            client.broadcast(&second),
            Err(FeedError::StaleBaton)
        ));

        // The loser rebuilds against the new baton and succeeds.
        let retried = client.publish(&registration, &[0x02]).expect("rebuild");
        assert_ne!(retried.tx.inputs[0], second.tx.inputs[0]);
        client.broadcast(&retried).expect("retry commits");
    }
}
