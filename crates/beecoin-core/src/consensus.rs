use crate::{constants::WIRE_VERSION, Block, ChainSnapshot, Ledger, LedgerError, Result};
use tracing::{debug, info, warn};

/// Outcome of one consensus round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The local chain was swapped for `peer`'s chain of `length` blocks.
    Replaced { peer: String, length: usize },
    KeptLocal,
}

impl Resolution {
    pub fn replaced(&self) -> bool {
        matches!(self, Resolution::Replaced { .. })
    }
}

/// Longest-valid-chain rule.
///
/// Each item is a peer and the result of fetching its chain. Failed fetches and
/// chains that do not validate are skipped. A peer chain wins only when it is
/// strictly longer than the best seen so far, starting from the local length,
/// so the first peer seen wins ties. The winner replaces the local chain
/// wholesale; the pending pool is kept.
pub fn resolve_conflicts<I>(ledger: &mut Ledger, responses: I) -> Resolution
where
    I: IntoIterator<Item = (String, Result<ChainSnapshot>)>,
{
    let mut best_length = ledger.len();
    let mut best = None;

    for (peer, response) in responses {
        let snapshot = match response {
            Ok(snapshot) => snapshot,
            Err(err) => {
                debug!(%peer, %err, "skipping peer");
                continue;
            }
        };
        if snapshot.length <= best_length {
            debug!(%peer, length = snapshot.length, best_length, "peer chain not longer");
            continue;
        }
        match candidate_blocks(ledger, &snapshot) {
            Ok(blocks) => {
                best_length = snapshot.length;
                best = Some((peer, blocks));
            }
            Err(err) => warn!(%peer, %err, "rejecting peer chain"),
        }
    }

    match best {
        Some((peer, blocks)) => {
            let length = blocks.len();
            ledger.replace_chain(blocks);
            info!(%peer, length, "adopted longer peer chain");
            Resolution::Replaced { peer, length }
        }
        None => Resolution::KeptLocal,
    }
}

fn candidate_blocks(ledger: &Ledger, snapshot: &ChainSnapshot) -> Result<Vec<Block>> {
    if snapshot.version != WIRE_VERSION {
        return Err(LedgerError::InvalidChain(format!(
            "wire version {} is not supported, expected {WIRE_VERSION}",
            snapshot.version
        )));
    }
    if snapshot.length != snapshot.chain.len() {
        return Err(LedgerError::InvalidChain(format!(
            "reported length {} but carries {} blocks",
            snapshot.length,
            snapshot.chain.len()
        )));
    }
    ledger.validate_chain(&snapshot.chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LedgerConfig, Transaction};

    const TEST_CONFIG: LedgerConfig = LedgerConfig {
        difficulty: 1,
        mining_reward: 100,
    };

    fn chain_of(len: usize, miner: &str) -> Ledger {
        let mut ledger = Ledger::new(TEST_CONFIG);
        while ledger.len() < len {
            ledger.mine_pending_transactions(miner);
        }
        ledger
    }

    fn unreachable(peer: &str) -> (String, Result<ChainSnapshot>) {
        (
            peer.to_string(),
            Err(LedgerError::PeerUnreachable {
                peer: peer.to_string(),
                reason: "connection refused".into(),
            }),
        )
    }

    #[test]
    fn longer_valid_chain_replaces_local() {
        let mut local = chain_of(3, "local");
        let peer = chain_of(5, "peer");
        let outcome = resolve_conflicts(
            &mut local,
            vec![("b:5000".to_string(), Ok(peer.snapshot()))],
        );
        assert_eq!(
            outcome,
            Resolution::Replaced {
                peer: "b:5000".into(),
                length: 5
            }
        );
        assert!(outcome.replaced());
        assert_eq!(local.snapshot().length, 5);
        assert_eq!(local.snapshot().chain, peer.snapshot().chain);
    }

    #[test]
    fn invalid_longer_chain_is_ignored() {
        let mut local = chain_of(3, "local");
        let before = local.snapshot();
        let mut forged = chain_of(5, "peer").snapshot();
        forged.chain[2].transactions[0].amount = 1_000_000;

        let outcome = resolve_conflicts(&mut local, vec![("b:5000".to_string(), Ok(forged))]);
        assert_eq!(outcome, Resolution::KeptLocal);
        assert_eq!(local.snapshot(), before);
    }

    #[test]
    fn equal_or_shorter_chains_keep_local() {
        let mut local = chain_of(3, "local");
        let before = local.snapshot();
        let outcome = resolve_conflicts(
            &mut local,
            vec![
                ("a".to_string(), Ok(chain_of(3, "a").snapshot())),
                ("b".to_string(), Ok(chain_of(2, "b").snapshot())),
            ],
        );
        assert_eq!(outcome, Resolution::KeptLocal);
        assert_eq!(local.snapshot(), before);
    }

    #[test]
    fn unreachable_peers_are_skipped() {
        let mut local = chain_of(2, "local");
        let peer = chain_of(4, "peer");
        let outcome = resolve_conflicts(
            &mut local,
            vec![
                unreachable("down:1"),
                ("up:2".to_string(), Ok(peer.snapshot())),
                unreachable("down:3"),
            ],
        );
        assert!(outcome.replaced());
        assert_eq!(local.len(), 4);
    }

    #[test]
    fn all_peers_unreachable_keeps_local() {
        let mut local = chain_of(2, "local");
        let outcome = resolve_conflicts(&mut local, vec![unreachable("a"), unreachable("b")]);
        assert_eq!(outcome, Resolution::KeptLocal);
    }

    #[test]
    fn longest_valid_chain_wins() {
        let mut local = chain_of(2, "local");
        let four = chain_of(4, "four");
        let six = chain_of(6, "six");
        let outcome = resolve_conflicts(
            &mut local,
            vec![
                ("four".to_string(), Ok(four.snapshot())),
                ("six".to_string(), Ok(six.snapshot())),
            ],
        );
        assert_eq!(
            outcome,
            Resolution::Replaced {
                peer: "six".into(),
                length: 6
            }
        );
        assert_eq!(local.latest_block(), six.latest_block());
    }

    #[test]
    fn first_seen_wins_ties() {
        let mut local = chain_of(2, "local");
        let first = chain_of(4, "first");
        let second = chain_of(4, "second");
        let outcome = resolve_conflicts(
            &mut local,
            vec![
                ("first".to_string(), Ok(first.snapshot())),
                ("second".to_string(), Ok(second.snapshot())),
            ],
        );
        assert_eq!(
            outcome,
            Resolution::Replaced {
                peer: "first".into(),
                length: 4
            }
        );
        assert_eq!(local.latest_block(), first.latest_block());
    }

    #[test]
    fn inflated_length_is_rejected() {
        let mut local = chain_of(2, "local");
        let mut snapshot = chain_of(3, "peer").snapshot();
        snapshot.length = 10;
        let outcome = resolve_conflicts(&mut local, vec![("p".to_string(), Ok(snapshot))]);
        assert_eq!(outcome, Resolution::KeptLocal);
        assert_eq!(local.len(), 2);
    }

    #[test]
    fn unknown_wire_version_is_rejected() {
        let mut local = chain_of(2, "local");
        let mut snapshot = chain_of(4, "peer").snapshot();
        snapshot.version = WIRE_VERSION + 1;
        let outcome =
            resolve_conflicts(&mut local, vec![("p".to_string(), Ok(snapshot.clone()))]);
        assert_eq!(outcome, Resolution::KeptLocal);
        assert_eq!(local.len(), 2);
        assert!(matches!(
            candidate_blocks(&local, &snapshot),
            Err(LedgerError::InvalidChain(_))
        ));

        snapshot.version = WIRE_VERSION;
        let outcome = resolve_conflicts(&mut local, vec![("p".to_string(), Ok(snapshot))]);
        assert!(outcome.replaced());
    }

    #[test]
    fn replacement_keeps_pending_pool() {
        let mut local = chain_of(1, "local");
        local.add_transaction(Transaction::new(Some("alice".into()), "bob", 3, 1));
        let peer = chain_of(3, "peer");
        resolve_conflicts(&mut local, vec![("p".to_string(), Ok(peer.snapshot()))]);
        assert_eq!(local.len(), 3);
        assert_eq!(local.pending().len(), 1);
    }

    #[test]
    fn adopted_blocks_keep_peer_nonce_and_hash() {
        let mut local = chain_of(1, "local");
        let peer = chain_of(3, "peer");
        resolve_conflicts(&mut local, vec![("p".to_string(), Ok(peer.snapshot()))]);
        for (mine, theirs) in local.chain().iter().zip(peer.chain()) {
            assert_eq!(mine.nonce(), theirs.nonce());
            assert_eq!(mine.hash(), theirs.hash());
        }
        // Mining continues on top of the adopted tip.
        let tip = local.latest_block().hash().to_string();
        assert_eq!(local.mine_pending_transactions("local").previous_hash(), tip);
    }
}
