//! Ledger identity, fragments, and the under-replication path shape.

use std::fmt;

use super::bookie::BookieId;

/// A 64-bit ledger identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct LedgerId(pub u64);

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for LedgerId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// A contiguous portion of a ledger, as reported by the ledger checker.
/// Exposes the bookie addresses hosting it so lost fragments can be
/// attributed to every distinct hosting bookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerFragment {
    pub ledger_id: LedgerId,
    pub hosts: Vec<BookieId>,
}

impl LedgerFragment {
    pub fn new(ledger_id: LedgerId, hosts: Vec<BookieId>) -> Self {
        Self { ledger_id, hosts }
    }
}

/// One (ledger, missing bookie) pair published to the external
/// under-replication queue. This crate never reads this record back —
/// it is consumed by the out-of-scope replication worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnderReplicationRecord {
    pub ledger_id: LedgerId,
    pub missing_bookie: BookieId,
}

impl UnderReplicationRecord {
    pub fn new(ledger_id: LedgerId, missing_bookie: BookieId) -> Self {
        Self {
            ledger_id,
            missing_bookie,
        }
    }
}

/// Build the path under which the under-replication manager would
/// persist a record for `ledger_id`, of shape
/// `<under_replication_root>/ledgers/<HEX_LEDGER_ID>`.
///
/// Used only by tests and the mock adapter to produce paths that
/// `parse_ledger_id_from_path` can read back — the real path format is
/// owned by the external under-replication manager (§6).
pub fn format_ledger_path(under_replication_root: &str, ledger_id: LedgerId) -> String {
    format!("{under_replication_root}/ledgers/{:x}", ledger_id.0)
}

/// Parse a ledger id out of a path of shape
/// `…/<under_replication_root>/ledgers/<HEX>`, per §4.4 / §6.
///
/// Any extra slashes in the suffix after `ledgers/` are stripped before
/// the remainder is parsed as base-16 — this tolerates sharded ZK-style
/// layouts (`ledgers/00/0f/abcd`) collapsing to a single hex token.
/// Paths that don't contain a `ledgers/` segment, or whose suffix isn't
/// valid hex, parse to `None` (invariant I5) and are silently ignored by
/// the snapshotter (§4.4).
pub fn parse_ledger_id_from_path(path: &str) -> Option<LedgerId> {
    let (_, suffix) = path.rsplit_once("ledgers/")?;
    let collapsed: String = suffix.chars().filter(|c| *c != '/').collect();
    if collapsed.is_empty() {
        return None;
    }
    u64::from_str_radix(&collapsed, 16).ok().map(LedgerId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_then_parse_round_trips() {
        for raw in [0u64, 1, 10, 255, u64::MAX] {
            let id = LedgerId(raw);
            let path = format_ledger_path("/ledgerunderreplication", id);
            assert_eq!(parse_ledger_id_from_path(&path), Some(id));
        }
    }

    #[test]
    fn parses_documented_examples() {
        assert_eq!(
            parse_ledger_id_from_path("/ledgerunderreplication/ledgers/0a"),
            Some(LedgerId(10))
        );
        assert_eq!(
            parse_ledger_id_from_path("/ledgerunderreplication/ledgers/ff"),
            Some(LedgerId(255))
        );
    }

    #[test]
    fn rejects_paths_without_the_shape() {
        assert_eq!(parse_ledger_id_from_path("garbage"), None);
        assert_eq!(parse_ledger_id_from_path("/ledgerunderreplication/ledgers/"), None);
        assert_eq!(parse_ledger_id_from_path("/ledgerunderreplication/ledgers/zz"), None);
    }

    #[test]
    fn collapses_sharded_slashes_before_parsing() {
        assert_eq!(
            parse_ledger_id_from_path("/root/ledgers/00/0f/ab"),
            Some(LedgerId(0x000fab))
        );
    }

    proptest::proptest! {
        /// I5: `parse(format(L)) == L` for every 64-bit ledger id.
        #[test]
        fn format_then_parse_round_trips_for_any_id(raw in proptest::prelude::any::<u64>()) {
            let id = LedgerId(raw);
            let path = format_ledger_path("/ledgerunderreplication", id);
            proptest::prop_assert_eq!(parse_ledger_id_from_path(&path), Some(id));
        }

        /// I5: a string with no `ledgers/` segment never parses.
        #[test]
        fn strings_without_the_ledgers_segment_never_parse(s in "[a-zA-Z0-9/]{0,40}") {
            proptest::prop_assume!(!s.contains("ledgers/"));
            proptest::prop_assert_eq!(parse_ledger_id_from_path(&s), None);
        }
    }
}
