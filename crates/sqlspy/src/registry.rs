//! Process-wide bookkeeping of open connections and live statements.
//!
//! Owned by the [`crate::SpyContext`]; there is no global instance.

use std::fmt::{self, Write};
use std::sync::Weak;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use parking_lot::Mutex;

/// Minimum time between two active statement dumps.
pub const STATEMENT_DUMP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// A statement that can describe the SQL it currently holds.
pub trait ActiveStatement: Send + Sync {
    fn current_sql(&self) -> Option<String>;
}

/// Registry entry for an open connection.
#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    pub driver: String,
    pub opened_at: Instant,
}

/// Tracks open connections by number and live statements by id.
///
/// Statements are held weakly: a statement dropped without `close()` leaves
/// a dead entry that is pruned on the next insert or scan.
pub struct ConnectionRegistry {
    next_number: AtomicU64,
    next_statement_id: AtomicU64,
    connections: DashMap<u64, ConnectionEntry>,
    statements: DashMap<u64, Weak<dyn ActiveStatement>>,
    dump_threshold: usize,
    last_dump: Mutex<Option<Instant>>,
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections.len())
            .field("statements", &self.statements.len())
            .field("dump_threshold", &self.dump_threshold)
            .finish_non_exhaustive()
    }
}

impl ConnectionRegistry {
    /// `dump_threshold` of 0 disables active statement dumps.
    pub fn new(dump_threshold: usize) -> Self {
        Self {
            next_number: AtomicU64::new(0),
            next_statement_id: AtomicU64::new(0),
            connections: DashMap::new(),
            statements: DashMap::new(),
            dump_threshold,
            last_dump: Mutex::new(None),
        }
    }

    /// Issue the next connection number. Numbers start at 1.
    pub fn next_connection_number(&self) -> u64 {
        self.next_number.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Register an open connection.
    ///
    /// Returns the active statement dump when the open connection count has
    /// reached the threshold and the last dump is old enough.
    pub fn track_connection(&self, number: u64, driver: &str) -> Option<Vec<String>> {
        self.track_connection_at(number, driver, Instant::now())
    }

    pub(crate) fn track_connection_at(
        &self,
        number: u64,
        driver: &str,
        now: Instant,
    ) -> Option<Vec<String>> {
        self.connections.insert(
            number,
            ConnectionEntry {
                driver: driver.to_owned(),
                opened_at: now,
            },
        );

        if self.dump_threshold == 0 || self.connections.len() < self.dump_threshold {
            return None;
        }
        {
            let mut last_dump = self.last_dump.lock();
            let cooling_down = (*last_dump)
                .is_some_and(|at| now.saturating_duration_since(at) < STATEMENT_DUMP_INTERVAL);
            if cooling_down {
                return None;
            }
            *last_dump = Some(now);
        }
        Some(self.active_statements_dump())
    }

    /// Remove a connection. Returns false if it was not tracked.
    pub fn untrack_connection(&self, number: u64) -> bool {
        self.connections.remove(&number).is_some()
    }

    pub fn is_tracked(&self, number: u64) -> bool {
        self.connections.contains_key(&number)
    }

    pub fn open_connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn connection(&self, number: u64) -> Option<ConnectionEntry> {
        self.connections.get(&number).map(|entry| entry.value().clone())
    }

    /// Register a statement; returns its registry id.
    pub fn track_statement(&self, statement: Weak<dyn ActiveStatement>) -> u64 {
        self.prune_statements();
        let id = self.next_statement_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.statements.insert(id, statement);
        id
    }

    pub fn untrack_statement(&self, id: u64) {
        self.statements.remove(&id);
    }

    /// Number of statements still alive.
    pub fn live_statement_count(&self) -> usize {
        self.prune_statements();
        self.statements.len()
    }

    fn prune_statements(&self) {
        self.statements.retain(|_, statement| statement.strong_count() > 0);
    }

    /// "Active statement" lines for every live statement with SQL.
    pub fn active_statements_dump(&self) -> Vec<String> {
        let mut live: Vec<(u64, String)> = self
            .statements
            .iter()
            .filter_map(|entry| {
                let sql = entry.value().upgrade()?.current_sql()?;
                Some((*entry.key(), sql))
            })
            .collect();
        live.sort_unstable_by_key(|(id, _)| *id);
        live.into_iter()
            .map(|(_, sql)| format!("Active statement: {sql}"))
            .collect()
    }

    /// Sorted summary of the open connection numbers.
    ///
    /// Keys are copied out before sorting; no lock spans the whole dump.
    pub fn open_connections_dump(&self) -> String {
        let mut numbers: Vec<u64> = self.connections.iter().map(|entry| *entry.key()).collect();
        if numbers.is_empty() {
            return "open connections: none".to_owned();
        }
        numbers.sort_unstable();
        let mut out = format!("open connections: ({})", numbers.len());
        for number in numbers {
            let _ = write!(out, " {number}");
        }
        out
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    struct FixedSql(&'static str);

    impl ActiveStatement for FixedSql {
        fn current_sql(&self) -> Option<String> {
            Some(self.0.to_owned())
        }
    }

    fn weak(statement: &Arc<FixedSql>) -> Weak<dyn ActiveStatement> {
        let statement: Arc<dyn ActiveStatement> = Arc::clone(statement) as Arc<dyn ActiveStatement>;
        Arc::downgrade(&statement)
    }

    #[test]
    fn test_numbers_start_at_one() {
        let registry = ConnectionRegistry::default();
        assert_eq!(registry.next_connection_number(), 1);
        assert_eq!(registry.next_connection_number(), 2);
        assert_eq!(registry.next_connection_number(), 3);
    }

    #[test]
    fn test_numbers_unique_across_threads() {
        let registry = Arc::new(ConnectionRegistry::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    (0..250)
                        .map(|_| registry.next_connection_number())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut seen = HashSet::new();
        for handle in handles {
            for number in handle.join().unwrap() {
                assert!(seen.insert(number), "duplicate number {number}");
            }
        }
        assert_eq!(seen.len(), 2000);
        assert_eq!(seen.iter().min(), Some(&1));
        assert_eq!(seen.iter().max(), Some(&2000));
    }

    #[test]
    fn test_open_connections_dump() {
        let registry = ConnectionRegistry::default();
        assert_eq!(registry.open_connections_dump(), "open connections: none");
        registry.track_connection(12, "mem");
        registry.track_connection(3, "mem");
        registry.track_connection(7, "mem");
        assert_eq!(registry.open_connections_dump(), "open connections: (3) 3 7 12");
        assert!(registry.untrack_connection(7));
        assert!(!registry.untrack_connection(7));
        assert_eq!(registry.open_connections_dump(), "open connections: (2) 3 12");
    }

    #[test]
    fn test_connection_entry() {
        let registry = ConnectionRegistry::default();
        registry.track_connection(1, "oracle");
        assert!(registry.is_tracked(1));
        assert_eq!(registry.connection(1).unwrap().driver, "oracle");
        assert!(registry.connection(2).is_none());
    }

    #[test]
    fn test_dropped_statements_are_pruned() {
        let registry = ConnectionRegistry::default();
        let kept = Arc::new(FixedSql("select 1"));
        let dropped = Arc::new(FixedSql("select 2"));
        registry.track_statement(weak(&kept));
        registry.track_statement(weak(&dropped));
        assert_eq!(registry.live_statement_count(), 2);
        drop(dropped);
        assert_eq!(registry.live_statement_count(), 1);
        assert_eq!(registry.active_statements_dump(), vec!["Active statement: select 1"]);
    }

    #[test]
    fn test_untrack_statement() {
        let registry = ConnectionRegistry::default();
        let statement = Arc::new(FixedSql("select 1"));
        let id = registry.track_statement(weak(&statement));
        registry.untrack_statement(id);
        assert_eq!(registry.live_statement_count(), 0);
    }

    #[test]
    fn test_zero_threshold_never_dumps() {
        let registry = ConnectionRegistry::new(0);
        let statement = Arc::new(FixedSql("select 1"));
        registry.track_statement(weak(&statement));
        for number in 1..=50 {
            assert!(registry.track_connection(number, "mem").is_none());
        }
    }

    #[test]
    fn test_threshold_dump_with_cooldown() {
        let registry = ConnectionRegistry::new(2);
        let statement = Arc::new(FixedSql("update t set a = 1"));
        registry.track_statement(weak(&statement));
        let start = Instant::now();

        assert!(registry.track_connection_at(1, "mem", start).is_none());
        let dump = registry.track_connection_at(2, "mem", start).unwrap();
        assert_eq!(dump, vec!["Active statement: update t set a = 1"]);

        let later = start + Duration::from_secs(60);
        assert!(registry.track_connection_at(3, "mem", later).is_none());

        let much_later = start + STATEMENT_DUMP_INTERVAL;
        assert!(registry.track_connection_at(4, "mem", much_later).is_some());
    }
}
