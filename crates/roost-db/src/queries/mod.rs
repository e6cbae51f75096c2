mod dossiers;
mod filter;
mod items;
mod users;

/// Ids bound per `IN (...)` lookup, well under SQLite's variable limit.
pub(crate) const ID_BATCH: usize = 500;

/// `?1, ?2, ... ?n`
pub(crate) fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{}", i)).collect::<Vec<_>>().join(", ")
}
