use shared::PlayerRecord;

/// A cohort tag that parses as a positive year has expired once that year is reached.
/// Anything else ("B2", "staff", "") never expires.
pub fn cohort_expired(cohort_tag: &str, current_year: i32) -> bool {
    match cohort_tag.trim().parse::<i64>() {
        Ok(year) if year > 0 => year <= i64::from(current_year),
        _ => false,
    }
}

/// Drops graduated players. Returns the kept records in their original order and the
/// identifiers of the removed ones.
pub fn remove_expired(records: Vec<PlayerRecord>, current_year: i32) -> (Vec<PlayerRecord>, Vec<String>) {
    let (expired, kept): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|record| cohort_expired(&record.cohort_tag, current_year));

    let removed: Vec<String> = expired.into_iter().map(|record| record.id).collect();
    if !removed.is_empty() {
        log::info!("Removed {} expired players: {:?}", removed.len(), removed);
    }

    (kept, removed)
}
