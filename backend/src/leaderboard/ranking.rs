use shared::PlayerRecord;

/// Orders records by primary current rating, highest first, and stamps each one with
/// the 1-based position it held in the input. Ties keep their input order. The rank a
/// record is about to receive is its index in the returned sequence; it is never stored.
pub fn rank(records: Vec<PlayerRecord>) -> Vec<PlayerRecord> {
    let mut ranked: Vec<PlayerRecord> = records
        .into_iter()
        .enumerate()
        .map(|(index, mut record)| {
            record.previous_rank = position(index);
            record
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.rating_primary.current.cmp(&a.rating_primary.current));
    ranked
}

/// Reorders without touching `previous_rank`.
pub fn sort_by_primary(records: &mut [PlayerRecord]) {
    records.sort_by(|a, b| b.rating_primary.current.cmp(&a.rating_primary.current));
}

fn position(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}
