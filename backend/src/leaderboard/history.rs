use chrono::NaiveDate;
use shared::{PlayerRecord, HISTORY_DAYS};

/// Appends today's primary score to the rolling history, at most once per calendar day,
/// keeping only the most recent entries. Returns whether an entry was appended.
pub fn update_history(record: &mut PlayerRecord, observed_score: i32, today: NaiveDate) -> bool {
    if record.last_history_update == Some(today) {
        log::debug!("History already updated today for {}", record.id);
        return false;
    }

    record.history.push(observed_score);
    if record.history.len() > HISTORY_DAYS {
        let excess = record.history.len() - HISTORY_DAYS;
        record.history.drain(..excess);
    }
    record.last_history_update = Some(today);

    log::info!("Updated history for {}: added {} for {}", record.id, observed_score, today);
    true
}
