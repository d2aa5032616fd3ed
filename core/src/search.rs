//! Client-side name filter for an already fetched client list.

use crate::types::ClientRecord;

/// Records whose `"first last"` name contains `term`, ignoring case. An empty
/// term matches everything. Order is preserved.
pub fn filter_by_name(records: &[ClientRecord], term: &str) -> Vec<ClientRecord> {
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|c| needle.is_empty() || c.full_name().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::types::Gender;

    fn record(id: &str, first: &str, last: &str) -> ClientRecord {
        ClientRecord {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            dob: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            gender: Gender::Other,
            email: String::new(),
            phone_number: String::new(),
            programs: Vec::new(),
        }
    }

    fn sample() -> Vec<ClientRecord> {
        vec![record("C1", "Jane", "Doe"), record("C2", "John", "Smith")]
    }

    #[test]
    fn substring_match() {
        let hits = filter_by_name(&sample(), "jan");
        assert_eq!(hits, vec![record("C1", "Jane", "Doe")]);
    }

    #[test]
    fn empty_term_returns_all() {
        assert_eq!(filter_by_name(&sample(), ""), sample());
    }

    #[test]
    fn case_insensitive() {
        assert_eq!(filter_by_name(&sample(), "JANE").len(), 1);
        assert_eq!(filter_by_name(&sample(), "jOhN sMi").len(), 1);
    }

    #[test]
    fn spans_first_and_last_name() {
        assert_eq!(filter_by_name(&sample(), "e d")[0].id, "C1");
        assert!(filter_by_name(&sample(), "doe smith").is_empty());
    }
}
