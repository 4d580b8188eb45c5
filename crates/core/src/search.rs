//! Search-as-you-type filtering for list screens.
//!
//! A record matches when any of its field values, rendered as a string,
//! contains the query case-insensitively. This is a linear scan over every
//! field of every record; the admin lists are small enough that nothing
//! smarter is warranted.

/// A record whose fields can be matched against a search query.
pub trait Searchable {
    /// String form of every field value, in declaration order.
    ///
    /// Optional fields that are absent contribute nothing.
    fn field_values(&self) -> Vec<String>;
}

/// Whether `record` matches `query`.
///
/// An empty or whitespace-only query matches everything.
#[must_use]
pub fn matches_query<T: Searchable + ?Sized>(record: &T, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    record
        .field_values()
        .iter()
        .any(|value| value.to_lowercase().contains(&needle))
}

/// Keep the records that match `query`, preserving their order.
#[must_use]
pub fn filter_records<'a, T: Searchable>(records: &'a [T], query: &str) -> Vec<&'a T> {
    records
        .iter()
        .filter(|record| matches_query(*record, query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        id: i32,
        name: &'static str,
        note: Option<&'static str>,
    }

    impl Searchable for Row {
        fn field_values(&self) -> Vec<String> {
            let mut values = vec![self.id.to_string(), self.name.to_owned()];
            if let Some(note) = self.note {
                values.push(note.to_owned());
            }
            values
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                id: 1,
                name: "Consola Retro",
                note: None,
            },
            Row {
                id: 2,
                name: "Control inalámbrico",
                note: Some("Compatible con PC"),
            },
            Row {
                id: 12,
                name: "Audífonos",
                note: Some("retroiluminados"),
            },
        ]
    }

    fn ids(found: &[&Row]) -> Vec<i32> {
        found.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_empty_query_returns_everything_in_order() {
        let data = rows();
        assert_eq!(ids(&filter_records(&data, "")), vec![1, 2, 12]);
        assert_eq!(ids(&filter_records(&data, "   ")), vec![1, 2, 12]);
    }

    #[test]
    fn test_matches_any_field_case_insensitively() {
        let data = rows();
        assert_eq!(ids(&filter_records(&data, "RETRO")), vec![1, 12]);
        assert_eq!(ids(&filter_records(&data, "pc")), vec![2]);
    }

    #[test]
    fn test_numeric_fields_match_as_strings() {
        let data = rows();
        assert_eq!(ids(&filter_records(&data, "1")), vec![1, 12]);
    }

    #[test]
    fn test_non_ascii_case_folding() {
        let data = rows();
        assert_eq!(ids(&filter_records(&data, "AUDÍFONOS")), vec![12]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let data = rows();
        assert!(filter_records(&data, "teclado").is_empty());
    }

    #[test]
    fn test_inclusion_agrees_with_matches_query() {
        let data = rows();
        for query in ["", "o", "retro", "2", "zzz", "Compatible"] {
            let kept = filter_records(&data, query);
            for row in &data {
                let included = kept.iter().any(|r| r.id == row.id);
                assert_eq!(included, matches_query(row, query), "query {query:?}");
            }
        }
    }
}
