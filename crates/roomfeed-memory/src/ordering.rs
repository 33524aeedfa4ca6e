//! Ordering of documents for ordered queries.

use crate::rules::parse_timestamp;
use chrono::{DateTime, Utc};
use roomfeed_core::{Direction, Document, OrderBy};
use serde_json::Value;
use std::cmp::Ordering;

/// Compare two field values.
///
/// Values are ranked by type first: missing, null, bools, numbers,
/// timestamps, other strings, arrays, objects. Within a rank, bools and
/// numbers compare by value, timestamps chronologically and strings
/// lexically; arrays and objects compare equal, so the stable sort keeps
/// them in insertion order.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_present(a, b),
    }
}

#[derive(Debug)]
enum Rank<'a> {
    Null,
    Bool(bool),
    Number(f64),
    Timestamp(DateTime<Utc>),
    Text(&'a str),
    Array,
    Object,
}

impl<'a> Rank<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            Value::Null => Rank::Null,
            Value::Bool(b) => Rank::Bool(*b),
            Value::Number(n) => Rank::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => match parse_timestamp(value) {
                Some(ts) => Rank::Timestamp(ts),
                None => Rank::Text(s),
            },
            Value::Array(_) => Rank::Array,
            Value::Object(_) => Rank::Object,
        }
    }

    fn position(&self) -> u8 {
        match self {
            Rank::Null => 0,
            Rank::Bool(_) => 1,
            Rank::Number(_) => 2,
            Rank::Timestamp(_) => 3,
            Rank::Text(_) => 4,
            Rank::Array => 5,
            Rank::Object => 6,
        }
    }
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    let (a, b) = (Rank::of(a), Rank::of(b));
    match (&a, &b) {
        (Rank::Bool(x), Rank::Bool(y)) => x.cmp(y),
        (Rank::Number(x), Rank::Number(y)) => x.total_cmp(y),
        (Rank::Timestamp(x), Rank::Timestamp(y)) => x.cmp(y),
        (Rank::Text(x), Rank::Text(y)) => x.cmp(y),
        _ => a.position().cmp(&b.position()),
    }
}

/// Stable sort of documents by an order clause.
pub fn sort_documents(docs: &mut [Document], order: &OrderBy) {
    docs.sort_by(|a, b| {
        let ord = compare_values(a.get(&order.field), b.get(&order.field));
        match order.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, created_at: &str) -> Document {
        Document::new(id).with_field("createdAt", created_at)
    }

    #[test]
    fn test_timestamps_sort_chronologically() {
        // Lexical order would put the +09:00 value last
        let mut docs = vec![
            doc("late", "2020-05-07T10:00:00Z"),
            doc("early", "2020-05-07T16:00:00+09:00"),
            doc("middle", "2020-05-07T08:00:00Z"),
        ];
        let order = OrderBy {
            field: "createdAt".into(),
            direction: Direction::Ascending,
        };
        sort_documents(&mut docs, &order);
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_descending_and_missing() {
        let mut docs = vec![
            doc("a", "2020-01-01T00:00:00Z"),
            Document::new("none"),
            doc("b", "2021-01-01T00:00:00Z"),
        ];
        let order = OrderBy {
            field: "createdAt".into(),
            direction: Direction::Descending,
        };
        sort_documents(&mut docs, &order);
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "none"]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            compare_values(Some(&Value::from(2)), Some(&Value::from(10))),
            Ordering::Less
        );
    }

    #[test]
    fn test_mixed_types_rank_before_value() {
        let values = [
            Some(Value::from("beta")),
            Some(Value::from(3)),
            Some(Value::from("2020-05-07T07:43:40Z")),
            Some(Value::from(true)),
            Some(Value::from(1.5)),
            None,
            Some(Value::from("alpha")),
            Some(Value::Null),
        ];
        let mut docs: Vec<Document> = values
            .iter()
            .enumerate()
            .map(|(i, value)| match value {
                Some(value) => Document::new(i.to_string()).with_field("createdAt", value.clone()),
                None => Document::new(i.to_string()),
            })
            .collect();
        let order = OrderBy {
            field: "createdAt".into(),
            direction: Direction::Ascending,
        };
        sort_documents(&mut docs, &order);
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["5", "7", "3", "4", "1", "2", "6", "0"]);
    }

    #[test]
    fn test_mixed_snapshot_is_fully_sorted() {
        let mut docs: Vec<Document> = (0..200u64)
            .map(|i| {
                let value = match i % 3 {
                    0 => Value::from((i * 37) % 101),
                    1 => Value::from(format!("room-{:03}", (i * 53) % 211)),
                    _ => Value::from(format!("2020-05-{:02}T07:43:40Z", 1 + (i * 7) % 28)),
                };
                Document::new(i.to_string()).with_field("createdAt", value)
            })
            .collect();
        let order = OrderBy {
            field: "createdAt".into(),
            direction: Direction::Ascending,
        };
        sort_documents(&mut docs, &order);

        for pair in docs.windows(2) {
            let ord = compare_values(pair[0].get("createdAt"), pair[1].get("createdAt"));
            assert_ne!(ord, Ordering::Greater, "{:?} before {:?}", pair[0], pair[1]);
        }
        let numbers: Vec<f64> = docs
            .iter()
            .filter_map(|d| d.get("createdAt").and_then(Value::as_f64))
            .collect();
        assert!(numbers.windows(2).all(|w| w[0] <= w[1]));
    }
}
