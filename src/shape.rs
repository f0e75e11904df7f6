use serde_json::Value;

/// Pure extraction rule: returns the item list if the value has this shape.
///
/// The same listing can arrive as a bare array, under `data`, or nested one
/// level deeper. A rule table is an ordered slice of matchers tried until one
/// yields a list. Keyed matchers treat an empty array as absent so the next
/// key gets its turn.
pub type ShapeMatcher = fn(&Value) -> Option<&Vec<Value>>;

/// Try each matcher in order and return the first list found
pub fn match_list<'a>(value: &'a Value, rules: &[ShapeMatcher]) -> Option<&'a Vec<Value>> {
    rules.iter().find_map(|rule| rule(value))
}

pub fn bare_list(value: &Value) -> Option<&Vec<Value>> {
    value.as_array()
}

pub fn data_list(value: &Value) -> Option<&Vec<Value>> {
    value.get("data")?.as_array()
}

pub fn data_batches(value: &Value) -> Option<&Vec<Value>> {
    nested_list(value, "batches")
}

pub fn data_result(value: &Value) -> Option<&Vec<Value>> {
    nested_list(value, "result")
}

pub fn data_payload(value: &Value) -> Option<&Vec<Value>> {
    nested_list(value, "payload")
}

pub fn data_subjects(value: &Value) -> Option<&Vec<Value>> {
    nested_list(value, "subjects")
}

pub fn subjects_list(value: &Value) -> Option<&Vec<Value>> {
    keyed_list(value, "subjects")
}

pub fn result_list(value: &Value) -> Option<&Vec<Value>> {
    keyed_list(value, "result")
}

pub fn topics_list(value: &Value) -> Option<&Vec<Value>> {
    keyed_list(value, "topics")
}

pub fn contents_list(value: &Value) -> Option<&Vec<Value>> {
    keyed_list(value, "contents")
}

fn keyed_list<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    value
        .get(key)?
        .as_array()
        .filter(|items| !items.is_empty())
}

fn nested_list<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    keyed_list(value.get("data")?, key)
}

/// Layouts of the batch listing, highest priority first
pub const BATCH_SHAPES: &[ShapeMatcher] =
    &[bare_list, data_list, data_batches, data_result, data_payload];

/// Layouts of the batch details response carrying subjects
pub const SUBJECT_SHAPES: &[ShapeMatcher] = &[bare_list, data_subjects, subjects_list];

/// Layouts of one page of the topics listing
pub const TOPIC_SHAPES: &[ShapeMatcher] =
    &[bare_list, data_list, result_list, topics_list, contents_list];

/// First non-empty value among `keys`, rendered as a string.
///
/// Numbers are accepted too, since some ids come back numeric.
pub fn first_string(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match item.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First value among `keys` that reads as a positive integer.
///
/// Accepts JSON numbers as well as numeric strings. Zero is skipped like a
/// missing key.
pub fn first_count(item: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| {
        let count = match item.get(*key)? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }?;
        (count > 0).then_some(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_shapes_extract_identical_lists() {
        let items = json!([{"_id": "b1", "name": "Batch A"}, {"_id": "b2", "name": "Batch B"}]);
        let shapes = [
            items.clone(),
            json!({ "data": items.clone() }),
            json!({ "data": { "batches": items.clone() } }),
            json!({ "data": { "result": items.clone() } }),
            json!({ "data": { "payload": items.clone() } }),
        ];

        for shape in &shapes {
            let list = match_list(shape, BATCH_SHAPES).unwrap();
            assert_eq!(list, items.as_array().unwrap(), "shape {shape}");
        }
    }

    #[test]
    fn unknown_shape_matches_nothing() {
        let value = json!({"items": [1, 2, 3]});
        assert!(match_list(&value, BATCH_SHAPES).is_none());
        assert!(match_list(&json!("text"), TOPIC_SHAPES).is_none());
    }

    #[test]
    fn rule_order_decides_between_shapes() {
        let value = json!({"result": [1], "topics": [2]});
        assert_eq!(match_list(&value, TOPIC_SHAPES).unwrap(), &vec![json!(1)]);
    }

    #[test]
    fn empty_keyed_list_falls_through_to_next_key() {
        let batches = json!({"data": {"batches": [], "result": [{"_id": "b1"}]}});
        assert_eq!(
            match_list(&batches, BATCH_SHAPES).unwrap(),
            &vec![json!({"_id": "b1"})]
        );

        let topics = json!({"topics": [], "contents": [{"topic": "Notes"}]});
        assert_eq!(match_list(&topics, TOPIC_SHAPES).unwrap().len(), 1);

        let subjects = json!({"data": {"subjects": []}, "subjects": [{"subjectId": "s1"}]});
        assert_eq!(match_list(&subjects, SUBJECT_SHAPES).unwrap().len(), 1);
    }

    #[test]
    fn empty_data_list_still_matches() {
        let page = json!({"data": [], "topics": [{"topic": "ignored"}]});
        assert!(match_list(&page, TOPIC_SHAPES).unwrap().is_empty());
        assert!(match_list(&json!({"topics": []}), TOPIC_SHAPES).is_none());
    }

    #[test]
    fn subject_shapes_cover_nested_and_top_level() {
        let nested = json!({"data": {"subjects": [{"subjectId": "s1"}]}});
        let top = json!({"subjects": [{"subjectId": "s1"}]});

        assert_eq!(match_list(&nested, SUBJECT_SHAPES).unwrap().len(), 1);
        assert_eq!(match_list(&top, SUBJECT_SHAPES).unwrap().len(), 1);
    }

    #[test]
    fn first_string_skips_empty_and_missing() {
        let item = json!({"topic": "", "title": "Chapter 1", "name": "ignored"});
        assert_eq!(
            first_string(&item, &["topic", "title", "name"]),
            Some("Chapter 1".to_string())
        );
        assert_eq!(first_string(&item, &["missing"]), None);
        assert_eq!(first_string(&json!({"id": 42}), &["id"]), Some("42".to_string()));
    }

    #[test]
    fn first_count_reads_numbers_and_numeric_strings() {
        assert_eq!(first_count(&json!({"tagCount": 45}), &["tagCount"]), Some(45));
        assert_eq!(first_count(&json!({"count": "22"}), &["tagCount", "count"]), Some(22));
        assert_eq!(first_count(&json!({"tagCount": null}), &["tagCount"]), None);
        assert_eq!(first_count(&json!({"tagCount": "many"}), &["tagCount"]), None);
    }

    #[test]
    fn first_count_skips_zero() {
        let item = json!({"tagCount": 0, "count": 45});
        assert_eq!(first_count(&item, &["tagCount", "count"]), Some(45));
        assert_eq!(first_count(&json!({"tagCount": "0"}), &["tagCount"]), None);
    }
}
