use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub fn first_page() -> i64 {
    1
}

// anything that is not a positive integer falls back to the first page
pub fn deserialize_page<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or_else(first_page))
}

/// Quiz clients send the whole category object (`{"id": .., "type": ..}`), an empty
/// string, or nothing at all. Returns the category id, 0 meaning every category.
pub fn deserialize_quiz_category<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::String(s)) if s.is_empty() => return Ok(0),
        Some(Value::Object(mut fields)) => fields.remove("id"),
        Some(id @ Value::Number(_)) => Some(id),
        Some(_) => {
            return Err(de::Error::invalid_type(
                Unexpected::Other("non-object category"),
                &"a category object",
            ))
        }
    };
    match id {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| de::Error::custom(format!("Category id {n} is not an integer"))),
        Some(Value::String(s)) if s.is_empty() => Ok(0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("Wrong value {s}, can not parse to i64"))),
        Some(_) => Err(de::Error::custom("Category id should be a number")),
    }
}

#[cfg(test)]
mod tests {
    use axum::extract::Query;
    use axum::http::Uri;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Deserialize, Debug)]
    struct Paged {
        #[serde(default = "first_page", deserialize_with = "deserialize_page")]
        page: i64,
    }

    #[derive(Deserialize, Debug)]
    struct Quiz {
        #[serde(default, deserialize_with = "deserialize_quiz_category")]
        quiz_category: i64,
    }

    fn quiz(body: serde_json::Value) -> Result<i64, serde_json::Error> {
        serde_json::from_value::<Quiz>(body).map(|q| q.quiz_category)
    }

    fn page(query: &str) -> i64 {
        let uri: Uri = format!("/questions?{query}").parse().unwrap();
        Query::<Paged>::try_from_uri(&uri).unwrap().0.page
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(page(""), 1);
        assert_eq!(page("page=3"), 3);
        assert_eq!(page("page=abc"), 1);
        assert_eq!(page("page=0"), 1);
        assert_eq!(page("page=-2"), 1);
    }

    #[test]
    fn quiz_category_shapes() {
        assert_eq!(quiz(json!({})).unwrap(), 0);
        assert_eq!(quiz(json!({"quiz_category": null})).unwrap(), 0);
        assert_eq!(quiz(json!({"quiz_category": ""})).unwrap(), 0);
        assert_eq!(quiz(json!({"quiz_category": {"type": "click", "id": 0}})).unwrap(), 0);
        assert_eq!(quiz(json!({"quiz_category": {"type": "Art", "id": 2}})).unwrap(), 2);
        assert_eq!(quiz(json!({"quiz_category": {"type": "Art", "id": "5"}})).unwrap(), 5);
        assert_eq!(quiz(json!({"quiz_category": {"type": "Art"}})).unwrap(), 0);
        assert_eq!(quiz(json!({"quiz_category": 4})).unwrap(), 4);
    }

    #[test]
    fn quiz_category_rejects_garbage() {
        assert!(quiz(json!({"quiz_category": {"id": "art"}})).is_err());
        assert!(quiz(json!({"quiz_category": [1, 2]})).is_err());
        assert!(quiz(json!({"quiz_category": {"id": 1.5}})).is_err());
    }
}
