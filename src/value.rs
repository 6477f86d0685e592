//! Conversions into template [`Value`]s. Templates print strings verbatim, so
//! every string is HTML-escaped on the way in; markup that must reach the page
//! as-is (rendered post bodies, the inner page inside the layout) is inserted
//! afterwards with [`insert_raw`].

use gtmpl_value::Value;
use serde::Serialize;
use serde_json::Value as Json;

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serializes `item` into a template value, escaping every string.
pub fn to_value<T: Serialize + ?Sized>(item: &T) -> serde_json::Result<Value> {
    Ok(from_json(serde_json::to_value(item)?))
}

fn from_json(json: Json) -> Value {
    match json {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match (n.as_u64(), n.as_i64(), n.as_f64()) {
            (Some(u), _, _) => Value::from(u),
            (None, Some(i), _) => Value::from(i),
            (None, None, Some(f)) => Value::from(f),
            (None, None, None) => Value::Nil,
        },
        Json::String(s) => Value::String(escape_html(&s)),
        Json::Array(items) => Value::Array(items.into_iter().map(from_json).collect()),
        Json::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key, from_json(value)))
                .collect(),
        ),
    }
}

/// Adds `key` to an object value with unescaped `html`. Non-object values
/// are left untouched.
pub fn insert_raw(value: &mut Value, key: &str, html: String) {
    insert(value, key, Value::String(html))
}

/// Adds `key` to an object value. Non-object values are left untouched.
pub fn insert(value: &mut Value, key: &str, item: Value) {
    if let Value::Object(fields) = value {
        fields.insert(key.to_owned(), item);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Card<'a> {
        title: &'a str,
        read_time: u32,
        tags: Vec<&'a str>,
        image: Option<&'a str>,
    }

    fn field<'v>(value: &'v Value, key: &str) -> &'v Value {
        match value {
            Value::Object(fields) => &fields[key],
            _ => panic!("not an object: {:?}", value),
        }
    }

    fn string(value: &Value) -> &str {
        match value {
            Value::String(s) => s,
            _ => panic!("not a string: {:?}", value),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            "&lt;b&gt;Tom &amp; Jerry&#39;s &quot;show&quot;&lt;/b&gt;",
            escape_html(r#"<b>Tom & Jerry's "show"</b>"#)
        );
        assert_eq!("前端开发", escape_html("前端开发"));
    }

    #[test]
    fn test_to_value_escapes_strings() -> serde_json::Result<()> {
        let value = to_value(&Card {
            title: "<script>",
            read_time: 7,
            tags: vec!["C&C"],
            image: None,
        })?;
        assert_eq!("&lt;script&gt;", string(field(&value, "title")));
        assert!(matches!(field(&value, "readTime"), Value::Number(_)));
        match field(&value, "tags") {
            Value::Array(tags) => assert_eq!("C&amp;C", string(&tags[0])),
            other => panic!("not an array: {:?}", other),
        }
        assert!(matches!(field(&value, "image"), Value::Nil));
        Ok(())
    }

    #[test]
    fn test_insert_raw() {
        let mut value = Value::Object(HashMap::new());
        insert_raw(&mut value, "html", "<p>hi</p>".to_owned());
        assert_eq!("<p>hi</p>", string(field(&value, "html")));

        let mut not_object = Value::Nil;
        insert_raw(&mut not_object, "html", String::new());
        assert!(matches!(not_object, Value::Nil));
    }
}
