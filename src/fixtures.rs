#[cfg(test)]
pub mod test {
    use crate::value::{ConfigValue, Object};

    /// A small document covering nesting, arrays and comments.
    pub const SAMPLE: &str = r#"# demo service
app {
    name = "demo"
    workers = 4
    // toggles
    debug = false
}

features = ["search", "export"]
limits.rate = 2.5
"#;

    /// Build an object tree from JSON, for concise expectations.
    pub fn object(json: &str) -> Object {
        match serde_json::from_str::<ConfigValue>(json).unwrap() {
            ConfigValue::Object(map) => map,
            other => panic!("fixture is not an object: {other:?}"),
        }
    }

    #[test]
    fn object_keeps_key_order() {
        let map = object(r#"{"b": 1, "a": 2}"#);
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a"]);
    }
}
