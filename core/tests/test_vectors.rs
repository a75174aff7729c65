//! Verify request building and option parsing against JSON vectors stored in
//! `test-vectors/`.
//!
//! Request vectors describe a method, a URL and a form, and the exact URL,
//! body and content type the builder must produce. Option vectors feed raw
//! key/value pairs through the string-keyed setter.

use courier_core::builder::build;
use courier_core::{ConfigError, Form, FormValue, HttpMethod, OptionStore, OptionValue, RequestBody};
use serde_json::Value;

fn form_value(value: &Value) -> FormValue<'static> {
    match value {
        Value::String(text) => FormValue::from(text.as_str()),
        Value::Object(object) if object.contains_key("list") => {
            let items = object["list"].as_array().unwrap().iter().map(form_value).collect();
            FormValue::List(items)
        }
        Value::Object(object) if object.contains_key("map") => FormValue::Map(form(&object["map"])),
        other => panic!("unsupported form value: {other}"),
    }
}

fn form(pairs: &Value) -> Form<'static> {
    pairs
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            let pair = pair.as_array().unwrap();
            (pair[0].as_str().unwrap().to_string(), form_value(&pair[1]))
        })
        .collect()
}

fn option_value(value: &Value) -> OptionValue {
    match value {
        Value::Bool(on) => OptionValue::Bool(*on),
        Value::Number(n) => OptionValue::Int(n.as_u64().unwrap()),
        Value::String(text) => OptionValue::Text(text.clone()),
        other => panic!("unsupported option value: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let store = OptionStore::new();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let method: HttpMethod = case["method"].as_str().unwrap().parse().unwrap();
        let expected = &case["expected_request"];

        let req = build(method, case["url"].as_str().unwrap(), form(&case["form"]).into(), &store).unwrap();
        assert_eq!(req.method, method, "{name}: method");
        assert_eq!(req.url.as_str(), expected["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(req.header("Content-Type"), expected["content_type"].as_str(), "{name}: content type");

        match (&req.body, expected["body"].as_str()) {
            (RequestBody::Empty, None) => {}
            (RequestBody::Bytes(body), Some(want)) => {
                assert_eq!(std::str::from_utf8(body).unwrap(), want, "{name}: body")
            }
            (other, want) => panic!("{name}: body {other:?} does not match {want:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[test]
fn option_test_vectors() {
    let raw = include_str!("../../test-vectors/options.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let mut store = OptionStore::new();
        let result = store.set_raw_option(case["key"].as_str().unwrap(), option_value(&case["value"]));

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "UnknownOption" => assert!(matches!(err, ConfigError::UnknownOption(_)), "{name}: {err}"),
                "InvalidValue" => assert!(matches!(err, ConfigError::InvalidValue { .. }), "{name}: {err}"),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            result.unwrap();
            let applied = serde_json::to_value(store.transport()).unwrap();
            for (field, want) in case["expected"].as_object().unwrap() {
                assert_eq!(&applied[field], want, "{name}: {field}");
            }
        }
    }
}
