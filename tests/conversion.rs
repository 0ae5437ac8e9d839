use std::sync::Arc;

use indexmap::IndexMap;
use mapto::demo::{Info, Person};
use mapto::{Error, Key, Value};
use serde_json::json;

mapto::record! {
    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        #[map_to = "name"]
        name: String,
        #[map_to = "date"]
        date: i64,
        #[map_to = "old"]
        old: isize,
    }
}

mapto::record! {
    #[derive(Debug, Default, PartialEq)]
    struct Pair {
        #[map_to = "0!"]
        left: String,
        #[map_to = "1"]
        right: u16,
    }
}

mapto::record! {
    #[derive(Debug, Default, PartialEq)]
    struct Narrow {
        #[map_to = "small"]
        small: i8,
        #[map_to = "values"]
        values: Vec<u8>,
    }
}

#[test]
fn john_round_trip() {
    let src = Value::from(json!({"name": "John", "date": "19950216", "old": 26}));
    let sample: Sample = mapto::compile::<Sample>().unwrap().generate(&src).unwrap();
    assert_eq!(sample, Sample { name: "John".into(), date: 19950216, old: 26 });
}

#[test]
fn required_field_in_every_source_shape() {
    let person = mapto::compile::<Person>().unwrap();
    let info = Value::str_map([("version", 1.5f64)]);

    let generic = Value::map([
        (Key::from("name"), Value::from("Ada")),
        (Key::from("date"), Value::I64(1)),
        (Key::from("info"), info.clone()),
    ]);
    let string_keyed = Value::str_map([
        ("name", Value::from("Ada")),
        ("date", Value::I64(1)),
        ("info", info),
    ]);

    let a: Person = person.generate(&generic).unwrap();
    let b: Person = person.generate(&string_keyed).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.info, Info { version: 1.5 });

    let pair = mapto::compile::<Pair>().unwrap();
    let by_isize: IndexMap<isize, Value> = [(0, Value::from("l")), (1, Value::from("9"))].into_iter().collect();
    let by_key = Value::map([(Key::Int(0), Value::from("l")), (Key::Int(1), Value::U16(9))]);
    let by_str = Value::str_map([("0", Value::from("l")), ("1", Value::I64(9))]);
    let expected = Pair { left: "l".into(), right: 9 };
    assert_eq!(pair.generate::<Pair>(&Value::IntMap(by_isize)).unwrap(), expected);
    assert_eq!(pair.generate::<Pair>(&by_key).unwrap(), expected);
    assert_eq!(pair.generate::<Pair>(&by_str).unwrap(), expected);
}

#[test]
fn nested_required_field_reports_dotted_path() {
    let src = Value::from(json!({"name": "Amy", "date": 2, "info": {"note": "none"}}));
    let mut amy = Person::default();
    let err = mapto::direct_convert(&src, &mut amy).unwrap_err();
    assert_eq!(err, Error::RequiredFieldMissing { path: "info.version".into() });
}

#[test]
fn missing_optional_field_keeps_destination() {
    let mut amy = Person { old: 41, ..Person::default() };
    let src = Value::from(json!({"name": "Amy", "date": 2, "info": {"version": 3}}));
    mapto::direct_convert(&src, &mut amy).unwrap();
    assert_eq!(amy.old, 41);
    assert_eq!(amy.info.version, 3.0);
}

#[test]
fn family_tree() {
    let src = Value::from(json!({
        "name": "John",
        "date": 19950216,
        "info": {"version": 1},
        "partner": {"name": "Ada", "date": "0x10", "info": {"version": "2"}},
        "children": [
            {"name": "Amy", "date": "0b11", "old": "7", "info": {"version": 1}},
            {"name": "Bo", "date": 0, "info": {"version": 1}, "children": []},
        ],
    }));
    let john: Person = mapto::compile_independent::<Person>().unwrap().generate(&src).unwrap();
    assert_eq!(john.partner.as_deref().map(|p| (p.name.as_str(), p.date)), Some(("Ada", 16)));
    assert_eq!(john.children.len(), 2);
    assert_eq!((john.children[0].date, john.children[0].old), (3, 7));
    assert!(john.children[1].children.is_empty());
}

#[test]
fn element_errors_carry_their_path() {
    let src = Value::from(json!({
        "name": "John",
        "date": 1,
        "info": {"version": 1},
        "children": [{"name": "Amy", "date": "soon", "info": {"version": 1}}],
    }));
    let err = mapto::compile::<Person>().unwrap().generate::<Person>(&src).unwrap_err();
    assert_eq!(err.path(), Some("children[0].date"));
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn integer_narrowing_truncates() {
    let src = Value::from(json!({"small": 300, "values": []}));
    let narrow: Narrow = mapto::compile::<Narrow>().unwrap().generate(&src).unwrap();
    assert_eq!(narrow, Narrow { small: 44, values: vec![] });
}

#[test]
fn shared_and_independent_compiles() {
    let a = mapto::compile_force::<Sample>();
    let b = mapto::compile_force::<Sample>();
    assert!(Arc::ptr_eq(&a, &b));

    let c = mapto::compile_independent_force::<Sample>();
    assert!(!Arc::ptr_eq(&a, &c));
    let src = Value::str_map([("name", "Eve")]);
    assert_eq!(c.generate::<Sample>(&src).unwrap(), a.generate::<Sample>(&src).unwrap());
    assert!(mapto::Registry::shared().contains(std::any::type_name::<Sample>()));
}

#[test]
#[should_panic(expected = "cannot compile")]
fn forced_compile_of_a_non_record_panics() {
    mapto::compile_independent_force::<Vec<String>>();
}
