//! Records bundled with the `mapto` binary.
use indexmap::IndexMap;
use serde::Serialize;

crate::record! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct Person {
        #[map_to = "name!"]
        pub name: String,
        #[map_to = "date!"]
        pub date: i64,
        #[map_to = "old"]
        pub old: isize,
        #[map_to = "children"]
        pub children: Vec<Person>,
        #[map_to = "partner"]
        pub partner: Option<Box<Person>>,
        #[map_to = "info"]
        pub info: Info,
    }
}

crate::record! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct Info {
        #[map_to = "version!"]
        pub version: f64,
    }
}

crate::record! {
    /// A package manifest; the build settings sit at the top level of the
    /// source next to the package keys.
    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct Manifest {
        #[map_to = "name!"]
        pub name: String,
        #[map_to = "version"]
        pub version: String,
        #[map_to = "tags"]
        pub tags: Vec<String>,
        #[map_to = "dependencies"]
        pub dependencies: IndexMap<String, String>,
        #[map_to = "<-"]
        pub build: Build,
    }
}

crate::record! {
    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    pub struct Build {
        #[map_to = "edition"]
        pub edition: u16,
        #[map_to = "publish"]
        pub publish: bool,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{compile_independent, Error, Value};

    #[test]
    fn manifest_with_embedded_build() {
        let src = Value::from(json!({
            "name": "mapto",
            "version": "0.1.0",
            "tags": ["conversion", "records"],
            "dependencies": {"regex": "1", "indexmap": "2"},
            "edition": "2024",
            "publish": "false",
        }));
        let manifest: Manifest = compile_independent::<Manifest>().unwrap().generate(&src).unwrap();
        assert_eq!(manifest.build, Build { edition: 2024, publish: false });
        assert_eq!(manifest.tags, ["conversion", "records"]);
        assert_eq!(manifest.dependencies.keys().collect::<Vec<_>>(), ["regex", "indexmap"]);
    }

    #[test]
    fn person_nested_required_path() {
        let src = Value::from(json!({"name": "Ada", "date": 1, "info": {}}));
        let err = compile_independent::<Person>().unwrap().generate::<Person>(&src).unwrap_err();
        assert_eq!(err, Error::required("info.version"));
    }

    #[test]
    fn converted_records_serialize() {
        let src = Value::from(json!({"name": "Amy", "date": "20200101", "info": {"version": "1.5"}}));
        let amy: Person = compile_independent::<Person>().unwrap().generate(&src).unwrap();
        let out = serde_json::to_value(&amy).unwrap();
        assert_eq!(out["date"], json!(20200101));
        assert_eq!(out["info"]["version"], json!(1.5));
        assert_eq!(out["partner"], json!(null));
    }
}
