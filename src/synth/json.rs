// src/synth/json.rs

use std::any::Any;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::errors::{Result, SynthkitError};
use crate::synth::file::{FileOptions, RenderContext, SynthFile};

/// Key under which the marker is stored in JSON documents.
pub const MARKER_KEY: &str = "//";

#[derive(Debug, Clone, PartialEq)]
enum Override {
    Set(Vec<String>, Value),
    Delete(Vec<String>),
}

/// JSON object file with dotted-path overrides.
///
/// Keys are rendered sorted (serde_json's default map), so output is stable.
/// Overrides are applied in the order they were added, after the base object:
///
/// ```ignore
/// file.add_override("compilerOptions.strict", json!(true))?;
/// file.add_override("scripts.a\\.b", json!("x"))?; // key "a.b"
/// file.add_deletion_override("compilerOptions.outDir")?;
/// ```
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
    options: FileOptions,
    obj: Map<String, Value>,
    overrides: Vec<Override>,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>, obj: Value, options: FileOptions) -> Result<Self> {
        let path = path.into();
        let obj = match obj {
            Value::Object(map) => map,
            other => {
                return Err(SynthkitError::ConfigError(format!(
                    "JSON file {:?} must be an object, got {}",
                    path,
                    type_name(&other)
                )));
            }
        };
        Ok(Self {
            path,
            options,
            obj,
            overrides: Vec::new(),
        })
    }

    pub fn add_override(&mut self, path: &str, value: Value) -> Result<()> {
        self.overrides.push(Override::Set(split_path(path)?, value));
        Ok(())
    }

    pub fn add_deletion_override(&mut self, path: &str) -> Result<()> {
        self.overrides.push(Override::Delete(split_path(path)?));
        Ok(())
    }

    /// The base object plus every override, without the marker.
    pub fn resolved(&self) -> Value {
        let mut root = Value::Object(self.obj.clone());
        for ov in &self.overrides {
            match ov {
                Override::Set(keys, value) => set_path(&mut root, keys, value.clone()),
                Override::Delete(keys) => delete_path(&mut root, keys),
            }
        }
        root
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Split `a.b\.c` into `["a", "b.c"]`.
fn split_path(path: &str) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'.') => {
                current.push('.');
                chars.next();
            }
            '.' => keys.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    keys.push(current);

    if keys.iter().any(|k| k.is_empty()) {
        return Err(SynthkitError::ConfigError(format!(
            "invalid override path '{path}'"
        )));
    }
    Ok(keys)
}

/// Set `keys` under `node`, turning anything in the way into an object.
fn set_path(node: &mut Value, keys: &[String], value: Value) {
    let Some((first, rest)) = keys.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(first.clone()).or_insert(Value::Null);
        set_path(child, rest, value);
    }
}

fn delete_path(root: &mut Value, keys: &[String]) {
    let Some((last, parents)) = keys.split_last() else {
        return;
    };
    let mut node = root;
    for key in parents {
        match node.get_mut(key.as_str()) {
            Some(next) => node = next,
            None => return,
        }
    }
    if let Value::Object(map) = node {
        map.remove(last);
    }
}

impl SynthFile for JsonFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn options(&self) -> &FileOptions {
        &self.options
    }

    fn render(&self, ctx: &RenderContext) -> Result<Option<Vec<u8>>> {
        let mut root = self.resolved();
        if self.options.marker {
            if let Value::Object(map) = &mut root {
                map.insert(MARKER_KEY.to_string(), Value::String(ctx.marker.clone()));
            }
        }
        let mut out = serde_json::to_string_pretty(&root)?;
        out.push('\n');
        Ok(Some(out.into_bytes()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn overrides_are_applied_in_order() {
        let mut file = JsonFile::new(
            "tsconfig.json",
            json!({ "compilerOptions": { "outDir": "lib", "strict": false } }),
            FileOptions::default(),
        )
        .unwrap();
        file.add_override("compilerOptions.strict", json!(true)).unwrap();
        file.add_override("scripts.a\\.b", json!("x")).unwrap();
        file.add_deletion_override("compilerOptions.outDir").unwrap();

        assert_eq!(
            file.resolved(),
            json!({ "compilerOptions": { "strict": true }, "scripts": { "a.b": "x" } })
        );
    }

    #[test]
    fn overrides_replace_scalars_in_the_way() {
        let mut file =
            JsonFile::new("a.json", json!({ "server": "localhost", "keep": 1 }), FileOptions::default())
                .unwrap();
        file.add_override("server.port", json!(8080)).unwrap();
        file.add_override("server.tls.enabled", json!(false)).unwrap();

        assert_eq!(
            file.resolved(),
            json!({ "keep": 1, "server": { "port": 8080, "tls": { "enabled": false } } })
        );
    }

    #[test]
    fn render_is_sorted_and_stamped() {
        let file = JsonFile::new("b.json", json!({ "z": 1, "a": 2 }), FileOptions::default()).unwrap();
        let out = String::from_utf8(file.render(&RenderContext::new("demo")).unwrap().unwrap()).unwrap();

        let marker_pos = out.find("\"//\"").unwrap();
        let a_pos = out.find("\"a\"").unwrap();
        let z_pos = out.find("\"z\"").unwrap();
        assert!(marker_pos < a_pos && a_pos < z_pos);
        assert!(out.ends_with("}\n"));
    }

    #[test]
    fn non_object_root_is_rejected() {
        assert!(JsonFile::new("x.json", json!([1, 2]), FileOptions::default()).is_err());
    }

    #[test]
    fn bad_override_paths_are_rejected() {
        let mut file = JsonFile::new("x.json", json!({}), FileOptions::default()).unwrap();
        assert!(file.add_override("a..b", json!(1)).is_err());
        assert!(file.add_override("", json!(1)).is_err());
    }
}
