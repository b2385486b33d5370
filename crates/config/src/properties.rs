//! Property handling: `${key}` placeholder resolution and flattening of
//! property maps into `key -> value` strings

use serde_yaml::Value;
use types::Properties;

const OPEN: &str = "${";
const CLOSE: char = '}';
const ESCAPED_OPEN: &str = "\\${";

/// Result of resolving one string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Text with every known placeholder substituted
    pub text: String,
    /// Keys that had neither a value nor a default
    pub unresolved: Vec<String>,
}

/// Substitutes `${key}` and `${key:default}` placeholders from a property map
///
/// Unknown keys without a default are left in place. `\${` escapes a literal
/// `${`.
#[derive(Debug, Clone, Copy)]
pub struct PropertyResolver<'a> {
    variables: &'a Properties,
}

impl<'a> PropertyResolver<'a> {
    pub fn new(variables: &'a Properties) -> Self {
        Self { variables }
    }

    /// Resolve the placeholders in a single string
    pub fn resolve(&self, text: &str) -> Resolved {
        let mut out = String::with_capacity(text.len());
        let mut unresolved = Vec::new();
        let mut rest = text;

        loop {
            let escaped = rest.find(ESCAPED_OPEN);
            let open = rest.find(OPEN);

            match (escaped, open) {
                (Some(esc), Some(pos)) if esc + 1 == pos => {
                    out.push_str(&rest[..esc]);
                    out.push_str(OPEN);
                    rest = &rest[pos + OPEN.len()..];
                }
                (_, Some(pos)) => {
                    out.push_str(&rest[..pos]);
                    let after = &rest[pos + OPEN.len()..];

                    let Some(end) = after.find(CLOSE) else {
                        out.push_str(&rest[pos..]);
                        break;
                    };

                    let expression = &after[..end];
                    match self.lookup(expression) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push_str(&rest[pos..pos + OPEN.len() + end + 1]);
                            unresolved.push(expression.to_string());
                        }
                    }
                    rest = &after[end + 1..];
                }
                (_, None) => {
                    out.push_str(rest);
                    break;
                }
            }
        }

        Resolved {
            text: out,
            unresolved,
        }
    }

    /// Resolve every string inside a YAML tree in place, returning the
    /// placeholders that could not be resolved
    pub fn resolve_tree(&self, value: &mut Value) -> Vec<String> {
        let mut unresolved = Vec::new();
        self.resolve_value(value, &mut unresolved);
        unresolved
    }

    fn resolve_value(&self, value: &mut Value, unresolved: &mut Vec<String>) {
        match value {
            Value::String(text) => {
                if !text.contains(OPEN) {
                    return;
                }
                let resolved = self.resolve(text);
                unresolved.extend(resolved.unresolved);
                *text = resolved.text;
            }
            Value::Sequence(items) => {
                for item in items {
                    self.resolve_value(item, unresolved);
                }
            }
            Value::Mapping(mapping) => {
                for (_, item) in mapping.iter_mut() {
                    self.resolve_value(item, unresolved);
                }
            }
            Value::Tagged(tagged) => self.resolve_value(&mut tagged.value, unresolved),
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }

    fn lookup<'s>(&'s self, expression: &'s str) -> Option<&'s str> {
        if let Some(value) = self.variables.get(expression) {
            return Some(value.as_str());
        }
        let (key, default) = expression.split_once(':')?;
        Some(self.variables.get(key).map_or(default, String::as_str))
    }
}

/// Flatten a YAML mapping into dotted `key -> value` strings
///
/// Nested mappings produce `outer.inner` keys. Sequences are rejected.
pub fn flatten_properties(value: Value) -> Result<Properties, String> {
    let mut properties = Properties::new();
    match value {
        Value::Null => {}
        Value::Mapping(_) => flatten_into(&mut properties, "", value)?,
        _ => return Err("properties must be a mapping".to_string()),
    }
    Ok(properties)
}

fn flatten_into(properties: &mut Properties, prefix: &str, value: Value) -> Result<(), String> {
    match value {
        Value::Mapping(mapping) => {
            for (key, item) in mapping {
                let key = scalar_to_string(key)
                    .ok_or_else(|| format!("property keys under '{}' must be scalars", prefix))?;
                let full_key = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(properties, &full_key, item)?;
            }
            Ok(())
        }
        Value::Tagged(tagged) => flatten_into(properties, prefix, tagged.value),
        other => {
            let text = scalar_to_string(other)
                .ok_or_else(|| format!("property '{}' must be a scalar value", prefix))?;
            properties.insert(prefix.to_string(), text);
            Ok(())
        }
    }
}

/// String form of a YAML scalar; `None` for sequences and mappings
pub fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(tagged) => scalar_to_string(tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        let variables = vars(&[("driver", "test-driver"), ("host", "db")]);
        let resolver = PropertyResolver::new(&variables);

        let resolved = resolver.resolve("jdbc://${host}/${schema}");
        assert_eq!(resolved.text, "jdbc://db/${schema}");
        assert_eq!(resolved.unresolved, vec!["schema".to_string()]);

        let resolved = resolver.resolve("${driver}");
        assert_eq!(resolved.text, "test-driver");
        assert!(resolved.unresolved.is_empty());
    }

    #[test]
    fn test_resolve_defaults() {
        let variables = vars(&[("port", "5432")]);
        let resolver = PropertyResolver::new(&variables);

        assert_eq!(resolver.resolve("${port:1}").text, "5432");
        assert_eq!(resolver.resolve("${host:localhost}").text, "localhost");
        assert_eq!(resolver.resolve("${url:jdbc:h2:mem:a}").text, "jdbc:h2:mem:a");
        assert_eq!(resolver.resolve("${password:}").text, "");
    }

    #[test]
    fn test_escaped_and_unterminated() {
        let variables = vars(&[("a", "x")]);
        let resolver = PropertyResolver::new(&variables);

        let resolved = resolver.resolve("\\${a} and ${a}");
        assert_eq!(resolved.text, "${a} and x");
        assert!(resolved.unresolved.is_empty());

        let resolved = resolver.resolve("prefix ${a");
        assert_eq!(resolved.text, "prefix ${a");
    }

    #[test]
    fn test_resolve_tree_keeps_strings() {
        let variables = vars(&[("size", "20"), ("flag", "true"), ("pin", "007")]);
        let resolver = PropertyResolver::new(&variables);

        let mut tree: Value = serde_yaml::from_str(
            r#"
pool: ${size}
enabled: ${flag}
password: ${pin}
label: "pool-${size}"
items: ["${missing}"]
"#,
        )
        .unwrap();

        let unresolved = resolver.resolve_tree(&mut tree);
        assert_eq!(unresolved, vec!["missing".to_string()]);
        assert_eq!(tree["pool"], Value::String("20".to_string()));
        assert_eq!(tree["enabled"], Value::String("true".to_string()));
        assert_eq!(tree["password"], Value::String("007".to_string()));
        assert_eq!(tree["label"], Value::String("pool-20".to_string()));
        assert_eq!(tree["items"][0], Value::String("${missing}".to_string()));
    }

    #[test]
    fn test_flatten_properties() {
        let value: Value = serde_yaml::from_str(
            r#"
driver: org.h2.Driver
pool:
  size: 10
  enabled: true
empty:
"#,
        )
        .unwrap();

        let properties = flatten_properties(value).unwrap();
        assert_eq!(properties["driver"], "org.h2.Driver");
        assert_eq!(properties["pool.size"], "10");
        assert_eq!(properties["pool.enabled"], "true");
        assert_eq!(properties["empty"], "");

        let sequence: Value = serde_yaml::from_str("items: [1, 2]").unwrap();
        assert!(flatten_properties(sequence).is_err());
        assert!(flatten_properties(Value::from("scalar")).is_err());
    }
}
