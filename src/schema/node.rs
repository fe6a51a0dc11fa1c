//! Recursive representation of a JSON Schema for structural traversal.
//!
//! Only the two keys the partitioner walks through are lifted out of the raw
//! map: `properties` (when it is an object) and `items` (when it is an
//! object). Everything else stays in `fields` exactly as received, so
//! converting a value into a [`SchemaNode`] and back never changes its content.

use indexmap::IndexMap;
use serde_json::{Map, Value};

const PROPERTIES: &str = "properties";
const ITEMS: &str = "items";

/// A schema value, split into its structural children and everything else.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// An object-shaped schema.
    Object(ObjectSchema),
    /// Anything that is not a JSON object (boolean schemas, malformed input).
    Other(Value),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    /// Non-structural keywords (`type`, `description`, `required`, ...).
    pub fields: Map<String, Value>,
    /// Child schemas under `properties`, in declaration order.
    pub properties: Option<IndexMap<String, SchemaNode>>,
    /// Element schema under `items` for the single-schema array form.
    pub items: Option<Box<SchemaNode>>,
}

impl SchemaNode {
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return SchemaNode::Other(value.clone());
        };

        let mut object = ObjectSchema::default();
        for (key, child) in map {
            match (key.as_str(), child) {
                (PROPERTIES, Value::Object(props)) => {
                    object.properties = Some(
                        props
                            .iter()
                            .map(|(name, prop)| (name.clone(), SchemaNode::from_value(prop)))
                            .collect(),
                    );
                }
                (ITEMS, Value::Object(_)) => {
                    object.items = Some(Box::new(SchemaNode::from_value(child)));
                }
                _ => {
                    object.fields.insert(key.clone(), child.clone());
                }
            }
        }
        SchemaNode::Object(object)
    }

    pub fn into_value(self) -> Value {
        match self {
            SchemaNode::Other(value) => value,
            SchemaNode::Object(object) => {
                let mut map = object.fields;
                if let Some(props) = object.properties {
                    let props: Map<String, Value> = props
                        .into_iter()
                        .map(|(name, node)| (name, node.into_value()))
                        .collect();
                    map.insert(PROPERTIES.to_string(), Value::Object(props));
                }
                if let Some(items) = object.items {
                    map.insert(ITEMS.to_string(), items.into_value());
                }
                Value::Object(map)
            }
        }
    }
}
