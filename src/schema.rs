//! Translation of a model version's declared input schema into
//! selectable properties, and of selections into request input.

use log::{debug, trace, warn};
use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};
use crate::request::VersionDescriptor;
use crate::{InputSchemaEntry, PropertySelection, ValueKind};

/// Candidate locations of the input properties object, tried in order
const PROPERTY_POINTERS: [&str; 3] =
  [ "/openapi_schema/components/schemas/Input/properties"
  , "/components/schemas/Input/properties"
  , "/properties"
  ];

/// Coerce a declared schema type into one of the accepted value kinds.
/// Total: every declared type maps to exactly one kind.
pub fn coerce(declared: &str) -> ValueKind
{   match declared
    {   "integer" | "number" => ValueKind::Number
      , "boolean" => ValueKind::Boolean
      , _ => ValueKind::String
    }
}

/// List the input properties of a version schema, in document order.
///
/// Accepts the full version document, its `openapi_schema`, or the
/// `Input` component itself.
pub fn list_properties(schema: &Value)
  -> Result<Vec<InputSchemaEntry>>
{   let properties = PROPERTY_POINTERS.iter()
      .find_map(|p| schema.pointer(p))
      .and_then(Value::as_object)
      .ok_or_else(|| {
        warn!("Schema has no input properties object");
        Error::ParseError(
          "schema does not declare input properties".to_string()
        )
      })?;

    let entries: Vec<InputSchemaEntry> = properties.iter()
      .map(|(key, def)| entry_from_definition(key, def))
      .collect();

    debug!("Schema declares {} input properties", entries.len());
    Ok(entries)
}

fn entry_from_definition(key: &str, def: &Value) -> InputSchemaEntry
{   let text = |field: &str| def.get(field)
      .and_then(Value::as_str)
      .map(str::to_string);

    let entry = InputSchemaEntry
    {   key: key.to_string()
      , title: text("title").unwrap_or_else(|| key.to_string())
      , description: text("description").unwrap_or_default()
      , declared_type: text("type").unwrap_or_default()
      , default: def.get("default").cloned()
      , order: def.get("x-order").and_then(Value::as_i64)
    };
    trace!("Property {} declared as {:?}", entry.key, entry.declared_type);
    entry
}

/// Value held by the slot matching the selection's kind, or that kind's
/// zero value when the slot was never filled.
pub fn resolve_value(selection: &PropertySelection) -> Value
{   match selection.kind
    {   ValueKind::Boolean => {
          Value::Bool(selection.boolean_value.unwrap_or(false))
        }
      , ValueKind::Number => {
          number_value(selection.number_value.unwrap_or(0.0))
        }
      , ValueKind::String => {
          Value::String(
            selection.string_value.clone().unwrap_or_default()
          )
        }
    }
}

fn number_value(n: f64) -> Value
{   if n.is_finite()
      && n.fract() == 0.0
      && n >= i64::MIN as f64
      && n < i64::MAX as f64
    {   return Value::from(n as i64);
    }
    Number::from_f64(n)
      .map(Value::Number)
      .unwrap_or_else(|| Value::from(0))
}

/// Assemble the flat input object sent with a prediction
pub fn build_input(selections: &[PropertySelection])
  -> Map<String, Value>
{   let mut input = Map::new();
    for selection in selections
    {   if input.contains_key(&selection.key)
        {   debug!("Input key {} given twice, keeping last", selection.key);
        }
        input.insert(selection.key.clone(), resolve_value(selection));
    }
    input
}

/// Newest first (ties keep their input order), keeping only ids that
/// contain `filter`. An empty filter keeps everything.
pub fn sort_and_filter_versions(
  mut versions: Vec<VersionDescriptor>
, filter: &str
) -> Vec<VersionDescriptor>
{   versions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    versions.retain(|v| v.id.contains(filter));
    versions
}

#[cfg(test)]
mod tests
{   use super::*;
    use serde_json::json;

    #[test]
    fn coerce_maps_numeric_types_to_number()
    {   assert_eq!(coerce("integer"), ValueKind::Number);
        assert_eq!(coerce("number"), ValueKind::Number);
        assert_eq!(coerce("boolean"), ValueKind::Boolean);
        assert_eq!(coerce("string"), ValueKind::String);
        assert_eq!(coerce(""), ValueKind::String);
    }

    #[test]
    fn number_slot_emits_integers_when_integral()
    {   assert_eq!(number_value(4.0), json!(4));
        assert_eq!(number_value(0.75), json!(0.75));
        assert_eq!(number_value(f64::NAN), json!(0));
    }

    #[test]
    fn number_slot_keeps_values_beyond_i64_as_floats()
    {   let two_pow_63 = 9_223_372_036_854_775_808.0_f64;
        assert_eq!(number_value(two_pow_63), json!(two_pow_63));
        assert_ne!(number_value(two_pow_63), json!(i64::MAX));
        assert_eq!(number_value(-1e3), json!(-1000));
    }
}
