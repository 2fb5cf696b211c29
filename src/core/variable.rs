//! The variable model shared by the evaluator and the flow interpreter.
//!
//! ## Variable
//!
//! A closed recursive sum type: null, booleans, numbers, strings, mappings,
//! lists and [`Location`]s. Lists and mappings use `im` persistent
//! structures so copying a whole game state is O(1).
//!
//! ## VariableContainer
//!
//! Case-insensitive name → [`Variable`] map. Keys are lowercased on insert
//! and on lookup, so `Suit` and `suit` name the same entry.
//!
//! ## Locations
//!
//! A location is a board position: either a single optional component
//! (`Location::Component`) or an ordered collection of components
//! (`Location::Collection`, first element = top of the pile). Components are
//! always mappings.

use std::cmp::Ordering;
use std::fmt;

use im::{OrdMap, Vector};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EvaluationError;

/// Key that marks a mapping as a component location.
pub const COMPONENT_KEY: &str = "component";

/// Key that marks a mapping as a collection location.
pub const COLLECTION_KEY: &str = "collection";

/// A game-state value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Variable {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Mapping(VariableContainer),
    List(Vector<Variable>),
    Location(Location),
}

/// A board position holding components.
#[derive(Clone, Debug, PartialEq)]
pub enum Location {
    /// Holds at most one component.
    Component(Option<VariableContainer>),
    /// Holds an ordered pile of components.
    Collection(Vector<VariableContainer>),
}

impl Location {
    /// An empty component location.
    #[must_use]
    pub fn empty_component() -> Self {
        Self::Component(None)
    }

    /// A collection location holding `components` in order.
    pub fn collection(components: impl IntoIterator<Item = VariableContainer>) -> Self {
        Self::Collection(components.into_iter().collect())
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Component(_) => "component location",
            Self::Collection(_) => "collection location",
        }
    }

    /// The value a reader sees when locations are resolved: the component
    /// (or null) for a component location, the list of components for a
    /// collection location.
    #[must_use]
    pub fn resolve(&self) -> Variable {
        match self {
            Self::Component(Some(component)) => Variable::Mapping(component.clone()),
            Self::Component(None) => Variable::Null,
            Self::Collection(components) => Variable::List(
                components.iter().cloned().map(Variable::Mapping).collect(),
            ),
        }
    }
}

impl Variable {
    /// Name of the variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Mapping(_) => "mapping",
            Self::List(_) => "list",
            Self::Location(location) => location.type_name(),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn is_component_location(&self) -> bool {
        matches!(self, Self::Location(Location::Component(_)))
    }

    #[must_use]
    pub fn is_collection_location(&self) -> bool {
        matches!(self, Self::Location(Location::Collection(_)))
    }

    /// Truthiness used by the logical built-ins: null, `false`, `0`, NaN and
    /// the empty string are falsy, everything else is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Mapping(_) | Self::List(_) | Self::Location(_) => true,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&Vector<Variable>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_mapping(&self) -> Option<&VariableContainer> {
        match self {
            Self::Mapping(container) => Some(container),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_location(&self) -> Option<&Location> {
        match self {
            Self::Location(location) => Some(location),
            _ => None,
        }
    }

    /// Unwrap a location into what it holds; other variants are returned as is.
    #[must_use]
    pub fn resolved(self) -> Variable {
        match self {
            Self::Location(location) => location.resolve(),
            other => other,
        }
    }

    /// Ordering between two numbers or two strings. Anything else is
    /// unordered.
    #[must_use]
    pub fn partial_compare(&self, other: &Variable) -> Option<Ordering> {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Interpret a mapping as a location when it carries a `component` or
    /// `collection` key.
    pub fn from_container(container: VariableContainer) -> Result<Self, String> {
        if let Some(component) = container.get(COMPONENT_KEY) {
            return match component {
                Self::Null => Ok(Self::Location(Location::Component(None))),
                Self::Mapping(inner) => Ok(Self::Location(Location::Component(Some(inner.clone())))),
                other => Err(format!("component must be a mapping or null, found {}", other.type_name())),
            };
        }

        if let Some(collection) = container.get(COLLECTION_KEY) {
            let items = collection
                .as_list()
                .ok_or_else(|| format!("collection must be a list, found {}", collection.type_name()))?;
            let components = items
                .iter()
                .map(|item| match item {
                    Self::Mapping(inner) => Ok(inner.clone()),
                    other => Err(format!(
                        "collection entries must be mappings, found {}",
                        other.type_name()
                    )),
                })
                .collect::<Result<Vector<_>, _>>()?;
            return Ok(Self::Location(Location::Collection(components)));
        }

        Ok(Self::Mapping(container))
    }
}

/// Render a number the way game authors write it: integral values without a
/// fractional part.
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Mapping(container) => write!(f, "{container}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Location(Location::Component(Some(component))) => {
                write!(f, "{{\"component\": {component}}}")
            }
            Self::Location(Location::Component(None)) => write!(f, "{{\"component\": null}}"),
            Self::Location(Location::Collection(components)) => {
                write!(f, "{{\"collection\": [")?;
                for (i, component) in components.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{component}")?;
                }
                write!(f, "]}}")
            }
        }
    }
}

impl From<bool> for Variable {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Variable {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Variable {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<usize> for Variable {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Variable {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Variable {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<VariableContainer> for Variable {
    fn from(value: VariableContainer) -> Self {
        Self::Mapping(value)
    }
}

impl From<Location> for Variable {
    fn from(value: Location) -> Self {
        Self::Location(value)
    }
}

impl From<Vec<Variable>> for Variable {
    fn from(value: Vec<Variable>) -> Self {
        Self::List(value.into_iter().collect())
    }
}

impl FromIterator<Variable> for Variable {
    fn from_iter<T: IntoIterator<Item = Variable>>(iter: T) -> Self {
        Self::List(iter.into_iter().collect())
    }
}

/// Case-insensitive variable storage.
///
/// Every key is lowercased before it is stored or looked up.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariableContainer {
    entries: OrdMap<String, Variable>,
}

impl VariableContainer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a variable name to its stored form.
    #[must_use]
    pub fn normalize(name: &str) -> String {
        name.to_lowercase()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.entries.get(&Self::normalize(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.entries.get_mut(&Self::normalize(name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&Self::normalize(name))
    }

    /// Look a name up, failing with the name as the caller spelled it.
    pub fn lookup(&self, name: &str) -> Result<&Variable, EvaluationError> {
        self.get(name).ok_or_else(|| EvaluationError::UndefinedVariable {
            name: name.to_string(),
        })
    }

    /// Look a name up and, when `resolve_locations` is set, unwrap a location
    /// into the component or components it holds.
    pub fn lookup_resolved(&self, name: &str, resolve_locations: bool) -> Result<Variable, EvaluationError> {
        let variable = self.lookup(name)?;
        if resolve_locations {
            if let Variable::Location(location) = variable {
                return Ok(location.resolve());
            }
        }
        Ok(variable.clone())
    }

    /// Insert or replace a variable.
    pub fn insert(&mut self, name: &str, value: impl Into<Variable>) {
        self.entries.insert(Self::normalize(name), value.into());
    }

    /// Copy of this container with one variable replaced.
    #[must_use]
    pub fn with(&self, name: &str, value: impl Into<Variable>) -> Self {
        let mut next = self.clone();
        next.insert(name, value);
        next
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        self.entries.remove(&Self::normalize(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over (normalized name, value) pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Variable)> {
        self.entries.iter()
    }

    /// Copy every entry of `other` into this container, replacing clashes.
    pub fn extend_from(&mut self, other: &VariableContainer) {
        for (name, value) in other.iter() {
            self.entries.insert(name.clone(), value.clone());
        }
    }
}

impl<K: AsRef<str>, V: Into<Variable>> FromIterator<(K, V)> for VariableContainer {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut container = Self::new();
        for (name, value) in iter {
            container.insert(name.as_ref(), value);
        }
        container
    }
}

impl fmt::Display for VariableContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name:?}: {value}")?;
        }
        write!(f, "}}")
    }
}

// === Serialization ===

impl Serialize for Variable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => serializer.serialize_i64(*n as i64),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::Mapping(container) => container.serialize(serializer),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Location(Location::Component(component)) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(COMPONENT_KEY, component)?;
                map.end()
            }
            Self::Location(Location::Collection(components)) => {
                let mut map = serializer.serialize_map(Some(1))?;
                let items: Vec<&VariableContainer> = components.iter().collect();
                map.serialize_entry(COLLECTION_KEY, &items)?;
                map.end()
            }
        }
    }
}

impl Serialize for VariableContainer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct ContainerVisitor;

impl<'de> Visitor<'de> for ContainerVisitor {
    type Value = VariableContainer;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a map of variables")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut container = VariableContainer::new();
        while let Some((name, value)) = map.next_entry::<String, Variable>()? {
            container.insert(&name, value);
        }
        Ok(container)
    }
}

impl<'de> Deserialize<'de> for VariableContainer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ContainerVisitor)
    }
}

struct VariableVisitor;

impl<'de> Visitor<'de> for VariableVisitor {
    type Value = Variable;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a game variable")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Variable::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Variable::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        Variable::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Variable::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Variable::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Variable::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Variable::Number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Variable::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Variable::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vector::new();
        while let Some(item) = seq.next_element::<Variable>()? {
            items.push_back(item);
        }
        Ok(Variable::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
        let container = ContainerVisitor.visit_map(map)?;
        Variable::from_container(container).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for Variable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(VariableVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(suit: &str, value: i32) -> VariableContainer {
        [("suit", Variable::from(suit)), ("value", Variable::from(value))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_container_is_case_insensitive() {
        let mut container = VariableContainer::new();
        container.insert("Suit", "hearts");

        assert_eq!(container.get("suit"), Some(&Variable::from("hearts")));
        assert_eq!(container.get("SUIT"), Some(&Variable::from("hearts")));
        assert!(container.contains("sUiT"));
        assert_eq!(container.iter().next().map(|(k, _)| k.as_str()), Some("suit"));
    }

    #[test]
    fn test_lookup_missing_reports_given_name() {
        let container = VariableContainer::new();
        let err = container.lookup("Foo").unwrap_err();
        assert_eq!(err.to_string(), "Variable Foo is not defined.");
    }

    #[test]
    fn test_lookup_resolved_unwraps_locations() {
        let mut container = VariableContainer::new();
        container.insert("trick", Location::Component(Some(card("hearts", 3))));
        container.insert("empty", Location::empty_component());
        container.insert("deck", Location::collection([card("spades", 1), card("clubs", 2)]));

        assert_eq!(container.lookup_resolved("trick", true).unwrap(), Variable::Mapping(card("hearts", 3)));
        assert_eq!(container.lookup_resolved("empty", true).unwrap(), Variable::Null);
        assert_eq!(
            container.lookup_resolved("deck", true).unwrap(),
            Variable::from(vec![Variable::Mapping(card("spades", 1)), Variable::Mapping(card("clubs", 2))])
        );

        assert!(container.lookup_resolved("deck", false).unwrap().is_collection_location());
        assert!(container.lookup_resolved("trick", false).unwrap().is_component_location());
    }

    #[test]
    fn test_with_leaves_original_untouched() {
        let original: VariableContainer = [("score", 1)].into_iter().collect();
        let next = original.with("score", 2);

        assert_eq!(original.get("score"), Some(&Variable::from(1)));
        assert_eq!(next.get("score"), Some(&Variable::from(2)));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Variable::Null.is_truthy());
        assert!(!Variable::from(false).is_truthy());
        assert!(!Variable::from(0).is_truthy());
        assert!(!Variable::from("").is_truthy());
        assert!(!Variable::Number(f64::NAN).is_truthy());
        assert!(Variable::from(2).is_truthy());
        assert!(Variable::from("foo").is_truthy());
        assert!(Variable::from(Vec::new()).is_truthy());
    }

    #[test]
    fn test_partial_compare() {
        assert_eq!(Variable::from(1).partial_compare(&Variable::from(2)), Some(Ordering::Less));
        assert_eq!(Variable::from("b").partial_compare(&Variable::from("a")), Some(Ordering::Greater));
        assert_eq!(Variable::from(1).partial_compare(&Variable::from("a")), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(3.14), "3.14");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn test_deserialize_lowercases_keys_and_detects_locations() {
        let json = r#"{
            "Score": 3,
            "Hand": {"collection": [{"Suit": "hearts", "Value": 3}]},
            "Trick": {"component": null},
            "Nested": {"Inner": [1, 2.5, "x", true, null]}
        }"#;
        let container: VariableContainer = serde_json::from_str(json).unwrap();

        assert_eq!(container.get("score"), Some(&Variable::from(3)));
        assert_eq!(
            container.get("hand"),
            Some(&Variable::Location(Location::collection([card("hearts", 3)])))
        );
        assert_eq!(container.get("trick"), Some(&Variable::Location(Location::Component(None))));

        let nested = container.get("nested").and_then(Variable::as_mapping).unwrap();
        assert_eq!(nested.get("inner").and_then(Variable::as_list).map(|l| l.len()), Some(5));
    }

    #[test]
    fn test_deserialize_rejects_malformed_locations() {
        let result: Result<Variable, _> = serde_json::from_str(r#"{"collection": [1, 2]}"#);
        assert!(result.is_err());

        let result: Result<Variable, _> = serde_json::from_str(r#"{"component": 4}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_roundtrips_locations() {
        let location = Variable::Location(Location::collection([card("clubs", 9)]));
        let json = serde_json::to_string(&location).unwrap();
        assert_eq!(json, r#"{"collection":[{"suit":"clubs","value":9}]}"#);

        let back: Variable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, location);
    }

    #[test]
    fn test_display_is_json_like() {
        let value = Variable::from(vec![Variable::from(1), Variable::from("a"), Variable::Null]);
        assert_eq!(value.to_string(), r#"[1, "a", null]"#);
        assert_eq!(Variable::Mapping(card("hearts", 3)).to_string(), r#"{"suit": "hearts", "value": 3}"#);
    }
}
