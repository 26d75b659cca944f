//! Action references, parameter bags and named parameter setters

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::KeymapError;

/// A literal parameter value fixed at bind time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<ParamValue>),
}

impl ParamValue {
    /// Equality that treats `1` and `1.0` as the same number
    pub fn loosely_eq(&self, other: &ParamValue) -> bool {
        match (self, other) {
            (ParamValue::Int(a), ParamValue::Float(b)) | (ParamValue::Float(b), ParamValue::Int(a)) => {
                (*a as f64) == *b
            }
            (ParamValue::Tuple(a), ParamValue::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_eq(y))
            }
            _ => self == other,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{}", b),
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(x) => write!(f, "{}", x),
            ParamValue::Str(s) => write!(f, "'{}'", s),
            ParamValue::Tuple(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

/// Parameter name to literal value
pub type Params = BTreeMap<String, ParamValue>;

/// The command a binding invokes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRef {
    pub id: String,
    /// `None` when the binding carries no static parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
}

impl ActionRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            params: None,
        }
    }

    pub fn with_params(id: impl Into<String>, params: Params) -> Self {
        Self {
            id: id.into(),
            params: Some(params),
        }
    }

    /// Add a single parameter (builder pattern)
    pub fn param(mut self, name: &str, value: impl Into<ParamValue>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(name.to_string(), value.into());
        self
    }

    pub fn has_params(&self) -> bool {
        self.params.as_ref().is_some_and(|p| !p.is_empty())
    }

    pub fn get_param(&self, name: &str) -> Option<&ParamValue> {
        self.params.as_ref().and_then(|p| p.get(name))
    }

    pub fn set_param(&mut self, name: &str, value: ParamValue) {
        self.params
            .get_or_insert_with(Params::new)
            .insert(name.to_string(), value);
    }

    /// Drop an empty parameter map so "no params" has one representation
    pub(crate) fn normalized(mut self) -> Self {
        if self.params.as_ref().is_some_and(|p| p.is_empty()) {
            self.params = None;
        }
        self
    }
}

impl fmt::Display for ActionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(ref params) = self.params {
            let parts: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            write!(f, "({})", parts.join(", "))?;
        }
        Ok(())
    }
}

/// Which actions a query selects
///
/// Only patterns that literally start with `*` are wildcards; a pattern
/// written with parameters is always an exact id.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionPattern {
    /// `*` - any action, parameters ignored
    Any,
    /// `*suffix` - any action id containing `suffix`, parameters ignored
    Contains(String),
    /// Exact id; `params: None` ignores the record's parameters, `Some`
    /// requires the same keys with equal values (empty = no parameters)
    Exact(ActionRef),
}

impl ActionPattern {
    pub fn parse(id: &str, params: Option<Params>) -> Self {
        if params.is_none() {
            if id == "*" {
                return ActionPattern::Any;
            }
            if let Some(rest) = id.strip_prefix('*') {
                return ActionPattern::Contains(rest.to_string());
            }
        }
        ActionPattern::Exact(ActionRef {
            id: id.to_string(),
            params,
        })
    }

    /// Exact id, any parameters
    pub fn id(id: impl Into<String>) -> Self {
        ActionPattern::Exact(ActionRef::new(id))
    }

    /// The same pattern with parameter comparison switched off
    pub fn structural(&self) -> ActionPattern {
        match self {
            ActionPattern::Exact(action) => ActionPattern::id(action.id.clone()),
            other => other.clone(),
        }
    }
}

impl From<&ActionRef> for ActionPattern {
    fn from(action: &ActionRef) -> Self {
        ActionPattern::Exact(action.clone())
    }
}

impl fmt::Display for ActionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionPattern::Any => write!(f, "*"),
            ActionPattern::Contains(s) => write!(f, "*{}", s),
            ActionPattern::Exact(action) => write!(f, "{}", action),
        }
    }
}

/// Known parameter names per action id
///
/// Actions without an entry accept any parameter and store it opaquely.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ParamSchema {
    known: HashMap<String, BTreeSet<String>>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, action_id: &str, params: &[&str]) {
        self.known
            .entry(action_id.to_string())
            .or_default()
            .extend(params.iter().map(|p| p.to_string()));
    }

    /// Merge another schema into this one (later definitions extend earlier ones)
    pub fn extend(&mut self, other: ParamSchema) {
        for (action, params) in other.known {
            self.known.entry(action).or_default().extend(params);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Check that `param` (or the macro operator owning a dotted name) exists
    pub fn check(&self, action_id: &str, param: &str) -> Result<(), KeymapError> {
        let Some(params) = self.known.get(action_id) else {
            return Ok(());
        };
        let top = param.split('.').next().unwrap_or(param);
        if params.contains(top) {
            Ok(())
        } else {
            Err(KeymapError::UnknownParam {
                action: action_id.to_string(),
                param: param.to_string(),
            })
        }
    }
}

/// Setter names that assign one enum-by-value string to a same-named parameter
const ENUM_SETTERS: &[&str] = &[
    "type",
    "filter_type",
    "mode",
    "direction",
    "action",
    "target",
    "affect",
    "space_type",
    "orient_type",
    "close_spline_method",
    "sculpt_tool",
];

/// A named parameter setter run against a freshly inserted binding
///
/// Covers values that cannot be written as static literals in the action
/// reference (enum properties set by name, macro sub-operator properties).
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSetter {
    Enum { name: &'static str, value: String },
    Value(ParamValue),
    Delimit(Vec<String>),
    ContextToggleValues(ParamValue, ParamValue),
    QuadAndNgonMethod(String, String),
    TargetAndFalloffType(String, String),
    RipUseFill(bool),
}

impl ParamSetter {
    /// Build a setter from its rule-file name and argument
    pub fn from_config(name: &str, arg: &ParamValue) -> Result<Self, KeymapError> {
        let invalid = |expected: &str| {
            KeymapError::InvalidSetter(format!("`{}` expects {}, got {}", name, expected, arg))
        };

        if let Some(&enum_name) = ENUM_SETTERS.iter().find(|&&s| s == name) {
            let value = arg.as_str().ok_or_else(|| invalid("a string"))?;
            return Ok(ParamSetter::Enum {
                name: enum_name,
                value: value.to_string(),
            });
        }

        match name {
            "value" => Ok(ParamSetter::Value(arg.clone())),
            "delimit" => match arg {
                ParamValue::Str(s) => Ok(ParamSetter::Delimit(vec![s.clone()])),
                ParamValue::Tuple(items) => items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .map(ParamSetter::Delimit)
                    .ok_or_else(|| invalid("a list of strings")),
                _ => Err(invalid("a list of strings")),
            },
            "context_toggle_values" => match arg {
                ParamValue::Tuple(items) if items.len() == 2 => Ok(
                    ParamSetter::ContextToggleValues(items[0].clone(), items[1].clone()),
                ),
                _ => Err(invalid("[value_1, value_2]")),
            },
            "quad_and_ngon_method" | "target_and_falloff_type" => {
                let pair = match arg {
                    ParamValue::Tuple(items) if items.len() == 2 => {
                        items[0].as_str().zip(items[1].as_str())
                    }
                    _ => None,
                };
                let (a, b) = pair.ok_or_else(|| invalid("a pair of strings"))?;
                if name == "quad_and_ngon_method" {
                    Ok(ParamSetter::QuadAndNgonMethod(a.to_string(), b.to_string()))
                } else {
                    Ok(ParamSetter::TargetAndFalloffType(a.to_string(), b.to_string()))
                }
            }
            "rip_use_fill" => match arg {
                ParamValue::Bool(b) => Ok(ParamSetter::RipUseFill(*b)),
                _ => Err(invalid("a boolean")),
            },
            _ => Err(KeymapError::InvalidSetter(format!("unknown setter `{}`", name))),
        }
    }

    /// The (parameter, value) pairs this setter writes, in order
    fn assignments(&self) -> Vec<(&str, ParamValue)> {
        match self {
            ParamSetter::Enum { name, value } => vec![(name, ParamValue::Str(value.clone()))],
            ParamSetter::Value(v) => vec![("value", v.clone())],
            ParamSetter::Delimit(items) => vec![(
                "delimit",
                ParamValue::Tuple(items.iter().map(|s| ParamValue::Str(s.clone())).collect()),
            )],
            ParamSetter::ContextToggleValues(a, b) => {
                vec![("value_1", a.clone()), ("value_2", b.clone())]
            }
            ParamSetter::QuadAndNgonMethod(quad, ngon) => vec![
                ("quad_method", ParamValue::Str(quad.clone())),
                ("ngon_method", ParamValue::Str(ngon.clone())),
            ],
            ParamSetter::TargetAndFalloffType(target, falloff) => vec![
                ("target", ParamValue::Str(target.clone())),
                ("falloff_type", ParamValue::Str(falloff.clone())),
            ],
            ParamSetter::RipUseFill(fill) => vec![("MESH_OT_rip.use_fill", ParamValue::Bool(*fill))],
        }
    }

    /// Write this setter's parameters into `action`
    ///
    /// Stops at the first parameter the schema rejects; parameters written
    /// before the failure stay in place.
    pub fn apply(&self, action: &mut ActionRef, schema: &ParamSchema) -> Result<(), KeymapError> {
        for (name, value) in self.assignments() {
            schema.check(&action.id, name)?;
            action.set_param(name, value);
        }
        Ok(())
    }
}
