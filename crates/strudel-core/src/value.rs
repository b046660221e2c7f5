use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Control names a backend is known to understand. The control set is open
/// (unknown keys are passed through to the sink unchanged); this list only
/// documents the ones described in the backend interface.
pub const KNOWN_CONTROLS: &[&str] = &[
    "s", "n", "note", "gain", "pan", "speed", "cutoff", "resonance", "delay", "delaytime",
    "delayfeedback", "room", "begin", "end", "cut", "orbit", "midichan",
];

/// How two control maps combine when applicative combinators merge values
/// produced by two patterns (e.g. `.note(...).s(...)`, `pat1 # pat2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOp {
    /// `<|` — on key collision, keep the left (this) value.
    Left,
    /// `|>` — on key collision, keep the right (other) value.
    Right,
    /// `|` — on key collision, the right value wins but only for shared keys;
    /// keys unique to either side always pass through. Equivalent to `Right`
    /// for scalar collisions; kept distinct for readability at call sites.
    Both,
}

/// Represents a value in a Strudel pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Number value
    Number(f64),
    /// String value (note names, sample names, etc.)
    String(String),
    /// Boolean value
    Bool(bool),
    /// List of values
    List(Vec<Value>),
    /// Control map: named scalar controls (`s`, `n`, `note`, `gain`, ...)
    Map(BTreeMap<String, Value>),
    /// Silence/rest
    Silence,
}

impl Value {
    /// Check if this value is silence
    pub fn is_silence(&self) -> bool {
        matches!(self, Value::Silence)
    }

    /// Try to extract a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to extract a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to extract a list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Try to extract a control map
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Wrap a scalar as a single-key control map, e.g. `Value::Number(3.0).into_control("n")`.
    pub fn into_control(self, name: &str) -> Value {
        let mut map = BTreeMap::new();
        map.insert(name.to_string(), self);
        Value::Map(map)
    }

    /// Key-wise union merge of two values under the given collision policy.
    ///
    /// Maps merge key-wise; a scalar on either side (e.g. a `struct` binary
    /// pattern's `true`/`false`) has no keys to union, so the policy picks
    /// one side wholesale instead.
    pub fn merge(&self, other: &Value, op: MergeOp) -> Value {
        match (self, other) {
            (Value::Map(a), Value::Map(b)) => {
                let mut result = a.clone();
                for (k, v) in b {
                    match result.get(k) {
                        Some(existing) => {
                            let merged = match op {
                                MergeOp::Left => existing.clone(),
                                MergeOp::Right | MergeOp::Both => v.clone(),
                            };
                            result.insert(k.clone(), merged);
                        }
                        None => {
                            result.insert(k.clone(), v.clone());
                        }
                    }
                }
                Value::Map(result)
            }
            (Value::Map(a), other) => {
                // Scalar merged into a map: fold in under its bare display form
                // is ambiguous, so the non-map side simply wins or loses whole.
                match op {
                    MergeOp::Left => Value::Map(a.clone()),
                    MergeOp::Right | MergeOp::Both => other.clone(),
                }
            }
            (this, Value::Map(_)) => match op {
                MergeOp::Left => this.clone(),
                MergeOp::Right | MergeOp::Both => other.clone(),
            },
            (this, other) => match op {
                MergeOp::Left => this.clone(),
                MergeOp::Right | MergeOp::Both => other.clone(),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Silence => write!(f, "~"),
        }
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(m: BTreeMap<String, Value>) -> Self {
        Value::Map(m)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(list: Vec<Value>) -> Self {
        Value::List(list)
    }
}
