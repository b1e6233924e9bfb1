//! Script conditions
//!
//! Conditions used by `if`, `ifElse`, `while` and `waitUntil`. A condition is
//! either a nested object (`{"type": "playerNear", "distance": 5}`) under the
//! `condition` key, or a condition name with its parameters flattened into
//! the command's own values.

use serde_json::Value;

use super::ast::ParamMap;
use super::params::Params;
use crate::input::KeyCode;

/// Key match for `onKeyPress` and `keyPressed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFilter {
    Any,
    Key(KeyCode),
    /// A label that names no known key; never matches
    Invalid,
}

impl KeyFilter {
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("any") || label.is_empty() {
            return KeyFilter::Any;
        }
        KeyCode::from_label(label).map_or(KeyFilter::Invalid, KeyFilter::Key)
    }

    pub fn matches(self, key: KeyCode) -> bool {
        match self {
            KeyFilter::Any => true,
            KeyFilter::Key(k) => k == key,
            KeyFilter::Invalid => false,
        }
    }
}

/// Comparison used by the variable conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compare {
    Equals,
    Greater,
    Less,
}

impl Compare {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Compare::Equals => (lhs - rhs).abs() < 1e-9,
            Compare::Greater => lhs > rhs,
            Compare::Less => lhs < rhs,
        }
    }
}

/// A boolean test evaluated against the live session.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    PlayerNear(f32),
    PlayerFar(f32),
    KeyPressed(KeyFilter),
    Var { name: String, compare: Compare, value: f64 },
    LocalVar { name: String, compare: Compare, value: f64 },
    /// True with the given probability (0..1)
    Random(f32),
    TouchingPlayer,
    HealthBelow(f32),
    HasItem(String),
    IsVisible,
    /// Fixed result; unknown condition names lower to `Const(false)`
    Const(bool),
}

impl Condition {
    /// Lower the condition carried by a command's values.
    pub fn lower(values: &ParamMap) -> Self {
        match values.get("condition") {
            Some(Value::Object(nested)) => {
                let nested: ParamMap = nested.clone().into_iter().collect();
                let kind = Params(&nested).text("type", "");
                Self::from_parts(&kind, Params(&nested))
            }
            Some(Value::String(kind)) => Self::from_parts(kind, Params(values)),
            Some(Value::Bool(b)) => Condition::Const(*b),
            _ => Condition::Const(false),
        }
    }

    fn from_parts(kind: &str, p: Params<'_>) -> Self {
        let var = |compare: Compare| Condition::Var {
            name: p.text("name", ""),
            compare,
            value: p.num_f64("value", 0.0),
        };
        let local = |compare: Compare| Condition::LocalVar {
            name: p.text("name", ""),
            compare,
            value: p.num_f64("value", 0.0),
        };
        match kind {
            "playerNear" => Condition::PlayerNear(p.num("distance", 3.0)),
            "playerFar" => Condition::PlayerFar(p.num("distance", 3.0)),
            "keyPressed" => Condition::KeyPressed(KeyFilter::from_label(&p.text("key", "any"))),
            "varEquals" => var(Compare::Equals),
            "varGreater" => var(Compare::Greater),
            "varLess" => var(Compare::Less),
            "localVarEquals" => local(Compare::Equals),
            "localVarGreater" => local(Compare::Greater),
            "localVarLess" => local(Compare::Less),
            "random" => Condition::Random(p.num("chance", 0.5).clamp(0.0, 1.0)),
            "touchingPlayer" => Condition::TouchingPlayer,
            "healthBelow" => Condition::HealthBelow(p.num("amount", 50.0)),
            "hasItem" => Condition::HasItem(p.text("item", &p.text("name", ""))),
            "isVisible" => Condition::IsVisible,
            "true" | "always" => Condition::Const(true),
            other => {
                tracing::trace!("unknown condition {:?}, evaluating as false", other);
                Condition::Const(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(v: Value) -> ParamMap {
        serde_json::from_value(v).expect("object")
    }

    #[test]
    fn test_flat_condition() {
        let c = Condition::lower(&values(json!({"condition": "varGreater", "name": "score", "value": "5"})));
        assert_eq!(
            c,
            Condition::Var { name: "score".into(), compare: Compare::Greater, value: 5.0 }
        );
    }

    #[test]
    fn test_nested_condition() {
        let c = Condition::lower(&values(json!({"condition": {"type": "playerNear", "distance": 2}})));
        assert_eq!(c, Condition::PlayerNear(2.0));
    }

    #[test]
    fn test_unknown_condition_is_false() {
        assert_eq!(Condition::lower(&values(json!({"condition": "moonIsFull"}))), Condition::Const(false));
        assert_eq!(Condition::lower(&values(json!({}))), Condition::Const(false));
    }

    #[test]
    fn test_key_filter() {
        assert!(KeyFilter::from_label("any").matches(KeyCode::Q));
        assert!(KeyFilter::from_label("space").matches(KeyCode::Space));
        assert!(!KeyFilter::from_label("not-a-key").matches(KeyCode::Space));
    }
}
