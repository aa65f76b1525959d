//! Statement parameters.

use crate::value::Value;

/// Parameters bound to one statement execution.
///
/// A statement binds positional parameters or named parameters, never both;
/// the enum makes that structural rather than a runtime precedence rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Params {
    /// No parameters are bound.
    #[default]
    None,
    /// Positional parameters, bound in order (1-based on the driver side).
    Positional(Vec<Value>),
    /// Named parameters; how names map to markers is the driver's business
    /// (the SQLite driver binds `:name` markers from bare keys).
    Named(Vec<(String, Value)>),
}

impl Params {
    /// Number of parameters carried.
    pub fn len(&self) -> usize {
        match self {
            Params::None => 0,
            Params::Positional(values) => values.len(),
            Params::Named(pairs) => pairs.len(),
        }
    }

    /// True when no parameters are carried.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        if values.is_empty() {
            Params::None
        } else {
            Params::Positional(values)
        }
    }
}

/// Build a `Vec<Value>` from literals, converting each through `Value::from`.
///
/// ```
/// use sqlscope_core::{Value, values};
///
/// assert_eq!(values![1, "two"], vec![Value::Int(1), Value::Text("two".into())]);
/// ```
#[macro_export]
macro_rules! values {
    () => { Vec::<$crate::Value>::new() };
    ($($v:expr),+ $(,)?) => { vec![$($crate::Value::from($v)),+] };
}

/// Build positional [`Params`] from literals; empty input yields `Params::None`.
///
/// ```
/// use sqlscope_core::{Params, Value, params};
///
/// assert_eq!(params![], Params::None);
/// assert_eq!(params![7], Params::Positional(vec![Value::Int(7)]));
/// ```
#[macro_export]
macro_rules! params {
    () => { $crate::Params::None };
    ($($v:expr),+ $(,)?) => { $crate::Params::Positional($crate::values![$($v),+]) };
}

/// Build named [`Params`] from `key => value` pairs.
///
/// ```
/// use sqlscope_core::named_params;
///
/// let params = named_params! { "id" => 1, "name" => "x" };
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! named_params {
    () => { $crate::Params::None };
    ($($k:expr => $v:expr),+ $(,)?) => {
        $crate::Params::Named(vec![$(($k.to_string(), $crate::Value::from($v))),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths() {
        assert_eq!(Params::None.len(), 0);
        assert!(Params::None.is_empty());
        assert_eq!(Params::Positional(vec![Value::Int(1)]).len(), 1);
        assert_eq!(
            Params::Named(vec![("a".to_string(), Value::Int(1))]).len(),
            1
        );
    }

    #[test]
    fn macros() {
        assert_eq!(params![], Params::None);
        assert_eq!(
            params![1, "x"],
            Params::Positional(vec![Value::Int(1), Value::Text("x".to_string())])
        );
        let named = named_params! { "k" => 2 };
        assert_eq!(named, Params::Named(vec![("k".to_string(), Value::Int(2))]));
    }

    #[test]
    fn from_vec_collapses_empty() {
        assert_eq!(Params::from(Vec::new()), Params::None);
        assert_eq!(
            Params::from(vec![Value::Bool(true)]),
            Params::Positional(vec![Value::Bool(true)])
        );
    }
}
