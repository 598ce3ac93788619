//! Recursive descriptor matching.
//!
//! `check` decides whether a value conforms to a descriptor and, if not,
//! builds a human-readable description of why. Recursion depth equals the
//! descriptor's nesting depth; container checks are linear in element count.
//!
//! Policy:
//! - Sequences fail if any single element fails; every failing element is
//!   listed with its index.
//! - Mappings check keys and values as two independent pools, and phrase the
//!   message by which pools failed.
//! - Unions pass on the first matching alternative; on total failure the
//!   union and the raw value are reported, not the per-alternative errors.
//! - Unrecognized descriptors pass silently unless `strict`, in which case the
//!   whole descriptor tree is rejected before any value is looked at.
use tracing::debug;

use crate::descriptor::{ScalarType, TypeDescriptor};
use crate::error::ConfigurationError;
use crate::value::Value;

/// `Ok(None)` if `value` conforms to `descriptor`, `Ok(Some(message))` if not.
///
/// # Errors
///
/// `ConfigurationError` if `strict` and the descriptor contains an
/// unrecognized node anywhere, whatever the value.
pub fn check(
    descriptor: &TypeDescriptor,
    value: &Value,
    strict: bool,
) -> Result<Option<String>, ConfigurationError> {
    if strict {
        if let Some(raw) = descriptor.find_unrecognized() {
            return Err(ConfigurationError::unrecognized(raw));
        }
    }
    Ok(match_value(descriptor, value))
}

// ------------------------------- Dispatch --------------------------------- //

// Unrecognized nodes reaching this point are either non-strict or already
// rejected by `check`, so they always pass here.
fn match_value(descriptor: &TypeDescriptor, value: &Value) -> Option<String> {
    match descriptor {
        TypeDescriptor::Scalar(t) => match_scalar(t, value),
        TypeDescriptor::Sequence(item) => match_sequence(descriptor, item, value),
        TypeDescriptor::Mapping(k, v) => match_mapping(descriptor, k, v, value),
        TypeDescriptor::Callable => match value {
            Value::Callable(_) => None,
            other => Some(format!(
                "must be an instance of {descriptor}, but received {}",
                other.type_name()
            )),
        },
        TypeDescriptor::Union(alts) => {
            if alts.iter().any(|alt| match_value(alt, value).is_none()) {
                None
            } else {
                Some(format!("must be an instance of {descriptor}, but received {value}"))
            }
        }
        TypeDescriptor::Unrecognized(raw) => {
            debug!(descriptor = %raw, "skipping unrecognized type descriptor");
            None
        }
    }
}

// ------------------------------- Scalars ---------------------------------- //

fn scalar_satisfied(t: &ScalarType, value: &Value) -> bool {
    match (t, value) {
        (ScalarType::Any, _) => true,
        (ScalarType::None, Value::None) => true,
        (ScalarType::Bool, Value::Bool(_)) => true,
        (ScalarType::Int, Value::Int(_)) => true,
        (ScalarType::Float, Value::Float(_)) => true,
        (ScalarType::Str, Value::Str(_)) => true,
        (ScalarType::Bytes, Value::Bytes(_)) => true,
        (ScalarType::DateTime, Value::DateTime(_)) => true,
        (ScalarType::Named(name), Value::Record(r)) => r.type_name == *name,
        _ => false,
    }
}

fn match_scalar(t: &ScalarType, value: &Value) -> Option<String> {
    if scalar_satisfied(t, value) {
        None
    } else {
        Some(format!("must be an instance of {t}, but received {}", value.type_name()))
    }
}

// ------------------------------ Containers -------------------------------- //

fn match_sequence(
    descriptor: &TypeDescriptor,
    item: &TypeDescriptor,
    value: &Value,
) -> Option<String> {
    let Value::List(xs) = value else {
        return Some(format!("must be an instance of List, but received {}", value.type_name()));
    };

    let errors: Vec<String> = xs
        .iter()
        .enumerate()
        .filter_map(|(i, x)| match_value(item, x).map(|e| format!("#{i}: {e}")))
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(format!("must be an instance of {descriptor}, but there are some errors: {errors:?}"))
    }
}

fn match_mapping(
    descriptor: &TypeDescriptor,
    key: &TypeDescriptor,
    val: &TypeDescriptor,
    value: &Value,
) -> Option<String> {
    let Value::Dict(map) = value else {
        return Some(format!("must be an instance of Dict, but received {}", value.type_name()));
    };

    let key_errors: Vec<String> = map.keys().filter_map(|k| match_value(key, k)).collect();
    let val_errors: Vec<String> = map.values().filter_map(|v| match_value(val, v)).collect();

    match (key_errors.is_empty(), val_errors.is_empty()) {
        (true, true) => None,
        (false, false) => Some(format!(
            "must be an instance of {descriptor}, but there are some errors in keys and values. \
             key errors: {key_errors:?}, value errors: {val_errors:?}"
        )),
        (false, true) => Some(format!(
            "must be an instance of {descriptor}, but there are some errors in keys: {key_errors:?}"
        )),
        (true, false) => Some(format!(
            "must be an instance of {descriptor}, but there are some errors in values: {val_errors:?}"
        )),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Callable, RecordValue};
    use proptest::prelude::*;

    fn d(s: &str) -> TypeDescriptor { s.parse().unwrap() }

    fn lenient(desc: &str, value: Value) -> Option<String> {
        check(&d(desc), &value, false).unwrap()
    }

    #[test]
    fn scalar_mismatch_names_both_types() {
        assert_eq!(lenient("Int", Value::from(30)), None);
        assert_eq!(
            lenient("Int", Value::from("30")).as_deref(),
            Some("must be an instance of Int, but received String")
        );
    }

    #[test]
    fn scalar_checks_are_exact() {
        assert!(lenient("Int", Value::from(true)).is_some());
        assert!(lenient("Float", Value::from(1)).is_some());
        assert!(lenient("None", Value::None).is_none());
        assert!(lenient("Any", Value::list([1])).is_none());
    }

    #[test]
    fn named_scalar_matches_record_type() {
        let addr = Value::from(RecordValue::new("Address").with("city", "Oslo"));
        assert_eq!(lenient("Address", addr.clone()), None);
        assert_eq!(
            lenient("Person", addr).as_deref(),
            Some("must be an instance of Person, but received Address")
        );
    }

    #[test]
    fn sequence_requires_a_list() {
        assert_eq!(
            lenient("List[int]", Value::from("abc")).as_deref(),
            Some("must be an instance of List, but received String")
        );
        assert_eq!(lenient("List[int]", Value::list(Vec::<i64>::new())), None);
    }

    #[test]
    fn one_bad_element_fails_the_sequence() {
        let v = Value::list(vec![Value::from(1), Value::from("2"), Value::from(3)]);
        assert_eq!(
            lenient("List[int]", v).as_deref(),
            Some(
                "must be an instance of List[Int], but there are some errors: \
                 [\"#1: must be an instance of Int, but received String\"]"
            )
        );
    }

    #[test]
    fn nested_sequences_recurse() {
        let v = Value::list(vec![Value::list([1, 2]), Value::list(vec![Value::from(3.5)])]);
        let msg = lenient("List[List[int]]", v).unwrap();
        assert!(msg.starts_with("must be an instance of List[List[Int]], but there are some errors:"));
        assert!(msg.contains("#1: must be an instance of List[Int]"));
        assert!(msg.contains("#0: must be an instance of Int, but received Float"));
    }

    #[test]
    fn mapping_requires_a_dict() {
        assert_eq!(
            lenient("Dict[str, int]", Value::list([1])).as_deref(),
            Some("must be an instance of Dict, but received List")
        );
    }

    #[test]
    fn mapping_phrasing_depends_on_failing_pools() {
        let keys_only = Value::dict([(Value::from(1), Value::from(1))]);
        let values_only = Value::dict([("a", "x")]);
        let both = Value::dict([(Value::from(1), Value::from("x"))]);
        let ok = Value::dict([("a", 1), ("b", 2)]);

        assert_eq!(lenient("Dict[str, int]", ok), None);
        assert_eq!(
            lenient("Dict[str, int]", keys_only).as_deref(),
            Some(
                "must be an instance of Dict[String, Int], but there are some errors in keys: \
                 [\"must be an instance of String, but received Int\"]"
            )
        );
        assert_eq!(
            lenient("Dict[str, int]", values_only).as_deref(),
            Some(
                "must be an instance of Dict[String, Int], but there are some errors in values: \
                 [\"must be an instance of Int, but received String\"]"
            )
        );
        assert_eq!(
            lenient("Dict[str, int]", both).as_deref(),
            Some(
                "must be an instance of Dict[String, Int], but there are some errors in keys and values. \
                 key errors: [\"must be an instance of String, but received Int\"], \
                 value errors: [\"must be an instance of Int, but received String\"]"
            )
        );
    }

    #[test]
    fn callable_ignores_signature() {
        let f = Value::from(Callable::new("f", |_| Value::None));
        assert_eq!(lenient("Callable[[int], str]", f), None);
        assert_eq!(
            lenient("Callable", Value::from(1)).as_deref(),
            Some("must be an instance of Callable, but received Int")
        );
    }

    #[test]
    fn union_reports_value_not_alternatives() {
        assert_eq!(lenient("Union[int, str]", Value::from("x")), None);
        assert_eq!(
            lenient("Union[int, str]", Value::from(3.14)).as_deref(),
            Some("must be an instance of Union[Int, String], but received 3.14")
        );
        assert_eq!(lenient("Optional[int]", Value::None), None);
    }

    #[test]
    fn unrecognized_passes_when_lenient() {
        assert_eq!(lenient("Tuple[int, str]", Value::from("anything")), None);
        assert_eq!(lenient("List[Set[int]]", Value::list([1, 2])), None);
        // container shape is still enforced around the unknown item
        assert!(lenient("List[Set[int]]", Value::from(1)).is_some());
    }

    #[test]
    fn unrecognized_is_fatal_when_strict_whatever_the_value() {
        for v in [Value::from(1), Value::None, Value::list(Vec::<i64>::new())] {
            let err = check(&d("Tuple[int, str]"), &v, true).unwrap_err();
            assert_eq!(err.descriptor, "Tuple[int, str]");
        }
        // an empty list or an earlier matching alternative cannot hide it
        assert!(check(&d("List[Set[int]]"), &Value::list(Vec::<i64>::new()), true).is_err());
        assert!(check(&d("Union[int, Set[int]]"), &Value::from(1), true).is_err());
    }

    #[test]
    fn strict_recognized_descriptors_behave_like_lenient() {
        let v = Value::from("x");
        assert_eq!(
            check(&d("Int"), &v, true).unwrap(),
            check(&d("Int"), &v, false).unwrap()
        );
    }

    fn arb_scalar_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::None),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            (-1.0e6..1.0e6f64).prop_map(Value::from),
            "[a-z]{0,8}".prop_map(Value::from),
        ]
    }

    fn arb_scalar_descriptor() -> impl Strategy<Value = TypeDescriptor> {
        prop_oneof![
            Just(TypeDescriptor::Scalar(ScalarType::None)),
            Just(TypeDescriptor::Scalar(ScalarType::Bool)),
            Just(TypeDescriptor::Scalar(ScalarType::Int)),
            Just(TypeDescriptor::Scalar(ScalarType::Float)),
            Just(TypeDescriptor::Scalar(ScalarType::Str)),
        ]
    }

    fn conforms(descriptor: &TypeDescriptor, value: &Value) -> bool {
        match_value(descriptor, value).is_none()
    }

    proptest! {
        #[test]
        fn union_outcome_ignores_alternative_order(
            a in arb_scalar_descriptor(),
            b in arb_scalar_descriptor(),
            v in arb_scalar_value(),
        ) {
            let ab = TypeDescriptor::union([a.clone(), b.clone()]);
            let ba = TypeDescriptor::union([b.clone(), a.clone()]);
            prop_assert_eq!(conforms(&ab, &v), conforms(&ba, &v));
            prop_assert_eq!(conforms(&ab, &v), conforms(&a, &v) || conforms(&b, &v));
        }

        #[test]
        fn a_single_bad_element_fails_the_list(
            good in prop::collection::vec(any::<i64>(), 0..16),
            at in any::<prop::sample::Index>(),
        ) {
            let list_of_int = TypeDescriptor::list(TypeDescriptor::Scalar(ScalarType::Int));
            let mut items: Vec<Value> = good.into_iter().map(Value::from).collect();
            prop_assert!(conforms(&list_of_int, &Value::List(items.clone())));

            let idx = at.index(items.len() + 1);
            items.insert(idx, Value::from("bad"));
            let msg = check(&list_of_int, &Value::List(items), false).unwrap();
            let msg = msg.expect("list with a string element must fail");
            prop_assert!(msg.contains(&format!("#{idx}: ")), "message: {}", msg);
        }
    }
}
