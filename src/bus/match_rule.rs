//! # Match-rule translation.
//!
//! Turns a target's `key=value` match-option map into the bus's native
//! match rule. The map is passed through key-by-key; the supported vocabulary
//! is `sender`, `destination`, `interface`, `member`, `path`,
//! `path_namespace` and `arg0`..`argN`. Anything else fails registration for
//! that target (fatal at startup).
//!
//! Keys are applied in sorted order so that error reporting is deterministic
//! regardless of map iteration order.

use std::collections::HashMap;

use zbus::{message, MatchRule};

use crate::error::BusError;

/// Builds a signal match rule from the configured option map.
///
/// An empty map yields a rule matching every signal on the connection.
pub(crate) fn from_options(options: &HashMap<String, String>) -> Result<MatchRule<'static>, BusError> {
    let mut builder = MatchRule::builder().msg_type(message::Type::Signal);

    let mut entries: Vec<(&String, &String)> = options.iter().collect();
    entries.sort();

    for (key, value) in entries {
        let invalid = |source| BusError::InvalidMatchValue {
            key: key.clone(),
            source,
        };
        builder = match key.as_str() {
            "sender" => builder.sender(value.clone()).map_err(invalid)?,
            "destination" => builder.destination(value.clone()).map_err(invalid)?,
            "interface" => builder.interface(value.clone()).map_err(invalid)?,
            "member" => builder.member(value.clone()).map_err(invalid)?,
            "path" => builder.path(value.clone()).map_err(invalid)?,
            "path_namespace" => builder.path_namespace(value.clone()).map_err(invalid)?,
            k if k.starts_with("arg") => {
                let idx: u8 = k[3..].parse().map_err(|_| BusError::UnknownMatchKey {
                    key: key.clone(),
                })?;
                builder.arg(idx, value.clone()).map_err(invalid)?
            }
            _ => {
                return Err(BusError::UnknownMatchKey { key: key.clone() });
            }
        };
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_known_keys_build_a_rule() {
        let rule = from_options(&options(&[
            ("interface", "org.freedesktop.login1.Manager"),
            ("member", "PrepareForSleep"),
            ("path", "/org/freedesktop/login1"),
            ("sender", "org.freedesktop.login1"),
        ]))
        .unwrap();

        let serialized = rule.to_string();
        assert!(serialized.contains("type='signal'"));
        assert!(serialized.contains("interface='org.freedesktop.login1.Manager'"));
        assert!(serialized.contains("member='PrepareForSleep'"));
        assert!(serialized.contains("path='/org/freedesktop/login1'"));
        assert!(serialized.contains("sender='org.freedesktop.login1'"));
    }

    #[test]
    fn test_arg_keys_are_indexed() {
        let rule = from_options(&options(&[("arg2", "some-value")])).unwrap();
        assert!(rule.to_string().contains("arg2='some-value'"));
    }

    #[test]
    fn test_empty_map_matches_all_signals() {
        let rule = from_options(&HashMap::new()).unwrap();
        assert!(rule.to_string().contains("type='signal'"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = from_options(&options(&[("frobnicate", "x")])).unwrap_err();
        match err {
            BusError::UnknownMatchKey { key } => assert_eq!(key, "frobnicate"),
            other => panic!("expected UnknownMatchKey, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_arg_index_is_rejected() {
        let err = from_options(&options(&[("argx", "x")])).unwrap_err();
        assert!(matches!(err, BusError::UnknownMatchKey { .. }));
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let err = from_options(&options(&[("interface", "not an interface")])).unwrap_err();
        match err {
            BusError::InvalidMatchValue { key, .. } => assert_eq!(key, "interface"),
            other => panic!("expected InvalidMatchValue, got {other:?}"),
        }
    }
}
