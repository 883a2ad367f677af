//! Utility functions and helpers for configuration

use serde::{Deserialize, Deserializer, Serializer};
use std::time::Duration;

/// Serde helper module for Duration serialization as (fractional) seconds
pub mod serde_duration {
    use super::*;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds).map_err(serde::de::Error::custom)
    }
}

/// Default functions for serde
pub fn default_true() -> bool {
    true
}

pub fn default_false() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(with = "serde_duration")]
        value: Duration,
    }

    #[test]
    fn test_fractional_seconds() {
        let wrapper: Wrapper = serde_json::from_str(r#"{"value": 0.25}"#).unwrap();
        assert_eq!(wrapper.value, Duration::from_millis(250));
    }

    #[test]
    fn test_negative_seconds_rejected() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"value": -1}"#).is_err());
    }
}
