// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::builtins::utils::*;
use crate::decls::{DeclError, Declarations};
use crate::types::Type;

// Member function name and the overload id stem of each timestamp getter.
const TIMESTAMP_GETTERS: [(&str, &str); 10] = [
    ("getFullYear", "timestamp_to_year"),
    ("getMonth", "timestamp_to_month"),
    ("getDayOfYear", "timestamp_to_day_of_year"),
    ("getDayOfMonth", "timestamp_to_day_of_month"),
    ("getDate", "timestamp_to_day_of_month_1_based"),
    ("getDayOfWeek", "timestamp_to_day_of_week"),
    ("getHours", "timestamp_to_hours"),
    ("getMinutes", "timestamp_to_minutes"),
    ("getSeconds", "timestamp_to_seconds"),
    ("getMilliseconds", "timestamp_to_milliseconds"),
];

const DURATION_GETTERS: [(&str, &str); 4] = [
    ("getHours", "duration_to_hours"),
    ("getMinutes", "duration_to_minutes"),
    ("getSeconds", "duration_to_seconds"),
    ("getMilliseconds", "duration_to_milliseconds"),
];

pub fn register(d: &mut Declarations) -> Result<(), DeclError> {
    for (name, id) in TIMESTAMP_GETTERS {
        let mut sigs = vec![
            sig(id, vec![Type::Timestamp], Type::Int),
            sig(
                &format!("{id}_with_tz"),
                vec![Type::Timestamp, Type::String],
                Type::Int,
            ),
        ];
        if let Some((_, duration_id)) = DURATION_GETTERS.iter().find(|(n, _)| *n == name) {
            sigs.push(sig(duration_id, vec![Type::Duration], Type::Int));
        }
        d.add_function(receiver_function(name, sigs))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Duration, EvalError, Timestamp, Value};

    fn ts(text: &str) -> Value {
        Value::Timestamp(Timestamp::parse(text).unwrap())
    }

    #[test]
    fn timestamp_getters() {
        let t = ts("2023-03-05T23:30:15.250Z");
        assert_eq!(
            receive("getFullYear", "timestamp_to_year", &[t.clone()]),
            Value::Int(2023)
        );
        assert_eq!(
            receive("getMonth", "timestamp_to_month", &[t.clone()]),
            Value::Int(2)
        );
        assert_eq!(
            receive("getDate", "timestamp_to_day_of_month_1_based", &[t.clone()]),
            Value::Int(5)
        );
        assert_eq!(
            receive(
                "getDate",
                "timestamp_to_day_of_month_1_based_with_tz",
                &[t.clone(), Value::from("+01:00")]
            ),
            Value::Int(6)
        );
        assert_eq!(
            receive("getMilliseconds", "timestamp_to_milliseconds", &[t.clone()]),
            Value::Int(250)
        );
        assert!(matches!(
            receive(
                "getHours",
                "timestamp_to_hours_with_tz",
                &[t, Value::from("Mars/Olympus")]
            ),
            Value::Error(EvalError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn duration_getters() {
        let d = Value::Duration(Duration::parse("2h45m").unwrap());
        assert_eq!(
            receive("getMinutes", "duration_to_minutes", &[d.clone()]),
            Value::Int(165)
        );
        assert_eq!(
            receive("getHours", "duration_to_hours", &[d]),
            Value::Int(2)
        );
    }

    #[test]
    fn registered_overloads() {
        let mut d = Declarations::new();
        register(&mut d).unwrap();
        assert_eq!(d.find_function("getHours").len(), 3);
        assert_eq!(d.find_function("getFullYear").len(), 2);
    }
}
