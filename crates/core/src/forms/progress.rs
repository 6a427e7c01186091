use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One field of a form as seen by the progress bar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormField {
    pub value: Value,
    pub required: bool,
}

impl FormField {
    pub fn required(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            required: true,
        }
    }

    pub fn optional(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            required: false,
        }
    }

    /// Non-empty arrays, non-blank strings and truthy scalars count as
    /// filled in. Objects always do.
    pub fn is_complete(&self) -> bool {
        match &self.value {
            Value::Null => false,
            Value::Bool(flag) => *flag,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
            Value::String(s) => !s.trim().is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(_) => true,
        }
    }
}

/// Completion of the required fields of a form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormProgress {
    /// Rounded percentage, 0 to 100.
    pub progress: u8,
    pub completed: usize,
    pub total: usize,
}

/// Derives form completion from its fields. Only required fields count; a
/// form without required fields is complete.
pub fn calculate_form_progress(fields: &BTreeMap<String, FormField>) -> FormProgress {
    let (completed, total) = fields
        .values()
        .filter(|field| field.required)
        .fold((0usize, 0usize), |(completed, total), field| {
            (completed + usize::from(field.is_complete()), total + 1)
        });

    FormProgress {
        progress: percentage(completed, total),
        completed,
        total,
    }
}

/// `round(100 * part / whole)`, with an empty whole counting as complete.
pub(crate) fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 100;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(fields: &[(&str, FormField)]) -> BTreeMap<String, FormField> {
        fields
            .iter()
            .map(|(name, field)| (name.to_string(), field.clone()))
            .collect()
    }

    #[test]
    fn test_empty_form_is_complete() {
        assert_eq!(
            calculate_form_progress(&BTreeMap::new()),
            FormProgress {
                progress: 100,
                completed: 0,
                total: 0
            }
        );
    }

    #[test]
    fn test_optional_fields_are_ignored() {
        let fields = form(&[
            ("name", FormField::required("John")),
            ("bio", FormField::optional("")),
        ]);
        assert_eq!(
            calculate_form_progress(&fields),
            FormProgress {
                progress: 100,
                completed: 1,
                total: 1
            }
        );
    }

    #[test]
    fn test_only_optional_fields_counts_as_complete() {
        let fields = form(&[("bio", FormField::optional(""))]);
        assert_eq!(calculate_form_progress(&fields).progress, 100);
    }

    #[test]
    fn test_completeness_rules() {
        let cases = [
            (json!(null), false),
            (json!(false), false),
            (json!(true), true),
            (json!(0), false),
            (json!(0.0), false),
            (json!(3), true),
            (json!(-1.5), true),
            (json!(""), false),
            (json!("   "), false),
            (json!(" x "), true),
            (json!([]), false),
            (json!([""]), true),
            (json!({}), true),
        ];
        for (value, expected) in cases {
            assert_eq!(
                FormField::required(value.clone()).is_complete(),
                expected,
                "value {}",
                value
            );
        }
    }

    #[test]
    fn test_progress_is_rounded() {
        let fields = form(&[
            ("title", FormField::required("Robotics camp")),
            ("description", FormField::required("")),
            ("category", FormField::required(json!([]))),
        ]);
        assert_eq!(
            calculate_form_progress(&fields),
            FormProgress {
                progress: 33,
                completed: 1,
                total: 3
            }
        );

        let fields = form(&[
            ("title", FormField::required("Robotics camp")),
            ("description", FormField::required("Build robots")),
            ("category", FormField::required(json!(["stem"]))),
        ]);
        assert_eq!(calculate_form_progress(&fields).progress, 100);
    }

    #[test]
    fn test_two_of_three_rounds_up() {
        let fields = form(&[
            ("a", FormField::required("x")),
            ("b", FormField::required("y")),
            ("c", FormField::required(json!(null))),
        ]);
        assert_eq!(calculate_form_progress(&fields).progress, 67);
    }
}
