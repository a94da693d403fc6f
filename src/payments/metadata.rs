//! Transaction metadata extraction
//!
//! Paystack metadata is free-form and has accumulated several shapes over
//! time: a direct field, a `custom_fields` list rendered on the checkout
//! page, and a legacy snake_case field. Each lookup is an ordered list of
//! extractors tried in sequence; adding a new shape is a pure addition to
//! the relevant list.

use serde_json::Value as JsonValue;

type Extractor = fn(&JsonValue) -> Option<String>;

/// Extractors for the payment-purpose marker, in priority order.
const PURPOSE_EXTRACTORS: &[Extractor] = &[purpose_direct, purpose_custom_field];

/// Extractors for the embedded application number, in priority order.
const APPLICATION_NUMBER_EXTRACTORS: &[Extractor] = &[
    application_number_direct,
    application_number_custom_field,
    application_number_legacy,
];

/// Read-only view over the `metadata` object of a gateway transaction
#[derive(Debug, Clone)]
pub struct TransactionMetadata {
    raw: JsonValue,
}

impl TransactionMetadata {
    pub fn new(raw: JsonValue) -> Self {
        Self { raw }
    }

    pub fn empty() -> Self {
        Self {
            raw: JsonValue::Null,
        }
    }

    /// Purpose label embedded at initialization, if any
    pub fn purpose(&self) -> Option<String> {
        first_match(PURPOSE_EXTRACTORS, &self.raw)
    }

    /// Application number embedded at initialization, normalized to trimmed
    /// uppercase, if any
    pub fn application_number(&self) -> Option<String> {
        first_match(APPLICATION_NUMBER_EXTRACTORS, &self.raw)
            .map(|value| value.trim().to_uppercase())
            .filter(|value| !value.is_empty())
    }

    pub fn raw(&self) -> &JsonValue {
        &self.raw
    }
}

fn first_match(extractors: &[Extractor], raw: &JsonValue) -> Option<String> {
    extractors.iter().find_map(|extract| extract(raw))
}

fn non_empty_str(value: &JsonValue) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn custom_fields(raw: &JsonValue) -> Option<&Vec<JsonValue>> {
    raw.get("custom_fields").and_then(|v| v.as_array())
}

fn purpose_direct(raw: &JsonValue) -> Option<String> {
    raw.get("purpose").and_then(non_empty_str)
}

fn purpose_custom_field(raw: &JsonValue) -> Option<String> {
    custom_fields(raw)?.iter().find_map(|field| {
        let display_name = field.get("display_name")?.as_str()?;
        if display_name.to_lowercase().contains("purpose") {
            field.get("value").and_then(non_empty_str)
        } else {
            None
        }
    })
}

fn application_number_direct(raw: &JsonValue) -> Option<String> {
    raw.get("applicationNumber").and_then(non_empty_str)
}

fn application_number_custom_field(raw: &JsonValue) -> Option<String> {
    custom_fields(raw)?.iter().find_map(|field| {
        let variable_name = field.get("variable_name")?.as_str()?;
        if variable_name.to_lowercase().contains("application") {
            field.get("value").and_then(non_empty_str)
        } else {
            None
        }
    })
}

fn application_number_legacy(raw: &JsonValue) -> Option<String> {
    raw.get("application_number").and_then(non_empty_str)
}
