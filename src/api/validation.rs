//! Request parameter validation.
//!
//! Raw query strings and JSON bodies are turned into typed queries here.
//! Every problem is collected per field rather than stopping at the first,
//! so a client sees all of them in one 400 response.

use chrono::{Duration, Local, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

pub const MAX_CITY_LEN: usize = 20;
/// Forecasts may be requested or pinned up to this many days ahead.
pub const FORECAST_WINDOW_DAYS: i64 = 10;
/// Wire format for incoming dates (`DD.MM.YYYY`).
pub const INPUT_DATE_FORMAT: &str = "%d.%m.%Y";

/// Key for errors that concern the request as a whole.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

const REQUIRED: &str = "This field is required.";

/// The server's current calendar date.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Field name → messages. Serializes as a plain JSON object.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    fn into_result<T>(self, value: Option<T>) -> Result<T, Self> {
        match value {
            Some(v) if self.is_empty() => Ok(v),
            _ => Err(self),
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// `GET /current` parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CityQuery {
    pub city: String,
}

impl CityQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let city = check_city(params.get("city").map(String::as_str), &mut errors);
        errors.into_result(city.map(|city| CityQuery { city }))
    }
}

/// `GET /forecast` parameters. The date lies in `[today, today + 10]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastQuery {
    pub city: String,
    pub date: NaiveDate,
}

impl ForecastQuery {
    pub fn from_params(params: &HashMap<String, String>, today: NaiveDate) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let city = check_city(params.get("city").map(String::as_str), &mut errors);
        let date = check_date(params.get("date").map(String::as_str), Some(today), &mut errors);
        errors.into_result(city.zip(date).map(|(city, date)| ForecastQuery { city, date }))
    }

    /// Same fields without the date window, for removing stale overrides.
    pub fn key_from_params(params: &HashMap<String, String>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let city = check_city(params.get("city").map(String::as_str), &mut errors);
        let date = check_date(params.get("date").map(String::as_str), None, &mut errors);
        errors.into_result(city.zip(date).map(|(city, date)| ForecastQuery { city, date }))
    }
}

/// `POST /forecast` body: a manual override.
#[derive(Debug, Clone, PartialEq)]
pub struct OverridePayload {
    pub city: String,
    pub date: NaiveDate,
    pub min_temperature: f64,
    pub max_temperature: f64,
}

impl OverridePayload {
    pub fn from_json(body: &[u8], today: NaiveDate) -> Result<Self, ValidationErrors> {
        let value: Value = serde_json::from_slice(body).map_err(|e| {
            ValidationErrors::single(NON_FIELD_ERRORS, format!("JSON parse error - {e}"))
        })?;
        let Value::Object(fields) = value else {
            return Err(ValidationErrors::single(
                NON_FIELD_ERRORS,
                "Invalid data. Expected a dictionary.",
            ));
        };

        let mut errors = ValidationErrors::default();
        let city = json_text(fields.get("city"), "city", &mut errors)
            .and_then(|raw| check_city(Some(raw.as_str()), &mut errors));
        let date = json_text(fields.get("date"), "date", &mut errors)
            .and_then(|raw| check_date(Some(raw.as_str()), Some(today), &mut errors));
        let min = check_number(fields.get("min_temperature"), "min_temperature", &mut errors);
        let max = check_number(fields.get("max_temperature"), "max_temperature", &mut errors);

        // Checked whenever both numbers parsed, even if other fields failed.
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                errors.add(
                    NON_FIELD_ERRORS,
                    "Minimum temperature cannot be greater than maximum temperature.",
                );
            }
        }

        let payload = match (city, date, min, max) {
            (Some(city), Some(date), Some(min_temperature), Some(max_temperature)) => Some(OverridePayload {
                city,
                date,
                min_temperature,
                max_temperature,
            }),
            _ => None,
        };
        errors.into_result(payload)
    }
}

// ---------------------------------------------------------------------------
// Field checks
// ---------------------------------------------------------------------------

fn check_city(raw: Option<&str>, errors: &mut ValidationErrors) -> Option<String> {
    let Some(raw) = raw else {
        errors.add("city", REQUIRED);
        return None;
    };
    let city = raw.trim();
    if city.is_empty() {
        errors.add("city", "This field may not be blank.");
        return None;
    }
    if city.chars().count() > MAX_CITY_LEN {
        errors.add(
            "city",
            format!("Ensure this field has no more than {MAX_CITY_LEN} characters."),
        );
        return None;
    }
    Some(city.to_string())
}

/// Parse `DD.MM.YYYY`; with `today` set, also enforce the forecast window.
fn check_date(raw: Option<&str>, today: Option<NaiveDate>, errors: &mut ValidationErrors) -> Option<NaiveDate> {
    let Some(raw) = raw else {
        errors.add("date", REQUIRED);
        return None;
    };
    let Ok(date) = NaiveDate::parse_from_str(raw.trim(), INPUT_DATE_FORMAT) else {
        errors.add(
            "date",
            "Date has wrong format. Use one of these formats instead: DD.MM.YYYY.",
        );
        return None;
    };

    if let Some(today) = today {
        if date < today {
            errors.add("date", "Date cannot be in the past.");
            return None;
        }
        if date > today + Duration::days(FORECAST_WINDOW_DAYS) {
            errors.add(
                "date",
                format!("Date cannot be more than {FORECAST_WINDOW_DAYS} days ahead."),
            );
            return None;
        }
    }
    Some(date)
}

/// JSON strings pass through; numbers are accepted as their text.
fn json_text(value: Option<&Value>, field: &str, errors: &mut ValidationErrors) -> Option<String> {
    match value {
        None | Some(Value::Null) => {
            errors.add(field, REQUIRED);
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(_) => {
            errors.add(field, "Not a valid string.");
            None
        }
    }
}

/// Numbers, or strings holding a finite number.
fn check_number(value: Option<&Value>, field: &str, errors: &mut ValidationErrors) -> Option<f64> {
    let parsed = match value {
        None | Some(Value::Null) => {
            errors.add(field, REQUIRED);
            return None;
        }
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed.filter(|v| v.is_finite()) {
        Some(v) => Some(v),
        None => {
            errors.add(field, "A valid number is required.");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
