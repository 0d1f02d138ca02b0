//! Tool catalogue offered to the model.
//!
//! The model names a tool by string. Names are resolved through a fixed
//! lookup table into [`ToolKind`], and the argument object is read field by
//! field into a typed [`ToolCall`] before anything touches the datastore.

use crate::error::ToolError;
use chrono::NaiveDateTime;
use foodiespot_ai::FunctionSchema;
use foodiespot_booking::{BookingStore, book, check_availability, parse_reservation_time, recommend};
use foodiespot_core::RestaurantId;
use serde_json::{Map, Value as JsonValue, json};
use tracing::{debug, instrument};

/// The tools the assistant can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Recommend,
    CheckAvailability,
    Book,
}

/// Wire names as exposed to the model.
const TOOL_NAMES: [(&str, ToolKind); 3] = [
    ("recommend_restaurants", ToolKind::Recommend),
    ("availability_tool", ToolKind::CheckAvailability),
    ("booking_tool", ToolKind::Book),
];

impl ToolKind {
    /// Every tool, in the order offered to the model.
    pub const ALL: [ToolKind; 3] = [Self::Recommend, Self::CheckAvailability, Self::Book];

    /// Resolves a wire name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTool` for names outside the catalogue.
    pub fn from_name(name: &str) -> Result<Self, ToolError> {
        TOOL_NAMES
            .iter()
            .find(|(wire, _)| *wire == name)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| ToolError::UnknownTool {
                name: name.to_string(),
            })
    }

    /// Returns the wire name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        TOOL_NAMES
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(wire, _)| *wire)
            .unwrap_or_default()
    }

    /// Returns the description shown to the model.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Recommend => "Suggest restaurants based on cuisine preference and party size",
            Self::CheckAvailability => "Check seating availability at a restaurant",
            Self::Book => "Book a reservation at a restaurant",
        }
    }

    /// Returns the JSON schema of the argument object.
    #[must_use]
    pub fn parameters(&self) -> JsonValue {
        let timestamp = json!({
            "type": "string",
            "description": "ISO-8601 date and time, e.g. 2024-05-01T19:00:00"
        });
        match self {
            Self::Recommend => json!({
                "type": "object",
                "properties": {
                    "cuisine": { "type": "string" },
                    "party_size": { "type": "integer" }
                },
                "required": ["party_size"]
            }),
            Self::CheckAvailability => json!({
                "type": "object",
                "properties": {
                    "restaurant_id": { "type": "integer" },
                    "timestamp": timestamp,
                    "party_size": { "type": "integer" }
                },
                "required": ["restaurant_id", "timestamp", "party_size"]
            }),
            Self::Book => json!({
                "type": "object",
                "properties": {
                    "restaurant_id": { "type": "integer" },
                    "customer_name": { "type": "string" },
                    "timestamp": timestamp,
                    "party_size": { "type": "integer" }
                },
                "required": ["restaurant_id", "customer_name", "timestamp", "party_size"]
            }),
        }
    }

    /// Returns the function schema sent to the model.
    #[must_use]
    pub fn schema(&self) -> FunctionSchema {
        FunctionSchema::new(self.name(), self.description(), self.parameters())
    }
}

/// Schemas for every tool.
#[must_use]
pub fn function_schemas() -> Vec<FunctionSchema> {
    ToolKind::ALL.iter().map(ToolKind::schema).collect()
}

/// Arguments for [`ToolKind::Recommend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendArgs {
    pub cuisine: Option<String>,
    pub party_size: u32,
}

/// Arguments for [`ToolKind::CheckAvailability`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityArgs {
    pub restaurant_id: RestaurantId,
    pub timestamp: NaiveDateTime,
    pub party_size: u32,
}

/// Arguments for [`ToolKind::Book`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingArgs {
    pub restaurant_id: RestaurantId,
    pub customer_name: String,
    pub timestamp: NaiveDateTime,
    pub party_size: u32,
}

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Recommend(RecommendArgs),
    CheckAvailability(AvailabilityArgs),
    Book(BookingArgs),
}

impl ToolCall {
    /// Resolves the tool and validates its arguments.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTool` or `InvalidArguments`.
    pub fn parse(name: &str, arguments: &JsonValue) -> Result<Self, ToolError> {
        let kind = ToolKind::from_name(name)?;
        let args = Arguments::new(kind, arguments)?;

        Ok(match kind {
            ToolKind::Recommend => Self::Recommend(RecommendArgs {
                cuisine: args.optional_string("cuisine")?,
                party_size: args.positive("party_size")?,
            }),
            ToolKind::CheckAvailability => Self::CheckAvailability(AvailabilityArgs {
                restaurant_id: args.restaurant_id()?,
                timestamp: args.timestamp("timestamp")?,
                party_size: args.positive("party_size")?,
            }),
            ToolKind::Book => Self::Book(BookingArgs {
                restaurant_id: args.restaurant_id()?,
                customer_name: args.required_string("customer_name")?,
                timestamp: args.timestamp("timestamp")?,
                party_size: args.positive("party_size")?,
            }),
        })
    }

    /// Returns which tool this invokes.
    #[must_use]
    pub fn kind(&self) -> ToolKind {
        match self {
            Self::Recommend(_) => ToolKind::Recommend,
            Self::CheckAvailability(_) => ToolKind::CheckAvailability,
            Self::Book(_) => ToolKind::Book,
        }
    }
}

/// Field reader over a tool's argument object.
struct Arguments<'a> {
    kind: ToolKind,
    object: &'a Map<String, JsonValue>,
}

impl<'a> Arguments<'a> {
    fn new(kind: ToolKind, value: &'a JsonValue) -> Result<Self, ToolError> {
        match value {
            JsonValue::Object(object) => Ok(Self { kind, object }),
            other => Err(ToolError::InvalidArguments {
                tool: kind.name().to_string(),
                field: "arguments".to_string(),
                reason: format!("expected an object, got {other}"),
            }),
        }
    }

    fn invalid(&self, field: &str, reason: impl Into<String>) -> ToolError {
        ToolError::InvalidArguments {
            tool: self.kind.name().to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    fn present(&self, field: &str) -> Option<&'a JsonValue> {
        self.object.get(field).filter(|v| !v.is_null())
    }

    fn required(&self, field: &str) -> Result<&'a JsonValue, ToolError> {
        self.present(field)
            .ok_or_else(|| self.invalid(field, "field is required"))
    }

    /// Integers may arrive as JSON numbers or as numeric strings.
    fn integer(&self, field: &str) -> Result<i64, ToolError> {
        let value = self.required(field)?;
        match value {
            JsonValue::Number(n) => n
                .as_i64()
                .ok_or_else(|| self.invalid(field, format!("expected an integer, got {n}"))),
            JsonValue::String(s) => s
                .trim()
                .parse()
                .map_err(|_| self.invalid(field, format!("expected an integer, got \"{s}\""))),
            other => Err(self.invalid(field, format!("expected an integer, got {other}"))),
        }
    }

    fn positive(&self, field: &str) -> Result<u32, ToolError> {
        let n = self.integer(field)?;
        u32::try_from(n)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| self.invalid(field, format!("must be a positive integer, got {n}")))
    }

    fn restaurant_id(&self) -> Result<RestaurantId, ToolError> {
        let n = self.integer("restaurant_id")?;
        if n <= 0 {
            return Err(self.invalid("restaurant_id", format!("must be positive, got {n}")));
        }
        Ok(RestaurantId::new(n))
    }

    fn optional_string(&self, field: &str) -> Result<Option<String>, ToolError> {
        match self.present(field) {
            None => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.invalid(field, format!("expected a string, got {other}"))),
        }
    }

    fn required_string(&self, field: &str) -> Result<String, ToolError> {
        match self.required(field)? {
            JsonValue::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            JsonValue::String(_) => Err(self.invalid(field, "must not be blank")),
            other => Err(self.invalid(field, format!("expected a string, got {other}"))),
        }
    }

    fn timestamp(&self, field: &str) -> Result<NaiveDateTime, ToolError> {
        match self.required(field)? {
            JsonValue::String(s) => parse_reservation_time(s)
                .ok_or_else(|| self.invalid(field, format!("'{s}' is not an ISO-8601 date-time"))),
            other => Err(self.invalid(field, format!("expected a string, got {other}"))),
        }
    }
}

/// Executes exactly one tool and serializes its result.
///
/// # Errors
///
/// Returns `Booking` if the tool fails.
#[instrument(skip(store, call), fields(tool = call.kind().name()))]
pub async fn dispatch(store: &dyn BookingStore, call: ToolCall) -> Result<JsonValue, ToolError> {
    let kind = call.kind();
    let result = match call {
        ToolCall::Recommend(args) => {
            let summaries = recommend(store, args.cuisine.as_deref(), args.party_size).await?;
            serde_json::to_value(summaries)
        }
        ToolCall::CheckAvailability(args) => {
            let availability =
                check_availability(store, args.restaurant_id, args.timestamp, args.party_size)
                    .await?;
            serde_json::to_value(availability)
        }
        ToolCall::Book(args) => {
            let confirmation = book(
                store,
                args.restaurant_id,
                &args.customer_name,
                args.timestamp,
                args.party_size,
            )
            .await?;
            serde_json::to_value(confirmation)
        }
    };

    let value = result.map_err(|e| ToolError::ResultEncoding {
        tool: kind.name().to_string(),
        reason: e.to_string(),
    })?;
    debug!(result = %value, "tool finished");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodiespot_booking::{BookingError, MemoryStore, NewRestaurant};

    fn invalid_field(err: ToolError) -> String {
        match err {
            ToolError::InvalidArguments { field, .. } => field,
            other => panic!("expected InvalidArguments, got {other:?}"),
        }
    }

    #[test]
    fn lookup_table_round_trips() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()).expect("known"), kind);
        }
    }

    #[test]
    fn unknown_tool_is_an_error() {
        let err = ToolCall::parse("cancel_reservation", &json!({})).unwrap_err();
        assert_eq!(
            err,
            ToolError::UnknownTool {
                name: "cancel_reservation".to_string()
            }
        );
    }

    #[test]
    fn schemas_declare_required_fields() {
        let schemas = function_schemas();
        assert_eq!(schemas.len(), 3);

        let book = schemas
            .iter()
            .find(|s| s.name == "booking_tool")
            .expect("booking schema");
        assert_eq!(
            book.parameters["required"],
            json!(["restaurant_id", "customer_name", "timestamp", "party_size"])
        );
        let recommend = &schemas[0];
        assert_eq!(recommend.name, "recommend_restaurants");
        assert_eq!(recommend.parameters["required"], json!(["party_size"]));
    }

    #[test]
    fn parses_recommend_with_optional_cuisine() {
        let call = ToolCall::parse("recommend_restaurants", &json!({"party_size": 2})).expect("parse");
        assert_eq!(
            call,
            ToolCall::Recommend(RecommendArgs {
                cuisine: None,
                party_size: 2
            })
        );

        let call = ToolCall::parse(
            "recommend_restaurants",
            &json!({"party_size": "3", "cuisine": "Mexican"}),
        )
        .expect("parse");
        assert_eq!(
            call,
            ToolCall::Recommend(RecommendArgs {
                cuisine: Some("Mexican".to_string()),
                party_size: 3
            })
        );
    }

    #[test]
    fn parses_booking() {
        let call = ToolCall::parse(
            "booking_tool",
            &json!({
                "restaurant_id": 1,
                "customer_name": " Ann ",
                "timestamp": "2024-05-01T19:00:00",
                "party_size": 4
            }),
        )
        .expect("parse");

        match call {
            ToolCall::Book(args) => {
                assert_eq!(args.restaurant_id, RestaurantId::new(1));
                assert_eq!(args.customer_name, "Ann");
                assert_eq!(args.timestamp.to_string(), "2024-05-01 19:00:00");
                assert_eq!(args.party_size, 4);
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let err = ToolCall::parse(
            "availability_tool",
            &json!({"restaurant_id": 1, "party_size": 2}),
        )
        .unwrap_err();
        assert_eq!(invalid_field(err), "timestamp");
    }

    #[test]
    fn wrong_types_are_rejected() {
        let err = ToolCall::parse("recommend_restaurants", &json!({"party_size": 2.5})).unwrap_err();
        assert_eq!(invalid_field(err), "party_size");

        let err = ToolCall::parse(
            "recommend_restaurants",
            &json!({"party_size": 2, "cuisine": 7}),
        )
        .unwrap_err();
        assert_eq!(invalid_field(err), "cuisine");

        let err = ToolCall::parse("booking_tool", &json!(["not", "an", "object"])).unwrap_err();
        assert_eq!(invalid_field(err), "arguments");
    }

    #[test]
    fn non_positive_values_are_rejected() {
        let err = ToolCall::parse("recommend_restaurants", &json!({"party_size": 0})).unwrap_err();
        assert_eq!(invalid_field(err), "party_size");

        let err = ToolCall::parse(
            "availability_tool",
            &json!({"restaurant_id": -1, "timestamp": "2024-05-01T19:00", "party_size": 2}),
        )
        .unwrap_err();
        assert_eq!(invalid_field(err), "restaurant_id");
    }

    #[test]
    fn blank_name_and_bad_timestamp_are_rejected() {
        let err = ToolCall::parse(
            "booking_tool",
            &json!({"restaurant_id": 1, "customer_name": "  ", "timestamp": "2024-05-01T19:00", "party_size": 2}),
        )
        .unwrap_err();
        assert_eq!(invalid_field(err), "customer_name");

        let err = ToolCall::parse(
            "booking_tool",
            &json!({"restaurant_id": 1, "customer_name": "Ann", "timestamp": "next friday", "party_size": 2}),
        )
        .unwrap_err();
        assert_eq!(invalid_field(err), "timestamp");
    }

    #[tokio::test]
    async fn dispatch_runs_the_named_tool() {
        let store = MemoryStore::new();
        store
            .insert_restaurant(NewRestaurant::new("Trattoria", "Zone 2", "Italian", 4, 4.5))
            .await
            .expect("seed");

        let call = ToolCall::parse("recommend_restaurants", &json!({"cuisine": "italian", "party_size": 2}))
            .expect("parse");
        let result = dispatch(&store, call).await.expect("dispatch");

        assert_eq!(
            result,
            json!([{"id": 1, "name": "Trattoria", "location": "Zone 2", "cuisine": "Italian", "rating": 4.5}])
        );
    }

    #[tokio::test]
    async fn dispatch_surfaces_not_found() {
        let store = MemoryStore::new();
        let call = ToolCall::parse(
            "availability_tool",
            &json!({"restaurant_id": 8, "timestamp": "2024-05-01T19:00", "party_size": 2}),
        )
        .expect("parse");

        let err = dispatch(&store, call).await.unwrap_err();

        assert_eq!(
            err,
            ToolError::Booking(BookingError::RestaurantNotFound {
                id: RestaurantId::new(8)
            })
        );
    }
}
