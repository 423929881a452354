//! Weather lookup via WeatherAPI

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{fetch_json, field, show};
use crate::registry::{BuiltinTool, HandlerError, ParamSpec, ToolArgs, ToolContext, ToolSpec};

/// WeatherAPI serves at most 14 forecast days
const MAX_FORECAST_DAYS: i64 = 14;

/// `get_weather(city, current, forecast, days, forecast_type, day_for_hourly)`
///
/// Current conditions and forecasts are rendered as small CSV-like tables
/// (header line plus one row per period) to keep the model's context short.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeatherTool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ForecastType {
    Daily,
    Hourly,
}

#[async_trait]
impl BuiltinTool for WeatherTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "get_weather",
            "Fetches current weather and/or a forecast for a city from WeatherAPI.",
        )
        .param(ParamSpec::string("city", "City name"))
        .param(ParamSpec::boolean("current", "Include current conditions").with_default(true))
        .param(ParamSpec::boolean("forecast", "Include a forecast").with_default(false))
        .param(
            ParamSpec::integer(
                "days",
                "Total forecast days. For an hourly forecast it must exceed day_for_hourly.",
            )
            .with_default(1)
            .range(Some(1), Some(MAX_FORECAST_DAYS)),
        )
        .param(
            ParamSpec::string("forecast_type", "Forecast granularity, used when forecast=true")
                .with_default("daily")
                .one_of(["daily", "hourly"]),
        )
        .param(
            ParamSpec::integer(
                "day_for_hourly",
                "Day for the hourly forecast: 0 is today, 1 is tomorrow, and so on",
            )
            .with_default(0)
            .range(None, Some(MAX_FORECAST_DAYS - 1)),
        )
    }

    async fn run(&self, args: ToolArgs, ctx: &ToolContext) -> Result<Value, HandlerError> {
        let city = args.get_str("city")?;
        let current = args.get_bool("current")?;
        let forecast = args.get_bool("forecast")?;
        let forecast_type = match args.get_str("forecast_type")? {
            "hourly" => ForecastType::Hourly,
            _ => ForecastType::Daily,
        };
        let day_for_hourly = args.get_i64("day_for_hourly")?;
        let mut days = args.get_i64("days")?;

        if forecast_type == ForecastType::Hourly {
            if day_for_hourly < 0 {
                return Err(HandlerError::invalid(
                    "day_for_hourly",
                    "cannot be negative",
                ));
            }
            if day_for_hourly >= days {
                days = day_for_hourly + 1;
                ctx.logger().debug(&format!(
                    "[get_weather] Adjusted forecast days to {} for hourly request",
                    days
                ));
            }
        }

        if !current && !forecast {
            return Err(HandlerError::failed(NOTHING_REQUESTED));
        }

        let key = ctx.credential("weather", &ctx.config().credentials.weather)?;
        let base = ctx.config().endpoints.weather.trim_end_matches('/');

        let current_data = if current {
            let request = ctx
                .http()
                .get(format!("{}/current.json", base))
                .query(&[("key", key), ("q", city), ("aqi", "yes")]);
            Some(fetch_json(request, "WeatherAPI").await.and_then(|body| format_current(&body)))
        } else {
            None
        };

        let forecast_data = if forecast {
            let days = days.to_string();
            let request = ctx.http().get(format!("{}/forecast.json", base)).query(&[
                ("key", key),
                ("q", city),
                ("aqi", "yes"),
                ("days", days.as_str()),
            ]);
            Some(
                fetch_json(request, "WeatherAPI")
                    .await
                    .and_then(|body| match forecast_type {
                        ForecastType::Daily => format_daily(&body),
                        ForecastType::Hourly => format_hourly(&body, day_for_hourly as usize),
                    }),
            )
        } else {
            None
        };

        match (current_data, forecast_data) {
            (Some(current), None) => Ok(json!({ "current": current? })),
            (None, Some(forecast)) => Ok(json!({ "forecast": forecast? })),
            (Some(Err(c)), Some(Err(f))) => Err(HandlerError::upstream(format!(
                "Failed to get current weather data ({}); failed to get forecast data ({})",
                c, f
            ))),
            // A partial answer is still useful to the model
            (Some(current), Some(forecast)) => Ok(json!({
                "current": current
                    .unwrap_or_else(|e| format!("Failed to get current weather data: {}", e)),
                "forecast": forecast
                    .unwrap_or_else(|e| format!("Failed to get forecast weather data: {}", e)),
            })),
            (None, None) => Err(HandlerError::failed(NOTHING_REQUESTED)),
        }
    }
}

const NOTHING_REQUESTED: &str = "Either current or forecast (or both) must be true";

fn format_current(body: &Value) -> Result<String, HandlerError> {
    let data = field(body, "current")?;
    let updated = show(field(data, "last_updated")?);
    // "2025-06-01 14:30" → "14:30"
    let updated = updated.split(' ').nth(1).unwrap_or(&updated).to_string();
    let condition = show(field(field(data, "condition")?, "text")?);

    let row = [
        updated,
        show(field(data, "temp_c")?),
        show(field(data, "wind_kph")?),
        show(field(data, "pressure_in")?),
        show(field(data, "humidity")?),
        show(field(data, "vis_km")?),
        show(field(data, "precip_mm")?),
        show(field(data, "uv")?),
        condition,
        air_quality(data.get("air_quality")).to_string(),
    ];
    Ok(format!(
        "last_updated, temp_c, wind_kph, pressure_in, humidity, visibility_km, precipitation_mm, uv, condition, air_quality\n{}",
        row.join(", ")
    ))
}

fn format_daily(body: &Value) -> Result<String, HandlerError> {
    let days = forecast_days(body)?;
    let mut lines = vec![
        "date, avg_temp_c, max_temp_c, min_temp_c, max_wind_kph, avg_humidity, avg_visibility, daily_chance_of_rain, uv, condition, precipitation_mm, snow_cm, air_quality"
            .to_string(),
    ];
    for day in days {
        let d = field(day, "day")?;
        let row = [
            show(field(day, "date")?),
            show(field(d, "avgtemp_c")?),
            show(field(d, "maxtemp_c")?),
            show(field(d, "mintemp_c")?),
            show(field(d, "maxwind_kph")?),
            show(field(d, "avghumidity")?),
            show(field(d, "avgvis_km")?),
            show(field(d, "daily_chance_of_rain")?),
            show(field(d, "uv")?),
            show(field(field(d, "condition")?, "text")?),
            show(field(d, "totalprecip_mm")?),
            show(field(d, "totalsnow_cm")?),
            air_quality(d.get("air_quality")).to_string(),
        ];
        lines.push(row.join(", "));
    }
    Ok(lines.join("\n"))
}

fn format_hourly(body: &Value, day: usize) -> Result<String, HandlerError> {
    let days = forecast_days(body)?;
    let selected = days.get(day).ok_or_else(|| {
        HandlerError::upstream(format!(
            "forecast has {} day(s); day_for_hourly {} is out of range",
            days.len(),
            day
        ))
    })?;
    let hours = field(selected, "hour")?
        .as_array()
        .ok_or_else(|| HandlerError::upstream("unexpected response: 'hour' is not a list"))?;

    let mut lines = vec![
        "date, hour, temp_c, wind_kph, humidity, visibility_km, precipitation_mm, uv, condition, will_it_rain, will_it_snow, snow_cm, air_quality"
            .to_string(),
    ];
    for hour in hours {
        let time = show(field(hour, "time")?);
        let (date, clock) = time.split_once(' ').unwrap_or((time.as_str(), ""));
        let row = [
            date.to_string(),
            clock.to_string(),
            show(field(hour, "temp_c")?),
            show(field(hour, "wind_kph")?),
            show(field(hour, "humidity")?),
            show(field(hour, "vis_km")?),
            show(field(hour, "precip_mm")?),
            show(field(hour, "uv")?),
            show(field(field(hour, "condition")?, "text")?),
            show(field(hour, "will_it_rain")?),
            show(field(hour, "will_it_snow")?),
            show(field(hour, "snow_cm")?),
            air_quality(hour.get("air_quality")).to_string(),
        ];
        lines.push(row.join(", "));
    }
    Ok(lines.join("\n"))
}

fn forecast_days(body: &Value) -> Result<&Vec<Value>, HandlerError> {
    field(field(body, "forecast")?, "forecastday")?
        .as_array()
        .ok_or_else(|| HandlerError::upstream("unexpected response: 'forecastday' is not a list"))
}

const QUALITY_LEVELS: [&str; 5] = ["Good", "Fair", "Moderate", "Poor", "Very Poor"];

/// Upper bounds (exclusive) per level for SO2, NO2, PM10, PM2.5, O3, CO;
/// "Very Poor" is unbounded
const QUALITY_BOUNDS: [[f64; 4]; 6] = [
    [20.0, 80.0, 250.0, 350.0],
    [40.0, 70.0, 150.0, 200.0],
    [20.0, 50.0, 100.0, 200.0],
    [10.0, 25.0, 50.0, 75.0],
    [60.0, 100.0, 140.0, 180.0],
    [4400.0, 9400.0, 12400.0, 15400.0],
];

const POLLUTANTS: [&str; 6] = ["so2", "no2", "pm10", "pm2_5", "o3", "co"];

/// Classify an `air_quality` block by its worst pollutant
fn air_quality(block: Option<&Value>) -> &'static str {
    let Some(block) = block else {
        return "N/A";
    };

    let mut worst = 0;
    for (pollutant, bounds) in POLLUTANTS.iter().zip(QUALITY_BOUNDS.iter()) {
        let Some(value) = block.get(*pollutant).and_then(Value::as_f64) else {
            return "Invalid Data";
        };
        if value.is_nan() || value < 0.0 {
            return "Invalid Data";
        }
        let value = (value * 1000.0).round() / 1000.0;
        let level = bounds
            .iter()
            .position(|upper| value < *upper)
            .unwrap_or(QUALITY_LEVELS.len() - 1);
        worst = worst.max(level);
    }
    QUALITY_LEVELS[worst]
}
