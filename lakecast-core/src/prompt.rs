//! Builds the text prompt sent to the language model.
//!
//! The wording lives in a template with named `{placeholders}`; the style
//! parameters that fill it come from [`StyleConfig`] so persona, palettes and
//! length can change without touching code.

use std::{collections::HashMap, sync::LazyLock};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use regex::{Captures, Regex};

use crate::{
    config::{Config, StyleConfig},
    model::{CurrentConditions, ForecastPeriod, WeatherSnapshot},
};

pub const DEFAULT_TEMPLATE: &str = "\
Here are the current conditions in {location}:
{current_conditions}
Below is the weather forecast for {location}:
{forecast_periods}

Current local date and time: {current_time}

Considering this image and the weather forecast, assess the weather, looking
for where any precipitation is, the clarity of the day, and more. The image is
{scene}.

Considering your assessment, write a weather report for {location} covering
current conditions, the expected weather for the day, how pleasant the scene
looks, wave conditions, precipitation, recommended attire, whether the
temperature is typical for the season and region, and suggested activities for
the day, time and place. If today is a major U.S. or religious holiday, or
election day, mention it; otherwise mention a holiday only if one is coming up
in the next few days or weeks.

Take care not to mistake the current conditions for the upcoming forecast.

Style guidelines:

- Write one or two plain paragraphs, with no headers, bullet points or
  exclamation marks
- Don't refer to the image as an input
- Describe the wind with words like {wind_words} rather than a speed
- Describe how the air feels, combining temperature and humidity, with phrases
  like {humidity_words} rather than a humidity figure; the comfort matrix below
  shows which applies
- Give temperatures by where they fall in the tens (\"high 70s\" for 79, \"low
  40s\" for 42) rather than exact numbers
- Prefer evocative words to figures, without becoming flowery
- Write in the voice of {persona}, suitable for reading on classical radio
- Keep the report under {word_limit} words

After the weather report, provide an HTML color code that best represents the
forecast, the time of day and the image. Output only the hex code, on a line by
itself, and do not mention the color code anywhere else in the report.

Comfort matrix (temperature in F, relative humidity in %):
{comfort_matrix}
";

/// Temperature and humidity bands mapped to how the air feels.
pub const COMFORT_MATRIX: &[(&str, &str, &str)] = &[
    ("cold", "<=40", "Cold, humidity less relevant"),
    ("chilly", "41-50", "Chilly"),
    ("cool_dry", "51-65, RH<40", "Cool & crisp"),
    ("cool", "51-65, RH>=40", "Pleasant & cool"),
    ("comfortable_dry", "66-75, RH<40", "Perfect conditions"),
    ("comfortable", "66-75, RH<60", "Ideal comfort"),
    ("warm_humid", "66-75, RH>=60", "Slightly muggy"),
    ("warm_dry", "76-85, RH<40", "Warm but manageable"),
    ("warm_sticky", "76-85, RH<60", "Warm and sticky"),
    ("hot_humid", "76-85, RH>=60", "Uncomfortably humid"),
    ("hot_dry", ">85, RH<40", "Very hot"),
    ("dangerous", ">85, RH>=40", "Oppressively humid"),
];

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"));

/// Local time in the monitored zone, e.g. `2024-05-01 09:30:00 CDT`.
pub fn format_local_time(now: &DateTime<Tz>) -> String {
    now.format("%Y-%m-%d %H:%M:%S %Z").to_string()
}

pub fn local_now(tz: Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(&tz)
}

fn reading(value: Option<f64>) -> String {
    value.map_or_else(|| "unavailable".to_string(), |v| format!("{v:.1}"))
}

pub fn format_current_conditions(c: &CurrentConditions) -> String {
    let description = if c.description.is_empty() { "unavailable" } else { &c.description };
    format!(
        "- Temperature (F): {}\n\
         - Humidity (%): {}\n\
         - Wind speed (MPH): {}\n\
         - Wind direction (degrees): {}\n\
         - Description: {}\n",
        reading(c.temperature_f),
        reading(c.humidity),
        reading(c.wind_speed_mph),
        reading(c.wind_direction),
        description,
    )
}

pub fn format_forecast_periods(periods: &[ForecastPeriod]) -> String {
    periods
        .iter()
        .map(|p| format!(" - {}: {}", p.name, p.detailed_forecast))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_comfort_matrix() -> String {
    COMFORT_MATRIX
        .iter()
        .map(|(label, range, feel)| format!("- {label} ({range}): {feel}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Substitute `{name}` placeholders in one pass. Unknown names are left as-is,
/// and substituted text is never scanned again.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[derive(Debug, Clone)]
pub struct ReportComposer {
    template: String,
    style: StyleConfig,
    location_name: String,
    tz: Tz,
}

impl ReportComposer {
    pub fn new(style: StyleConfig, location_name: impl Into<String>, tz: Tz) -> Self {
        let template = style.template.clone().unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
        Self { template, style, location_name: location_name.into(), tz }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(config.style.clone(), config.location.name.clone(), config.timezone()?))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn compose(&self, snapshot: &WeatherSnapshot) -> String {
        self.compose_at(snapshot, &local_now(self.tz))
    }

    pub fn compose_at(&self, snapshot: &WeatherSnapshot, now: &DateTime<Tz>) -> String {
        let quoted = |words: &[String]| {
            words.iter().map(|w| format!("\"{w}\"")).collect::<Vec<_>>().join(", ")
        };

        let vars: HashMap<&str, String> = HashMap::from([
            ("location", self.location_name.clone()),
            ("scene", self.style.scene.clone()),
            ("current_conditions", format_current_conditions(&snapshot.current_conditions)),
            ("forecast_periods", format_forecast_periods(&snapshot.forecast)),
            ("current_time", format_local_time(now)),
            ("persona", self.style.persona.clone()),
            ("word_limit", self.style.word_limit.to_string()),
            ("wind_words", quoted(&self.style.wind_words)),
            ("humidity_words", quoted(&self.style.humidity_words)),
            ("comfort_matrix", format_comfort_matrix()),
        ]);

        let prompt = render(&self.template, &vars).trim().to_string();
        log::debug!("Composed prompt ({} chars)", prompt.len());
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Location;
    use chrono::TimeZone;
    use chrono_tz::America::Chicago;

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            location: Location {
                name: "Evanston".into(),
                state: "IL".into(),
                latitude: 42.032931,
                longitude: -87.680432,
            },
            current_conditions: CurrentConditions {
                timestamp: "2024-05-01T14:51:00+00:00".into(),
                temperature_f: Some(50.0),
                temperature_c: Some(10.0),
                humidity: Some(64.5),
                wind_speed_mph: Some(11.185),
                wind_direction: None,
                description: "Partly Cloudy".into(),
            },
            forecast: vec![
                ForecastPeriod {
                    name: "Today".into(),
                    detailed_forecast: "Sunny, with a high near 58.".into(),
                    extra: Default::default(),
                },
                ForecastPeriod {
                    name: "Tonight".into(),
                    detailed_forecast: "Clear, low around 41.".into(),
                    extra: Default::default(),
                },
            ],
        }
    }

    fn at() -> DateTime<Tz> {
        Chicago.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn local_time_is_zone_qualified() {
        assert_eq!(format_local_time(&at()), "2024-05-01 09:30:00 CDT");
        let winter = Chicago.with_ymd_and_hms(2024, 1, 15, 18, 0, 0).unwrap();
        assert_eq!(format_local_time(&winter), "2024-01-15 18:00:00 CST");
    }

    #[test]
    fn conditions_mark_missing_readings() {
        let text = format_current_conditions(&snapshot().current_conditions);

        assert!(text.contains("- Temperature (F): 50.0\n"));
        assert!(text.contains("- Humidity (%): 64.5\n"));
        assert!(text.contains("- Wind speed (MPH): 11.2\n"));
        assert!(text.contains("- Wind direction (degrees): unavailable\n"));
        assert!(text.contains("- Description: Partly Cloudy\n"));
    }

    #[test]
    fn forecast_periods_render_one_line_each() {
        assert_eq!(
            format_forecast_periods(&snapshot().forecast),
            " - Today: Sunny, with a high near 58.\n - Tonight: Clear, low around 41."
        );
    }

    #[test]
    fn render_is_single_pass_and_keeps_unknowns() {
        let vars = HashMap::from([("a", "{b}".to_string()), ("b", "B".to_string())]);
        assert_eq!(render("{a}|{b}|{c}", &vars), "{b}|B|{c}");
    }

    #[test]
    fn custom_template_controls_shape() {
        let style = StyleConfig {
            template: Some("{location} @ {current_time}\n{forecast_periods}\n<={word_limit}".into()),
            word_limit: 120,
            ..StyleConfig::default()
        };
        let composer = ReportComposer::new(style, "Evanston, Illinois", Chicago);

        let prompt = composer.compose_at(&snapshot(), &at());

        assert_eq!(
            prompt,
            "Evanston, Illinois @ 2024-05-01 09:30:00 CDT\n\
             \x20- Today: Sunny, with a high near 58.\n\
             \x20- Tonight: Clear, low around 41.\n\
             <=120"
        );
    }

    #[test]
    fn default_template_fills_every_placeholder() {
        let composer = ReportComposer::new(StyleConfig::default(), "Evanston, Illinois", Chicago);

        let prompt = composer.compose_at(&snapshot(), &at());

        assert!(!PLACEHOLDER.is_match(&prompt), "unfilled placeholder in:\n{prompt}");
        assert!(prompt.starts_with("Here are the current conditions in Evanston, Illinois:"));
        assert!(prompt.contains("Current local date and time: 2024-05-01 09:30:00 CDT"));
        assert!(prompt.contains(" - Tonight: Clear, low around 41."));
        assert!(prompt.contains("under 500 words"));
        assert!(prompt.contains("\"blustery\""));
        assert!(prompt.contains("- dangerous (>85, RH>=40): Oppressively humid"));
        assert!(prompt.ends_with("Oppressively humid"));
    }

    #[test]
    fn compose_is_deterministic_for_fixed_time() {
        let composer = ReportComposer::new(StyleConfig::default(), "Evanston", Chicago);
        assert_eq!(composer.compose_at(&snapshot(), &at()), composer.compose_at(&snapshot(), &at()));
    }
}
