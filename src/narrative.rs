//! # Narrative Generation
//!
//! Turns a score and its conditions into a one-sentence summary and a
//! one-sentence recommendation.
//!
//! ## Strategies
//! - **Language model**: when the [`Narrator`] holds a model, it sends a forecaster
//!   prompt with every condition (plus feet, mph and compass conversions) and
//!   reads back a `{"summary", "recommendation"}` JSON object
//! - **Templates**: score-banded sentences, used when no model is configured and
//!   whenever the model call fails, times out, or returns something unparseable
//!
//! Narration never fails; model problems are logged and replaced by templates.

use crate::llm::{LanguageModel, LlmError};
use crate::scoring::ScoreBand;
use crate::{ConditionsRecord, Difficulty};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const SYSTEM_PROMPT: &str =
    "You are a professional surf forecaster providing brief, accurate surf condition assessments.";

pub const METERS_TO_FEET: f64 = 3.28;
pub const MS_TO_MPH: f64 = 2.237;

const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Summary and recommendation text for a scored spot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub summary: String,
    pub recommendation: String,
}

/// 8-point compass label for a bearing in degrees.
pub fn direction_label(degrees: f64) -> &'static str {
    let index = (degrees / 45.0).round() as i64;
    COMPASS[index.rem_euclid(8) as usize]
}

/// Forecaster prompt embedding the spot, score and all conditions.
pub fn build_prompt(conditions: &ConditionsRecord, score: u8) -> String {
    let rating_line = conditions
        .user_rating
        .map(|r| format!("- User Rating: {r}/5 stars\n"))
        .unwrap_or_default();

    format!(
        r#"You are a professional surf forecaster. Analyze the following surf conditions and provide a brief summary and recommendation.

Surf Spot: {spot}
Difficulty Level: {difficulty}
Overall Score: {score}/100

Current Conditions:
- Wave Height: {wave_m:.1}m ({wave_ft:.1}ft)
- Wave Period: {period:.0} seconds
- Wave Direction: {wave_dir}
- Tide: {tide:.2}m ({phase})
- Wind Speed: {wind_ms:.1} m/s ({wind_mph:.1} mph)
- Wind Direction: {wind_dir}
{rating_line}
Please provide:
1. A one-sentence summary of the conditions (max 150 characters)
2. A one-sentence recommendation for surfers (max 150 characters)

Format your response as JSON:
{{
  "summary": "your summary here",
  "recommendation": "your recommendation here"
}}"#,
        spot = conditions.spot_name,
        difficulty = conditions.difficulty,
        wave_m = conditions.wave_height,
        wave_ft = conditions.wave_height * METERS_TO_FEET,
        period = conditions.wave_period,
        wave_dir = direction_label(conditions.wave_direction),
        tide = conditions.tide_height,
        phase = conditions.tide_phase,
        wind_ms = conditions.wind_speed,
        wind_mph = conditions.wind_speed * MS_TO_MPH,
        wind_dir = direction_label(conditions.wind_direction),
    )
}

/// First balanced `{...}` block in `text`, skipping braces inside JSON strings.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Read a narrative out of model output.
///
/// A field that is missing or blank is taken from `fallback`; output with
/// neither field is rejected.
pub fn parse_narrative(text: &str, fallback: &Narrative) -> Result<Narrative, LlmError> {
    let json = extract_json(text).ok_or_else(|| LlmError::Parse("no JSON object found".into()))?;
    let value: Value = serde_json::from_str(json).map_err(|e| LlmError::Parse(e.to_string()))?;

    let field = |name: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    match (field("summary"), field("recommendation")) {
        (None, None) => Err(LlmError::Parse(
            "missing summary and recommendation".into(),
        )),
        (summary, recommendation) => Ok(Narrative {
            summary: summary.unwrap_or_else(|| fallback.summary.clone()),
            recommendation: recommendation.unwrap_or_else(|| fallback.recommendation.clone()),
        }),
    }
}

/// Score-banded summary sentence. Wind speed is printed as reported, with the `mph` label.
pub fn template_summary(score: u8, conditions: &ConditionsRecord) -> String {
    let height = conditions.wave_height;
    let period = conditions.wave_period;
    let wind = conditions.wind_speed;

    match ScoreBand::from_score(score) {
        ScoreBand::Excellent => format!(
            "Excellent conditions! {height:.1}m waves with {period:.0}s period and light {wind:.0}mph winds."
        ),
        ScoreBand::Good => format!(
            "Good surfing conditions. {height:.1}m waves, {period:.0}s period, {wind:.0}mph winds."
        ),
        ScoreBand::Fair => format!(
            "Fair conditions. {height:.1}m waves at {period:.0}s period with {wind:.0}mph winds. Conditions could be better."
        ),
        ScoreBand::Poor => format!(
            "Poor conditions. Small {height:.1}m waves at {period:.0}s period and/or strong {wind:.0}mph winds."
        ),
    }
}

/// Score-banded recommendation sentence for the spot's difficulty.
pub fn template_recommendation(score: u8, difficulty: Difficulty) -> String {
    match ScoreBand::from_score(score) {
        ScoreBand::Excellent => {
            format!("Perfect day to surf! Conditions are ideal for {difficulty} surfers.")
        }
        ScoreBand::Good => format!("Go surf! Good conditions for {difficulty} level."),
        ScoreBand::Fair => {
            let level = match difficulty {
                Difficulty::Beginner => Difficulty::Intermediate,
                other => other,
            };
            format!("Surfable but not ideal. Best for experienced {level} surfers.")
        }
        ScoreBand::Poor => format!(
            "Consider waiting for better conditions. Not recommended for {difficulty} surfers today."
        ),
    }
}

/// Deterministic narrative from the templates.
pub fn templated(conditions: &ConditionsRecord, score: u8) -> Narrative {
    Narrative {
        summary: template_summary(score, conditions),
        recommendation: template_recommendation(score, conditions.difficulty),
    }
}

/// Produces narratives, preferring a language model when one is configured.
#[derive(Clone)]
pub struct Narrator {
    model: Option<Arc<dyn LanguageModel>>,
    timeout: Duration,
}

impl Narrator {
    /// `model = None` selects template narratives; `timeout` bounds each model call.
    pub fn new(model: Option<Arc<dyn LanguageModel>>, timeout: Duration) -> Self {
        Narrator { model, timeout }
    }

    /// Narrator that only uses templates.
    pub fn templated() -> Self {
        Narrator::new(None, Duration::ZERO)
    }

    pub fn uses_model(&self) -> bool {
        self.model.is_some()
    }

    pub async fn narrate(&self, conditions: &ConditionsRecord, score: u8) -> Narrative {
        let fallback = templated(conditions, score);

        let Some(model) = &self.model else {
            debug!("no language model configured, using template narrative");
            return fallback;
        };

        match self.generate(model.as_ref(), conditions, score, &fallback).await {
            Ok(narrative) => narrative,
            Err(e) => {
                warn!(model = model.name(), error = %e, "narrative generation failed, using templates");
                fallback
            }
        }
    }

    async fn generate(
        &self,
        model: &dyn LanguageModel,
        conditions: &ConditionsRecord,
        score: u8,
        fallback: &Narrative,
    ) -> Result<Narrative, LlmError> {
        let prompt = build_prompt(conditions, score);
        let text = tokio::time::timeout(self.timeout, model.complete(SYSTEM_PROMPT, &prompt))
            .await
            .map_err(|_| LlmError::Timeout(self.timeout))??;

        parse_narrative(&text, fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TidePhase;
    use async_trait::async_trait;

    fn conditions(difficulty: Difficulty) -> ConditionsRecord {
        ConditionsRecord {
            wave_height: 2.04,
            wave_direction: 250.0,
            wave_period: 14.2,
            tide_height: 1.234,
            tide_phase: TidePhase::Rising,
            wind_speed: 8.0,
            wind_direction: 10.0,
            user_rating: None,
            spot_name: "Trestles".to_string(),
            difficulty,
            offline: false,
        }
    }

    struct CannedModel(&'static str);

    #[async_trait]
    impl LanguageModel for CannedModel {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl LanguageModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        }
    }

    struct SlowModel;

    #[async_trait]
    impl LanguageModel for SlowModel {
        fn name(&self) -> &str {
            "slow"
        }

        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(r#"{"summary": "late", "recommendation": "late"}"#.to_string())
        }
    }

    fn narrator(model: impl LanguageModel + 'static) -> Narrator {
        Narrator::new(Some(Arc::new(model)), Duration::from_millis(100))
    }

    #[test]
    fn compass_labels() {
        assert_eq!(direction_label(0.0), "N");
        assert_eq!(direction_label(22.0), "N");
        assert_eq!(direction_label(23.0), "NE");
        assert_eq!(direction_label(90.0), "E");
        assert_eq!(direction_label(180.0), "S");
        assert_eq!(direction_label(250.0), "W");
        assert_eq!(direction_label(315.0), "NW");
        assert_eq!(direction_label(350.0), "N");
        assert_eq!(direction_label(-45.0), "NW");
    }

    #[test]
    fn prompt_embeds_conversions() {
        let mut c = conditions(Difficulty::Intermediate);
        c.user_rating = Some(4);
        let prompt = build_prompt(&c, 87);

        assert!(prompt.contains("Surf Spot: Trestles"));
        assert!(prompt.contains("Difficulty Level: intermediate"));
        assert!(prompt.contains("Overall Score: 87/100"));
        assert!(prompt.contains("- Wave Height: 2.0m (6.7ft)"));
        assert!(prompt.contains("- Wave Period: 14 seconds"));
        assert!(prompt.contains("- Wave Direction: W"));
        assert!(prompt.contains("- Tide: 1.23m (rising)"));
        assert!(prompt.contains("- Wind Speed: 8.0 m/s (17.9 mph)"));
        assert!(prompt.contains("- Wind Direction: N"));
        assert!(prompt.contains("- User Rating: 4/5 stars"));
        assert!(prompt.contains("\"recommendation\": \"your recommendation here\""));
    }

    #[test]
    fn prompt_omits_missing_rating() {
        let prompt = build_prompt(&conditions(Difficulty::Beginner), 60);
        assert!(!prompt.contains("User Rating"));
    }

    #[test]
    fn extract_json_finds_first_balanced_object() {
        let text = r#"Sure! {"summary": "a {b} c", "recommendation": "d"} and {"other": 1}"#;
        assert_eq!(
            extract_json(text),
            Some(r#"{"summary": "a {b} c", "recommendation": "d"}"#)
        );
    }

    #[test]
    fn extract_json_handles_nesting_and_escapes() {
        let text = r#"```json
{"summary": "say \"hi\" }", "meta": {"x": 1}, "recommendation": "go"}
```"#;
        let json = extract_json(text).unwrap();
        let value: Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["recommendation"], "go");
    }

    #[test]
    fn extract_json_rejects_unbalanced() {
        assert_eq!(extract_json("no braces here"), None);
        assert_eq!(extract_json(r#"{"summary": "cut off"#), None);
    }

    #[test]
    fn parse_fills_missing_field_from_fallback() {
        let fallback = Narrative {
            summary: "fallback summary".into(),
            recommendation: "fallback recommendation".into(),
        };
        let parsed = parse_narrative(r#"{"summary": "Clean lines."}"#, &fallback).unwrap();
        assert_eq!(parsed.summary, "Clean lines.");
        assert_eq!(parsed.recommendation, "fallback recommendation");

        assert!(parse_narrative(r#"{"mood": "stoked"}"#, &fallback).is_err());
        assert!(parse_narrative(r#"{"summary": 5, "recommendation": ""}"#, &fallback).is_err());
        assert!(parse_narrative("not json", &fallback).is_err());
    }

    #[test]
    fn excellent_band_templates() {
        let n = templated(&conditions(Difficulty::Intermediate), 90);
        assert_eq!(
            n.summary,
            "Excellent conditions! 2.0m waves with 14s period and light 8mph winds."
        );
        assert_eq!(
            n.recommendation,
            "Perfect day to surf! Conditions are ideal for intermediate surfers."
        );
    }

    #[test]
    fn good_band_templates() {
        let n = templated(&conditions(Difficulty::Advanced), 60);
        assert_eq!(
            n.summary,
            "Good surfing conditions. 2.0m waves, 14s period, 8mph winds."
        );
        assert_eq!(n.recommendation, "Go surf! Good conditions for advanced level.");
    }

    #[test]
    fn fair_band_promotes_beginner_to_intermediate() {
        let n = templated(&conditions(Difficulty::Beginner), 30);
        assert_eq!(
            n.summary,
            "Fair conditions. 2.0m waves at 14s period with 8mph winds. Conditions could be better."
        );
        assert_eq!(
            n.recommendation,
            "Surfable but not ideal. Best for experienced intermediate surfers."
        );

        let expert = template_recommendation(30, Difficulty::Expert);
        assert_eq!(
            expert,
            "Surfable but not ideal. Best for experienced expert surfers."
        );
    }

    #[test]
    fn poor_band_templates() {
        let n = templated(&conditions(Difficulty::Expert), 10);
        assert_eq!(
            n.summary,
            "Poor conditions. Small 2.0m waves at 14s period and/or strong 8mph winds."
        );
        assert_eq!(
            n.recommendation,
            "Consider waiting for better conditions. Not recommended for expert surfers today."
        );
    }

    #[test]
    fn template_wind_is_not_converted() {
        let mut c = conditions(Difficulty::Expert);
        c.wave_height = 0.5;
        c.wave_period = 8.0;
        c.wind_speed = 25.0;
        assert_eq!(
            template_summary(0, &c),
            "Poor conditions. Small 0.5m waves at 8s period and/or strong 25mph winds."
        );
    }

    #[tokio::test]
    async fn without_model_uses_templates() {
        let c = conditions(Difficulty::Intermediate);
        let narrator = Narrator::templated();
        assert!(!narrator.uses_model());
        assert_eq!(narrator.narrate(&c, 80).await, templated(&c, 80));
    }

    #[tokio::test]
    async fn model_output_is_used() {
        let c = conditions(Difficulty::Intermediate);
        let narrator = narrator(CannedModel(
            "Here you go:\n{\"summary\": \"Head-high and glassy.\", \"recommendation\": \"Paddle out now.\"}",
        ));

        let n = narrator.narrate(&c, 80).await;
        assert_eq!(n.summary, "Head-high and glassy.");
        assert_eq!(n.recommendation, "Paddle out now.");
    }

    #[tokio::test]
    async fn failing_model_falls_back_to_templates() {
        let c = conditions(Difficulty::Beginner);
        for score in [95, 60, 40, 5] {
            assert_eq!(
                narrator(FailingModel).narrate(&c, score).await,
                templated(&c, score)
            );
        }
    }

    #[tokio::test]
    async fn unparseable_model_output_falls_back() {
        let c = conditions(Difficulty::Advanced);
        let n = narrator(CannedModel("I think the surf is pretty good today."))
            .narrate(&c, 55)
            .await;
        assert_eq!(n, templated(&c, 55));
    }

    #[tokio::test]
    async fn slow_model_times_out() {
        let c = conditions(Difficulty::Advanced);
        let n = narrator(SlowModel).narrate(&c, 55).await;
        assert_eq!(n, templated(&c, 55));
    }
}
