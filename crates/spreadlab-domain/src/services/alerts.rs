use crate::services::sanitize::AnalyticsPayload;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertMetric {
    #[default]
    ZScore,
}

impl AlertMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertMetric::ZScore => "z_score",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertOperator {
    #[serde(rename = ">")]
    Above,
    #[serde(rename = "<")]
    Below,
}

impl AlertOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertOperator::Above => ">",
            AlertOperator::Below => "<",
        }
    }

    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            AlertOperator::Above => value > threshold,
            AlertOperator::Below => value < threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertRule {
    #[serde(default)]
    pub metric: AlertMetric,
    pub operator: AlertOperator,
    pub threshold: f64,
}

impl AlertRule {
    pub fn describe(&self) -> String {
        format!(
            "{} {} {}",
            self.metric.as_str(),
            self.operator.as_str(),
            self.threshold
        )
    }
}

pub fn default_alert_rules() -> Vec<AlertRule> {
    vec![
        AlertRule {
            metric: AlertMetric::ZScore,
            operator: AlertOperator::Above,
            threshold: 2.0,
        },
        AlertRule {
            metric: AlertMetric::ZScore,
            operator: AlertOperator::Below,
            threshold: -2.0,
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredAlert {
    pub rule: AlertRule,
    pub value: f64,
    pub timestamp: String,
}

/// Checks each rule against the latest defined value of its metric.
pub fn evaluate_alerts(payload: &AnalyticsPayload, rules: &[AlertRule]) -> Vec<TriggeredAlert> {
    let Some((value, timestamp)) = payload.latest_z_score() else {
        return Vec::new();
    };

    rules
        .iter()
        .filter(|rule| match rule.metric {
            AlertMetric::ZScore => rule.operator.holds(value, rule.threshold),
        })
        .map(|rule| TriggeredAlert {
            rule: rule.clone(),
            value,
            timestamp: timestamp.to_string(),
        })
        .collect()
}
