//! Executors for the `data_analysis` skill.

use serde_json::Value;
use skillgate_core::{Error, Result};
use skillgate_providers::{ToolParameter, ToolResult};

use crate::Tool;
use crate::tool::required_numbers;

const ALL_METRICS: &[&str] = &["mean", "median", "std", "var", "min", "max", "q25", "q75", "count"];

/// Descriptive statistics over a non-empty series
#[derive(Debug, Clone, PartialEq)]
struct Summary {
    count: usize,
    mean: f64,
    median: f64,
    std: f64,
    variance: f64,
    min: f64,
    max: f64,
    q25: f64,
    q75: f64,
}

impl Summary {
    fn of(data: &[f64]) -> Option<Self> {
        if data.is_empty() {
            return None;
        }

        let mut sorted = data.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = data.len();
        let mean = data.iter().sum::<f64>() / count as f64;
        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Self {
            count,
            mean,
            median: percentile(&sorted, 50.0),
            std: variance.sqrt(),
            variance,
            min: sorted[0],
            max: sorted[count - 1],
            q25: percentile(&sorted, 25.0),
            q75: percentile(&sorted, 75.0),
        })
    }

    fn metric(&self, name: &str) -> Option<(&'static str, f64)> {
        Some(match name {
            "mean" => ("mean", self.mean),
            "median" => ("median", self.median),
            "std" => ("std", self.std),
            "var" => ("variance", self.variance),
            "min" => ("min", self.min),
            "max" => ("max", self.max),
            "q25" => ("25th_percentile", self.q25),
            "q75" => ("75th_percentile", self.q75),
            "count" => ("count", self.count as f64),
            _ => return None,
        })
    }
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

fn data_parameter() -> (String, ToolParameter) {
    ("data".to_string(), ToolParameter::new_array(ToolParameter::new_number("A data point")))
}

#[derive(Debug)]
pub struct CalculateStatisticsTool;

impl Tool for CalculateStatisticsTool {
    fn name(&self) -> &str {
        "calculate_statistics"
    }

    fn description(&self) -> &str {
        "Calculate statistical metrics (mean, median, std, var, min, max, q25, q75, count) for numerical data."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![
            data_parameter(),
            (
                "metrics".to_string(),
                ToolParameter::new_string("Comma-separated metric names, or 'all' (default)"),
            ),
        ])
        .with_required(&["data"])
    }

    fn execute(&self, tool_call_id: String, arguments: &Value) -> Result<ToolResult> {
        let data = required_numbers(self.name(), arguments, "data")?;
        let summary =
            Summary::of(&data).ok_or_else(|| Error::Validation("calculate_statistics: data is empty".to_string()))?;

        let requested = arguments.get("metrics").and_then(|v| v.as_str()).unwrap_or("all");
        let names: Vec<&str> = if requested == "all" {
            ALL_METRICS.to_vec()
        } else {
            requested.split(',').map(str::trim).filter(|m| !m.is_empty()).collect()
        };

        let mut output = String::from("Statistical Analysis Results:\n");
        for name in names {
            let (label, value) = summary
                .metric(name)
                .ok_or_else(|| Error::Validation(format!("calculate_statistics: unknown metric '{name}'")))?;
            output.push_str(&format!("\n- {label}: {value:.4}"));
        }

        Ok(ToolResult::success(tool_call_id, output))
    }
}

#[derive(Debug)]
pub struct SummarizeDataTool;

impl Tool for SummarizeDataTool {
    fn name(&self) -> &str {
        "summarize_data"
    }

    fn description(&self) -> &str {
        "Produce a readable summary report of a numerical series: central tendency, spread, quartiles and data quality."
    }

    fn parameters(&self) -> ToolParameter {
        ToolParameter::new_object(vec![data_parameter()]).with_required(&["data"])
    }

    fn execute(&self, tool_call_id: String, arguments: &Value) -> Result<ToolResult> {
        let data = required_numbers(self.name(), arguments, "data")?;
        let s = Summary::of(&data).ok_or_else(|| Error::Validation("summarize_data: data is empty".to_string()))?;

        let zeros = data.iter().filter(|x| **x == 0.0).count();
        let negatives = data.iter().filter(|x| **x < 0.0).count();

        let report = format!(
            "Data Summary Report\n\
             ===================\n\n\
             Dataset Size: {count}\n\n\
             Central Tendency:\n- Mean: {mean:.4}\n- Median: {median:.4}\n\n\
             Spread:\n- Standard Deviation: {std:.4}\n- Variance: {var:.4}\n- Range: {range:.4}\n\n\
             Quartiles:\n- 25th Percentile: {q25:.4}\n- 75th Percentile: {q75:.4}\n- IQR: {iqr:.4}\n\n\
             Data Quality:\n- Zero Values: {zeros}\n- Negative Values: {negatives}",
            count = s.count,
            mean = s.mean,
            median = s.median,
            std = s.std,
            var = s.variance,
            range = s.max - s.min,
            q25 = s.q25,
            q75 = s.q75,
            iqr = s.q75 - s.q25,
        );

        Ok(ToolResult::success(tool_call_id, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::test_helpers::statistics_tool_call;
    use serde_json::json;

    #[test]
    fn test_summary_values() {
        let s = Summary::of(&[4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();
        assert_eq!(s.count, 5);
        assert_eq!(s.mean, 3.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.variance, 2.0);
        assert_eq!((s.min, s.max), (1.0, 5.0));
        assert_eq!((s.q25, s.q75), (2.0, 4.0));
    }

    #[test]
    fn test_percentile_interpolates() {
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 50.0), 2.5);
        assert_eq!(percentile(&[7.0], 75.0), 7.0);
    }

    #[test]
    fn test_calculate_selected_metrics() {
        let call = statistics_tool_call("call_1", &[1.0, 2.0, 3.0], "mean, max");
        let result = CalculateStatisticsTool.execute(call.id.clone(), call.arguments()).unwrap();
        assert_eq!(result.content, "Statistical Analysis Results:\n\n- mean: 2.0000\n- max: 3.0000");
    }

    #[test]
    fn test_calculate_all_metrics_by_default() {
        let result = CalculateStatisticsTool.execute("c".into(), &json!({"data": [2, 4]})).unwrap();
        for label in ["mean", "median", "std", "variance", "min", "max", "25th_percentile", "75th_percentile", "count"]
        {
            assert!(result.content.contains(&format!("- {label}:")), "missing {label}");
        }
    }

    #[test]
    fn test_calculate_rejects_empty_and_unknown() {
        assert!(CalculateStatisticsTool.execute("c".into(), &json!({"data": []})).is_err());
        let err = CalculateStatisticsTool.execute("c".into(), &json!({"data": [1], "metrics": "mode"})).unwrap_err();
        assert!(err.to_string().contains("unknown metric 'mode'"));
    }

    #[test]
    fn test_summarize_data() {
        let result = SummarizeDataTool.execute("c".into(), &json!({"data": [0, -2, 4, 6]})).unwrap();
        assert!(result.content.starts_with("Data Summary Report"));
        assert!(result.content.contains("Dataset Size: 4"));
        assert!(result.content.contains("- Range: 8.0000"));
        assert!(result.content.contains("- Zero Values: 1"));
        assert!(result.content.contains("- Negative Values: 1"));
    }
}
