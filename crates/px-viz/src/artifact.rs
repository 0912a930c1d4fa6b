//! Plot-friendly JSON artifacts.
//!
//! The plotting backend is external; the stack's obligation ends at
//! emitting finished display attributes and flat point arrays.

use serde::{Deserialize, Serialize};

use crate::stack::SeriesStack;

/// Schema tag of [`StackArtifact`].
pub const STACK_SCHEMA_VERSION: &str = "pixband_stack_v1";

/// One member series of a stack artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesArtifact {
    /// Series name.
    pub name: String,
    /// Full legend title.
    pub title: String,
    /// Abbreviated legend title.
    pub short_title: String,
    /// Point x positions: bin centers plus the display shift.
    pub x: Vec<f64>,
    /// Point y values.
    pub y: Vec<f64>,
    /// Symmetric y errors.
    pub yerr: Vec<f64>,
    /// Color index from the palette rotation.
    pub color: usize,
    /// Marker style index from the palette rotation.
    pub marker: usize,
}

/// A full comparison plot: shared axis policy plus one entry per
/// member. The first entry draws the frame with markers and error
/// bars; later entries overlay points without erasing anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackArtifact {
    /// Artifact schema tag.
    pub schema_version: String,
    /// Shared x-axis title, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_title: Option<String>,
    /// Shared y-axis title, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_title: Option<String>,
    /// Requested x tick divisions, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_ticks: Option<u32>,
    /// Visible x sub-range, if restricted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_view: Option<(f64, f64)>,
    /// Shared y-axis maximum (display range is `0..y_max`).
    pub y_max: f64,
    /// Member series in drawing order.
    pub series: Vec<SeriesArtifact>,
}

impl SeriesStack {
    /// Finalize display attributes and emit the plot artifact.
    ///
    /// Auto-computes the comfortable y maximum when none was fixed,
    /// then applies it to every member before conversion.
    pub fn to_artifact(&mut self) -> StackArtifact {
        let y_max = self.apply_y_max();
        let first_style = self.series().first().map(|s| s.style.clone()).unwrap_or_default();

        let series = self
            .series()
            .iter()
            .zip(self.titles())
            .zip(self.short_titles())
            .map(|((s, title), short_title)| SeriesArtifact {
                name: s.name.clone(),
                title: title.clone(),
                short_title: short_title.clone(),
                x: (0..s.n_bins()).map(|i| s.bin_center(i) + s.style.x_shift).collect(),
                y: (0..s.n_bins()).map(|i| s.value(i)).collect(),
                yerr: (0..s.n_bins()).map(|i| s.error(i)).collect(),
                color: s.style.color.unwrap_or(1),
                marker: s.style.marker.unwrap_or(20),
            })
            .collect();

        StackArtifact {
            schema_version: STACK_SCHEMA_VERSION.to_string(),
            x_title: first_style.x_title,
            y_title: first_style.y_title,
            x_ticks: first_style.x_ticks,
            x_view: first_style.x_view,
            y_max,
            series,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use px_core::TimeSeries;

    fn series(name: &str, values: &[f64]) -> TimeSeries {
        let mut s = TimeSeries::new(name, "", values.len(), 20.0, 40.0).unwrap();
        for (i, &v) in values.iter().enumerate() {
            s.set_bin(i, v, 0.1 * v, 1.0).unwrap();
        }
        s
    }

    fn stack() -> SeriesStack {
        let mut stack = SeriesStack::new();
        stack.push(series("Tot_LB_B0", &[0.2, 0.4])).unwrap();
        stack.push(series("Tot_LB_ECC", &[0.1, 0.3])).unwrap();
        stack.set_x_title("Average #mu per lumi block");
        stack.set_y_title("Average bandwidth usage");
        stack.set_x_ticks(210);
        stack
    }

    #[test]
    fn artifact_contract_smoke() {
        let mut stack = stack();
        stack.shift(&[0.0, 0.05]).unwrap();
        let artifact = stack.to_artifact();

        assert_eq!(artifact.schema_version, STACK_SCHEMA_VERSION);
        assert_eq!(artifact.series.len(), 2);
        assert_eq!(artifact.x_title.as_deref(), Some("Average #mu per lumi block"));
        assert_eq!(artifact.x_ticks, Some(210));

        let first = &artifact.series[0];
        assert_eq!(first.short_title, "L0");
        assert_eq!(first.x.len(), 2);
        assert_abs_diff_eq!(first.x[0], 25.0); // center of [20, 30)
        assert_abs_diff_eq!(first.y[1], 0.4);

        // Second series carries its shift: 0.05 * bin width 10.
        let second = &artifact.series[1];
        assert_abs_diff_eq!(second.x[0], 25.5, epsilon = 1e-12);

        // Distinct palette assignments.
        assert_ne!(first.color, second.color);
        assert_ne!(first.marker, second.marker);
    }

    #[test]
    fn artifact_applies_auto_max_to_all_members() {
        let mut stack = stack();
        let artifact = stack.to_artifact();
        // max 0.4 * margin 1.3 = 0.52 -> ceil(5.2)/10 = 0.6.
        assert_abs_diff_eq!(artifact.y_max, 0.6, epsilon = 1e-12);
        assert!(stack.series().iter().all(|s| s.style.y_max == Some(0.6)));
    }

    #[test]
    fn explicit_max_survives_artifact_conversion() {
        let mut stack = stack();
        stack.set_comfortable_max(0.52);
        let artifact = stack.to_artifact();
        // 0.52 * 1.3 = 0.676 -> 0.7; auto-compute must not override it.
        assert_abs_diff_eq!(artifact.y_max, 0.7, epsilon = 1e-12);
    }

    #[test]
    fn artifact_round_trips_through_json() {
        let mut stack = stack();
        let artifact = stack.to_artifact();
        let json = serde_json::to_string(&artifact).unwrap();
        let back: StackArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back.schema_version, artifact.schema_version);
        assert_eq!(back.series.len(), artifact.series.len());
    }
}
