//! An ordered stack of comparable series sharing display configuration.

use px_core::{Error, Result, TimeSeries};

/// One marker/color pair of the rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    /// Color index.
    pub color: usize,
    /// Marker style index.
    pub marker: usize,
}

/// Deterministic marker/color rotation.
///
/// Color indices count up from 1 and skip the reserved index 5; marker
/// indices are offset by a base style and skip the reserved index 3
/// (both display-palette conventions of the plotting backend, not
/// numeric choices).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

/// Color index never assigned by the default rotation.
pub const RESERVED_COLOR: usize = 5;
/// Marker index never assigned by the default rotation.
pub const RESERVED_MARKER: usize = 3;
/// Offset added to marker indices to reach the backend's marker styles.
pub const MARKER_STYLE_BASE: usize = 19;

impl Palette {
    /// Build a rotation of `n` visually distinct pairs.
    pub fn rotation(n: usize) -> Self {
        let mut entries = Vec::with_capacity(n);
        let mut color = 0usize;
        let mut marker = 0usize;
        for _ in 0..n {
            color += 1;
            if color == RESERVED_COLOR {
                color += 1;
            }
            marker += 1;
            if marker == RESERVED_MARKER {
                marker += 1;
            }
            entries.push(PaletteEntry { color, marker: MARKER_STYLE_BASE + marker });
        }
        Self { entries }
    }

    /// Palette from explicit pairs.
    pub fn from_entries(entries: Vec<PaletteEntry>) -> Self {
        Self { entries }
    }

    /// Pair for the `i`-th series, wrapping around when exhausted.
    pub fn entry(&self, i: usize) -> PaletteEntry {
        self.entries[i % self.entries.len()]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::rotation(7)
    }
}

/// Shared display configuration of a stack.
#[derive(Debug, Clone)]
pub struct StackConfig {
    /// Headroom factor applied before rounding the y maximum up.
    pub margin: f64,
    /// Series with more bins than this are rebinned on insertion.
    pub rebin_threshold: usize,
    /// Rebin factor applied past the threshold.
    pub rebin_factor: usize,
    /// Marker/color rotation.
    pub palette: Palette,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            margin: 1.3,
            rebin_threshold: 1000,
            rebin_factor: 50,
            palette: Palette::default(),
        }
    }
}

/// Round up to a clean axis bound: multiply by 10 until at least 1,
/// take the ceiling, divide back by the same power of 10.
///
/// Always rounds up (never to nearest), preserves the order of
/// magnitude, and is idempotent at the same order of magnitude.
pub fn round_up(value: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    let mut v = value;
    let mut order = 0i32;
    while v < 1.0 {
        v *= 10.0;
        order += 1;
    }
    v.ceil() / 10f64.powi(order)
}

/// An ordered, owning collection of output series sharing titles, axis
/// policy, and cosmetics.
///
/// The first series is the drawing frame; later series overlay it
/// without erasing anything.
#[derive(Debug, Clone, Default)]
pub struct SeriesStack {
    cfg: StackConfig,
    series: Vec<TimeSeries>,
    titles: Vec<String>,
    short_titles: Vec<String>,
    y_max: Option<f64>,
}

/// Abbreviate a series name: the part after the last underscore, with
/// the barrel-layer letter substitution (`B0` -> `L0`).
fn short_title_of(name: &str) -> String {
    let tail = name.rsplit('_').next().unwrap_or(name);
    let mut chars = tail.chars();
    match (chars.next(), chars.clone().next()) {
        (Some('B'), Some(d)) if d.is_ascii_digit() => format!("L{}", chars.as_str()),
        _ => tail.to_string(),
    }
}

impl SeriesStack {
    /// Empty stack with default configuration.
    pub fn new() -> Self {
        Self::with_config(StackConfig::default())
    }

    /// Empty stack with explicit configuration.
    pub fn with_config(cfg: StackConfig) -> Self {
        Self { cfg, series: Vec::new(), titles: Vec::new(), short_titles: Vec::new(), y_max: None }
    }

    /// Build a stack by pushing a sequence of series in order.
    pub fn from_series(
        cfg: StackConfig,
        series: impl IntoIterator<Item = TimeSeries>,
    ) -> Result<Self> {
        let mut stack = Self::with_config(cfg);
        for s in series {
            stack.push(s)?;
        }
        Ok(stack)
    }

    /// Append a series, taking ownership. Titles are derived from the
    /// name, the next palette pair is assigned, and oversized series
    /// are rebinned.
    pub fn push(&mut self, mut series: TimeSeries) -> Result<()> {
        if series.n_bins() > self.cfg.rebin_threshold
            && series.n_bins() % self.cfg.rebin_factor == 0
        {
            series.rebin(self.cfg.rebin_factor)?;
        }
        let entry = self.cfg.palette.entry(self.series.len());
        series.style.color = Some(entry.color);
        series.style.marker = Some(entry.marker);
        if let Some(y_max) = self.y_max {
            series.style.y_max = Some(y_max);
        }
        self.titles.push(series.name.clone());
        self.short_titles.push(short_title_of(&series.name));
        self.series.push(series);
        Ok(())
    }

    /// Replace the derived short titles with explicit ones.
    pub fn set_short_titles(&mut self, titles: Vec<String>) -> Result<()> {
        if titles.len() != self.series.len() {
            return Err(Error::InvalidArgument(format!(
                "{} short titles for {} series",
                titles.len(),
                self.series.len()
            )));
        }
        self.short_titles = titles;
        Ok(())
    }

    /// Member series in insertion order.
    pub fn series(&self) -> &[TimeSeries] {
        &self.series
    }

    /// Number of member series.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True when the stack has no members.
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Full titles in insertion order.
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Abbreviated titles in insertion order.
    pub fn short_titles(&self) -> &[String] {
        &self.short_titles
    }

    /// The shared y-axis maximum, if one was fixed already.
    pub fn y_max(&self) -> Option<f64> {
        self.y_max
    }

    /// Global maximum bin value across all members, ignoring errors.
    pub fn max_value(&self) -> f64 {
        self.series.iter().fold(0.0, |m, s| {
            let v = s.max_value();
            if v > m {
                v
            } else {
                m
            }
        })
    }

    /// Fix the shared y maximum to `value * margin`, rounded up to a
    /// clean bound. The first setter wins: auto-computation and any
    /// later explicit call are ignored afterwards.
    pub fn set_comfortable_max(&mut self, value: f64) {
        if self.y_max.is_some() {
            return;
        }
        let y_max = round_up(value * self.cfg.margin);
        self.y_max = Some(y_max);
        for s in &mut self.series {
            s.style.y_max = Some(y_max);
        }
    }

    /// Restrict the visible x range of every member (display only).
    pub fn set_x_view(&mut self, x_max: f64) {
        for s in &mut self.series {
            s.style.x_view = Some((0.0, x_max));
        }
    }

    /// Set the x-axis title on every member.
    pub fn set_x_title(&mut self, title: &str) {
        for s in &mut self.series {
            s.style.x_title = Some(title.to_string());
        }
    }

    /// Set the y-axis title on every member.
    pub fn set_y_title(&mut self, title: &str) {
        for s in &mut self.series {
            s.style.y_title = Some(title.to_string());
        }
    }

    /// Set the requested x-axis tick divisions on every member.
    pub fn set_x_ticks(&mut self, ticks: u32) {
        for s in &mut self.series {
            s.style.x_ticks = Some(ticks);
        }
    }

    /// Shift series `i` horizontally by `fractions[i]` of the first
    /// member's bin width, to de-overlap points at identical buckets.
    /// Display only; bin content never moves.
    pub fn shift(&mut self, fractions: &[f64]) -> Result<()> {
        if fractions.len() != self.series.len() {
            return Err(Error::InvalidArgument(format!(
                "{} shift values for {} series",
                fractions.len(),
                self.series.len()
            )));
        }
        let width = match self.series.first() {
            Some(first) => first.bin_width(),
            None => return Ok(()),
        };
        for (s, fraction) in self.series.iter_mut().zip(fractions) {
            s.style.x_shift = fraction * width;
        }
        Ok(())
    }

    /// Apply the shared y maximum to every member, auto-computing a
    /// comfortable bound from [`max_value`] when none was fixed yet.
    ///
    /// [`max_value`]: SeriesStack::max_value
    pub(crate) fn apply_y_max(&mut self) -> f64 {
        if self.y_max.is_none() {
            let max = self.max_value();
            self.set_comfortable_max(max);
        }
        let y_max = self.y_max.unwrap_or(0.0);
        for s in &mut self.series {
            s.style.y_max = Some(y_max);
        }
        y_max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn series(name: &str, values: &[f64]) -> TimeSeries {
        let mut s = TimeSeries::new(name, "", values.len(), 0.0, values.len() as f64).unwrap();
        for (i, &v) in values.iter().enumerate() {
            s.set_bin(i, v, 0.1 * v, 1.0).unwrap();
        }
        s
    }

    #[test]
    fn round_up_examples() {
        // 0.52 * 1.4 = 0.728 -> one decade up -> ceil(7.28) / 10.
        assert_abs_diff_eq!(round_up(0.52 * 1.4), 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(round_up(0.728), 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(round_up(7.3), 8.0);
        assert_abs_diff_eq!(round_up(0.0), 0.0);
    }

    #[test]
    fn round_up_is_idempotent() {
        for x in [0.728, 0.0652, 0.3, 4.2, 17.0] {
            let once = round_up(x);
            assert_abs_diff_eq!(round_up(once), once, epsilon = 1e-12);
        }
    }

    #[test]
    fn short_titles_abbreviate_and_substitute() {
        let mut stack = SeriesStack::new();
        stack.push(series("Bitstr_Occ_Tot_LB_B0", &[0.1])).unwrap();
        stack.push(series("Bitstr_Occ_Tot_LB_ECA", &[0.1])).unwrap();
        assert_eq!(stack.short_titles(), &["L0".to_string(), "ECA".to_string()]);
        assert_eq!(stack.titles()[0], "Bitstr_Occ_Tot_LB_B0");
    }

    #[test]
    fn explicit_short_titles_must_match_len() {
        let mut stack = SeriesStack::new();
        stack.push(series("a_B1", &[0.1])).unwrap();
        assert!(stack.set_short_titles(vec!["one".into(), "two".into()]).is_err());
        stack.set_short_titles(vec!["one".into()]).unwrap();
        assert_eq!(stack.short_titles(), &["one".to_string()]);
    }

    #[test]
    fn palette_rotation_skips_reserved_indices() {
        let palette = Palette::default();
        let colors: Vec<usize> = (0..7).map(|i| palette.entry(i).color).collect();
        let markers: Vec<usize> = (0..7).map(|i| palette.entry(i).marker).collect();
        assert_eq!(colors, vec![1, 2, 3, 4, 6, 7, 8]);
        assert!(!colors.contains(&RESERVED_COLOR));
        assert_eq!(markers, vec![20, 21, 23, 24, 25, 26, 27]);
        assert!(!markers.contains(&(MARKER_STYLE_BASE + RESERVED_MARKER)));
        // Wraps around deterministically.
        assert_eq!(palette.entry(7), palette.entry(0));
    }

    #[test]
    fn comfortable_max_first_setter_wins() {
        let mut stack = SeriesStack::new();
        stack.push(series("a_B0", &[0.3, 0.52])).unwrap();
        stack.set_comfortable_max(0.52);
        assert_abs_diff_eq!(stack.y_max().unwrap(), 0.7, epsilon = 1e-12); // ceil(0.52*1.3*10)/10
        stack.set_comfortable_max(10.0);
        assert_abs_diff_eq!(stack.y_max().unwrap(), 0.7, epsilon = 1e-12);
    }

    #[test]
    fn margin_is_configurable() {
        let cfg = StackConfig { margin: 1.4, ..Default::default() };
        let mut stack = SeriesStack::with_config(cfg);
        stack.push(series("a_B0", &[0.52])).unwrap();
        stack.set_comfortable_max(0.52);
        assert_abs_diff_eq!(stack.y_max().unwrap(), 0.8, epsilon = 1e-12);
    }

    #[test]
    fn max_value_scans_all_members() {
        let mut stack = SeriesStack::new();
        stack.push(series("a_B0", &[0.1, 0.4])).unwrap();
        stack.push(series("a_B1", &[0.2, 0.3])).unwrap();
        assert_abs_diff_eq!(stack.max_value(), 0.4);
    }

    #[test]
    fn shift_requires_matching_length_and_keeps_content() {
        let mut stack = SeriesStack::new();
        stack.push(series("a_B0", &[0.1, 0.2])).unwrap();
        stack.push(series("a_B1", &[0.3, 0.4])).unwrap();
        assert!(stack.shift(&[0.1]).is_err());

        stack.shift(&[0.0, 0.25]).unwrap();
        assert_abs_diff_eq!(stack.series()[0].style.x_shift, 0.0);
        assert_abs_diff_eq!(stack.series()[1].style.x_shift, 0.25); // 0.25 * bin width 1.0
        assert_abs_diff_eq!(stack.series()[1].value(0), 0.3); // content untouched
    }

    #[test]
    fn push_rebins_oversized_series() {
        let values: Vec<f64> = (0..1500).map(|i| i as f64 * 1e-4).collect();
        let mut stack = SeriesStack::new();
        stack.push(series("big_B0", &values)).unwrap();
        assert_eq!(stack.series()[0].n_bins(), 30);
    }
}
