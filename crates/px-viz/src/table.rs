//! Tab-separated table rendering of a stack.

use std::fmt::Write as _;

use crate::stack::SeriesStack;

impl SeriesStack {
    /// Render the stack as tab-separated text: one header row of
    /// abbreviated titles, then one row per bin of the first series
    /// with the bin center followed by each member's
    /// `value*100 ± error*100` at one decimal.
    ///
    /// A zero value means "no data" and leaves that member's cell
    /// empty for that row only; other members still report.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        out.push_str("pile-up");
        for title in self.short_titles() {
            let _ = write!(out, "\t{title}");
        }
        out.push('\n');

        let Some(first) = self.series().first() else {
            return out;
        };
        for bin in 0..first.n_bins() {
            let _ = write!(out, "{}", first.bin_center(bin));
            for s in self.series() {
                if bin < s.n_bins() && s.value(bin) != 0.0 {
                    let _ =
                        write!(out, "\t{:.1} ± {:.1}", 100.0 * s.value(bin), 100.0 * s.error(bin));
                } else {
                    out.push('\t');
                }
            }
            out.push('\n');
        }
        out
    }
}
