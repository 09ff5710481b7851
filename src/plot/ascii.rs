//! ASCII plotting of adjusted series for terminal output.
//!
//! Fixed-size grid, deterministic output. Long series are downsampled by
//! averaging the rows that fall into each column.

use crate::domain::AdjustedSeries;

/// Render `series` as a `width` x `height` line plot with a range header.
pub fn render_ascii_plot(series: &AdjustedSeries, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (Some(first), Some(last), Some((lo, hi))) =
        (series.points.first(), series.points.last(), series.value_range())
    else {
        return format!("Plot: {} (no data)\n", series.resolution);
    };

    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 1.0, hi + 1.0) };
    let (y_min, y_max) = pad_range(lo, hi, 0.05);

    let values: Vec<f64> = series.points.iter().map(|p| p.adjusted_value).collect();
    let mut grid = vec![vec![' '; width]; height];

    let mut prev = None;
    for (x, v) in column_means(&values, width) {
        let y = map_y(v, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(&mut grid, x0, y0, x, y, '-'),
            None => grid[y][x] = '-',
        }
        prev = Some((x, y));
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} {}..{} | y=[{y_min:.2}, {y_max:.2}]\n",
        series.resolution, first.date, last.date
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// `(column, value)` pairs: one per row when the series fits, otherwise the
/// mean of each column's rows.
fn column_means(values: &[f64], width: usize) -> Vec<(usize, f64)> {
    let n = values.len();
    if n <= width {
        let last = n.saturating_sub(1).max(1) as f64;
        return values
            .iter()
            .enumerate()
            .map(|(i, &v)| (map_x(i as f64, 0.0, last, width), v))
            .collect();
    }

    let mut sums = vec![(0.0, 0usize); width];
    for (i, &v) in values.iter().enumerate() {
        let col = i * width / n;
        sums[col].0 += v;
        sums[col].1 += 1;
    }
    sums.into_iter()
        .enumerate()
        .filter(|(_, (_, count))| *count > 0)
        .map(|(col, (sum, count))| (col, sum / count as f64))
        .collect()
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let pad = ((max - min).abs() * frac).max(1e-12);
    (min - pad, max + pad)
}

/// Fraction of the way from `lo` to `hi`, clamped to `[0, 1]`.
fn fraction(v: f64, lo: f64, hi: f64) -> f64 {
    ((v - lo) / (hi - lo)).clamp(0.0, 1.0)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let last_col = width.max(2) - 1;
    (fraction(t, t_min, t_max) * last_col as f64).round() as usize
}

/// Row index for `y`; rows count down from the top, so `y_max` lands on row 0.
fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let last_row = height.max(2) - 1;
    ((1.0 - fraction(y, y_min, y_max)) * last_row as f64).round() as usize
}

/// Mark every cell on the segment between two grid cells, stepping once per
/// cell along the longer axis.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let (dx, dy) = (x1 as f64 - x0 as f64, y1 as f64 - y0 as f64);
    let steps = dx.abs().max(dy.abs()).max(1.0) as usize;
    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        let x = (x0 as f64 + dx * t).round() as usize;
        let y = (y0 as f64 + dy * t).round() as usize;
        if let Some(cell) = grid.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = ch;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdjustedPoint, Resolution};
    use crate::test_support::d;
    use chrono::Days;

    fn series(values: &[f64]) -> AdjustedSeries {
        AdjustedSeries {
            resolution: Resolution::Daily,
            points: values
                .iter()
                .enumerate()
                .map(|(i, &adjusted_value)| AdjustedPoint {
                    date: d(2004, 1, 1) + Days::new(i as u64),
                    adjusted_value,
                })
                .collect(),
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();

        let txt = render_ascii_plot(&series(&values), 10, 5);

        let expected = concat!(
            "Plot: daily 2004-01-01..2004-01-10 | y=[0.55, 10.45]\n",
            "         -\n",
            "      --- \n",
            "    --    \n",
            " ---      \n",
            "-         \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn long_series_is_downsampled_to_width() {
        let values: Vec<f64> = (0..365).map(|i| 50.0 + f64::from(i % 30)).collect();

        let txt = render_ascii_plot(&series(&values), 40, 8);

        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 9);
        assert!(lines[1..].iter().all(|l| l.chars().count() == 40));
        assert_eq!(column_means(&values, 40).len(), 40);
    }

    #[test]
    fn empty_series_renders_header_only() {
        assert_eq!(render_ascii_plot(&series(&[]), 20, 6), "Plot: daily (no data)\n");
    }
}
