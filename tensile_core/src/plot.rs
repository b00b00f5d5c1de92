//! # Plots
//!
//! SVG charts of analyzed specimens and result files, rendered with
//! `plotters`.
//!
//! ## Output Layout
//!
//! ```text
//! <out>/
//! ├── <group>/<length>/plot-10in-21-single-Stress-vs-Strain-3.svg
//! ├── <group>/<length>/plot-group_A_10in-multi-Stress-vs-Strain.svg
//! ├── output-KE-vs-D.svg
//! └── summary_comparison_by_length.svg
//! ```

use std::error::Error;
use std::fmt;
use std::fs::File;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;

use crate::analysis::AnalyzedSpecimen;
use crate::calculations::curve::Channel;
use crate::calculations::fit::{first_argmax, linear_fit, max_value, mean, min_value};
use crate::errors::{TensileError, TensileResult};
use crate::file_io::ensure_dir;
use crate::report::IndividualRow;
use crate::settings::OutputSettings;
use crate::specimen::{group_label, length_label};
use crate::summary::BatchSummary;
use crate::units::{Megapascals, Pascals};

type DrawResult = Result<(), Box<dyn Error>>;

const CAPTION_FONT: (&str, u32) = ("sans-serif", 22);

/// Columns of `individual_results.csv` that can be plotted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputParam {
    /// Kinetic energy
    KE,
    /// Velocity
    V,
    /// Diameter
    D,
    /// Gauge length
    L,
}

impl OutputParam {
    pub fn axis_label(self) -> &'static str {
        match self {
            OutputParam::KE => "Kinetic Energy (J)",
            OutputParam::V => "Velocity (m/s)",
            OutputParam::D => "Diameter (mm)",
            OutputParam::L => "Length (mm)",
        }
    }

    fn value(self, row: &IndividualRow) -> f64 {
        match self {
            OutputParam::KE => row.kinetic_energy_j,
            OutputParam::V => row.velocity_m_s,
            OutputParam::D => row.diameter_mm as f64,
            OutputParam::L => row.length_mm,
        }
    }
}

impl fmt::Display for OutputParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputParam::KE => "KE",
            OutputParam::V => "V",
            OutputParam::D => "D",
            OutputParam::L => "L",
        };
        f.write_str(name)
    }
}

impl FromStr for OutputParam {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KE" => Ok(OutputParam::KE),
            "V" => Ok(OutputParam::V),
            "D" => Ok(OutputParam::D),
            "L" => Ok(OutputParam::L),
            other => Err(format!("unknown output parameter '{}'", other)),
        }
    }
}

/// Axis range covering `values` with 5% headroom on both ends.
fn padded_range(values: impl Iterator<Item = f64> + Clone) -> Range<f64> {
    let lo = values.clone().fold(f64::INFINITY, f64::min);
    let hi = values.fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    let span = hi - lo;
    if span <= 0.0 {
        return (lo - 1.0)..(hi + 1.0);
    }
    (lo - 0.05 * span)..(hi + 0.05 * span)
}

/// Stress axes start at zero with 10% headroom.
fn channel_range(channel: Channel, values: &[f64]) -> Range<f64> {
    match channel {
        Channel::Stress => {
            let top = max_value(values).unwrap_or(1.0);
            0.0..(if top > 0.0 { top * 1.1 } else { 1.0 })
        }
        _ => padded_range(values.iter().copied()),
    }
}

fn specimen_dir(settings: &OutputSettings, source_path: &str) -> TensileResult<PathBuf> {
    let dir = settings
        .output_dir
        .join(group_label(source_path))
        .join(length_label(source_path));
    ensure_dir(&dir)?;
    Ok(dir)
}

fn draw_error(err: Box<dyn Error>) -> TensileError {
    TensileError::plot_error(err)
}

/// Legend entry without a marker, used for key figures.
fn legend_text<'a, DB: DrawingBackend + 'a>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    text: String,
) -> DrawResult
where
    DB::ErrorType: 'static,
{
    chart
        .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
        .label(text)
        .legend(|(x, y)| EmptyElement::at((x, y)));
    Ok(())
}

/// Plot one specimen with its yield marker, elastic fit line and key
/// properties in the legend.
pub fn plot_single_trace(
    specimen: &AnalyzedSpecimen,
    x: Channel,
    y: Channel,
    settings: &OutputSettings,
) -> TensileResult<PathBuf> {
    let meta = &specimen.metadata;
    let dir = specimen_dir(settings, &meta.source_path)?;
    let path = dir.join(format!(
        "plot-{}in-{}-single-{}-vs-{}-{}.svg",
        meta.gauge_length_inches(),
        meta.size_class(),
        y,
        x,
        meta.run_index
    ));

    draw_single_trace(&path, specimen, x, y, settings.plot_size()).map_err(draw_error)?;
    tracing::info!(path = %path.display(), "single trace plot saved");
    Ok(path)
}

fn draw_single_trace(
    path: &Path,
    specimen: &AnalyzedSpecimen,
    x: Channel,
    y: Channel,
    size: (u32, u32),
) -> DrawResult {
    let curve = &specimen.curve;
    let props = &specimen.properties;
    let xs = curve.channel(x);
    let ys = curve.channel(y);

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(specimen.file_name(), CAPTION_FONT)
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(channel_range(x, &xs), channel_range(y, &ys))?;

    chart
        .configure_mesh()
        .x_desc(x.axis_label())
        .y_desc(y.axis_label())
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            xs.iter().copied().zip(ys.iter().copied()),
            BLUE.stroke_width(2),
        ))?
        .label(format!("{} vs {}", y, x))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    // Yield point at the sample nearest the yield strain, else the fracture point
    let yield_sample = props.yield_strain.and_then(|target| {
        curve
            .strain
            .iter()
            .enumerate()
            .map(|(i, s)| (i, (s - target).abs()))
            .reduce(|best, next| if next.1 < best.1 { next } else { best })
            .map(|(i, _)| i)
    });
    match yield_sample {
        Some(i) => {
            chart
                .draw_series(std::iter::once(Circle::new((xs[i], ys[i]), 6, RED.filled())))?
                .label("Yield Point")
                .legend(|(x, y)| Circle::new((x + 10, y), 5, RED.filled()));
        }
        None => {
            let corner = (
                max_value(&xs).unwrap_or(0.0),
                max_value(&ys).unwrap_or(0.0),
            );
            chart
                .draw_series(std::iter::once(Cross::new(corner, 6, RED.stroke_width(3))))?
                .label("Fracture")
                .legend(|(x, y)| Cross::new((x + 10, y), 5, RED.stroke_width(2)));
        }
    }

    // Linear fit over the first half of the rise to the y maximum
    if props.modulus_pa > 0.0 {
        let fit_max = first_argmax(&ys).unwrap_or(0) / 2;
        if fit_max > 1 {
            if let Some(fit) = linear_fit(&xs[..fit_max], &ys[..fit_max]) {
                chart
                    .draw_series(LineSeries::new(
                        xs.iter().map(|&v| (v, fit.at(v))),
                        RED.mix(0.7).stroke_width(2),
                    ))?
                    .label("Linear Fit")
                    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.mix(0.7)));
            }
        }
    }

    legend_text(&mut chart, format!("Modulus = {:.2} MPa", props.modulus_mpa()))?;
    legend_text(&mut chart, format!("Yield = {:.2} MPa", props.yield_stress_mpa()))?;
    legend_text(&mut chart, format!("Max Force = {:.2} N", props.max_force_n))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Overlay several specimens with the set's average properties in the
/// legend. Returns `None` for an empty set.
///
/// With a `title_suffix` the file is named `plot-<suffix>-multi-...`,
/// otherwise after the first specimen's gauge length and diameter class.
pub fn plot_multi_trace(
    specimens: &[AnalyzedSpecimen],
    x: Channel,
    y: Channel,
    title_suffix: Option<&str>,
    settings: &OutputSettings,
) -> TensileResult<Option<PathBuf>> {
    let Some(first) = specimens.first() else {
        tracing::warn!("No data provided for multi-trace plot");
        return Ok(None);
    };
    let meta = &first.metadata;
    let dir = specimen_dir(settings, &meta.source_path)?;
    let file_name = match title_suffix {
        Some(suffix) if !suffix.is_empty() => format!("plot-{}-multi-{}-vs-{}.svg", suffix, y, x),
        _ => format!(
            "plot-{}in-{}-multi-{}-vs-{}.svg",
            meta.gauge_length_inches(),
            meta.size_class(),
            y,
            x
        ),
    };
    let path = dir.join(file_name);

    draw_multi_trace(&path, specimens, x, y, settings.plot_size()).map_err(draw_error)?;
    tracing::info!(path = %path.display(), traces = specimens.len(), "multi-trace plot saved");
    Ok(Some(path))
}

fn draw_multi_trace(
    path: &Path,
    specimens: &[AnalyzedSpecimen],
    x: Channel,
    y: Channel,
    size: (u32, u32),
) -> DrawResult {
    let traces: Vec<(Vec<f64>, Vec<f64>)> = specimens
        .iter()
        .map(|s| (s.curve.channel(x), s.curve.channel(y)))
        .collect();
    let all_x: Vec<f64> = traces.iter().flat_map(|(xs, _)| xs.iter().copied()).collect();
    let all_y: Vec<f64> = traces.iter().flat_map(|(_, ys)| ys.iter().copied()).collect();

    let x_range = match x {
        Channel::Strain => 0.0..max_value(&all_x).unwrap_or(1.0).max(1.0),
        _ => channel_range(x, &all_x),
    };

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} vs {}", y, x), CAPTION_FONT)
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range, channel_range(y, &all_y))?;

    chart
        .configure_mesh()
        .x_desc(x.axis_label())
        .y_desc(y.axis_label())
        .draw()?;

    for (i, (xs, ys)) in traces.iter().enumerate() {
        let color = Palette99::pick(i).mix(0.7);
        chart
            .draw_series(LineSeries::new(
                xs.iter().copied().zip(ys.iter().copied()),
                color.stroke_width(2),
            ))?
            .label(format!("Sample {}", i + 1))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    let average = |f: fn(&AnalyzedSpecimen) -> f64| {
        let values: Vec<f64> = specimens.iter().map(f).collect();
        mean(&values).unwrap_or(0.0)
    };
    let modulus = Megapascals::from(Pascals(average(|s| s.properties.modulus_pa))).0;
    let yield_stress = Megapascals::from(Pascals(average(|s| s.properties.yield_stress_pa))).0;
    let max_force = average(|s| s.properties.max_force_n);

    legend_text(&mut chart, format!("Avg. Modulus = {:.2} MPa", modulus))?;
    legend_text(&mut chart, format!("Avg. Yield = {:.2} MPa", yield_stress))?;
    legend_text(&mut chart, format!("Avg. Max Force = {:.2} N", max_force))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Read the rows of an `individual_results.csv` file.
pub fn read_individual_results(path: &Path) -> TensileResult<Vec<IndividualRow>> {
    let file = File::open(path).map_err(|e| {
        TensileError::file_error("open", path.display().to_string(), e.to_string())
    })?;
    let mut reader = csv::Reader::from_reader(file);
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<IndividualRow>, csv::Error>>()?;
    Ok(rows)
}

/// Plot two columns of an `individual_results.csv` file against each other.
pub fn plot_output_data(
    results_csv: &Path,
    x: OutputParam,
    y: OutputParam,
    settings: &OutputSettings,
) -> TensileResult<PathBuf> {
    let rows = read_individual_results(results_csv)?;
    if rows.is_empty() {
        return Err(TensileError::empty_data(results_csv.display().to_string()));
    }
    let points: Vec<(f64, f64)> = rows.iter().map(|r| (x.value(r), y.value(r))).collect();

    ensure_dir(&settings.output_dir)?;
    let path = settings.output_dir.join(format!("output-{}-vs-{}.svg", y, x));
    draw_output_data(&path, &points, x, y, settings.plot_size()).map_err(draw_error)?;
    tracing::info!(path = %path.display(), points = points.len(), "output plot saved");
    Ok(path)
}

fn draw_output_data(
    path: &Path,
    points: &[(f64, f64)],
    x: OutputParam,
    y: OutputParam,
    size: (u32, u32),
) -> DrawResult {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(80)
        .build_cartesian_2d(
            padded_range(points.iter().map(|p| p.0)),
            padded_range(points.iter().map(|p| p.1)),
        )?;

    chart
        .configure_mesh()
        .x_desc(x.axis_label())
        .y_desc(y.axis_label())
        .draw()?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), BLUE.stroke_width(2)))?
        .label(format!("{} vs {}", y, x))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    chart.draw_series(points.iter().map(|&p| Circle::new(p, 4, BLUE.filled())))?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Leading integer of a `<n>in` label, for ordering lengths on an axis.
fn length_inches(label: &str) -> Option<f64> {
    let digits: String = label.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<f64>().ok()
}

/// Modulus, yield stress and max force against gauge length, one line per
/// group. Returns `None` when the summary holds nothing plottable.
pub fn plot_summary_comparison(
    summary: &BatchSummary,
    settings: &OutputSettings,
) -> TensileResult<Option<PathBuf>> {
    let series: Vec<(String, Vec<(f64, [f64; 3])>)> = summary
        .iter()
        .map(|(group, lengths)| {
            let mut points: Vec<(f64, [f64; 3])> = lengths
                .iter()
                .filter_map(|(length, stats)| {
                    let inches = length_inches(length)?;
                    Some((
                        inches,
                        [
                            Megapascals::from(Pascals(stats.modulus_avg)).0,
                            Megapascals::from(Pascals(stats.yield_stress_avg)).0,
                            stats.max_force_avg,
                        ],
                    ))
                })
                .collect();
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            (group.clone(), points)
        })
        .filter(|(_, points)| !points.is_empty())
        .collect();

    if series.is_empty() {
        tracing::warn!("No data available for summary plots");
        return Ok(None);
    }

    ensure_dir(&settings.output_dir)?;
    let path = settings.output_dir.join("summary_comparison_by_length.svg");
    let (width, height) = settings.plot_size();
    draw_summary_comparison(&path, &series, (width * 3 / 2, height / 2)).map_err(draw_error)?;
    tracing::info!(path = %path.display(), "summary comparison plot saved");
    Ok(Some(path))
}

fn draw_summary_comparison(
    path: &Path,
    series: &[(String, Vec<(f64, [f64; 3])>)],
    size: (u32, u32),
) -> DrawResult {
    const PANELS: [(&str, &str); 3] = [
        ("Modulus vs Length", "Modulus (MPa)"),
        ("Yield Stress vs Length", "Yield Stress (MPa)"),
        ("Max Force vs Length", "Max Force (N)"),
    ];

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 3));

    for (k, (panel, (title, y_desc))) in panels.iter().zip(PANELS).enumerate() {
        let xs = series.iter().flat_map(|(_, p)| p.iter().map(|q| q.0));
        let ys: Vec<f64> = series
            .iter()
            .flat_map(|(_, p)| p.iter().map(move |q| q.1[k]))
            .collect();
        let y_top = max_value(&ys).unwrap_or(1.0);
        let y_bottom = min_value(&ys).unwrap_or(0.0).min(0.0);

        let mut chart = ChartBuilder::on(panel)
            .caption(title, ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(
                padded_range(xs),
                y_bottom..(if y_top > y_bottom { y_top * 1.1 } else { y_bottom + 1.0 }),
            )?;

        chart
            .configure_mesh()
            .x_desc("Length (in)")
            .y_desc(y_desc)
            .draw()?;

        for (i, (group, points)) in series.iter().enumerate() {
            let color = Palette99::pick(i).mix(1.0);
            chart
                .draw_series(LineSeries::new(
                    points.iter().map(|&(x, v)| (x, v[k])),
                    color.stroke_width(2),
                ))?
                .label(group.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            chart.draw_series(
                points
                    .iter()
                    .map(|&(x, v)| Circle::new((x, v[k]), 4, color.filled())),
            )?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_table;
    use crate::report::append_individual_results;
    use crate::summary::{summarize_specimens, GroupSummary};
    use crate::table::{RawSample, RawTable};
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    fn specimen(path: &str, scale: f64) -> AnalyzedSpecimen {
        let samples = (0..200)
            .map(|i| RawSample {
                time: Some(i as f64 * 0.1),
                force: scale * (i as f64).min(120.0 + 0.2 * i as f64),
                stroke: i as f64 * 0.5,
            })
            .collect();
        analyze_table(&RawTable::new(path, samples)).unwrap()
    }

    fn settings(dir: &Path) -> OutputSettings {
        OutputSettings {
            output_dir: dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_trace_file_name() {
        let dir = tempdir().unwrap();
        let s = specimen("data/group_A/10in/pull--line-crimp-21--4.csv", 1.0);
        let path =
            plot_single_trace(&s, Channel::Strain, Channel::Stress, &settings(dir.path())).unwrap();
        assert_eq!(
            path,
            dir.path()
                .join("group_A")
                .join("10in")
                .join("plot-10in-21-single-Stress-vs-Strain-4.svg")
        );
        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_multi_trace_names() {
        let dir = tempdir().unwrap();
        let runs = vec![
            specimen("data/group_B/5in/pull--line-knot-30--1.csv", 1.0),
            specimen("data/group_B/5in/pull--line-knot-30--2.csv", 1.1),
        ];
        let settings = settings(dir.path());

        let named = plot_multi_trace(&runs, Channel::Strain, Channel::Stress, None, &settings)
            .unwrap()
            .unwrap();
        assert!(named.ends_with("group_B/5in/plot-5in-30-multi-Stress-vs-Strain.svg"));

        let suffixed = plot_multi_trace(
            &runs,
            Channel::Time,
            Channel::Force,
            Some("group_B_5in"),
            &settings,
        )
        .unwrap()
        .unwrap();
        assert!(suffixed.ends_with("plot-group_B_5in-multi-Force-vs-Time.svg"));
        assert!(suffixed.exists());

        assert_eq!(
            plot_multi_trace(&[], Channel::Strain, Channel::Stress, None, &settings).unwrap(),
            None
        );
    }

    #[test]
    fn test_output_plot_from_results() {
        let dir = tempdir().unwrap();
        let runs = vec![
            specimen("data/group_A/5in/pull--line-crimp-21--1.csv", 1.0),
            specimen("data/group_A/10in/pull--line-crimp-25--1.csv", 1.3),
        ];
        let csv_path = append_individual_results(dir.path(), &runs).unwrap();

        let path =
            plot_output_data(&csv_path, OutputParam::D, OutputParam::KE, &settings(dir.path()))
                .unwrap();
        assert_eq!(path, dir.path().join("output-KE-vs-D.svg"));
        assert!(path.exists());
    }

    #[test]
    fn test_summary_comparison() {
        let dir = tempdir().unwrap();
        let runs = vec![specimen("data/group_A/5in/a--line-crimp-21--1.csv", 1.0)];
        let mut lengths = BTreeMap::new();
        lengths.insert("5in".to_string(), summarize_specimens(&runs));
        lengths.insert("20in".to_string(), GroupSummary::default());
        let mut summary = BatchSummary::new();
        summary.insert("group_A".to_string(), lengths);

        let path = plot_summary_comparison(&summary, &settings(dir.path()))
            .unwrap()
            .unwrap();
        assert_eq!(path, dir.path().join("summary_comparison_by_length.svg"));

        assert_eq!(
            plot_summary_comparison(&BatchSummary::new(), &settings(dir.path())).unwrap(),
            None
        );
    }

    #[test]
    fn test_output_param_parsing() {
        assert_eq!("KE".parse::<OutputParam>().unwrap(), OutputParam::KE);
        assert!("ke".parse::<OutputParam>().is_err());
        assert_eq!(OutputParam::V.axis_label(), "Velocity (m/s)");
    }

    #[test]
    fn test_padded_range() {
        let r = padded_range([0.0, 10.0].into_iter());
        assert_eq!(r, -0.5..10.5);
        assert_eq!(padded_range([3.0].into_iter()), 2.0..4.0);
        assert_eq!(padded_range(std::iter::empty::<f64>()), 0.0..1.0);
        assert_eq!(length_inches("20in"), Some(20.0));
    }
}
