use crate::{min_and_max, Error};
use plotters::coord::ranged1d::ValueFormatter;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter};
use std::ops::Range;
use std::path::Path;
use tracing::{debug, warn};

pub const DPI: u32 = 300;
/// 6.4 x 4.8 inches at 300 dpi
pub const WIDTH: u32 = 1920;
pub const HEIGHT: u32 = 1440;
/// half a point at 300 dpi
pub const STROKE_WIDTH: u32 = 2;
/// fraction of the data span added on each side of both axes
pub const AXIS_MARGIN: f64 = 0.05;

const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);
const INCH_PER_METER: f64 = 39.3701;

/// Vertical axis scale of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Linear,
    Log,
}

impl Scale {
    /// values that can be placed on this axis, the others break the line
    pub fn accepts(self, v: f64) -> bool {
        match self {
            Scale::Linear => v.is_finite(),
            Scale::Log => v.is_finite() && v > 0.,
        }
    }
}

/// One line plot of a series against its row index.
/// Every render draws on its own freshly allocated buffer.
#[derive(Debug, Clone)]
pub struct LineChart<'a> {
    pub values: &'a [f64],
    pub scale: Scale,
}

impl<'a> LineChart<'a> {
    pub fn new(values: &'a [f64], scale: Scale) -> LineChart<'a> {
        LineChart { values, scale }
    }

    /// runs of consecutive drawable points as (row index, value)
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current: Vec<(f64, f64)> = Vec::new();
        for (i, &v) in self.values.iter().enumerate() {
            if self.scale.accepts(v) {
                current.push((i as f64, v));
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    pub fn x_range(&self) -> Range<f64> {
        let last = self.values.len().saturating_sub(1) as f64;
        if last == 0. {
            return -0.5..0.5;
        }
        let margin = last * AXIS_MARGIN;
        -margin..last + margin
    }

    pub fn y_range(&self) -> Range<f64> {
        let scale = self.scale;
        let bounds = min_and_max(self.values, |v| scale.accepts(*v));
        match (scale, bounds) {
            (Scale::Linear, None) => 0.0..1.0,
            (Scale::Linear, Some((ymin, ymax))) => {
                let span = ymax - ymin;
                if span > 0. {
                    ymin - span * AXIS_MARGIN..ymax + span * AXIS_MARGIN
                } else {
                    let pad = if ymin == 0. { 1. } else { ymin.abs() * AXIS_MARGIN };
                    ymin - pad..ymax + pad
                }
            }
            (Scale::Log, None) => 1.0..10.0,
            (Scale::Log, Some((ymin, ymax))) => {
                let (lmin, lmax) = (ymin.log10(), ymax.log10());
                let span = lmax - lmin;
                let pad = if span > 0. { span * AXIS_MARGIN } else { 0.5 };
                10f64.powf(lmin - pad)..10f64.powf(lmax + pad)
            }
        }
    }

    /// Renders the chart and writes it as a png at `DPI` to `fout`, replacing any existing file.
    pub fn save(&self, fout: &Path) -> Result<(), Error> {
        let buffer = match self.render(true) {
            Ok(b) => b,
            Err(e) => {
                warn!(
                    "drawing {} with tick labels failed ({}), drawing without labels",
                    fout.display(),
                    e
                );
                self.render(false).map_err(|message| Error::Render {
                    path: fout.to_path_buf(),
                    message,
                })?
            }
        };
        write_png(fout, &buffer, WIDTH, HEIGHT, DPI).map_err(|source| Error::OutputWrite {
            path: fout.to_path_buf(),
            source,
        })?;
        debug!("saved {}", fout.display());
        Ok(())
    }

    /// Draws onto a new RGB buffer of WIDTH x HEIGHT.
    pub fn render(&self, labels: bool) -> Result<Vec<u8>, String> {
        let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
            root.fill(&WHITE).map_err(|e| e.to_string())?;
            let segments = self.segments();
            let builder = &mut ChartBuilder::on(&root);
            builder.margin(40);
            if labels {
                builder.x_label_area_size(110).y_label_area_size(200);
            } else {
                builder.x_label_area_size(20).y_label_area_size(20);
            }
            match self.scale {
                Scale::Linear => {
                    let mut chart = builder
                        .build_cartesian_2d(self.x_range(), self.y_range())
                        .map_err(|e| e.to_string())?;
                    draw_lines(&mut chart, &segments, self.values.len(), &linear_label, labels)
                        .map_err(|e| e.to_string())?;
                }
                Scale::Log => {
                    let mut chart = builder
                        .build_cartesian_2d(self.x_range(), self.y_range().log_scale())
                        .map_err(|e| e.to_string())?;
                    draw_lines(&mut chart, &segments, self.values.len(), &log_label, labels)
                        .map_err(|e| e.to_string())?;
                }
            }
            root.present().map_err(|e| e.to_string())?;
        }
        Ok(buffer)
    }
}

fn draw_lines<DB, Y>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, Y>>,
    segments: &[Vec<(f64, f64)>],
    rows: usize,
    y_fmt: &dyn Fn(&f64) -> String,
    labels: bool,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>>
where
    DB: DrawingBackend,
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    let x_fmt = index_label;
    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh()
        .axis_style(BLACK.stroke_width(STROKE_WIDTH))
        .set_all_tick_mark_size(12);
    if labels {
        mesh.label_style(("sans-serif", 42))
            .x_labels(x_label_count(rows))
            .x_label_formatter(&x_fmt)
            .y_label_formatter(y_fmt);
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw()?;

    for segment in segments {
        chart.draw_series(LineSeries::new(
            segment.iter().copied(),
            LINE_COLOR.stroke_width(STROKE_WIDTH),
        ))?;
    }
    Ok(())
}

/// at most one x tick per row, and never more than ten
pub fn x_label_count(rows: usize) -> usize {
    rows.max(2).min(10)
}

/// x ticks are row indices; ticks between rows stay unlabelled
pub fn index_label(x: &f64) -> String {
    if (x - x.round()).abs() < 1e-9 {
        format!("{:.0}", x.round() + 0.)
    } else {
        String::new()
    }
}

/// at most six decimals, without trailing zeros
pub fn linear_label(y: &f64) -> String {
    let s = format!("{:.6}", y);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// decades as `10^k`, anything else in short scientific notation
pub fn log_label(y: &f64) -> String {
    let decade = y.log10();
    if (decade - decade.round()).abs() < 1e-9 {
        format!("10^{}", decade.round() as i64)
    } else {
        format!("{:.0e}", y)
    }
}

/// Writes 8 bit RGB pixels as a png carrying the resolution in its pHYs chunk.
pub fn write_png(fout: &Path, rgb: &[u8], width: u32, height: u32, dpi: u32) -> io::Result<()> {
    let file = File::create(fout)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let ppm = (dpi as f64 * INCH_PER_METER).round() as u32;
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: png::Unit::Meter,
    }));
    let mut writer = encoder.write_header().map_err(encoding_to_io)?;
    writer.write_image_data(rgb).map_err(encoding_to_io)?;
    writer.finish().map_err(encoding_to_io)?;
    Ok(())
}

fn encoding_to_io(e: png::EncodingError) -> io::Error {
    match e {
        png::EncodingError::IoError(e) => e,
        other => io::Error::new(io::ErrorKind::Other, other.to_string()),
    }
}
