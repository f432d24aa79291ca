use std::fs;
use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::MonitorError;
use crate::types::FrameView;

#[derive(Clone, Debug)]
pub struct CaptureStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
}

impl Default for CaptureStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 700,
            background: RGBColor(10, 10, 10),
            palette: vec![CYAN, YELLOW, MAGENTA, GREEN, RED, BLUE, WHITE],
        }
    }
}

/// Renders the stacked-trace frame to an in-memory PNG, the same view the
/// GUI shows at the moment an alert fired.
pub fn render_frame_png(view: &FrameView, style: CaptureStyle) -> Result<Vec<u8>, MonitorError> {
    if view.panes.iter().all(|pane| pane.samples.is_empty()) {
        return Err(MonitorError::Capture("frame has no samples".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let x_max = view
            .panes
            .iter()
            .map(|pane| pane.samples.len())
            .max()
            .unwrap_or(0) as f64;
        let y_min = view
            .panes
            .iter()
            .flat_map(|pane| pane.samples.iter().map(|s| s + pane.row_offset))
            .fold(f64::INFINITY, f64::min);
        let y_max = view
            .panes
            .iter()
            .flat_map(|pane| pane.samples.iter().map(|s| s + pane.row_offset))
            .fold(f64::NEG_INFINITY, f64::max);
        let y_bounds = if (y_max - y_min).abs() < f64::EPSILON {
            (y_min - 50.0, y_max + 50.0)
        } else {
            (y_min, y_max)
        };
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption("seiswatch", ("sans-serif", 20).into_font().color(&WHITE))
            .set_label_area_size(LabelAreaPosition::Left, 45)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0f64..x_max.max(1.0), y_bounds.0..y_bounds.1)?;
        chart
            .configure_mesh()
            .light_line_style(&WHITE.mix(0.1))
            .draw()?;
        for (idx, pane) in view.panes.iter().enumerate() {
            if pane.samples.is_empty() {
                continue;
            }
            let color = style.palette[idx % style.palette.len()];
            let series = pane
                .samples
                .iter()
                .enumerate()
                .map(|(i, s)| (i as f64, s + pane.row_offset));
            chart
                .draw_series(LineSeries::new(series, &color))?
                .label(pane.legend())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        }
        chart
            .configure_series_labels()
            .border_style(&WHITE.mix(0.2))
            .background_style(&style.background)
            .draw()?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}

/// Writes the capture next to the binary as `capture@<RFC 3339 UTC>.png`
/// and returns the filename.
pub fn save_frame_png(view: &FrameView) -> Result<String, MonitorError> {
    let png = render_frame_png(view, CaptureStyle::default())?;
    let stamp = OffsetDateTime::now_utc().format(&Rfc3339)?;
    let name = format!("capture@{stamp}.png");
    fs::write(&name, png).map_err(|err| MonitorError::Capture(err.to_string()))?;
    Ok(name)
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, MonitorError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| MonitorError::Capture("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
