use crate::plot::color::FONT_SIZE;
use anyhow::{Context, Result};
use log::info;
use plotters::{
    coord::Shift,
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use std::{fs, path::Path};

pub mod bars;
pub mod color;
pub mod experiments;
pub mod line;
pub mod traces;

pub const NO_DATA_MESSAGE: &str = "No data for this selection";

/// Width reserved on the right of every chart for the legend.
const LEGEND_WIDTH_PX: u32 = 240;
const LEGEND_BOX_PX: i32 = 16;
const LEGEND_ROW_PX: i32 = 24;

/// Creates an SVG surface at `path`, lets `draw` paint on it, and writes
/// the file.
pub fn svg_file<F>(path: &Path, size: (u32, u32), draw: F) -> Result<()>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<()>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("error creating plot directory (path={})", parent.display()))?;
    }

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    draw(&root)?;
    root.present()?;
    info!("generated plot at: {}", path.display());

    Ok(())
}

/// Splits `area` into the plotting area and the legend column on its right.
pub(crate) fn split_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
) -> (DrawingArea<DB, Shift>, DrawingArea<DB, Shift>) {
    let (width, _) = area.dim_in_pixel();
    let plot_width = width.saturating_sub(LEGEND_WIDTH_PX).max(width / 2);
    area.split_horizontally(plot_width as i32)
}

/// Draws a column of colored boxes with their labels, under a title.
pub(crate) fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    entries: &[(String, RGBColor)],
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let x_pos = 10;
    let mut y_pos = 40;

    area.draw(&Text::new(
        title.to_string(),
        (x_pos, y_pos),
        ("sans-serif", FONT_SIZE).into_font().color(&BLACK),
    ))?;

    for (label, color) in entries {
        y_pos += LEGEND_ROW_PX;

        // Color box + frame
        let corners = [(x_pos, y_pos), (x_pos + LEGEND_BOX_PX, y_pos + LEGEND_BOX_PX)];
        area.draw(&Rectangle::new(corners, color.filled()))?;
        area.draw(&Rectangle::new(corners, BLACK.stroke_width(1)))?;

        area.draw(&Text::new(
            label.clone(),
            (x_pos + LEGEND_BOX_PX + 8, y_pos),
            ("sans-serif", FONT_SIZE - 2).into_font(),
        ))?;
    }

    Ok(())
}

/// Placeholder shown instead of an empty chart.
pub fn draw_no_data<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, title: &str) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (width, height) = area.dim_in_pixel();
    let centered = |size: i32| {
        TextStyle::from(("sans-serif", size).into_font()).pos(Pos::new(HPos::Center, VPos::Center))
    };

    if !title.is_empty() {
        area.draw(&Text::new(
            title.to_string(),
            (width as i32 / 2, 20),
            centered(color::TITLE_FONT_SIZE),
        ))?;
    }
    area.draw(&Text::new(
        NO_DATA_MESSAGE,
        (width as i32 / 2, height as i32 / 2),
        centered(FONT_SIZE),
    ))?;

    Ok(())
}
