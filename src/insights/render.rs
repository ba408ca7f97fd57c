use crate::error::{CommitmapError, Result};
use crate::model::{DensityGrid, TimeBucket, DAY_ORDER, WEEKDAYS};
use image::{ImageBuffer, ImageEncoder, RgbaImage};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use usvg::{TreeParsing, TreeTextToPath};

const CELL_SIZE: usize = 56;
const CELL_GAP: usize = 4;
const DAY_LABEL_WIDTH: usize = 110;
const INTERVAL_LABEL_HEIGHT: usize = 40;
const TITLE_HEIGHT: usize = 36;
const LEGEND_HEIGHT: usize = 30;
const PADDING: usize = 16;

const FONT_FAMILY: &str = "sans-serif";
const TEXT_COLOR: &str = "#24292f";
const BACKGROUND_COLOR: &str = "#ffffff";

/// 5-step palette from low to high intensity.
const PALETTE: [&str; 5] = ["#ebedf0", "#9be9a8", "#40c463", "#30a14e", "#216e39"];

fn palette_index(count: u32, max: u32) -> usize {
    if count == 0 {
        return 0;
    }
    if max == 0 {
        return 1;
    }
    let ratio = count as f32 / max as f32;
    match ratio {
        r if r >= 0.75 => 4,
        r if r >= 0.50 => 3,
        r if r >= 0.25 => 2,
        _ => 1,
    }
}

fn color_for_count(count: u32, max: u32) -> &'static str {
    PALETTE[palette_index(count, max)]
}

/// Deterministic artifact location: `<dir>/{org}_{repo}_heatmap.png`.
pub fn heatmap_path(output_dir: &Path, organization: &str, repository: &str) -> PathBuf {
    output_dir.join(format!("{organization}_{repository}_heatmap.png"))
}

/// Render the density grid to an annotated PNG heatmap, creating the
/// output directory if needed. Returns the written path.
pub fn render_heatmap(
    grid: &DensityGrid,
    organization: &str,
    repository: &str,
    output_dir: &Path,
) -> Result<PathBuf> {
    let svg = heatmap_svg(grid, organization, repository);
    let png = rasterize(&svg)?;

    fs::create_dir_all(output_dir)?;
    let path = heatmap_path(output_dir, organization, repository);
    fs::write(&path, png)?;
    info!("heatmap written to {}", path.display());
    Ok(path)
}

fn heatmap_svg(grid: &DensityGrid, organization: &str, repository: &str) -> String {
    let graph_width = 8 * (CELL_SIZE + CELL_GAP) - CELL_GAP;
    let graph_height = 7 * (CELL_SIZE + CELL_GAP) - CELL_GAP;
    let total_width = DAY_LABEL_WIDTH + graph_width + PADDING;
    let total_height = TITLE_HEIGHT + INTERVAL_LABEL_HEIGHT + graph_height + LEGEND_HEIGHT + PADDING;
    let max = grid.max();

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg width="{total_width}" height="{total_height}" viewBox="0 0 {total_width} {total_height}" xmlns="http://www.w3.org/2000/svg">"#
    ));
    svg.push_str(&format!(
        r#"<rect width="100%" height="100%" fill="{BACKGROUND_COLOR}"/>"#
    ));

    // Title
    svg.push_str(&format!(
        r#"<text x="{PADDING}" y="24" font-family="{FONT_FAMILY}" font-size="16" fill="{TEXT_COLOR}">{organization}/{repository}: {} commits by weekday and time of day</text>"#,
        grid.total()
    ));

    // Interval labels across the top
    for (col, bucket) in TimeBucket::ALL.iter().enumerate() {
        let x = DAY_LABEL_WIDTH + col * (CELL_SIZE + CELL_GAP) + CELL_SIZE / 2;
        let y = TITLE_HEIGHT + INTERVAL_LABEL_HEIGHT - 10;
        svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" font-family="{FONT_FAMILY}" font-size="11" fill="{TEXT_COLOR}" text-anchor="middle">{bucket}</text>"#
        ));
    }

    // Day labels down the left
    for (row, label) in WEEKDAYS.iter().enumerate() {
        let x = DAY_LABEL_WIDTH - 10;
        let y = TITLE_HEIGHT + INTERVAL_LABEL_HEIGHT + row * (CELL_SIZE + CELL_GAP) + CELL_SIZE / 2 + 4;
        svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" font-family="{FONT_FAMILY}" font-size="12" fill="{TEXT_COLOR}" text-anchor="end">{label}</text>"#
        ));
    }

    // Cells with annotated counts
    for (row, &day) in DAY_ORDER.iter().enumerate() {
        for (col, &bucket) in TimeBucket::ALL.iter().enumerate() {
            let count = grid.get(day, bucket);
            let x = DAY_LABEL_WIDTH + col * (CELL_SIZE + CELL_GAP);
            let y = TITLE_HEIGHT + INTERVAL_LABEL_HEIGHT + row * (CELL_SIZE + CELL_GAP);
            svg.push_str(&format!(
                r#"<rect x="{x}" y="{y}" width="{CELL_SIZE}" height="{CELL_SIZE}" rx="3" fill="{}"/>"#,
                color_for_count(count, max)
            ));

            let text_color = if palette_index(count, max) >= 3 {
                "#ffffff"
            } else {
                TEXT_COLOR
            };
            svg.push_str(&format!(
                r#"<text x="{}" y="{}" font-family="{FONT_FAMILY}" font-size="13" fill="{text_color}" text-anchor="middle">{count}</text>"#,
                x + CELL_SIZE / 2,
                y + CELL_SIZE / 2 + 4
            ));
        }
    }

    // Legend at bottom right
    let legend_square = 14;
    let legend_y = TITLE_HEIGHT + INTERVAL_LABEL_HEIGHT + graph_height + 10;
    let legend_start_x =
        total_width - PADDING - 40 - PALETTE.len() * (legend_square + 3) - 35;
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" font-family="{FONT_FAMILY}" font-size="11" fill="{TEXT_COLOR}" text-anchor="end">Less</text>"#,
        legend_start_x + 30,
        legend_y + legend_square / 2 + 3
    ));
    for (i, color) in PALETTE.iter().enumerate() {
        let x = legend_start_x + 35 + i * (legend_square + 3);
        svg.push_str(&format!(
            r#"<rect x="{x}" y="{legend_y}" width="{legend_square}" height="{legend_square}" rx="3" fill="{color}"/>"#
        ));
    }
    svg.push_str(&format!(
        r#"<text x="{}" y="{}" font-family="{FONT_FAMILY}" font-size="11" fill="{TEXT_COLOR}" text-anchor="start">More</text>"#,
        legend_start_x + 40 + PALETTE.len() * (legend_square + 3),
        legend_y + legend_square / 2 + 3
    ));

    svg.push_str("</svg>");
    svg
}

fn rasterize(svg: &str) -> Result<Vec<u8>> {
    let mut fontdb = usvg::fontdb::Database::new();
    fontdb.load_system_fonts();

    let opts = usvg::Options::default();
    let mut tree = usvg::Tree::from_data(svg.as_bytes(), &opts)
        .map_err(|e| CommitmapError::Render(format!("SVG parse failed: {e}")))?;
    tree.convert_text(&fontdb);

    // 2x for crisp text
    let scale = 2.0;
    let size = tree.size.to_int_size();
    let width = (size.width() as f32 * scale) as u32;
    let height = (size.height() as f32 * scale) as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| CommitmapError::Render("failed to allocate pixmap".into()))?;
    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::Tree::from_usvg(&tree).render(transform, &mut pixmap.as_mut());

    let img: RgbaImage =
        ImageBuffer::from_raw(pixmap.width(), pixmap.height(), pixmap.data().to_vec())
            .ok_or_else(|| CommitmapError::Render("failed to build image buffer".into()))?;

    let mut buffer = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new_with_quality(
        &mut buffer,
        image::codecs::png::CompressionType::Best,
        image::codecs::png::FilterType::Adaptive,
    );
    encoder
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|e| CommitmapError::Render(format!("PNG encode failed: {e}")))?;

    Ok(buffer)
}
