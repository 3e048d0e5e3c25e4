//! The three dashboard charts, drawn with plotters into SVG strings.

use crate::aggregate::{DailyTotal, ItemTotal};
use crate::error::Res;
use crate::filter::FilterOptions;
use crate::render::format::abbreviate;
use chrono::NaiveDate;
use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

pub(crate) const CHART_SIZE: (u32, u32) = (640, 400);
const FONT: &str = "sans-serif";
const TITLE_SIZE: u32 = 20;
const LABEL_SIZE: u32 = 13;

const TEXT: RGBColor = RGBColor(0x2a, 0x3f, 0x5f);
const GRID: RGBColor = RGBColor(0xe5, 0xec, 0xf6);
const MUTED: RGBColor = RGBColor(0x9a, 0xa5, 0xb1);

/// A fixed qualitative palette.
const PALETTE: [RGBColor; 10] = [
    RGBColor(0x63, 0x6e, 0xfa),
    RGBColor(0xef, 0x55, 0x3b),
    RGBColor(0x00, 0xcc, 0x96),
    RGBColor(0xab, 0x63, 0xfa),
    RGBColor(0xff, 0xa1, 0x5a),
    RGBColor(0x19, 0xd3, 0xf3),
    RGBColor(0xff, 0x66, 0x92),
    RGBColor(0xb6, 0xe8, 0x80),
    RGBColor(0xff, 0x97, 0xff),
    RGBColor(0xfe, 0xcb, 0x52),
];

/// Assigns each item a color by its position in the table, so an item keeps its color in every
/// chart and under every filter.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    items: Vec<String>,
}

impl Palette {
    pub fn new(options: &FilterOptions) -> Self {
        Self {
            items: options.items.clone(),
        }
    }

    pub fn color(&self, item: &str) -> RGBColor {
        match self.items.iter().position(|i| i == item) {
            Some(ix) => PALETTE[ix % PALETTE.len()],
            None => MUTED,
        }
    }

    /// The color of a single-series chart.
    pub fn primary(&self) -> RGBColor {
        PALETTE[0]
    }

    /// The color as a CSS hex string.
    pub fn css(&self, item: &str) -> String {
        let RGBColor(r, g, b) = self.color(item);
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or_default()
}

/// The upper bound of a value axis with some headroom for labels.
fn axis_max(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.15
    } else {
        1.0
    }
}

/// Bars of summed `Total Spent` per item, in the order given, with abbreviated value labels.
pub fn sales_by_item(sales: &[ItemTotal], palette: &Palette) -> Res<String> {
    const TITLE: &str = "Total Sales per Item";
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        if sales.is_empty() {
            no_data(&root, TITLE)?;
        } else {
            let labels: Vec<&str> = sales.iter().map(|t| t.item.as_str()).collect();
            let max = sales
                .iter()
                .map(|t| to_f64(t.total))
                .fold(0.0, f64::max);
            let mut chart = ChartBuilder::on(&root)
                .caption(TITLE, (FONT, TITLE_SIZE).into_font().color(&TEXT))
                .margin(12)
                .x_label_area_size(40)
                .y_label_area_size(60)
                .build_cartesian_2d((0..sales.len()).into_segmented(), 0f64..axis_max(max))?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .light_line_style(WHITE)
                .bold_line_style(GRID)
                .axis_style(MUTED)
                .label_style((FONT, LABEL_SIZE).into_font().color(&TEXT))
                .y_desc("Revenue ($)")
                .y_label_formatter(&|v| abbreviate(*v))
                .x_label_formatter(&|v| match v {
                    SegmentValue::CenterOf(ix) | SegmentValue::Exact(ix) => {
                        labels.get(*ix).map(|s| s.to_string()).unwrap_or_default()
                    }
                    SegmentValue::Last => String::new(),
                })
                .draw()?;

            chart.draw_series(sales.iter().enumerate().map(|(ix, t)| {
                let mut bar = Rectangle::new(
                    [
                        (SegmentValue::Exact(ix), 0.0),
                        (SegmentValue::Exact(ix + 1), to_f64(t.total)),
                    ],
                    palette.color(&t.item).filled(),
                );
                bar.set_margin(0, 0, 10, 10);
                bar
            }))?;

            let value_style = TextStyle::from((FONT, LABEL_SIZE).into_font())
                .color(&TEXT)
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            chart.draw_series(sales.iter().enumerate().map(|(ix, t)| {
                let value = to_f64(t.total);
                Text::new(
                    abbreviate(value),
                    (SegmentValue::CenterOf(ix), value),
                    value_style.clone(),
                )
            }))?;
        }
        root.present()?;
    }
    Ok(svg)
}

/// A donut of summed `Quantity` per item. Items without a positive quantity have no slice.
pub fn quantity_by_item(quantities: &[ItemTotal], palette: &Palette) -> Res<String> {
    const TITLE: &str = "Item Quantity Distribution";
    let slices: Vec<(&str, f64)> = quantities
        .iter()
        .map(|t| (t.item.as_str(), to_f64(t.total)))
        .filter(|(_, q)| *q > 0.0)
        .collect();

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        if slices.is_empty() {
            no_data(&root, TITLE)?;
        } else {
            let area = root.titled(TITLE, (FONT, TITLE_SIZE).into_font().color(&TEXT))?;
            let (width, height) = area.dim_in_pixel();
            let center = (width as i32 / 2, height as i32 / 2);
            let radius = f64::from(width.min(height)) * 0.35;

            let sizes: Vec<f64> = slices.iter().map(|(_, q)| *q).collect();
            let colors: Vec<RGBColor> = slices.iter().map(|(i, _)| palette.color(i)).collect();
            let labels: Vec<&str> = slices.iter().map(|(i, _)| *i).collect();

            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.donut_hole(radius * 0.4);
            pie.label_style((FONT, LABEL_SIZE).into_font().color(&TEXT));
            pie.percentages((FONT, LABEL_SIZE - 1).into_font().color(&WHITE));
            area.draw(&pie)?;
        }
        root.present()?;
    }
    Ok(svg)
}

/// Summed `Total Spent` per date, connected in date order.
pub fn daily_sales(daily: &[DailyTotal], palette: &Palette) -> Res<String> {
    const TITLE: &str = "Daily Sales Trend";
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;
        match (daily.first(), daily.last()) {
            (Some(first), Some(last)) => {
                let points: Vec<(NaiveDate, f64)> = daily
                    .iter()
                    .map(|d| (d.date, d.total.to_f64()))
                    .collect();
                let max = points.iter().map(|(_, v)| *v).fold(0.0, f64::max);
                let start = first.date.pred_opt().unwrap_or(first.date);
                let end = last.date.succ_opt().unwrap_or(last.date);

                let mut chart = ChartBuilder::on(&root)
                    .caption(TITLE, (FONT, TITLE_SIZE).into_font().color(&TEXT))
                    .margin(12)
                    .x_label_area_size(40)
                    .y_label_area_size(60)
                    .build_cartesian_2d(start..end, 0f64..axis_max(max))?;

                chart
                    .configure_mesh()
                    .light_line_style(WHITE)
                    .bold_line_style(GRID)
                    .axis_style(MUTED)
                    .label_style((FONT, LABEL_SIZE).into_font().color(&TEXT))
                    .x_labels(6)
                    .x_desc("Date")
                    .y_desc("Revenue ($)")
                    .x_label_formatter(&|d| d.format("%Y-%m-%d").to_string())
                    .y_label_formatter(&|v| abbreviate(*v))
                    .draw()?;

                let color = palette.primary();
                chart.draw_series(LineSeries::new(
                    points.iter().copied(),
                    ShapeStyle::from(&color).stroke_width(2),
                ))?;
                chart.draw_series(
                    points
                        .iter()
                        .map(|point| Circle::new(*point, 3, color.filled())),
                )?;
            }
            _ => no_data(&root, TITLE)?,
        }
        root.present()?;
    }
    Ok(svg)
}

/// An empty frame with the chart title and a "No data" caption.
fn no_data(root: &DrawingArea<SVGBackend<'_>, Shift>, title: &str) -> Res<()> {
    let area = root.titled(title, (FONT, TITLE_SIZE).into_font().color(&TEXT))?;
    let (width, height) = area.dim_in_pixel();
    area.draw(&Rectangle::new(
        [(0, 0), (width as i32 - 1, height as i32 - 1)],
        ShapeStyle::from(&GRID).stroke_width(1),
    ))?;
    let style = TextStyle::from((FONT, TITLE_SIZE).into_font())
        .color(&MUTED)
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(
        "No data",
        (width as i32 / 2, height as i32 / 2),
        style,
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;

    fn total(item: &str, v: i64) -> ItemTotal {
        ItemTotal {
            item: item.to_string(),
            total: Decimal::from(v),
        }
    }

    fn palette() -> Palette {
        Palette::new(&FilterOptions {
            min_date: None,
            max_date: None,
            items: vec!["Coffee".into(), "Tea".into(), "Cake".into()],
        })
    }

    #[test]
    fn test_palette_is_stable() {
        let palette = palette();
        assert_eq!(palette.color("Coffee"), PALETTE[0]);
        assert_eq!(palette.color("Cake"), PALETTE[2]);
        assert_eq!(palette.color("Unknown"), MUTED);
        assert_eq!(palette.css("Coffee"), "#636efa");
    }

    #[test]
    fn test_bar_chart_has_labels_and_colors() {
        let svg = sales_by_item(&[total("Cake", 2500), total("Tea", 8)], &palette()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Total Sales per Item"));
        assert!(svg.contains("2.5k"));
        assert!(svg.contains("8.0"));
        assert!(svg.contains("Revenue ($)"));
        assert!(svg.to_lowercase().contains("#00cc96"));
    }

    #[test]
    fn test_empty_charts_say_no_data() {
        let palette = palette();
        assert!(sales_by_item(&[], &palette).unwrap().contains("No data"));
        assert!(quantity_by_item(&[], &palette).unwrap().contains("No data"));
        assert!(daily_sales(&[], &palette).unwrap().contains("No data"));
        // A zero quantity has no slice to draw.
        assert!(quantity_by_item(&[total("Tea", 0)], &palette)
            .unwrap()
            .contains("No data"));
    }

    #[test]
    fn test_donut_and_line() {
        let palette = palette();
        let donut = quantity_by_item(&[total("Coffee", 3), total("Tea", 1)], &palette).unwrap();
        assert!(donut.contains("Item Quantity Distribution"));
        assert!(donut.contains("Coffee"));

        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let line = daily_sales(
            &[DailyTotal {
                date: day,
                total: Amount::new(Decimal::from(10)),
            }],
            &palette,
        )
        .unwrap();
        assert!(line.contains("Daily Sales Trend"));
        assert!(line.contains("Revenue ($)"));
        assert!(!line.contains("No data"));
    }
}
