use crate::{
    loader::FORECAST_TABLE,
    model::{format_quantity, FilterSelection, ForecastRecord, ForecastTable},
    session::Session,
    view::{render, DashboardView, ForecastView},
};
use anyhow::Context as _;
use chrono::{Datelike, NaiveDate};
use eframe::egui;
use egui::{Color32, Context, FontFamily, FontId, Margin, RichText, Stroke, Visuals};
use egui_extras::{Column, DatePickerButton, TableBuilder};
use egui_plot::{Line, Plot, PlotPoints};
use tracing::error;

const ACCENT: Color32 = Color32::from_rgb(110, 190, 230);
const MUTED: Color32 = Color32::from_rgb(160, 170, 185);
const WARN: Color32 = Color32::from_rgb(240, 190, 80);
const FAIL: Color32 = Color32::from_rgb(240, 110, 110);

pub fn set_custom_style(ctx: &Context) {
    // Slate dashboard theme
    let mut visuals = Visuals::dark();

    visuals.panel_fill = Color32::from_rgb(18, 22, 30);
    visuals.window_fill = Color32::from_rgb(24, 29, 38);
    visuals.extreme_bg_color = Color32::from_rgb(30, 36, 48);
    visuals.faint_bg_color = Color32::from_rgb(26, 32, 42);

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(36, 44, 58);
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, Color32::from_rgb(60, 72, 92));

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(44, 56, 74);
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.5, ACCENT);

    visuals.widgets.active.bg_fill = Color32::from_rgb(52, 68, 92);
    visuals.widgets.active.bg_stroke = Stroke::new(2.0, ACCENT);

    visuals.selection.bg_fill = Color32::from_rgb(40, 90, 120);
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();

    // Dense rows: the table is the main content.
    style.spacing.item_spacing = egui::vec2(6.0, 4.0);
    style.spacing.window_margin = Margin::symmetric(16, 10);
    style.spacing.button_padding = egui::vec2(10.0, 5.0);
    style.spacing.combo_width = 200.0;

    for (text_style, size, family) in [
        (egui::TextStyle::Body, 14.0, FontFamily::Proportional),
        (egui::TextStyle::Button, 14.0, FontFamily::Proportional),
        (egui::TextStyle::Small, 11.5, FontFamily::Proportional),
        (egui::TextStyle::Monospace, 13.0, FontFamily::Monospace),
        (egui::TextStyle::Heading, 19.0, FontFamily::Proportional),
    ] {
        style.text_styles.insert(text_style, FontId::new(size, family));
    }

    ctx.set_style(style);
}

pub struct DashboardApp {
    session: Session,
    selection: FilterSelection,
    // Last load failure, shown until the user retries.
    load_error: Option<String>,
}

impl DashboardApp {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            selection: FilterSelection::default(),
            load_error: None,
        }
    }

    fn load_table(&mut self) -> Option<std::sync::Arc<ForecastTable>> {
        if self.load_error.is_some() {
            return None;
        }
        match self
            .session
            .table()
            .with_context(|| format!("failed to load {FORECAST_TABLE}"))
        {
            Ok(table) => Some(table),
            Err(err) => {
                error!("{err:#}");
                self.load_error = Some(format!("{err:#}"));
                None
            }
        }
    }

    /// Clear the latched error and start over with a fresh connection.
    fn retry(&mut self) {
        self.load_error = None;
        self.session.reset();
    }

    fn reload(&mut self) {
        self.session.invalidate_table();
    }

    fn show_error(&mut self, ctx: &Context) {
        let Some(message) = self.load_error.clone() else {
            return;
        };
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::Frame::new()
                .fill(Color32::from_rgb(48, 24, 28))
                .stroke(Stroke::new(1.5, FAIL))
                .inner_margin(Margin::same(12))
                .show(ui, |ui| {
                    ui.label(RichText::new("⚠ Could not load forecast data").color(FAIL).strong());
                    ui.add_space(6.0);
                    ui.label(RichText::new(message).monospace());
                    ui.add_space(6.0);
                    if ui.button("Retry").clicked() {
                        self.retry();
                    }
                });
        });
    }

    /// Sidebar controls. Returns true when a reload was requested.
    fn show_filters(&mut self, ctx: &Context, view: &ForecastView<'_>) -> bool {
        let mut reload = false;

        egui::SidePanel::left("filters")
            .min_width(240.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                ui.heading(RichText::new("🔍 Filters").color(ACCENT));
                ui.separator();

                ui.label(RichText::new("Select Product ID").strong());
                egui::ComboBox::from_id_salt("product_id")
                    .selected_text(view.product.to_string())
                    .show_ui(ui, |ui| {
                        for product in &view.products {
                            if ui
                                .selectable_label(*product == view.product, product.to_string())
                                .clicked()
                            {
                                self.selection.product = Some(product.clone());
                            }
                        }
                    });

                ui.add_space(10.0);

                ui.label(RichText::new("Select Forecast Date Range").strong());
                let mut start = view.start;
                let mut end = view.end;
                ui.horizontal(|ui| {
                    ui.label("From");
                    ui.add(DatePickerButton::new(&mut start).id_salt("forecast_start"));
                });
                ui.horizontal(|ui| {
                    ui.label("To");
                    ui.add(DatePickerButton::new(&mut end).id_salt("forecast_end"));
                });
                if start != view.start {
                    self.selection.start = Some(start);
                }
                if end != view.end {
                    self.selection.end = Some(end);
                }
                if view.range_inverted() {
                    ui.label(RichText::new("Start date is after end date").color(WARN).small());
                }

                let (lo, hi) = view.date_bounds;
                ui.label(RichText::new(format!("Available: {lo} to {hi}")).color(MUTED).small());
                if ui.button("Full range").clicked() {
                    self.selection.start = None;
                    self.selection.end = None;
                }

                ui.add_space(10.0);
                ui.separator();

                if ui.button("🔄 Reload data").clicked() {
                    reload = true;
                }
            });

        reload
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.heading(
                RichText::new("📦 Inventory Forecast Dashboard")
                    .color(ACCENT)
                    .strong()
                    .size(26.0),
            );
            ui.add_space(4.0);
        });

        let Some(table) = self.load_table() else {
            self.show_error(ctx);
            return;
        };

        let view = match render(&table, &self.selection) {
            DashboardView::NoData => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    egui::Frame::new()
                        .fill(Color32::from_rgb(48, 40, 20))
                        .stroke(Stroke::new(1.5, WARN))
                        .inner_margin(Margin::same(12))
                        .show(ui, |ui| {
                            ui.label(RichText::new("⚠ No data available.").color(WARN));
                        });
                });
                return;
            }
            DashboardView::Ready(view) => view,
        };

        let reload = self.show_filters(ctx, &view);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label(RichText::new("📋 Forecast Data").size(20.0).strong());
            ui.label(
                RichText::new(format!("{} rows for product {}", view.rows.len(), view.product))
                    .color(MUTED)
                    .small(),
            );
            ui.push_id("forecast_table", |ui| {
                forecast_table(ui, table.columns(), view.rows.rows());
            });
            if view.rows.is_empty() {
                ui.label(RichText::new("No rows match the current filters.").color(MUTED).italics());
            }

            ui.add_space(12.0);
            ui.separator();

            ui.label(RichText::new("📈 Forecast Quantity Over Time").size(20.0).strong());
            forecast_chart(ui, &view.series);
        });

        if reload {
            self.reload();
        }
    }
}

fn forecast_table(ui: &mut egui::Ui, columns: &[String], rows: &[&ForecastRecord]) {
    let mut builder = TableBuilder::new(ui)
        .striped(true)
        .vscroll(true)
        .max_scroll_height(320.0)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center));
    for _ in columns {
        builder = builder.column(Column::auto().at_least(110.0).clip(true));
    }
    builder = builder.column(Column::remainder());

    builder
        .header(28.0, |mut header| {
            for name in columns {
                header.col(|ui| {
                    ui.label(RichText::new(name.as_str()).color(ACCENT).strong());
                });
            }
            header.col(|_| {});
        })
        .body(|body| {
            body.rows(24.0, rows.len(), |mut row| {
                let r = rows[row.index()];
                for column in columns {
                    row.col(|ui| {
                        ui.label(r.cell_text(column));
                    });
                }
                row.col(|_| {});
            });
        });
}

fn forecast_chart(ui: &mut egui::Ui, series: &[(NaiveDate, f64)]) {
    let points: PlotPoints = series
        .iter()
        .map(|(date, qty)| [date_to_x(*date), *qty])
        .collect();

    Plot::new("forecast_quantity_plot")
        .height(320.0)
        .x_axis_label("forecast_date")
        .y_axis_label("forecast_quantity")
        .x_axis_formatter(|mark, _range| {
            x_to_date(mark.value).map(|d| d.to_string()).unwrap_or_default()
        })
        .label_formatter(|_name, point| match x_to_date(point.x) {
            Some(d) => format!("{d}\n{}", format_quantity(point.y)),
            None => String::new(),
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new("forecast_quantity", points)
                    .color(ACCENT)
                    .width(2.0),
            );
        });
}

fn date_to_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn x_to_date(x: f64) -> Option<NaiveDate> {
    if x.fract().abs() > 1e-6 || !x.is_finite() {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x as i32)
}
