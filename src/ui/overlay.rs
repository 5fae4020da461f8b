//! Overlay UI: selected-country panel with the Back button, hover label
//! and status line.

use country_globe::state::{AppState, CountryEvent};
use eframe::egui::{self, Align2, Color32, RichText};
use egui_phosphor::regular as icons;

/// Left margin of the selection panel. The focused globe is shifted right
/// by the camera view offset to leave room for it.
const PANEL_MARGIN: f32 = 24.0;

pub fn render_overlay(ctx: &egui::Context, state: &mut AppState) {
    render_selection_panel(ctx, state);
    render_status(ctx, state);
}

fn render_selection_panel(ctx: &egui::Context, state: &mut AppState) {
    let Some(country) = state.selected_country() else {
        return;
    };
    let name = country.name.clone();
    let details = match (country.code.is_empty(), country.region.is_empty()) {
        (false, false) => format!("{} · {}", country.code, country.region),
        (false, true) => country.code.clone(),
        (true, false) => country.region.clone(),
        (true, true) => String::new(),
    };

    let mut back_clicked = false;
    egui::Area::new(egui::Id::new("selection_panel"))
        .anchor(Align2::LEFT_TOP, [PANEL_MARGIN, PANEL_MARGIN])
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_min_width(220.0);
                let back = ui.button(
                    RichText::new(format!("{} Back", icons::ARROW_LEFT)).size(14.0),
                );
                back_clicked = back.clicked();

                ui.add_space(8.0);
                ui.label(
                    RichText::new(name)
                        .strong()
                        .size(22.0)
                        .color(Color32::WHITE),
                );
                if !details.is_empty() {
                    ui.label(RichText::new(details).size(13.0).color(Color32::GRAY));
                }
            });
        });

    if back_clicked {
        state.dispatch(CountryEvent::ClearSelection);
    }
}

fn render_status(ctx: &egui::Context, state: &AppState) {
    let hovered = state.hovered_country().map(|c| c.name.clone());

    egui::Area::new(egui::Id::new("status_line"))
        .anchor(Align2::LEFT_BOTTOM, [PANEL_MARGIN, -PANEL_MARGIN])
        .interactable(false)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(name) = hovered {
                    ui.label(
                        RichText::new(format!("{} {}", icons::MAP_PIN, name))
                            .size(14.0)
                            .color(Color32::WHITE),
                    );
                    ui.separator();
                }
                ui.label(
                    RichText::new(&state.status_message)
                        .size(12.0)
                        .color(Color32::GRAY),
                );
            });
        });
}
