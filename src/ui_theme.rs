use crate::app::ActivityLevel;
use eframe::egui::{self, Color32, FontFamily, FontId, Rounding, Shadow, Stroke, Vec2};

pub struct StudioTheme {
    // Colors
    pub background: Color32,
    pub surface: Color32,
    pub surface_hover: Color32,
    pub card: Color32,
    pub placeholder: Color32,
    pub border: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,
    pub accent: Color32,
    pub accent_hover: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub error: Color32,

    // Overlay editing
    pub overlay_idle: Color32,
    pub overlay_active: Color32,
    pub handle_radius: f32,

    // Spacing
    pub spacing_small: f32,
    pub spacing_medium: f32,
    pub spacing_large: f32,
    pub padding_medium: f32,
    pub padding_large: f32,

    // Border radius
    pub radius_medium: Rounding,
    pub radius_large: Rounding,

    pub shadow_card: Shadow,

    // Typography
    pub font_small: FontId,
    pub font_medium: FontId,
    pub font_title: FontId,
}

impl Default for StudioTheme {
    fn default() -> Self {
        Self {
            // slate / indigo light theme
            background: Color32::from_rgb(248, 250, 252),
            surface: Color32::from_rgb(255, 255, 255),
            surface_hover: Color32::from_rgb(241, 245, 249),
            card: Color32::from_rgb(255, 255, 255),
            placeholder: Color32::from_rgb(226, 232, 240),
            border: Color32::from_rgb(203, 213, 225),
            text_primary: Color32::from_rgb(15, 23, 42),
            text_secondary: Color32::from_rgb(71, 85, 105),
            text_muted: Color32::from_rgb(148, 163, 184),
            accent: Color32::from_rgb(79, 70, 229),
            accent_hover: Color32::from_rgb(67, 56, 202),
            success: Color32::from_rgb(22, 163, 74),
            warning: Color32::from_rgb(217, 119, 6),
            error: Color32::from_rgb(220, 38, 38),

            overlay_idle: Color32::from_rgba_unmultiplied(129, 140, 248, 120),
            overlay_active: Color32::from_rgb(99, 102, 241),
            handle_radius: 8.0,

            spacing_small: 4.0,
            spacing_medium: 8.0,
            spacing_large: 16.0,
            padding_medium: 10.0,
            padding_large: 16.0,

            radius_medium: Rounding::same(10.0),
            radius_large: Rounding::same(18.0),

            shadow_card: Shadow {
                offset: Vec2::new(0.0, 2.0),
                blur: 10.0,
                spread: 0.0,
                color: Color32::from_black_alpha(25),
            },

            font_small: FontId::new(11.0, FontFamily::Proportional),
            font_medium: FontId::new(14.0, FontFamily::Proportional),
            font_title: FontId::new(20.0, FontFamily::Proportional),
        }
    }
}

impl StudioTheme {
    pub fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();
        style.visuals = egui::Visuals::light();

        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.surface;
        style.visuals.window_rounding = self.radius_large;
        style.visuals.extreme_bg_color = self.surface;

        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.text_primary);
        style.visuals.widgets.inactive.bg_fill = self.surface;
        style.visuals.widgets.inactive.weak_bg_fill = self.surface;
        style.visuals.widgets.inactive.rounding = self.radius_medium;
        style.visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, self.border);

        style.visuals.widgets.hovered.bg_fill = self.surface_hover;
        style.visuals.widgets.hovered.weak_bg_fill = self.surface_hover;
        style.visuals.widgets.hovered.rounding = self.radius_medium;
        style.visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, self.accent);

        style.visuals.widgets.active.rounding = self.radius_medium;
        style.visuals.widgets.active.bg_stroke = Stroke::new(1.5, self.accent_hover);

        style.visuals.selection.bg_fill = self.accent;
        style.visuals.selection.stroke = Stroke::new(1.0, Color32::WHITE);
        style.visuals.text_cursor.stroke = Stroke::new(2.0, self.accent);

        style.spacing.item_spacing = Vec2::new(self.spacing_medium, self.spacing_medium);

        style.text_styles = [
            (egui::TextStyle::Heading, self.font_title.clone()),
            (egui::TextStyle::Body, self.font_medium.clone()),
            (egui::TextStyle::Monospace, FontId::new(12.0, FontFamily::Monospace)),
            (egui::TextStyle::Button, self.font_medium.clone()),
            (egui::TextStyle::Small, self.font_small.clone()),
        ]
        .into();

        ctx.set_style(style);
    }

    pub fn card_frame(&self) -> egui::Frame {
        egui::Frame {
            inner_margin: egui::Margin::same(self.padding_large),
            rounding: self.radius_large,
            shadow: self.shadow_card,
            fill: self.card,
            stroke: Stroke::new(1.0, self.border),
            ..Default::default()
        }
    }

    pub fn primary_button<'a>(&self, text: &'a str) -> egui::Button<'a> {
        egui::Button::new(egui::RichText::new(text).color(Color32::WHITE).strong())
            .fill(self.accent)
            .rounding(self.radius_medium)
            .min_size(Vec2::new(0.0, 36.0))
    }

    pub fn section_label(&self, text: &str) -> egui::RichText {
        egui::RichText::new(text.to_uppercase())
            .font(self.font_small.clone())
            .color(self.accent)
            .strong()
    }

    pub fn activity_color(&self, level: ActivityLevel) -> Color32 {
        match level {
            ActivityLevel::Info => self.text_secondary,
            ActivityLevel::Success => self.success,
            ActivityLevel::Warning => self.warning,
            ActivityLevel::Error => self.error,
        }
    }
}
