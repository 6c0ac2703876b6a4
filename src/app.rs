use crate::compositor::{AssetRef, CompositionRequest, Compositor};
use crate::config::AppConfig;
use crate::cover_form::{
    BookCoverForm, CoverFormat, CoverGenre, CoverStyle, CoverTexture, CoverTrend, MAX_VARIANTS, MIN_VARIANTS,
};
use crate::export::{export_file_name, write_export, ExportError};
use crate::generation::{generate_variants, GeneratedImage, GenerationReport};
use crate::overlay::{InteractionMode, LogoPlacement, OverlayController};
use crate::ui_theme::StudioTheme;
use crate::upload::{read_upload, UploadedImage};
use chrono::{DateTime, Local};
use eframe::egui::{self, Color32, ColorImage, Rect, Sense, Stroke, TextureHandle, Vec2};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

const TITLE_PLACEHOLDER: &str = "Enter the book title...";
const AUTHOR_PLACEHOLDER: &str = "Author name...";
const IDEA_PLACEHOLDER: &str = "Describe the visual idea you have in mind...";
const BLURB_PLACEHOLDER: &str = "Write the synopsis or a hook line...";
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

const MAX_PREVIEW_EDGE: u32 = 1024;
const MAX_ACTIVITY: usize = 500;
const MAX_CARD_HEIGHT: f32 = 640.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    Info,
    Success,
    Warning,
    Error,
}

struct ActivityEntry {
    at: DateTime<Local>,
    level: ActivityLevel,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadSlot {
    FrontLogo,
    BackLogo,
    Reference,
}

/// Messages from background tasks to the UI thread.
enum AppEvent {
    Activity(ActivityLevel, String),
    Uploaded {
        slot: UploadSlot,
        image: UploadedImage,
        preview: ColorImage,
    },
    Generated {
        format: CoverFormat,
        report: GenerationReport,
        previews: Vec<(Uuid, ColorImage)>,
    },
    Exported {
        id: Uuid,
        result: Result<PathBuf, String>,
    },
}

/// Sends events to the UI and wakes it up.
#[derive(Clone)]
struct EventSink {
    sender: mpsc::UnboundedSender<AppEvent>,
    ctx: egui::Context,
}

impl EventSink {
    fn send(&self, event: AppEvent) {
        if self.sender.send(event).is_ok() {
            self.ctx.request_repaint();
        }
    }

    fn log(&self, level: ActivityLevel, message: impl Into<String>) {
        self.send(AppEvent::Activity(level, message.into()));
    }
}

struct Preview {
    texture: TextureHandle,
    /// Native `height / width` of the decoded image.
    height_over_width: f32,
}

impl Preview {
    fn load(ctx: &egui::Context, name: &str, image: ColorImage) -> Self {
        let [w, h] = image.size;
        let height_over_width = if w == 0 { 1.0 } else { h as f32 / w as f32 };
        Self {
            texture: ctx.load_texture(name, image, egui::TextureOptions::LINEAR),
            height_over_width,
        }
    }

    /// Size that fits inside a `max` square, keeping the aspect ratio.
    fn fit(&self, max: f32) -> Vec2 {
        if self.height_over_width > 1.0 {
            Vec2::new(max / self.height_over_width, max)
        } else {
            Vec2::new(max, max * self.height_over_width)
        }
    }
}

/// One generated variant with its own pair of logo overlays.
struct CoverResultView {
    image: GeneratedImage,
    preview: Option<Preview>,
    front_logo: OverlayController,
    back_logo: OverlayController,
    exporting: bool,
}

impl CoverResultView {
    fn new(image: GeneratedImage, sink: &EventSink) -> Self {
        Self {
            front_logo: Self::controller(LogoPlacement::FrontCover, &image, sink),
            back_logo: Self::controller(LogoPlacement::BackCover, &image, sink),
            image,
            preview: None,
            exporting: false,
        }
    }

    fn controller(placement: LogoPlacement, image: &GeneratedImage, sink: &EventSink) -> OverlayController {
        let sink = sink.clone();
        let variant = image.short_id();
        OverlayController::new(placement).with_commit_hook(move |state| {
            sink.log(
                ActivityLevel::Info,
                format!(
                    "Moved {} on {} to ({:.0}%, {:.0}%), width {:.0}%",
                    placement.label(),
                    variant,
                    state.x,
                    state.y,
                    state.size_percent
                ),
            );
        })
    }

    fn overlay_mut(&mut self, placement: LogoPlacement) -> &mut OverlayController {
        match placement {
            LogoPlacement::FrontCover => &mut self.front_logo,
            LogoPlacement::BackCover => &mut self.back_logo,
        }
    }

    fn overlay(&self, placement: LogoPlacement) -> &OverlayController {
        match placement {
            LogoPlacement::FrontCover => &self.front_logo,
            LogoPlacement::BackCover => &self.back_logo,
        }
    }

    /// Export request for this result. `format` is the format of the batch
    /// that produced it; the overlay uses the last committed placement.
    fn composition_request(&self, form: &BookCoverForm, format: CoverFormat) -> CompositionRequest {
        let overlay = form
            .logo_for(format)
            .map(|(placement, logo)| (logo.asset(), self.overlay(placement).committed()));
        CompositionRequest {
            background: AssetRef::Bytes(self.image.bytes.clone()),
            overlay,
        }
    }
}

pub struct CoverStudioApp {
    // Configuration
    config: AppConfig,
    config_path: PathBuf,
    show_api_key: bool,

    // Form
    form: BookCoverForm,
    front_logo_preview: Option<Preview>,
    back_logo_preview: Option<Preview>,
    reference_previews: Vec<Preview>,

    // Results
    results: Vec<CoverResultView>,
    results_format: CoverFormat,
    generating: bool,
    failure_notice: Option<String>,

    activity: Vec<ActivityEntry>,

    // Runtime
    runtime: tokio::runtime::Runtime,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    event_receiver: mpsc::UnboundedReceiver<AppEvent>,

    theme: StudioTheme,
}

impl CoverStudioApp {
    pub fn new(runtime: tokio::runtime::Runtime) -> Self {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        let config_path = AppConfig::default_path();
        let config = AppConfig::load_or_default(&config_path);
        let show_api_key = config.resolved_api_key().is_none();

        Self {
            config,
            config_path,
            show_api_key,
            form: BookCoverForm::default(),
            front_logo_preview: None,
            back_logo_preview: None,
            reference_previews: Vec::new(),
            results: Vec::new(),
            results_format: CoverFormat::default(),
            generating: false,
            failure_notice: None,
            activity: Vec::new(),
            runtime,
            event_sender,
            event_receiver,
            theme: StudioTheme::default(),
        }
    }

    fn sink(&self, ctx: &egui::Context) -> EventSink {
        EventSink {
            sender: self.event_sender.clone(),
            ctx: ctx.clone(),
        }
    }

    fn push_activity(&mut self, level: ActivityLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            ActivityLevel::Error => log::error!("{}", message),
            ActivityLevel::Warning => log::warn!("{}", message),
            ActivityLevel::Info | ActivityLevel::Success => log::info!("{}", message),
        }
        self.activity.push(ActivityEntry {
            at: Local::now(),
            level,
            message,
        });
        if self.activity.len() > MAX_ACTIVITY {
            let excess = self.activity.len() - MAX_ACTIVITY;
            self.activity.drain(0..excess);
        }
    }

    fn save_config(&mut self) {
        match self.config.save(&self.config_path) {
            Ok(()) => self.push_activity(ActivityLevel::Success, "Settings saved"),
            Err(e) => self.push_activity(ActivityLevel::Error, format!("Failed to save settings: {}", e)),
        }
    }

    fn pick_upload(&mut self, ctx: &egui::Context, slot: UploadSlot) {
        let dialog = rfd::FileDialog::new().add_filter("Images", &IMAGE_EXTENSIONS);
        let paths = match slot {
            UploadSlot::Reference => dialog.pick_files().unwrap_or_default(),
            UploadSlot::FrontLogo | UploadSlot::BackLogo => dialog.pick_file().into_iter().collect(),
        };

        for path in paths {
            let sink = self.sink(ctx);
            self.runtime.spawn(async move {
                match read_upload(&path).await {
                    Ok(image) => match decode_preview(image.bytes.clone()).await {
                        Some(preview) => sink.send(AppEvent::Uploaded { slot, image, preview }),
                        None => sink.log(
                            ActivityLevel::Error,
                            format!("Could not decode {}", path.display()),
                        ),
                    },
                    Err(e) => sink.log(ActivityLevel::Error, format!("Upload failed: {}", e)),
                }
            });
        }
    }

    fn submit(&mut self, ctx: &egui::Context) {
        if self.generating || !self.form.can_submit() {
            return;
        }

        let client = match self.config.build_client() {
            Ok(client) => client,
            Err(e) => {
                self.push_activity(ActivityLevel::Error, format!("Cannot start generation: {}", e));
                self.failure_notice = Some(format!("Cannot start generation: {}", e));
                return;
            }
        };

        self.generating = true;
        self.failure_notice = None;
        self.results.clear();
        self.push_activity(
            ActivityLevel::Info,
            format!(
                "Generating {} variant(s) of \"{}\"",
                self.form.variant_count(),
                self.form.title.trim()
            ),
        );

        let form = self.form.clone();
        let sink = self.sink(ctx);
        self.runtime.spawn(async move {
            let report = generate_variants(Arc::new(client), &form).await;
            let mut previews = Vec::new();
            for image in report.images() {
                if let Some(preview) = decode_preview(image.bytes.clone()).await {
                    previews.push((image.id, preview));
                }
            }
            sink.send(AppEvent::Generated {
                format: form.format,
                report,
                previews,
            });
        });
    }

    fn export_result(&mut self, ctx: &egui::Context, index: usize) {
        let Some(view) = self.results.get_mut(index) else {
            return;
        };
        let file_name = export_file_name(&self.form.title, &view.image.short_id());
        let mut dialog = rfd::FileDialog::new()
            .set_file_name(file_name.as_str())
            .add_filter("PNG image", &["png"]);
        if let Some(folder) = &self.config.export_folder {
            dialog = dialog.set_directory(folder);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };

        view.exporting = true;
        let id = view.image.id;
        let request = view.composition_request(&self.form, self.results_format);
        let compositor = Compositor::new(self.config.asset_timeout());
        let sink = self.sink(ctx);

        let folder = path.parent().map(|p| p.to_string_lossy().to_string());
        if folder.is_some() && folder != self.config.export_folder {
            self.config.export_folder = folder;
            if let Err(e) = self.config.save(&self.config_path) {
                log::warn!("Failed to remember export folder: {}", e);
            }
        }

        self.runtime.spawn(async move {
            let result: Result<PathBuf, ExportError> = async {
                let png = compositor.compose(&request).await?;
                write_export(&path, &png).await
            }
            .await;
            sink.send(AppEvent::Exported {
                id,
                result: result.map_err(|e| e.to_string()),
            });
        });
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.event_receiver.try_recv() {
            match event {
                AppEvent::Activity(level, message) => self.push_activity(level, message),
                AppEvent::Uploaded { slot, image, preview } => {
                    let preview = Preview::load(ctx, &image.name, preview);
                    self.push_activity(ActivityLevel::Success, format!("Added {}", image.name));
                    match slot {
                        UploadSlot::FrontLogo => {
                            self.form.front_logo = Some(image);
                            self.front_logo_preview = Some(preview);
                        }
                        UploadSlot::BackLogo => {
                            self.form.back_logo = Some(image);
                            self.back_logo_preview = Some(preview);
                        }
                        UploadSlot::Reference => {
                            self.form.references.push(image);
                            self.reference_previews.push(preview);
                        }
                    }
                }
                AppEvent::Generated {
                    format,
                    report,
                    previews,
                } => self.apply_report(ctx, format, report, previews),
                AppEvent::Exported { id, result } => {
                    if let Some(view) = self.results.iter_mut().find(|v| v.image.id == id) {
                        view.exporting = false;
                    }
                    match result {
                        Ok(path) => self.push_activity(
                            ActivityLevel::Success,
                            format!("Saved {}", path.display()),
                        ),
                        Err(e) => self.push_activity(ActivityLevel::Error, format!("Export failed: {}", e)),
                    }
                }
            }
        }
    }

    fn apply_report(
        &mut self,
        ctx: &egui::Context,
        format: CoverFormat,
        report: GenerationReport,
        mut previews: Vec<(Uuid, ColorImage)>,
    ) {
        self.generating = false;

        if report.is_total_failure() {
            self.failure_notice = Some("A technical error occurred. Please try again.".to_string());
            for (variant, reason) in report.failures() {
                self.push_activity(ActivityLevel::Error, format!("Variant {} failed: {}", variant + 1, reason));
            }
            return;
        }

        let images = report.images();
        let failures = report.failures();
        if failures.is_empty() {
            self.push_activity(
                ActivityLevel::Success,
                format!("{} variant(s) ready", images.len()),
            );
        } else {
            self.push_activity(
                ActivityLevel::Warning,
                format!("{} of {} variants generated", images.len(), report.requested()),
            );
            for (variant, reason) in failures {
                self.push_activity(ActivityLevel::Warning, format!("Variant {} failed: {}", variant + 1, reason));
            }
        }

        let sink = self.sink(ctx);
        self.results_format = format;
        self.results = images
            .into_iter()
            .map(|image| {
                let mut view = CoverResultView::new(image, &sink);
                if let Some(pos) = previews.iter().position(|(id, _)| *id == view.image.id) {
                    let (_, preview) = previews.swap_remove(pos);
                    view.preview = Some(Preview::load(ctx, &format!("cover-{}", view.image.id), preview));
                }
                view
            })
            .collect();
    }
}

impl eframe::App for CoverStudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_to_ctx(ctx);
        self.drain_events(ctx);

        egui::TopBottomPanel::bottom("activity_panel")
            .resizable(true)
            .default_height(120.0)
            .show(ctx, |ui| self.show_activity(ui));

        egui::SidePanel::left("form_panel")
            .resizable(false)
            .exact_width(380.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("form_scroll")
                    .auto_shrink([false; 2])
                    .show(ui, |ui| self.show_form(ui, ctx));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .id_salt("results_scroll")
                .auto_shrink([false; 2])
                .show(ui, |ui| self.show_results(ui, ctx));
        });
    }
}

impl CoverStudioApp {
    fn show_form(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.add_space(self.theme.spacing_medium);
        ui.horizontal(|ui| {
            ui.heading(egui::RichText::new("Oase").strong().color(self.theme.text_primary));
            ui.heading(egui::RichText::new("Cover Studio").color(self.theme.accent));
        });
        ui.add_space(self.theme.spacing_medium);

        let mut pick = None;
        self.theme.card_frame().show(ui, |ui| {
            ui.columns(2, |columns| {
                if logo_slot(
                    &mut columns[0],
                    &self.theme,
                    "Front cover logo",
                    &mut self.form.front_logo,
                    &mut self.front_logo_preview,
                ) {
                    pick = Some(UploadSlot::FrontLogo);
                }
                if logo_slot(
                    &mut columns[1],
                    &self.theme,
                    "Back cover logo",
                    &mut self.form.back_logo,
                    &mut self.back_logo_preview,
                ) {
                    pick = Some(UploadSlot::BackLogo);
                }
            });

            ui.add_space(self.theme.spacing_large);
            self.show_book_fields(ui);
            ui.add_space(self.theme.spacing_medium);

            if self.show_references(ui) {
                pick = Some(UploadSlot::Reference);
            }

            ui.add_space(self.theme.spacing_large);
            let enabled = !self.generating && self.form.can_submit();
            let label = if self.generating { "Working..." } else { "Create Design" };
            ui.horizontal(|ui| {
                let button = ui.add_enabled(enabled, self.theme.primary_button(label));
                if self.generating {
                    ui.spinner();
                }
                if button.clicked() {
                    self.submit(ctx);
                }
            });
        });

        if let Some(slot) = pick {
            self.pick_upload(ctx, slot);
        }

        ui.add_space(self.theme.spacing_medium);
        self.show_settings(ui);
    }

    fn show_book_fields(&mut self, ui: &mut egui::Ui) {
        ui.label(egui::RichText::new("Book title *").strong());
        ui.add(
            egui::TextEdit::singleline(&mut self.form.title)
                .hint_text(TITLE_PLACEHOLDER)
                .desired_width(f32::INFINITY),
        );
        ui.label(egui::RichText::new("Author").strong());
        ui.add(
            egui::TextEdit::singleline(&mut self.form.author)
                .hint_text(AUTHOR_PLACEHOLDER)
                .desired_width(f32::INFINITY),
        );

        ui.label(egui::RichText::new("Format & size").strong());
        egui::ComboBox::from_id_salt("cover_format")
            .width(ui.available_width())
            .selected_text(self.form.format.label())
            .show_ui(ui, |ui| {
                for format in CoverFormat::ALL {
                    ui.selectable_value(&mut self.form.format, format, format.label());
                }
            });

        ui.label(egui::RichText::new("Design idea").strong());
        ui.add(
            egui::TextEdit::multiline(&mut self.form.design_idea)
                .hint_text(IDEA_PLACEHOLDER)
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );

        if self.form.format.uses_blurb() {
            ui.label(egui::RichText::new("Blurb (back cover text)").strong());
            ui.add(
                egui::TextEdit::multiline(&mut self.form.blurb)
                    .hint_text(BLURB_PLACEHOLDER)
                    .desired_rows(4)
                    .desired_width(f32::INFINITY),
            );
        }

        egui::Grid::new("design_attributes")
            .num_columns(2)
            .spacing([12.0, 6.0])
            .show(ui, |ui| {
                ui.label(self.theme.section_label("Style"));
                ui.label(self.theme.section_label("Genre"));
                ui.end_row();
                catalog_combo(ui, "style", &mut self.form.style, CoverStyle::ALL, CoverStyle::as_str);
                catalog_combo(ui, "genre", &mut self.form.genre, CoverGenre::ALL, CoverGenre::as_str);
                ui.end_row();
                ui.label(self.theme.section_label("Trend"));
                ui.label(self.theme.section_label("Texture"));
                ui.end_row();
                catalog_combo(ui, "trend", &mut self.form.trend, CoverTrend::ALL, CoverTrend::as_str);
                catalog_combo(ui, "texture", &mut self.form.texture, CoverTexture::ALL, CoverTexture::as_str);
                ui.end_row();
            });

        ui.add_space(self.theme.spacing_small);
        ui.add(
            egui::Slider::new(&mut self.form.variant_count, MIN_VARIANTS..=MAX_VARIANTS)
                .text("image variants"),
        );
    }

    /// Returns `true` when the add button was clicked.
    fn show_references(&mut self, ui: &mut egui::Ui) -> bool {
        ui.label(egui::RichText::new("Visual references (optional)").strong());
        let mut remove = None;
        let mut add = false;
        ui.horizontal_wrapped(|ui| {
            for (index, preview) in self.reference_previews.iter().enumerate() {
                let response = ui
                    .add(egui::ImageButton::new((preview.texture.id(), preview.fit(56.0))))
                    .on_hover_text("Click to remove");
                if response.clicked() {
                    remove = Some(index);
                }
            }
            if ui.add_sized([56.0, 56.0], egui::Button::new("+")).clicked() {
                add = true;
            }
        });

        if let Some(index) = remove {
            self.form.remove_reference(index);
            if index < self.reference_previews.len() {
                self.reference_previews.remove(index);
            }
        }
        add
    }

    fn show_settings(&mut self, ui: &mut egui::Ui) {
        let mut save = false;
        egui::CollapsingHeader::new("Generator settings")
            .default_open(self.show_api_key)
            .show(ui, |ui| {
                ui.label("API key");
                ui.horizontal(|ui| {
                    ui.add(
                        egui::TextEdit::singleline(&mut self.config.api_key)
                            .password(!self.show_api_key)
                            .hint_text("GEMINI_API_KEY is used when empty")
                            .desired_width(260.0),
                    );
                    let eye = if self.show_api_key { "Hide" } else { "Show" };
                    if ui.small_button(eye).clicked() {
                        self.show_api_key = !self.show_api_key;
                    }
                });
                ui.label("Model");
                ui.add(egui::TextEdit::singleline(&mut self.config.model).desired_width(f32::INFINITY));
                ui.label("Logo and image load timeout (seconds)");
                ui.add(egui::DragValue::new(&mut self.config.asset_timeout_secs).range(1..=120));
                if ui.button("Save settings").clicked() {
                    save = true;
                }
            });
        if save {
            self.save_config();
        }
    }

    fn show_results(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        if let Some(notice) = self.failure_notice.clone() {
            egui::Frame::none()
                .fill(self.theme.error.linear_multiply(0.12))
                .rounding(self.theme.radius_medium)
                .inner_margin(egui::Margin::same(self.theme.padding_medium))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(notice).color(self.theme.error).strong());
                        if ui.small_button("Dismiss").clicked() {
                            self.failure_notice = None;
                        }
                    });
                });
            ui.add_space(self.theme.spacing_medium);
        }

        if self.results.is_empty() && !self.generating {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.3);
                ui.heading("Interactive editor");
                ui.label(
                    egui::RichText::new(
                        "Once designs appear you can drag and resize the logo directly on the image before downloading.",
                    )
                    .color(self.theme.text_secondary),
                );
            });
            return;
        }

        ui.horizontal(|ui| {
            ui.heading(egui::RichText::new("Output").color(self.theme.text_primary));
            ui.label(
                egui::RichText::new(format!("{} variants", self.results.len()))
                    .color(self.theme.accent)
                    .strong(),
            );
        });
        ui.separator();

        let format = if self.generating { self.form.format } else { self.results_format };
        let columns = match format {
            CoverFormat::Spine => 4,
            CoverFormat::ContentLayout => 1,
            CoverFormat::FrontCover | CoverFormat::BackCover => 2,
        };
        let spacing = self.theme.spacing_large;
        let card_width = ((ui.available_width() - spacing * (columns as f32 - 1.0)) / columns as f32).max(80.0);

        if self.generating {
            let count = self.form.variant_count() as usize;
            let placeholder_height = (card_width / format.display_aspect()).min(MAX_CARD_HEIGHT);
            for row in (0..count).collect::<Vec<_>>().chunks(columns) {
                ui.horizontal(|ui| {
                    for _ in row {
                        let (rect, _) = ui.allocate_exact_size(Vec2::new(card_width, placeholder_height), Sense::hover());
                        ui.painter().rect_filled(rect, self.theme.radius_large, self.theme.placeholder);
                        egui::Spinner::new()
                            .size(24.0)
                            .paint_at(ui, Rect::from_center_size(rect.center(), Vec2::splat(24.0)));
                    }
                });
                ui.add_space(spacing);
            }
            return;
        }

        let placement = format.logo_placement();
        let logo = placement.and_then(|p| match p {
            LogoPlacement::FrontCover => self.front_logo_preview.as_ref(),
            LogoPlacement::BackCover => self.back_logo_preview.as_ref(),
        });
        let theme = &self.theme;
        let results = &mut self.results;

        let mut export = None;
        let indices: Vec<usize> = (0..results.len()).collect();
        for row in indices.chunks(columns) {
            ui.horizontal_top(|ui| {
                for &index in row {
                    let view = &mut results[index];
                    ui.vertical(|ui| {
                        ui.set_width(card_width);
                        if result_card(ui, theme, view, format, placement.zip(logo), card_width) {
                            export = Some(index);
                        }
                    });
                }
            });
            ui.add_space(spacing);
        }

        if let Some(index) = export {
            self.export_result(ctx, index);
        }
    }

    fn show_activity(&mut self, ui: &mut egui::Ui) {
        ui.label(self.theme.section_label("Activity"));
        egui::ScrollArea::vertical()
            .id_salt("activity_scroll")
            .auto_shrink([false; 2])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for entry in &self.activity {
                    ui.horizontal(|ui| {
                        ui.label(
                            egui::RichText::new(entry.at.format("%H:%M:%S").to_string())
                                .monospace()
                                .color(self.theme.text_muted),
                        );
                        ui.label(
                            egui::RichText::new(&entry.message).color(self.theme.activity_color(entry.level)),
                        );
                    });
                }
            });
    }
}

/// Logo picker column. Returns `true` when the user asked to pick a file.
fn logo_slot(
    ui: &mut egui::Ui,
    theme: &StudioTheme,
    title: &str,
    logo: &mut Option<UploadedImage>,
    preview: &mut Option<Preview>,
) -> bool {
    ui.label(theme.section_label(title));
    let mut remove = false;
    if let Some(p) = preview.as_ref() {
        ui.add(egui::Image::new((p.texture.id(), p.fit(96.0))));
        remove = ui.small_button("Remove").clicked();
    } else {
        return ui.add_sized([96.0, 96.0], egui::Button::new("+ Logo")).clicked();
    }
    if remove {
        *logo = None;
        *preview = None;
    }
    false
}

fn catalog_combo<T: Copy + PartialEq>(
    ui: &mut egui::Ui,
    id: &str,
    value: &mut T,
    options: &[T],
    text: fn(T) -> &'static str,
) {
    egui::ComboBox::from_id_salt(id)
        .width(150.0)
        .selected_text(text(*value))
        .show_ui(ui, |ui| {
            for &option in options {
                ui.selectable_value(value, option, text(option));
            }
        });
}

/// Draws one result with its logo overlay. Returns `true` when export was clicked.
fn result_card(
    ui: &mut egui::Ui,
    theme: &StudioTheme,
    view: &mut CoverResultView,
    format: CoverFormat,
    logo: Option<(LogoPlacement, &Preview)>,
    width: f32,
) -> bool {
    // The container takes the image's own aspect ratio so percentages map
    // one-to-one onto the exported pixels.
    let aspect = view
        .preview
        .as_ref()
        .map_or(format.display_aspect(), |p| 1.0 / p.height_over_width);
    let mut size = Vec2::new(width, width / aspect);
    if size.y > MAX_CARD_HEIGHT {
        size = Vec2::new(MAX_CARD_HEIGHT * aspect, MAX_CARD_HEIGHT);
    }

    let (container, _) = ui.allocate_exact_size(size, Sense::hover());
    let painter = ui.painter_at(container);
    painter.rect_filled(container, theme.radius_medium, theme.placeholder);
    match &view.preview {
        Some(preview) => {
            painter.image(preview.texture.id(), container, full_uv(), Color32::WHITE);
        }
        None => {
            painter.text(
                container.center(),
                egui::Align2::CENTER_CENTER,
                "Preview unavailable",
                theme.font_small.clone(),
                theme.text_muted,
            );
        }
    }

    if let Some((placement, logo)) = logo {
        let image_id = view.image.id;
        let controller = view.overlay_mut(placement);
        let id = ui.id().with(("overlay", image_id, controller.placement().label()));
        overlay_widget(ui, theme, controller, container, logo, id);
    }

    let mut export = false;
    ui.horizontal(|ui| {
        ui.label(
            egui::RichText::new(format!("VARIANT {}", view.image.short_id()))
                .font(theme.font_small.clone())
                .color(theme.text_muted),
        )
        .on_hover_text(format!(
            "Generated at {}",
            view.image.generated_at.with_timezone(&Local).format("%H:%M:%S")
        ));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if view.exporting {
                ui.spinner();
            } else if ui.add(theme.primary_button("Download")).clicked() {
                export = true;
            }
        });
    });
    export
}

/// Routes pointer input to `controller` and paints the logo on top of the cover.
fn overlay_widget(
    ui: &mut egui::Ui,
    theme: &StudioTheme,
    controller: &mut OverlayController,
    container: Rect,
    logo: &Preview,
    id: egui::Id,
) {
    let logo_rect = controller.state().screen_rect(container, logo.height_over_width);
    let handle_rect = Rect::from_center_size(logo_rect.max, Vec2::splat(theme.handle_radius * 2.5));

    // The handle is registered last so it wins over the body where they overlap.
    let body = ui.interact(logo_rect, id.with("body"), Sense::drag());
    let handle = ui.interact(handle_rect, id.with("handle"), Sense::drag());

    let (latest, origin, released) = ui.ctx().input(|i| {
        (
            i.pointer.latest_pos(),
            i.pointer.press_origin(),
            i.pointer.any_released(),
        )
    });

    if let Some(pointer) = latest {
        let anchor = origin.unwrap_or(pointer);
        if handle.drag_started() {
            controller.begin_resize(anchor);
        } else if body.drag_started() {
            controller.begin_drag(anchor);
        }
        if controller.is_active() {
            controller.on_pointer_move(pointer, container);
        }
    }
    if controller.is_active() && released {
        controller.end_interaction();
    }

    let logo_rect = controller.state().screen_rect(container, logo.height_over_width);
    let painter = ui.painter_at(container);
    painter.image(logo.texture.id(), logo_rect, full_uv(), Color32::WHITE);

    let active = controller.is_active();
    if active || body.hovered() || handle.hovered() {
        let color = if active { theme.overlay_active } else { theme.overlay_idle };
        painter.rect_stroke(logo_rect, 0.0, Stroke::new(2.0, color));
        painter.circle_filled(logo_rect.max, theme.handle_radius, theme.overlay_active);
        painter.circle_stroke(logo_rect.max, theme.handle_radius, Stroke::new(1.5, Color32::WHITE));
    }

    if handle.hovered() || controller.mode() == InteractionMode::Resizing {
        ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeNwSe);
    } else if body.hovered() || active {
        ui.ctx().set_cursor_icon(egui::CursorIcon::Move);
    }
}

fn full_uv() -> Rect {
    Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0))
}

/// Decodes an image off the UI thread into a texture-ready bitmap, shrinking
/// large images so previews stay light.
async fn decode_preview(bytes: Arc<[u8]>) -> Option<ColorImage> {
    tokio::task::spawn_blocking(move || {
        let image = match image::load_from_memory(&bytes) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Preview decode failed: {}", e);
                return None;
            }
        };
        let image = if image.width() > MAX_PREVIEW_EDGE || image.height() > MAX_PREVIEW_EDGE {
            image.thumbnail(MAX_PREVIEW_EDGE, MAX_PREVIEW_EDGE)
        } else {
            image
        };
        let rgba = image.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        Some(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
    })
    .await
    .ok()
    .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    fn sink() -> EventSink {
        let (sender, _receiver) = mpsc::unbounded_channel();
        EventSink {
            sender,
            ctx: egui::Context::default(),
        }
    }

    fn logo(name: &str, byte: u8) -> UploadedImage {
        UploadedImage {
            name: name.to_string(),
            mime_type: "image/png".to_string(),
            bytes: vec![byte; 6].into(),
        }
    }

    fn form_with_logos() -> BookCoverForm {
        BookCoverForm {
            title: "Ronggeng Dukuh Paruk".to_string(),
            front_logo: Some(logo("front.png", 1)),
            back_logo: Some(logo("back.png", 2)),
            ..Default::default()
        }
    }

    fn overlay_url(request: &CompositionRequest) -> &str {
        match &request.overlay {
            Some((AssetRef::DataUrl(url), _)) => url,
            other => panic!("expected a data URL overlay, got {:?}", other),
        }
    }

    #[test]
    fn test_export_uses_committed_state_during_gesture() {
        let form = form_with_logos();
        let mut view = CoverResultView::new(GeneratedImage::new(vec![9, 9, 9]), &sink());
        let container = Rect::from_min_size(pos2(0.0, 0.0), Vec2::new(200.0, 200.0));

        view.front_logo.begin_drag(pos2(50.0, 50.0));
        view.front_logo.on_pointer_move(pos2(40.0, 60.0), container);
        let committed = view.front_logo.end_interaction().unwrap();
        assert_eq!((committed.x, committed.y), (73.0, 9.0));

        // Second drag still in progress.
        view.front_logo.begin_drag(pos2(0.0, 0.0));
        view.front_logo.on_pointer_move(pos2(-100.0, 0.0), container);
        assert_eq!(view.front_logo.state().x, 23.0);

        let request = view.composition_request(&form, CoverFormat::FrontCover);
        let (_, state) = request.overlay.as_ref().unwrap();
        assert_eq!(*state, committed);
        assert!(matches!(&request.background, AssetRef::Bytes(bytes) if bytes[..] == [9, 9, 9]));
    }

    #[test]
    fn test_export_follows_batch_format_not_form_format() {
        let mut form = form_with_logos();
        let view = CoverResultView::new(GeneratedImage::new(vec![1, 2, 3]), &sink());
        form.format = CoverFormat::BackCover;

        let request = view.composition_request(&form, CoverFormat::FrontCover);
        let front = form.front_logo.as_ref().unwrap().to_data_url();
        assert_eq!(overlay_url(&request), front);
        let (_, state) = request.overlay.as_ref().unwrap();
        assert_eq!(*state, LogoPlacement::FrontCover.default_state());

        let request = view.composition_request(&form, CoverFormat::BackCover);
        let back = form.back_logo.as_ref().unwrap().to_data_url();
        assert_eq!(overlay_url(&request), back);
        let (_, state) = request.overlay.as_ref().unwrap();
        assert_eq!(*state, LogoPlacement::BackCover.default_state());
    }

    #[test]
    fn test_export_without_logo_slot_has_no_overlay() {
        let form = form_with_logos();
        let view = CoverResultView::new(GeneratedImage::new(vec![1]), &sink());
        assert!(view.composition_request(&form, CoverFormat::Spine).overlay.is_none());
        assert!(view.composition_request(&form, CoverFormat::ContentLayout).overlay.is_none());
    }
}
