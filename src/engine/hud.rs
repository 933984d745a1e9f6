// egui overlay: answer panel, question input, voyage HUD, F3 stats.
//
// All chrome is screen-fixed 2D drawn after the 3D pass. The overlay never
// mutates app state directly; interactions come back as UiEvents the frame
// loop applies, keeping the tick order (store → camera → scene → render)
// intact.

use egui::epaint::Shadow;

use super::focus::{FocusState, SessionPhase};
use super::neighbors::{NEIGHBOR_COUNT, select_neighbors};
use super::star::{StarField, StarId};

const INDIGO: egui::Color32 = egui::Color32::from_rgb(129, 140, 248);
const INDIGO_PALE: egui::Color32 = egui::Color32::from_rgb(199, 210, 254);

/// Interactions the overlay wants applied next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The user submitted a question.
    Submit(String),
    /// A related-star button was clicked: move the view, keep the anchor.
    SelectNeighbor(StarId),
    /// Close the answer panel and clear the focus pair.
    CloseSession,
    /// Leave full voyage mode.
    StopVoyage,
    /// Show/hide the voyage highlight card.
    ToggleVoyageHud,
}

/// Frame counters for the F3 panel.
pub struct HudStats {
    pub fps: u32,
    pub frame_time_avg_ms: f32,
    pub frame_time_min_ms: f32,
    pub frame_time_max_ms: f32,
    pub star_count: usize,
    pub sprite_count: usize,
    pub camera_mode: &'static str,
    pub cruise_preset: &'static str,
}

/// Read-only app state the overlay renders from.
pub struct HudFrame<'a> {
    pub field: &'a StarField,
    pub focus: &'a FocusState,
    pub phase: SessionPhase,
    pub voyage_mode: bool,
    pub voyage_hud: bool,
    pub cruise_target: Option<StarId>,
    pub stats: Option<&'a HudStats>,
}

pub struct Hud {
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
    draft: String,
}

impl Hud {
    pub fn new(
        window: &winit::window::Window,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let egui_ctx = egui::Context::default();

        // Style: dark, translucent, monospace — matches the night sky.
        let mut visuals = egui::Visuals::dark();
        visuals.window_fill = egui::Color32::from_rgba_premultiplied(2, 6, 23, 200);
        visuals.window_stroke = egui::Stroke::new(1.0, egui::Color32::from_rgb(49, 46, 129));
        visuals.window_shadow = Shadow::NONE;
        visuals.override_text_color = Some(egui::Color32::from_rgb(226, 232, 240));
        egui_ctx.set_visuals(visuals);

        let mut style = (*egui_ctx.style()).clone();
        style.override_font_id = Some(egui::FontId::monospace(13.0));
        egui_ctx.set_style(style);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );

        let egui_renderer = egui_wgpu::Renderer::new(
            device,
            surface_format,
            None,  // no depth
            1,     // msaa samples
            false, // no dithering
        );

        Self {
            egui_ctx,
            egui_state,
            egui_renderer,
            draft: String::new(),
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &winit::window::Window,
        event: &winit::event::WindowEvent,
    ) -> egui_winit::EventResponse {
        self.egui_state.on_window_event(window, event)
    }

    /// True when the pointer is over (or captured by) the overlay, in which
    /// case the 3D layer should ignore clicks and drags.
    pub fn wants_pointer(&self) -> bool {
        self.egui_ctx.wants_pointer_input() || self.egui_ctx.is_pointer_over_area()
    }

    pub fn wants_keyboard(&self) -> bool {
        self.egui_ctx.wants_keyboard_input()
    }

    /// Run one overlay frame and paint it over `view`. Returns the events
    /// the user triggered.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        window: &winit::window::Window,
        view: &wgpu::TextureView,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
        frame: HudFrame,
    ) -> Vec<UiEvent> {
        let raw_input = self.egui_state.take_egui_input(window);
        let mut events = Vec::new();

        // The closure needs &mut self.draft while self.egui_ctx runs it;
        // split the borrow by taking the draft out for the duration.
        let mut draft = std::mem::take(&mut self.draft);

        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if !frame.voyage_mode {
                header(ctx, frame.field.len());
                input_bar(ctx, &mut draft, frame.phase, &mut events);
            } else {
                voyage_controls(ctx, frame.voyage_hud, &mut events);
                if frame.voyage_hud && !frame.focus.is_open() {
                    voyage_card(ctx, &frame);
                }
            }

            if frame.focus.is_open() {
                answer_panel(ctx, &frame, &mut events);
            }

            if let Some(stats) = frame.stats {
                stats_panel(ctx, stats);
            }
        });

        self.draft = draft;

        self.egui_state
            .handle_platform_output(window, full_output.platform_output);

        let tris = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, &tris, screen_descriptor);

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("hud pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.egui_renderer
                .render(&mut render_pass.forget_lifetime(), &tris, screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        events
    }
}

// ============================================================================
// PANELS
// ============================================================================

fn header(ctx: &egui::Context, star_count: usize) {
    egui::Area::new(egui::Id::new("header"))
        .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 16.0))
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new("Q U E S T A R")
                        .color(INDIGO)
                        .size(18.0)
                        .strong(),
                );
                ui.label(
                    egui::RichText::new(format!("{star_count} stars charted"))
                        .color(INDIGO_PALE)
                        .size(11.0),
                );
            });
        });
}

fn input_bar(
    ctx: &egui::Context,
    draft: &mut String,
    phase: SessionPhase,
    events: &mut Vec<UiEvent>,
) {
    egui::Area::new(egui::Id::new("input_bar"))
        .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -24.0))
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(egui::Color32::from_rgba_premultiplied(2, 6, 23, 200))
                .rounding(18.0)
                .inner_margin(egui::Margin::symmetric(14.0, 8.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let streaming = phase == SessionPhase::Streaming;
                        ui.add_enabled_ui(!streaming, |ui| {
                            let edit = egui::TextEdit::singleline(draft)
                                .hint_text("Ask the universe…")
                                .desired_width(320.0);
                            let response = ui.add(edit);

                            let submitted = response.lost_focus()
                                && ui.input(|i| i.key_pressed(egui::Key::Enter));
                            let clicked = ui
                                .button(egui::RichText::new("✦").color(INDIGO))
                                .clicked();

                            if (submitted || clicked) && !draft.trim().is_empty() {
                                events.push(UiEvent::Submit(draft.trim().to_string()));
                                draft.clear();
                            }
                        });
                        if streaming {
                            ui.label(egui::RichText::new("receiving…").color(INDIGO_PALE));
                        }
                    });
                });
        });
}

fn answer_panel(ctx: &egui::Context, frame: &HudFrame, events: &mut Vec<UiEvent>) {
    let Some(star) = frame.focus.viewing().and_then(|id| frame.field.get(id)) else {
        return;
    };
    let streaming = frame.phase == SessionPhase::Streaming;

    egui::Window::new("answer")
        .title_bar(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 64.0))
        .fixed_size(egui::vec2(460.0, 0.0))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                let topic = star.topic.as_deref().unwrap_or("Analysing…");
                ui.label(
                    egui::RichText::new(topic.to_uppercase())
                        .color(INDIGO)
                        .size(10.0),
                );
                if frame.focus.is_drifted() {
                    if let Some(anchor) = frame.focus.anchor() {
                        if ui
                            .small_button(egui::RichText::new("◂ back to center").size(10.0))
                            .clicked()
                        {
                            events.push(UiEvent::SelectNeighbor(anchor));
                        }
                    }
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("✕").clicked() {
                        events.push(UiEvent::CloseSession);
                    }
                });
            });

            ui.label(egui::RichText::new(&star.content).size(16.0).strong());
            ui.add_space(6.0);

            egui::ScrollArea::vertical().max_height(220.0).show(ui, |ui| {
                let mut text = answer_job(&star.answer);
                if streaming {
                    text.append(
                        " ▍",
                        0.0,
                        egui::TextFormat {
                            color: INDIGO,
                            ..Default::default()
                        },
                    );
                }
                ui.label(text);
            });

            if !streaming {
                ui.add_space(8.0);
                ui.separator();
                ui.label(
                    egui::RichText::new("— connected stars —")
                        .color(INDIGO_PALE)
                        .size(10.0),
                );

                let root_id = frame.focus.anchor().or(frame.focus.viewing());
                if let Some(root) = root_id.and_then(|id| frame.field.get(id)) {
                    for neighbor in select_neighbors(root, frame.field.all(), NEIGHBOR_COUNT) {
                        let here = neighbor.id == star.id;
                        let label = egui::RichText::new(format!("· {}", neighbor.content))
                            .color(if here { egui::Color32::WHITE } else { INDIGO_PALE });
                        if ui.add(egui::Button::new(label).frame(false)).clicked() && !here {
                            events.push(UiEvent::SelectNeighbor(neighbor.id));
                        }
                    }
                }
            }
        });
}

fn voyage_card(ctx: &egui::Context, frame: &HudFrame) {
    let Some(star) = frame.cruise_target.and_then(|id| frame.field.get(id)) else {
        return;
    };

    egui::Area::new(egui::Id::new("voyage_card"))
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 110))
                .rounding(16.0)
                .inner_margin(egui::Margin::same(18.0))
                .show(ui, |ui| {
                    ui.set_max_width(430.0);
                    ui.vertical_centered(|ui| {
                        let topic = star.topic.as_deref().unwrap_or("SIGNAL DETECTED");
                        ui.label(
                            egui::RichText::new(topic.to_uppercase())
                                .color(INDIGO)
                                .size(10.0),
                        );
                        ui.add_space(4.0);
                        ui.label(egui::RichText::new(&star.content).size(18.0).strong());
                        if !star.answer.is_empty() {
                            ui.add_space(6.0);
                            let mut snippet: String = star.answer.chars().take(180).collect();
                            if snippet.len() < star.answer.len() {
                                snippet.push('…');
                            }
                            ui.label(answer_job(&snippet));
                        }
                    });
                });
        });
}

fn voyage_controls(ctx: &egui::Context, hud_on: bool, events: &mut Vec<UiEvent>) {
    egui::Area::new(egui::Id::new("voyage_controls"))
        .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -32.0))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                let eye = if hud_on { "hide hud" } else { "show hud" };
                if ui.button(egui::RichText::new(eye).color(INDIGO)).clicked() {
                    events.push(UiEvent::ToggleVoyageHud);
                }
                if ui
                    .button(egui::RichText::new("✕ stop voyage").color(INDIGO))
                    .clicked()
                {
                    events.push(UiEvent::StopVoyage);
                }
            });
        });
}

fn stats_panel(ctx: &egui::Context, stats: &HudStats) {
    egui::Area::new(egui::Id::new("stats_panel"))
        .fixed_pos(egui::pos2(10.0, 10.0))
        .show(ctx, |ui| {
            egui::Frame::none()
                .fill(egui::Color32::from_rgba_premultiplied(0, 0, 0, 180))
                .inner_margin(egui::Margin::same(8.0))
                .rounding(4.0)
                .show(ui, |ui: &mut egui::Ui| {
                    ui.label(format!("FPS: {}", stats.fps));
                    ui.label(format!(
                        "Frame: {:.2} ms (min: {:.1} | max: {:.1})",
                        stats.frame_time_avg_ms,
                        stats.frame_time_min_ms,
                        stats.frame_time_max_ms
                    ));
                    ui.label(format!("Stars: {}", stats.star_count));
                    ui.label(format!("Sprites: {}", stats.sprite_count));
                    ui.label(format!(
                        "Camera: {}  Cruise: {}",
                        stats.camera_mode, stats.cruise_preset
                    ));
                });
        });
}

/// Render `**bold**` markdown spans as emphasized indigo text, everything
/// else plain. An unpaired trailing marker emphasizes the remainder.
fn answer_job(text: &str) -> egui::text::LayoutJob {
    let mut job = egui::text::LayoutJob::default();
    let plain = egui::TextFormat {
        color: egui::Color32::from_rgb(203, 213, 225),
        ..Default::default()
    };
    let bold = egui::TextFormat {
        color: INDIGO_PALE,
        ..Default::default()
    };

    let mut rest = text;
    let mut emphasized = false;
    while let Some(idx) = rest.find("**") {
        let (head, tail) = rest.split_at(idx);
        if !head.is_empty() {
            job.append(head, 0.0, if emphasized { bold.clone() } else { plain.clone() });
        }
        rest = &tail[2..];
        emphasized = !emphasized;
    }
    if !rest.is_empty() {
        job.append(rest, 0.0, if emphasized { bold.clone() } else { plain.clone() });
    }
    job
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_job_splits_bold_spans() {
        let job = answer_job("plain **strong** tail");
        let texts: Vec<&str> = job.sections.iter().map(|s| &job.text[s.byte_range.clone()]).collect();
        assert_eq!(texts, vec!["plain ", "strong", " tail"]);
    }

    #[test]
    fn answer_job_handles_unpaired_marker() {
        let job = answer_job("lead **rest");
        let texts: Vec<&str> = job.sections.iter().map(|s| &job.text[s.byte_range.clone()]).collect();
        assert_eq!(texts, vec!["lead ", "rest"]);
    }
}
