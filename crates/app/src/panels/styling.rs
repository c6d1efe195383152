//! Styling agent: generation parameters and the concept gallery

use super::{
    caption, primary_button, UiIntent, BRAND_ACCENT, BRAND_BLUE, SLATE_400, SLATE_500, SLATE_600,
    SLATE_700, SLATE_800, SLATE_900, SLATE_950,
};
use egui::{pos2, vec2, Align2, Color32, FontId, Frame, Rect, RichText, Sense, Shape, Stroke};
use pipeline::Action;
use rand::Rng;
use shared::DesignRecord;

pub const CFG_RANGE: std::ops::RangeInclusive<f32> = 1.0..=20.0;
pub const STEPS_RANGE: std::ops::RangeInclusive<u32> = 10..=150;

pub struct StylingForm {
    pub prompt: String,
    pub negative_prompt: String,
    pub cfg: f32,
    pub steps: u32,
    /// -1 lets the generator pick
    pub seed: i64,
}

impl Default for StylingForm {
    fn default() -> Self {
        Self {
            prompt: "Futuristic estateback, cyberpunk aesthetic, neon lighting, highly detailed, 8k".into(),
            negative_prompt: "low quality, blurry, distorted, ugly, bad anatomy".into(),
            cfg: 7.5,
            steps: 50,
            seed: -1,
        }
    }
}

impl StylingForm {
    pub fn randomize_seed(&mut self, rng: &mut impl Rng) {
        self.seed = rng.gen_range(0..1_000_000_000);
    }

    /// Chat message asking the orchestrator for new variants
    pub fn request_message(&self) -> String {
        format!(
            "Generate style variants: {} | negative: {} | cfg={} steps={} seed={}",
            self.prompt.trim(),
            self.negative_prompt.trim(),
            self.cfg,
            self.steps,
            self.seed
        )
    }
}

pub fn show(
    ui: &mut egui::Ui,
    form: &mut StylingForm,
    designs: &[DesignRecord],
    selected: Option<&str>,
    generating: bool,
    out: &mut Vec<UiIntent>,
) {
    egui::SidePanel::left("styling_form")
        .exact_width(320.0)
        .resizable(false)
        .frame(Frame::none().fill(SLATE_900).inner_margin(16.0))
        .show_inside(ui, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| controls(ui, form, generating, out));
        });

    egui::CentralPanel::default()
        .frame(Frame::none().fill(SLATE_950).inner_margin(24.0))
        .show_inside(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("造型智能体 (Styling Agent)").size(20.0).strong().color(Color32::WHITE));
                ui.label(RichText::new("/ 方案库").size(20.0).color(SLATE_500));
                if generating {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        super::badge(ui, "⟳ 处理中...", BRAND_ACCENT);
                    });
                }
            });
            ui.add_space(16.0);
            egui::ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
                gallery(ui, designs, selected, out);
            });
        });
}

fn controls(ui: &mut egui::Ui, form: &mut StylingForm, generating: bool, out: &mut Vec<UiIntent>) {
    ui.label(RichText::new("生成参数配置").size(15.0).strong().color(Color32::WHITE));
    ui.add_space(16.0);

    caption(ui, "正向提示词 (POSITIVE PROMPT)");
    ui.add(egui::TextEdit::multiline(&mut form.prompt).desired_rows(4).desired_width(f32::INFINITY));
    ui.add_space(12.0);

    caption(ui, "反向提示词 (NEGATIVE PROMPT)");
    ui.add(
        egui::TextEdit::multiline(&mut form.negative_prompt)
            .desired_rows(2)
            .desired_width(f32::INFINITY),
    );
    ui.add_space(12.0);

    caption(ui, "提示词相关性 (CFG SCALE)");
    ui.add(egui::Slider::new(&mut form.cfg, CFG_RANGE).step_by(0.5));
    ui.add_space(8.0);

    caption(ui, "采样步数 (STEPS)");
    ui.add(egui::Slider::new(&mut form.steps, STEPS_RANGE));
    ui.add_space(8.0);

    caption(ui, "随机种子 (SEED)");
    ui.horizontal(|ui| {
        ui.add(egui::DragValue::new(&mut form.seed).clamp_range(-1..=i64::from(u32::MAX)));
        if ui.button("随机").clicked() {
            form.randomize_seed(&mut rand::thread_rng());
        }
    });
    ui.add_space(16.0);

    let button = primary_button("生成变体", BRAND_BLUE).min_size(vec2(ui.available_width(), 36.0));
    if ui.add_enabled(!generating, button).clicked() {
        out.push(UiIntent::Submit(form.request_message()));
    }
}

fn gallery(ui: &mut egui::Ui, designs: &[DesignRecord], selected: Option<&str>, out: &mut Vec<UiIntent>) {
    for row in designs.chunks(2) {
        ui.columns(2, |cols| {
            for (ui, design) in cols.iter_mut().zip(row) {
                if design_card(ui, design, selected == Some(design.id.as_str())) {
                    out.push(UiIntent::Dispatch(Action::SelectDesign(design.id.clone())));
                }
            }
        });
        ui.add_space(16.0);
    }
}

/// Returns true when clicked
fn design_card(ui: &mut egui::Ui, design: &DesignRecord, selected: bool) -> bool {
    let width = ui.available_width();
    let (rect, response) = ui.allocate_exact_size(vec2(width, width * 9.0 / 16.0), Sense::click());
    let painter = ui.painter_at(rect);

    painter.rect_filled(rect, 8.0, SLATE_950);
    paint_silhouette(&painter, rect.shrink(rect.width() * 0.12), design);

    let caption_rect = Rect::from_min_max(pos2(rect.left(), rect.bottom() - 56.0), rect.max);
    painter.rect_filled(caption_rect, 8.0, Color32::from_black_alpha(200));
    painter.text(
        caption_rect.left_top() + vec2(12.0, 10.0),
        Align2::LEFT_TOP,
        &design.name,
        FontId::proportional(14.0),
        Color32::WHITE,
    );
    painter.text(
        caption_rect.left_top() + vec2(12.0, 30.0),
        Align2::LEFT_TOP,
        format!("{} • {}", design.vehicle_type.as_str(), design.style.vibe),
        FontId::monospace(11.0),
        SLATE_400,
    );
    painter.text(
        caption_rect.right_top() + vec2(-12.0, 12.0),
        Align2::RIGHT_TOP,
        format!("S: {}", design.style.seed),
        FontId::monospace(10.0),
        SLATE_500,
    );
    painter.text(
        caption_rect.right_top() + vec2(-12.0, 28.0),
        Align2::RIGHT_TOP,
        format!("CFG: {}", design.style.cfg),
        FontId::monospace(10.0),
        SLATE_500,
    );

    let border = if selected {
        Stroke::new(2.0, BRAND_BLUE)
    } else if response.hovered() {
        Stroke::new(1.0, SLATE_600)
    } else {
        Stroke::new(1.0, SLATE_800)
    };
    painter.rect_stroke(rect, 8.0, border);
    if selected {
        let check = rect.right_top() + vec2(-18.0, 18.0);
        painter.circle_filled(check, 10.0, BRAND_BLUE);
        painter.text(check, Align2::CENTER_CENTER, "✔", FontId::proportional(12.0), Color32::WHITE);
    }
    response.clicked()
}

/// Side profile standing in for the concept render
fn paint_silhouette(painter: &egui::Painter, rect: Rect, design: &DesignRecord) {
    let dims = design.dimensions();
    let roof = (dims.height / dims.length * 2.2).clamp(0.35, 0.7);
    let at = |x: f32, y: f32| pos2(rect.left() + x * rect.width(), rect.bottom() - 0.25 * rect.height() - y * rect.height());
    let top = [
        (0.0, 0.25),
        (0.25, 0.32),
        (0.38, roof),
        (0.72, roof),
        (0.9, 0.3),
        (1.0, 0.22),
    ];
    // x-monotone outline: fill one convex column per roof segment
    for pair in top.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        painter.add(Shape::convex_polygon(
            vec![at(x0, y0), at(x1, y1), at(x1, 0.05), at(x0, 0.05)],
            SLATE_800,
            Stroke::NONE,
        ));
    }
    let mut outline: Vec<_> = top.iter().map(|&(x, y)| at(x, y)).collect();
    outline.extend([at(1.0, 0.05), at(0.0, 0.05)]);
    painter.add(Shape::closed_line(outline, Stroke::new(1.5, BRAND_BLUE.gamma_multiply(0.4))));
    let wheel = rect.height() * 0.09;
    for x in [0.2, 0.8] {
        let center = at(x, 0.05);
        painter.circle(center, wheel, SLATE_900, Stroke::new(2.0, SLATE_600));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::command::fallback_commands;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_defaults() {
        let form = StylingForm::default();
        assert_eq!(form.cfg, 7.5);
        assert_eq!(form.steps, 50);
        assert_eq!(form.seed, -1);
        assert!(CFG_RANGE.contains(&form.cfg));
        assert!(STEPS_RANGE.contains(&form.steps));
    }

    #[test]
    fn test_randomize_seed_non_negative() {
        let mut form = StylingForm::default();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..20 {
            form.randomize_seed(&mut rng);
            assert!((0..1_000_000_000).contains(&form.seed));
        }
    }

    #[test]
    fn test_request_message_routes_to_styling_offline() {
        let form = StylingForm::default();
        let message = form.request_message();
        assert!(message.contains("cfg=7.5 steps=50 seed=-1"));
        assert_eq!(fallback_commands(&message)[0].name, "STYLING");
    }
}
