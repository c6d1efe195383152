//! CJK fallback font. egui's bundled fonts have no Chinese glyphs, so the
//! first system font found is appended to both families.

use egui::{FontData, FontDefinitions, FontFamily};
use std::path::Path;

const CANDIDATES: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/wenquanyi/wqy-microhei/wqy-microhei.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "/System/Library/Fonts/STHeiti Medium.ttc",
    "C:\\Windows\\Fonts\\msyh.ttc",
    "C:\\Windows\\Fonts\\simhei.ttf",
];

const FONT_NAME: &str = "cjk-fallback";

/// Install the fallback font; returns the path used
pub fn install_cjk_fallback(ctx: &egui::Context) -> Option<&'static str> {
    let Some((path, bytes)) = CANDIDATES
        .iter()
        .find_map(|p| std::fs::read(Path::new(p)).ok().map(|b| (*p, b)))
    else {
        tracing::warn!("no CJK font found; Chinese labels will render as boxes");
        return None;
    };

    let mut fonts = FontDefinitions::default();
    fonts
        .font_data
        .insert(FONT_NAME.into(), FontData::from_owned(bytes));
    for family in [FontFamily::Proportional, FontFamily::Monospace] {
        if let Some(list) = fonts.families.get_mut(&family) {
            list.push(FONT_NAME.into());
        }
    }
    ctx.set_fonts(fonts);
    tracing::info!(path, "loaded CJK font");
    Some(path)
}
