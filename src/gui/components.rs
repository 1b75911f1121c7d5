use eframe::egui;
use sys_health::models::HealthTier;

pub fn stat_card(ui: &mut egui::Ui, width: f32, height: f32, label: &str, value: &str, color: egui::Color32) {
    egui::Frame::none()
        .fill(egui::Color32::WHITE)
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_gray(230)))
        .rounding(10.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.set_width(width);
            ui.set_height(height);
            ui.vertical(|ui| {
                ui.label(
                    egui::RichText::new(label)
                        .size(11.0)
                        .color(egui::Color32::from_gray(120)),
                );
                ui.add_space(8.0);
                ui.label(egui::RichText::new(value).size(22.0).color(color).strong());
            });
        });
}

/// White rounded card with a title, used for every section of the report view.
pub fn section(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .fill(egui::Color32::WHITE)
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_gray(220)))
        .rounding(10.0)
        .inner_margin(15.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new(title).size(14.0).strong());
            ui.add_space(8.0);
            add_contents(ui);
        });
}

/// Tier color as an egui color.
pub fn tier_color(tier: HealthTier) -> egui::Color32 {
    hex_color(tier.color()).unwrap_or(egui::Color32::GRAY)
}

// "#rrggbb" only
fn hex_color(hex: &str) -> Option<egui::Color32> {
    let digits = hex.strip_prefix('#').filter(|d| d.len() == 6)?;
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
    Some(egui::Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Green / orange / red by free-space percentage, matching the disk score bands.
pub fn free_space_color(free_percent: f64) -> egui::Color32 {
    if free_percent <= 10.0 {
        egui::Color32::from_rgb(239, 68, 68)
    } else if free_percent <= 25.0 {
        egui::Color32::from_rgb(245, 158, 11)
    } else {
        egui::Color32::from_rgb(34, 197, 94)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_colors_parse() {
        assert_eq!(tier_color(HealthTier::Excellent), egui::Color32::from_rgb(0x28, 0xa7, 0x45));
        assert_eq!(tier_color(HealthTier::NeedsAttention), egui::Color32::from_rgb(0xdc, 0x35, 0x45));
        assert_eq!(hex_color("28a745"), None);
        assert_eq!(hex_color("#zzzzzz"), None);
    }
}
