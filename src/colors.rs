use image::Rgb;
use palette::{FromColor, Hsl, Srgb};

/// Generates `n` visually distinct, contrasting RGB colors.
///
/// Hues are spread evenly around the wheel starting at red; `saturation` and
/// `lightness` are in `[0, 1]`.
pub(crate) fn contrasting_colors(n: usize, saturation: f32, lightness: f32) -> Vec<Rgb<u8>> {
    let mut colors = Vec::with_capacity(n);

    for i in 0..n {
        let hue = (i as f32 * 360.0) / n as f32;

        let hsl_color = Hsl::new(hue, saturation, lightness);
        let srgb_linear = Srgb::from_color(hsl_color);
        let srgb_u8: Srgb<u8> = srgb_linear.into_format();

        colors.push(Rgb([srgb_u8.red, srgb_u8.green, srgb_u8.blue]));
    }

    colors
}
