use anyhow::Result;
use log::error;
use plotters::prelude::RGBColor;

pub static FONT_SIZE: i32 = 18;
pub static TITLE_FONT_SIZE: i32 = 20;
pub static STROKE_WIDTH: u32 = 2;

/// Categorical palette for one line per group.
static CATEGORICAL: [RGBColor; 10] = [
    RGBColor(76, 114, 176),
    RGBColor(221, 132, 82),
    RGBColor(85, 168, 104),
    RGBColor(196, 78, 82),
    RGBColor(129, 114, 179),
    RGBColor(147, 120, 96),
    RGBColor(218, 139, 195),
    RGBColor(140, 140, 140),
    RGBColor(204, 185, 116),
    RGBColor(100, 181, 205),
];

pub fn get_color_from_label(label: &str) -> Result<RGBColor> {
    match label {
        "dark-green" | "completed" => Ok(RGBColor(0, 68, 27)),
        "light-green" => Ok(RGBColor(116, 196, 118)),
        "dark-red" | "lost" => Ok(RGBColor(103, 0, 13)),
        "light-red" => Ok(RGBColor(251, 106, 74)),
        "grid" => Ok(RGBColor(200, 200, 200)),
        _ => {
            error!("unrecognized label for color (label={label})");
            anyhow::bail!("unrecognized label (label={label})");
        }
    }
}

pub fn categorical(idx: usize) -> RGBColor {
    CATEGORICAL[idx % CATEGORICAL.len()]
}

fn lerp(from: u8, to: u8, t: f64) -> u8 {
    (from as f64 + (to as f64 - from as f64) * t).round() as u8
}

/// `n` shades going from `dark` to `light`.
pub fn ramp(dark: RGBColor, light: RGBColor, n: usize) -> Vec<RGBColor> {
    if n <= 1 {
        return vec![dark; n];
    }

    (0..n)
        .map(|i| {
            let t = i as f64 / (n - 1) as f64;
            RGBColor(
                lerp(dark.0, light.0, t),
                lerp(dark.1, light.1, t),
                lerp(dark.2, light.2, t),
            )
        })
        .collect()
}

/// One shade of green per group, used for completed requests.
pub fn completed_palette(n: usize) -> Result<Vec<RGBColor>> {
    Ok(ramp(
        get_color_from_label("dark-green")?,
        get_color_from_label("light-green")?,
        n,
    ))
}

/// One shade of red per group, used for lost requests.
pub fn lost_palette(n: usize) -> Result<Vec<RGBColor>> {
    Ok(ramp(
        get_color_from_label("dark-red")?,
        get_color_from_label("light-red")?,
        n,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_endpoints() {
        let shades = ramp(RGBColor(0, 0, 0), RGBColor(100, 200, 50), 3);
        assert_eq!(shades[0], RGBColor(0, 0, 0));
        assert_eq!(shades[1], RGBColor(50, 100, 25));
        assert_eq!(shades[2], RGBColor(100, 200, 50));
    }

    #[test]
    fn test_palettes_have_one_shade_per_group() {
        assert_eq!(completed_palette(4).unwrap().len(), 4);
        assert_eq!(lost_palette(1).unwrap(), vec![RGBColor(103, 0, 13)]);
        assert!(completed_palette(0).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_label() {
        assert!(get_color_from_label("ultraviolet").is_err());
    }
}
