/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Utility for parsing colour strings: named colours, `#rrggbb`, or `[r, g, b]`
/// arrays with components in 0..=1.
pub fn parse_color(val: &str) -> Option<Rgb> {
    let val = val.trim();
    if val.starts_with('[') && val.ends_with(']') {
        // e.g. [1.0, 0.411765, 0.380392]
        let inner = &val[1..val.len() - 1];
        let parts: Vec<&str> = inner.split(',').map(|s| s.trim()).collect();
        if parts.len() == 3 {
            let mut c = [0u8; 3];
            for (slot, part) in c.iter_mut().zip(&parts) {
                let f = part.parse::<f32>().ok()?;
                *slot = (f.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
            Some(Rgb(c[0], c[1], c[2]))
        } else {
            None
        }
    } else if let Some(hex) = val.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        Some(Rgb(r, g, b))
    } else {
        let named = match val.to_ascii_lowercase().as_str() {
            "white" => Rgb(0xff, 0xff, 0xff),
            "black" => Rgb(0x00, 0x00, 0x00),
            "red" => Rgb(0xff, 0x00, 0x00),
            "darkred" => Rgb(0x8b, 0x00, 0x00),
            "green" => Rgb(0x00, 0x80, 0x00),
            "blue" => Rgb(0x00, 0x00, 0xff),
            "yellow" => Rgb(0xff, 0xff, 0x00),
            "orange" => Rgb(0xff, 0xa5, 0x00),
            "cyan" => Rgb(0x00, 0xff, 0xff),
            "magenta" => Rgb(0xff, 0x00, 0xff),
            "lightblue" => Rgb(0xad, 0xd8, 0xe6),
            "deepskyblue" => Rgb(0x00, 0xbf, 0xff),
            "skyblue" => Rgb(0x87, 0xce, 0xeb),
            "steelblue" => Rgb(0x46, 0x82, 0xb4),
            "darkgreen" => Rgb(0x00, 0x64, 0x00),
            "gray" | "grey" => Rgb(0x80, 0x80, 0x80),
            "lightgray" | "lightgrey" => Rgb(0xd3, 0xd3, 0xd3),
            "darkgray" | "darkgrey" => Rgb(0xa9, 0xa9, 0xa9),
            "brown" => Rgb(0xa5, 0x2a, 0x2a),
            "purple" => Rgb(0x80, 0x00, 0x80),
            "pink" => Rgb(0xff, 0xc0, 0xcb),
            "navy" => Rgb(0x00, 0x00, 0x80),
            "teal" => Rgb(0x00, 0x80, 0x80),
            "silver" => Rgb(0xc0, 0xc0, 0xc0),
            _ => return None,
        };
        Some(named)
    }
}
