use ratatui::style::Color;
use term_color_support::ColorSupport;

/// RGBA colour as the renderer receives it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Rgba { r, g, b, a }
    }
}

/// Board background behind the tiles
pub const BACKGROUND: Rgba = Rgba::new(40, 45, 42, 255);

// Named ANSI colours with their Campbell RGB sample and a stable 256-colour index
const PALETTE: [(&str, Color, (u8, u8, u8), u8); 16] = [
    ("black", Color::Black, (12, 12, 12), 232),
    ("red", Color::Red, (197, 15, 31), 160),
    ("green", Color::Green, (19, 161, 14), 28),
    ("yellow", Color::Yellow, (193, 156, 0), 178),
    ("blue", Color::Blue, (0, 55, 218), 20),
    ("magenta", Color::Magenta, (136, 23, 152), 90),
    ("cyan", Color::Cyan, (58, 150, 221), 38),
    ("gray", Color::Gray, (204, 204, 204), 250),
    ("darkgray", Color::DarkGray, (118, 118, 118), 243),
    ("lightred", Color::LightRed, (231, 72, 86), 203),
    ("lightgreen", Color::LightGreen, (22, 198, 12), 46),
    ("lightyellow", Color::LightYellow, (249, 241, 165), 229),
    ("lightblue", Color::LightBlue, (59, 120, 255), 63),
    ("lightmagenta", Color::LightMagenta, (180, 0, 158), 163),
    ("lightcyan", Color::LightCyan, (97, 214, 214), 116),
    ("white", Color::White, (242, 242, 242), 255),
];

/// Look up a colour by name (`"red"`, `"light_blue"`, `"#1e90ff"`)
pub fn parse_color(name: &str) -> Option<Color> {
    let key = name.trim().to_ascii_lowercase().replace(['_', '-', ' '], "");
    if let Some(hex) = key.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?));
    }
    match key.as_str() {
        "reset" | "default" => Some(Color::Reset),
        "grey" => Some(Color::Gray),
        "darkgrey" => Some(Color::DarkGray),
        _ => PALETTE.iter().find(|(n, ..)| *n == key).map(|(_, c, ..)| *c),
    }
}

/// Keep ANSI colours looking the same across terminals.
pub trait Adapt {
    fn adapt(self) -> Color;
}

impl Adapt for Color {
    fn adapt(self) -> Color {
        let Some(&(_, _, (r, g, b), index)) = PALETTE.iter().find(|(_, c, ..)| *c == self) else {
            return self;
        };
        let support = ColorSupport::stdout();
        if support.has_16m {
            Color::Rgb(r, g, b)
        } else if support.has_256 {
            Color::Indexed(index)
        } else {
            self
        }
    }
}

impl Adapt for Rgba {
    fn adapt(self) -> Color {
        Color::Rgb(self.r, self.g, self.b)
    }
}
