use clap::ValueEnum;
use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Theme {
    #[value(name = "caliber")]
    Caliber,
    #[value(name = "dark_minimal")]
    DarkMinimal,
    #[value(name = "light_minimal")]
    LightMinimal,
    #[value(name = "night_sky")]
    NightSky,
    #[value(name = "contrast")]
    Contrast,
}

/// Colors used by the history chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Color,
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub download: Color,
    pub upload: Color,
    pub latency: Color,
}

impl Theme {
    pub fn palette(self) -> Palette {
        match self {
            Theme::Caliber => Palette {
                background: Color::Rgb(255, 255, 255),
                text: Color::Rgb(95, 95, 95),
                muted: Color::Rgb(140, 140, 140),
                border: Color::Rgb(200, 200, 200),
                download: Color::Rgb(31, 119, 180),
                upload: Color::Rgb(214, 39, 40),
                latency: Color::Rgb(44, 160, 44),
            },
            Theme::DarkMinimal => Palette {
                background: Color::Rgb(33, 33, 33),
                text: Color::Rgb(230, 230, 230),
                muted: Color::Rgb(100, 100, 100),
                border: Color::Rgb(60, 60, 65),
                download: Color::Rgb(100, 149, 237),
                upload: Color::Rgb(230, 100, 100),
                latency: Color::Rgb(134, 194, 156),
            },
            Theme::LightMinimal => Palette {
                background: Color::Rgb(250, 250, 250),
                text: Color::Rgb(50, 50, 50),
                muted: Color::Rgb(150, 150, 150),
                border: Color::Rgb(220, 220, 220),
                download: Color::Rgb(40, 90, 200),
                upload: Color::Rgb(200, 50, 50),
                latency: Color::Rgb(30, 140, 70),
            },
            Theme::NightSky => Palette {
                background: Color::Rgb(42, 24, 80),
                text: Color::Rgb(225, 225, 255),
                muted: Color::Rgb(130, 120, 170),
                border: Color::Rgb(80, 60, 130),
                download: Color::Rgb(120, 200, 255),
                upload: Color::Rgb(255, 130, 180),
                latency: Color::Rgb(170, 255, 170),
            },
            Theme::Contrast => Palette {
                background: Color::Black,
                text: Color::White,
                muted: Color::Gray,
                border: Color::White,
                download: Color::Cyan,
                upload: Color::LightRed,
                latency: Color::LightGreen,
            },
        }
    }
}
