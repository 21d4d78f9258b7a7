/// Named fonts a slide may ask for. Each maps to a fixed CSS `font-family` fallback chain;
/// unknown names resolve to [`FontFamily::Arial`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontFamily {
    #[default]
    Arial,
    Helvetica,
    Roboto,
    OpenSans,
    Montserrat,
    BebasNeue,
    Impact,
    Futura,
    Georgia,
    Times,
}

impl FontFamily {
    pub fn from_name(name: Option<&str>) -> Self {
        let Some(name) = name else {
            return Self::default();
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "arial" => Self::Arial,
            "helvetica" => Self::Helvetica,
            "roboto" => Self::Roboto,
            "open sans" | "opensans" => Self::OpenSans,
            "montserrat" => Self::Montserrat,
            "bebas neue" | "bebasneue" => Self::BebasNeue,
            "impact" => Self::Impact,
            "futura" => Self::Futura,
            "georgia" => Self::Georgia,
            "times" | "times new roman" => Self::Times,
            _ => Self::default(),
        }
    }

    /// The value placed in the overlay's `font-family` attribute. Uses single quotes so it can
    /// sit inside a double-quoted attribute.
    pub fn css_chain(self) -> &'static str {
        match self {
            Self::Arial => "Arial, Helvetica, sans-serif",
            Self::Helvetica => "Helvetica, Arial, sans-serif",
            Self::Roboto => "Roboto, Arial, sans-serif",
            Self::OpenSans => "'Open Sans', Arial, sans-serif",
            Self::Montserrat => "Montserrat, Arial, sans-serif",
            Self::BebasNeue => "'Bebas Neue', Impact, sans-serif",
            Self::Impact => "Impact, 'Arial Black', sans-serif",
            Self::Futura => "Futura, 'Trebuchet MS', Arial, sans-serif",
            Self::Georgia => "Georgia, 'Times New Roman', serif",
            Self::Times => "'Times New Roman', Times, serif",
        }
    }
}
