use crate::overlay::LogoPlacement;
use crate::upload::UploadedImage;

pub const MIN_VARIANTS: u32 = 4;
pub const MAX_VARIANTS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverFormat {
    #[default]
    FrontCover,
    Spine,
    ContentLayout,
    BackCover,
}

impl CoverFormat {
    pub const ALL: [CoverFormat; 4] = [
        CoverFormat::FrontCover,
        CoverFormat::Spine,
        CoverFormat::ContentLayout,
        CoverFormat::BackCover,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CoverFormat::FrontCover => "Front Cover (1000 x 1500 px)",
            CoverFormat::Spine => "Spine (230 x 2500 px) Vertical",
            CoverFormat::ContentLayout => "Content Layout (2250 x 350 px) Horizontal",
            CoverFormat::BackCover => "Back Cover (1000 x 1500 px)",
        }
    }

    /// Aspect ratio sent to the generator. Only the ratios the service
    /// supports are used, so spine and layout get the closest one.
    pub fn aspect_ratio(self) -> &'static str {
        match self {
            CoverFormat::FrontCover | CoverFormat::BackCover => "3:4",
            CoverFormat::Spine => "9:16",
            CoverFormat::ContentLayout => "16:9",
        }
    }

    /// Width over height of the on-screen container for this format.
    pub fn display_aspect(self) -> f32 {
        match self {
            CoverFormat::FrontCover | CoverFormat::BackCover => 2.0 / 3.0,
            CoverFormat::Spine => 230.0 / 2500.0,
            CoverFormat::ContentLayout => 2250.0 / 350.0,
        }
    }

    /// Logo slot shown on results of this format, if any.
    pub fn logo_placement(self) -> Option<LogoPlacement> {
        match self {
            CoverFormat::FrontCover => Some(LogoPlacement::FrontCover),
            CoverFormat::BackCover => Some(LogoPlacement::BackCover),
            CoverFormat::Spine | CoverFormat::ContentLayout => None,
        }
    }

    pub fn uses_blurb(self) -> bool {
        self == CoverFormat::BackCover
    }
}

/// Declares a fixed option catalog whose text goes into the prompt verbatim.
/// The first entry is the default.
macro_rules! catalog {
    ($name:ident { $first:ident => $first_text:expr, $($variant:ident => $text:expr),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub enum $name {
            #[default]
            $first,
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$name::$first, $($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $name::$first => $first_text,
                    $($name::$variant => $text),+
                }
            }
        }
    };
}

catalog!(CoverStyle {
    Minimalis => "Minimalis",
    Tipografis => "Tipografis",
    Vintage => "Vintage",
    Ilustratif => "Ilustratif",
    ProfesionalKorporat => "Profesional Korporat",
    Industrial => "Industrial",
    PopArt => "Pop Art",
    Dark => "Dark",
    NoStyle => "no",
});

catalog!(CoverGenre {
    Literary => "Literary",
    TrueCrime => "True Crime",
    Fantasy => "Fantasy",
    Romance => "Romance",
    SelfHelp => "Self Help",
    NoGenre => "no",
});

catalog!(CoverTrend {
    SwissStyle => "Swiss style",
    Maximalist => "maximalist",
    FlatDesign => "flat design",
    Surealist => "surealist",
    Brutalism => "brutalism",
    NoTrend => "no",
});

catalog!(CoverTexture {
    Organic => "organic",
    Futuristik => "Futuristik",
    NoTexture => "no",
});

#[derive(Debug, Clone)]
pub struct BookCoverForm {
    pub title: String,
    pub author: String,
    pub design_idea: String,
    pub blurb: String,
    pub format: CoverFormat,
    pub style: CoverStyle,
    pub genre: CoverGenre,
    pub trend: CoverTrend,
    pub texture: CoverTexture,
    pub variant_count: u32,
    pub references: Vec<UploadedImage>,
    pub front_logo: Option<UploadedImage>,
    pub back_logo: Option<UploadedImage>,
}

impl Default for BookCoverForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            design_idea: String::new(),
            blurb: String::new(),
            format: CoverFormat::default(),
            style: CoverStyle::default(),
            genre: CoverGenre::default(),
            trend: CoverTrend::default(),
            texture: CoverTexture::default(),
            variant_count: MIN_VARIANTS,
            references: Vec::new(),
            front_logo: None,
            back_logo: None,
        }
    }
}

impl BookCoverForm {
    /// A title is the only required field.
    pub fn can_submit(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn variant_count(&self) -> u32 {
        self.variant_count.clamp(MIN_VARIANTS, MAX_VARIANTS)
    }

    /// Logo that applies to `format`, with its slot.
    pub fn logo_for(&self, format: CoverFormat) -> Option<(LogoPlacement, &UploadedImage)> {
        match format.logo_placement()? {
            LogoPlacement::FrontCover => self.front_logo.as_ref().map(|l| (LogoPlacement::FrontCover, l)),
            LogoPlacement::BackCover => self.back_logo.as_ref().map(|l| (LogoPlacement::BackCover, l)),
        }
    }

    pub fn remove_reference(&mut self, index: usize) {
        if index < self.references.len() {
            self.references.remove(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logo(name: &str) -> UploadedImage {
        UploadedImage {
            name: name.to_string(),
            mime_type: "image/png".to_string(),
            bytes: vec![1u8, 2, 3].into(),
        }
    }

    #[test]
    fn test_catalog_text() {
        assert_eq!(CoverStyle::default().as_str(), "Minimalis");
        assert_eq!(CoverStyle::ProfesionalKorporat.as_str(), "Profesional Korporat");
        assert_eq!(CoverStyle::NoStyle.as_str(), "no");
        assert_eq!(CoverGenre::SelfHelp.as_str(), "Self Help");
        assert_eq!(CoverTrend::default().as_str(), "Swiss style");
        assert_eq!(CoverTrend::FlatDesign.as_str(), "flat design");
        assert_eq!(CoverTexture::default().as_str(), "organic");
        assert_eq!(CoverStyle::ALL.len(), 9);
        assert_eq!(CoverGenre::ALL.len(), 6);
        assert_eq!(CoverTrend::ALL.len(), 6);
        assert_eq!(CoverTexture::ALL.len(), 3);
    }

    #[test]
    fn test_format_aspects() {
        assert_eq!(CoverFormat::FrontCover.aspect_ratio(), "3:4");
        assert_eq!(CoverFormat::BackCover.aspect_ratio(), "3:4");
        assert_eq!(CoverFormat::Spine.aspect_ratio(), "9:16");
        assert_eq!(CoverFormat::ContentLayout.aspect_ratio(), "16:9");
        assert!(CoverFormat::Spine.display_aspect() < 0.1);
        assert!(CoverFormat::ContentLayout.display_aspect() > 6.0);
    }

    #[test]
    fn test_can_submit_requires_title() {
        let mut form = BookCoverForm::default();
        assert!(!form.can_submit());
        form.title = "   ".to_string();
        assert!(!form.can_submit());
        form.title = "Laut Bercerita".to_string();
        assert!(form.can_submit());
    }

    #[test]
    fn test_variant_count_is_clamped() {
        let mut form = BookCoverForm::default();
        assert_eq!(form.variant_count(), 4);
        form.variant_count = 20;
        assert_eq!(form.variant_count(), 8);
        form.variant_count = 0;
        assert_eq!(form.variant_count(), 4);
    }

    #[test]
    fn test_logo_depends_on_format() {
        let mut form = BookCoverForm {
            front_logo: Some(logo("front.png")),
            back_logo: Some(logo("back.png")),
            ..Default::default()
        };

        let (slot, image) = form.logo_for(form.format).unwrap();
        assert_eq!(slot, LogoPlacement::FrontCover);
        assert_eq!(image.name, "front.png");

        form.format = CoverFormat::BackCover;
        let (slot, image) = form.logo_for(form.format).unwrap();
        assert_eq!(slot, LogoPlacement::BackCover);
        assert_eq!(image.name, "back.png");

        form.format = CoverFormat::Spine;
        assert!(form.logo_for(form.format).is_none());

        form.format = CoverFormat::FrontCover;
        form.front_logo = None;
        assert!(form.logo_for(form.format).is_none());
    }

    #[test]
    fn test_remove_reference_out_of_range() {
        let mut form = BookCoverForm {
            references: vec![logo("a.png"), logo("b.png")],
            ..Default::default()
        };
        form.remove_reference(5);
        assert_eq!(form.references.len(), 2);
        form.remove_reference(0);
        assert_eq!(form.references[0].name, "b.png");
    }
}
