/// Coarse genre families used for node glow colors and the genre-band layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenreFamily {
    Rock,
    Pop,
    HipHop,
    Electronic,
    Jazz,
    Indie,
}

type KeywordTable = [(GenreFamily, &'static [&'static str]); 6];

/// Keywords for the genre-band layout. Match order matters: "pop rock" is
/// rock, "k-pop" is pop.
const BAND_KEYWORDS: KeywordTable = [
    (GenreFamily::Rock, &["rock"]),
    (GenreFamily::Pop, &["pop"]),
    (GenreFamily::HipHop, &["hip hop", "rap"]),
    (GenreFamily::Electronic, &["electronic", "edm", "house"]),
    (GenreFamily::Jazz, &["jazz", "blues"]),
    (GenreFamily::Indie, &["indie", "alternative"]),
];

/// Keywords for glow colors. Narrower than the bands: house and blues glow
/// with the default color.
const GLOW_KEYWORDS: KeywordTable = [
    (GenreFamily::Rock, &["rock"]),
    (GenreFamily::Pop, &["pop"]),
    (GenreFamily::HipHop, &["hip hop", "rap"]),
    (GenreFamily::Electronic, &["electronic", "edm"]),
    (GenreFamily::Jazz, &["jazz"]),
    (GenreFamily::Indie, &["indie", "alternative"]),
];

fn lookup(table: &KeywordTable, tag: &str) -> Option<GenreFamily> {
    let tag = tag.to_lowercase();
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| tag.contains(k)))
        .map(|(family, _)| *family)
}

impl GenreFamily {
    /// Classify a single genre tag for the band layout, by case-insensitive
    /// substring match.
    pub fn classify(tag: &str) -> Option<GenreFamily> {
        lookup(&BAND_KEYWORDS, tag)
    }

    /// Classify a single genre tag for its glow color.
    pub fn classify_glow(tag: &str) -> Option<GenreFamily> {
        lookup(&GLOW_KEYWORDS, tag)
    }

    /// Band family of a record's primary (first) tag.
    pub fn primary(tags: &[String]) -> Option<GenreFamily> {
        tags.first().and_then(|tag| Self::classify(tag))
    }

    /// Glow family of a record's primary tag.
    pub fn primary_glow(tags: &[String]) -> Option<GenreFamily> {
        tags.first().and_then(|tag| Self::classify_glow(tag))
    }

    /// Glow color as 0xRRGGBB.
    pub fn glow_color(self) -> u32 {
        match self {
            GenreFamily::Rock => 0xFF4D4D,
            GenreFamily::Pop => 0xFF66CC,
            GenreFamily::HipHop => 0x994DFF,
            GenreFamily::Electronic => 0x4DCCFF,
            GenreFamily::Jazz => 0xFFCC4D,
            GenreFamily::Indie => 0x80FF80,
        }
    }

    /// 60-degree longitude band `[start, end)` owned by this family.
    pub fn longitude_band(self) -> (f64, f64) {
        match self {
            GenreFamily::Rock => (-180.0, -120.0),
            GenreFamily::Pop => (-120.0, -60.0),
            GenreFamily::HipHop => (-60.0, 0.0),
            GenreFamily::Electronic => (0.0, 60.0),
            GenreFamily::Jazz => (60.0, 120.0),
            GenreFamily::Indie => (120.0, 180.0),
        }
    }
}

/// Glow color for nodes without a recognised genre.
pub const DEFAULT_GLOW_COLOR: u32 = 0x4D99FF;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_case_insensitive() {
        assert_eq!(GenreFamily::classify("Indie Rock"), Some(GenreFamily::Rock));
        assert_eq!(GenreFamily::classify("K-POP"), Some(GenreFamily::Pop));
        assert_eq!(GenreFamily::classify("UK Hip Hop"), Some(GenreFamily::HipHop));
        assert_eq!(GenreFamily::classify("trap"), Some(GenreFamily::HipHop));
        assert_eq!(GenreFamily::classify("deep house"), Some(GenreFamily::Electronic));
        assert_eq!(GenreFamily::classify("delta blues"), Some(GenreFamily::Jazz));
        assert_eq!(GenreFamily::classify("alternative"), Some(GenreFamily::Indie));
        assert_eq!(GenreFamily::classify("baroque"), None);
    }

    #[test]
    fn glow_keywords_skip_house_and_blues() {
        assert_eq!(GenreFamily::classify_glow("deep house"), None);
        assert_eq!(GenreFamily::classify_glow("delta blues"), None);
        assert_eq!(GenreFamily::classify_glow("EDM"), Some(GenreFamily::Electronic));
        assert_eq!(GenreFamily::classify_glow("acid jazz"), Some(GenreFamily::Jazz));
        assert_eq!(GenreFamily::classify_glow("blues rock"), Some(GenreFamily::Rock));
    }

    #[test]
    fn primary_uses_first_tag_only() {
        let tags = vec!["baroque".to_string(), "rock".to_string()];
        assert_eq!(GenreFamily::primary(&tags), None);
        assert_eq!(GenreFamily::primary(&[]), None);
    }

    #[test]
    fn bands_tile_the_full_circle() {
        let mut bands: Vec<(f64, f64)> = BAND_KEYWORDS
            .iter()
            .map(|(family, _)| family.longitude_band())
            .collect();
        bands.sort_by(|a, b| a.0.total_cmp(&b.0));
        assert_eq!(bands.first().unwrap().0, -180.0);
        assert_eq!(bands.last().unwrap().1, 180.0);
        for pair in bands.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn colors_are_valid_rgb() {
        for (family, _) in GLOW_KEYWORDS {
            assert!(family.glow_color() <= 0xFFFFFF);
            assert_ne!(family.glow_color(), DEFAULT_GLOW_COLOR);
        }
    }
}
