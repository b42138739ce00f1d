//! Zodiac sign registry
//!
//! The twelve signs in calendar order, Aries first. Lookups are
//! case-insensitive and never fall back to a default sign.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ZodiacSign {
    pub slug: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    /// Character rendered by the astrology glyph font
    pub font_char: char,
    pub element: Element,
    pub date_range: &'static str,
}

/// Static registry, zero allocation
pub static ZODIAC_SIGNS: [ZodiacSign; 12] = [
    sign("aries", "Aries", "♈", 'x', Element::Fire, "Mar 21 – Apr 19"),
    sign("taurus", "Taurus", "♉", 'c', Element::Earth, "Apr 20 – May 20"),
    sign("gemini", "Gemini", "♊", 'v', Element::Air, "May 21 – Jun 20"),
    sign("cancer", "Cancer", "♋", 'b', Element::Water, "Jun 21 – Jul 22"),
    sign("leo", "Leo", "♌", 'n', Element::Fire, "Jul 23 – Aug 22"),
    sign("virgo", "Virgo", "♍", 'm', Element::Earth, "Aug 23 – Sep 22"),
    sign("libra", "Libra", "♎", 'X', Element::Air, "Sep 23 – Oct 22"),
    sign("scorpio", "Scorpio", "♏", 'C', Element::Water, "Oct 23 – Nov 21"),
    sign("sagittarius", "Sagittarius", "♐", 'V', Element::Fire, "Nov 22 – Dec 21"),
    sign("capricorn", "Capricorn", "♑", 'B', Element::Earth, "Dec 22 – Jan 19"),
    sign("aquarius", "Aquarius", "♒", 'N', Element::Air, "Jan 20 – Feb 18"),
    sign("pisces", "Pisces", "♓", 'M', Element::Water, "Feb 19 – Mar 20"),
];

const fn sign(
    slug: &'static str,
    name: &'static str,
    symbol: &'static str,
    font_char: char,
    element: Element,
    date_range: &'static str,
) -> ZodiacSign {
    ZodiacSign {
        slug,
        name,
        symbol,
        font_char,
        element,
        date_range,
    }
}

/// Case-insensitive lookup
pub fn get_sign(token: &str) -> Option<&'static ZodiacSign> {
    ZODIAC_SIGNS
        .iter()
        .find(|s| s.slug.eq_ignore_ascii_case(token))
}

pub fn is_valid_sign(token: &str) -> bool {
    get_sign(token).is_some()
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Element::Fire => "Fire",
            Element::Earth => "Earth",
            Element::Air => "Air",
            Element::Water => "Water",
        };
        write!(f, "{}", s)
    }
}
