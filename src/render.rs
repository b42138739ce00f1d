//! Plain-text reading card for the CLI

use std::fmt::Write;

use crate::models::{HoroscopeApiResponse, HoroscopeData, PersonalReading};

/// Highlights of this type are shown on the card; others are engine internals
const SKY_ASPECT: &str = "sky_aspect";

const SCORE_DIMENSIONS: [&str; 4] = ["love", "career", "money", "health"];

/// Word label for a 0-100 score
pub fn score_label(score: f64) -> &'static str {
    match score {
        s if s < 25.0 => "Challenging",
        s if s < 45.0 => "Tense / Low support",
        s if s < 60.0 => "Mixed",
        s if s < 75.0 => "Supportive",
        _ => "Strong tailwind",
    }
}

/// Confidence arrives either as a 0-1 fraction or as a percentage.
fn confidence_percent(confidence: f64) -> f64 {
    if confidence <= 1.0 {
        confidence * 100.0
    } else {
        confidence
    }
}

pub fn render_reading(response: &HoroscopeApiResponse) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_reading(&mut out, &response.data);
    out
}

fn write_reading(out: &mut String, data: &HoroscopeData) -> std::fmt::Result {
    let content = &data.content;
    let scores = &data.scores;

    writeln!(out, "=== {} · {} ===", data.sign.to_uppercase(), data.date)?;

    let mut keywords: Vec<&str> = Vec::new();
    for keyword in &content.keywords {
        if !keywords.contains(&keyword.as_str()) {
            keywords.push(keyword);
        }
    }
    if keywords.is_empty() {
        writeln!(out, "\n{}", content.theme)?;
    } else {
        writeln!(out, "\n{} [{}]", content.theme, keywords.join(", "))?;
    }
    writeln!(out, "\"{}\"", content.text)?;
    for insight in content.supporting_insights.iter().flatten() {
        writeln!(out, "  > {}", insight)?;
    }

    writeln!(out)?;
    if let Some(confidence) = data.personal.as_ref().and_then(|p| p.confidence_score) {
        writeln!(out, "Strength: {:.0}%", confidence_percent(confidence))?;
    }
    if let Some(overall) = scores.overall {
        writeln!(out, "Overall {:>3.0}%  {}", overall, score_label(overall))?;
    }
    for dimension in SCORE_DIMENSIONS {
        let score = match dimension {
            "love" => scores.love,
            "career" => scores.career,
            "money" => scores.money,
            _ => scores.health,
        };
        writeln!(out, "  {:<7} {:>3.0}%  {}", dimension, score, score_label(score))?;
        if let Some(reason) = data.factor_for(dimension) {
            writeln!(out, "          {}", reason)?;
        }
    }

    for item in content.dos.iter().flatten() {
        writeln!(out, "  + {}", item)?;
    }
    for item in content.donts.iter().flatten() {
        writeln!(out, "  - {}", item)?;
    }

    writeln!(
        out,
        "\nLucky: {} · {} · {}",
        data.lucky.color.label, data.lucky.number, data.lucky.time_window
    )?;
    writeln!(
        out,
        "Moon in {} ({})",
        data.astro.moon_sign.label, data.astro.moon_phase.label
    )?;
    for highlight in data.astro.highlights.iter().filter(|h| h.kind == SKY_ASPECT) {
        writeln!(out, "  * {}", highlight.label)?;
    }

    if let Some(personal) = &data.personal {
        write_personal(out, personal)?;
    }

    Ok(())
}

fn write_personal(out: &mut String, personal: &PersonalReading) -> std::fmt::Result {
    if let Some(areas) = personal.focus_areas.as_ref().filter(|a| !a.is_empty()) {
        writeln!(out, "\nFocus: {}", areas.join(", "))?;
    }

    writeln!(out, "\nTransits:")?;
    for transit in &personal.transits_top {
        let flag = if transit.is_significant() { " [significant]" } else { "" };
        writeln!(
            out,
            "  {} {} {} (orb {:.1}°){}",
            transit.transit_planet.label,
            transit.aspect.label,
            transit.natal_planet.label,
            transit.orb_deg,
            flag
        )?;
        writeln!(out, "    {}", transit.explanation.main())?;
        for point in transit.explanation.supporting() {
            writeln!(out, "      · {}", point)?;
        }
    }

    Ok(())
}
