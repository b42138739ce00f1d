//! Declared shape of the upstream horoscope response (`{meta, data}`)

use lazy_static::lazy_static;

use super::{array_of, nullable, object, optional, required, Schema};

lazy_static! {
    static ref HOROSCOPE_API_RESPONSE: Schema = object(vec![
        required("meta", meta()),
        required("data", data()),
    ]);
}

pub fn horoscope_api_response_schema() -> &'static Schema {
    &HOROSCOPE_API_RESPONSE
}

fn key_label() -> Schema {
    object(vec![
        required("key", Schema::String),
        required("label", Schema::String),
    ])
}

fn strings() -> Schema {
    array_of(Schema::String)
}

fn meta() -> Schema {
    object(vec![
        required("request_id", Schema::String),
        required("generated_at", Schema::String),
        required(
            "settings",
            object(vec![
                optional("tz_str", Schema::String),
                optional("timezone", Schema::String),
                required("locale", Schema::String),
                required("date_resolved", Schema::String),
                required("orb_policy", Schema::String),
            ]),
        ),
        required(
            "cache",
            object(vec![
                required("hit", Schema::Boolean),
                required("ttl_seconds", Schema::Number),
            ]),
        ),
        required(
            "engine",
            object(vec![
                required("name", Schema::String),
                required("version", Schema::String),
            ]),
        ),
    ])
}

fn data() -> Schema {
    object(vec![
        required("sign", Schema::String),
        required("date", Schema::String),
        required(
            "scores",
            object(vec![
                optional("overall", Schema::Number),
                required("love", Schema::Number),
                required("career", Schema::Number),
                required("money", Schema::Number),
                required("health", Schema::Number),
            ]),
        ),
        required(
            "score_factors",
            array_of(object(vec![
                required("dimension", Schema::String),
                required("reason", Schema::String),
            ])),
        ),
        required(
            "lucky",
            object(vec![
                required("color", key_label()),
                required("number", Schema::Number),
                required("time_window", Schema::String),
            ]),
        ),
        required(
            "content",
            object(vec![
                required("text", Schema::String),
                required("theme", Schema::String),
                required("keywords", strings()),
                optional("do", strings()),
                optional("dont", strings()),
                optional("supporting_insights", strings()),
            ]),
        ),
        required(
            "astro",
            object(vec![
                required("moon_sign", key_label()),
                required("moon_phase", key_label()),
                required(
                    "highlights",
                    array_of(object(vec![
                        required("type", Schema::String),
                        required("key", Schema::String),
                        required("label", Schema::String),
                    ])),
                ),
            ]),
        ),
        optional("personal", personal()),
    ])
}

fn personal() -> Schema {
    object(vec![
        required("transits_top", array_of(transit())),
        optional("focus_areas", strings()),
        optional("confidence_score", Schema::Number),
    ])
}

fn transit() -> Schema {
    object(vec![
        required("transit_planet", key_label()),
        required("natal_planet", key_label()),
        required("aspect", key_label()),
        required("orb_deg", Schema::Number),
        required("score", Schema::Number),
        required(
            "explanation",
            Schema::Union(vec![
                Schema::String,
                object(vec![
                    required("main", Schema::String),
                    optional("supporting", strings()),
                    optional("tags", strings()),
                ]),
            ]),
        ),
        required("is_applying", Schema::Boolean),
        required("exact_at", nullable(Schema::String)),
    ])
}
