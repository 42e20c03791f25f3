//! OCR request parameters.
//!
//! Sent as query parameters on the upload request; the backend applies them
//! to its detector/recognizer before running.

use serde::{Deserialize, Serialize};

/// Recognition language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrLang {
    Auto,
    Ch,
    En,
    #[default]
    ChEn,
}

impl OcrLang {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrLang::Auto => "auto",
            OcrLang::Ch => "ch",
            OcrLang::En => "en",
            OcrLang::ChEn => "ch_en",
        }
    }
}

impl std::fmt::Display for OcrLang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OcrLang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(OcrLang::Auto),
            "ch" => Ok(OcrLang::Ch),
            "en" => Ok(OcrLang::En),
            "ch_en" => Ok(OcrLang::ChEn),
            other => Err(format!("unknown language '{}' (expected auto, ch, en or ch_en)", other)),
        }
    }
}

/// Detector/recognizer tuning passed with each request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrParams {
    pub lang: OcrLang,
    /// Ask the backend for per-line boxes as well as the joined text.
    pub return_boxes: bool,
    /// Recognizer character set, e.g. `"default"` or `"en_sensitive"`.
    pub char_type: String,
    /// Detection box threshold (0.3 to 0.6 is typical).
    pub box_thresh: f64,
    /// Detection box expansion ratio.
    pub unclip_ratio: f64,
    /// Lines scoring below this are dropped.
    pub drop_score: f64,
    pub max_text_length: u32,
    /// 1 enables the backend's image preprocessing, 0 disables it.
    pub preprocess: u8,
}

impl Default for OcrParams {
    fn default() -> Self {
        Self {
            lang: OcrLang::ChEn,
            return_boxes: true,
            char_type: "en_sensitive".to_string(),
            box_thresh: 0.45,
            unclip_ratio: 1.9,
            drop_score: 0.30,
            max_text_length: 128,
            preprocess: 1,
        }
    }
}

impl OcrParams {
    /// Query parameters in the order the endpoint documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("lang", self.lang.as_str().to_string()),
            ("return_boxes", self.return_boxes.to_string()),
            ("char_type", self.char_type.clone()),
            ("box_thresh", self.box_thresh.to_string()),
            ("unclip_ratio", self.unclip_ratio.to_string()),
            ("drop_score", self.drop_score.to_string()),
            ("max_text_length", self.max_text_length.to_string()),
            ("preprocess", self.preprocess.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query_pairs() {
        let pairs = OcrParams::default().query_pairs();
        let rendered: Vec<String> = pairs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        assert_eq!(
            rendered.join("&"),
            "lang=ch_en&return_boxes=true&char_type=en_sensitive&box_thresh=0.45\
             &unclip_ratio=1.9&drop_score=0.3&max_text_length=128&preprocess=1"
        );
    }

    #[test]
    fn test_lang_round_trips_through_str() {
        for lang in [OcrLang::Auto, OcrLang::Ch, OcrLang::En, OcrLang::ChEn] {
            assert_eq!(lang.as_str().parse::<OcrLang>().unwrap(), lang);
        }
        assert!("jp".parse::<OcrLang>().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params: OcrParams = serde_json::from_str(r#"{"lang": "en", "drop_score": 0.5}"#).unwrap();
        assert_eq!(params.lang, OcrLang::En);
        assert_eq!(params.drop_score, 0.5);
        assert_eq!(params.max_text_length, 128);
        assert!(params.return_boxes);
    }
}
