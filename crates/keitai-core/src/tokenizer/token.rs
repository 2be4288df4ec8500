use serde::Serialize;

/// Whether a token came from the dictionary or from unknown-word processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WordType {
    Known,
    Unknown,
}

impl WordType {
    pub fn as_str(self) -> &'static str {
        match self {
            WordType::Known => "KNOWN",
            WordType::Unknown => "UNKNOWN",
        }
    }
}

/// One morpheme of the analysis, with IPADIC feature fields.
///
/// Missing feature fields are empty strings. Unknown words carry no
/// reading or pronunciation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub word_id: u32,
    pub word_type: WordType,
    /// 1-based character position in the input
    pub word_position: usize,
    pub surface_form: String,
    pub pos: String,
    pub pos_detail_1: String,
    pub pos_detail_2: String,
    pub pos_detail_3: String,
    pub conjugated_type: String,
    pub conjugated_form: String,
    pub basic_form: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronunciation: Option<String>,
}

impl Token {
    /// Map a `surface,pos,...,reading,pronunciation` feature line.
    pub(crate) fn known(word_id: u32, word_position: usize, features: &str) -> Self {
        let f: Vec<&str> = features.split(',').collect();
        let field = |i: usize| f.get(i).copied().unwrap_or("").to_string();
        Self {
            word_id,
            word_type: WordType::Known,
            word_position,
            surface_form: field(0),
            pos: field(1),
            pos_detail_1: field(2),
            pos_detail_2: field(3),
            pos_detail_3: field(4),
            conjugated_type: field(5),
            conjugated_form: field(6),
            basic_form: field(7),
            reading: f.get(8).map(|s| s.to_string()),
            pronunciation: f.get(9).map(|s| s.to_string()),
        }
    }

    /// Map an unknown-word feature line. The surface comes from the input
    /// text, not from the class name stored in the dictionary.
    pub(crate) fn unknown(
        word_id: u32,
        word_position: usize,
        features: &str,
        surface_form: &str,
    ) -> Self {
        let mut token = Self::known(word_id, word_position, features);
        token.word_type = WordType::Unknown;
        token.surface_form = surface_form.to_string();
        token.reading = None;
        token.pronunciation = None;
        token
    }

    /// Number of characters in the surface form.
    pub fn char_len(&self) -> usize {
        self.surface_form.chars().count()
    }

    /// Feature fields joined MeCab-style:
    /// `pos,pos1,pos2,pos3,ctype,cform,base[,reading,pronunciation]`.
    pub fn feature_line(&self) -> String {
        let mut fields = vec![
            self.pos.as_str(),
            self.pos_detail_1.as_str(),
            self.pos_detail_2.as_str(),
            self.pos_detail_3.as_str(),
            self.conjugated_type.as_str(),
            self.conjugated_form.as_str(),
            self.basic_form.as_str(),
        ];
        if let Some(r) = &self.reading {
            fields.push(r);
        }
        if let Some(p) = &self.pronunciation {
            fields.push(p);
        }
        fields.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_fields() {
        let t = Token::known(
            30,
            4,
            "うち,名詞,非自立,副詞可能,*,*,*,うち,ウチ,ウチ",
        );
        assert_eq!(t.surface_form, "うち");
        assert_eq!(t.pos, "名詞");
        assert_eq!(t.pos_detail_1, "非自立");
        assert_eq!(t.pos_detail_2, "副詞可能");
        assert_eq!(t.basic_form, "うち");
        assert_eq!(t.reading.as_deref(), Some("ウチ"));
        assert_eq!(t.pronunciation.as_deref(), Some("ウチ"));
        assert_eq!(t.feature_line(), "名詞,非自立,副詞可能,*,*,*,うち,ウチ,ウチ");
    }

    #[test]
    fn test_missing_fields() {
        let t = Token::known(0, 1, "x,名詞");
        assert_eq!(t.pos, "名詞");
        assert_eq!(t.pos_detail_1, "");
        assert_eq!(t.basic_form, "");
        assert_eq!(t.reading, None);

        let t = Token::known(0, 1, "");
        assert_eq!(t.surface_form, "");
        assert_eq!(t.pos, "");
    }

    #[test]
    fn test_unknown_uses_input_surface() {
        let t = Token::unknown(10, 5, "KATAKANA,名詞,一般,*,*,*,*,*", "トトロ");
        assert_eq!(t.word_type, WordType::Unknown);
        assert_eq!(t.surface_form, "トトロ");
        assert_eq!(t.pos, "名詞");
        assert_eq!(t.basic_form, "*");
        assert_eq!(t.reading, None);
        assert_eq!(t.char_len(), 3);
    }

    #[test]
    fn test_serialize() {
        let t = Token::unknown(10, 5, "KATAKANA,名詞,一般,*,*,*,*,*", "トトロ");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["word_type"], "UNKNOWN");
        assert_eq!(json["word_position"], 5);
        assert!(json.get("reading").is_none());
    }
}
