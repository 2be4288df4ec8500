//! Character classes for unknown-word processing (MeCab `char.def`).

use std::collections::HashMap;

use super::buffer::{ByteReader, ByteWriter};
use super::DictError;
use crate::unicode::{ucs2_code, UCS2_SIZE};

/// Class every unclassified character falls back to. Must be defined.
pub const DEFAULT_CLASS: &str = "DEFAULT";

/// Compatible classes are stored as bits of a `u32`.
const MAX_COMPAT_CLASS_ID: usize = 32;

/// One character class and its unknown-word invocation rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    /// Position of the class in `char.def`.
    pub id: u8,
    pub name: String,
    /// Create unknown-word candidates even when known words matched.
    pub is_always_invoke: bool,
    /// Merge runs of same-class characters into one candidate.
    pub is_grouping: bool,
    /// Length hint from `char.def`. Grouping ignores it unless
    /// `unknown.cap_group_at_max_length` is set.
    pub max_length: i32,
}

/// Per-code-point class tables covering the Basic Multilingual Plane.
#[derive(Debug, Clone)]
pub struct CharacterDefinition {
    category_map: Vec<u8>,
    compat_map: Vec<u32>,
    classes: Vec<CharClass>,
    default_id: u8,
}

struct RangeMapping {
    start: u32,
    end: u32,
    class: String,
    compat: Vec<String>,
}

impl CharacterDefinition {
    /// Parse the text of a MeCab `char.def` file.
    ///
    /// Class lines are `NAME INVOKE GROUP LENGTH`; mapping lines are
    /// `0xXXXX[..0xYYYY] CLASS [COMPAT...]`. `#` starts a comment.
    pub fn from_text(text: &str) -> Result<Self, DictError> {
        let mut classes: Vec<CharClass> = Vec::new();
        let mut mappings: Vec<RangeMapping> = Vec::new();

        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let err = |msg: String| DictError::InvalidCharDef(format!("line {}: {msg}", lineno + 1));
            let fields: Vec<&str> = line.split_whitespace().collect();

            if line.starts_with("0x") {
                let (start, end) = parse_range(fields[0]).map_err(&err)?;
                let class = fields
                    .get(1)
                    .ok_or_else(|| err("mapping without class".to_string()))?;
                mappings.push(RangeMapping {
                    start,
                    end,
                    class: class.to_string(),
                    compat: fields[2..].iter().map(|s| s.to_string()).collect(),
                });
            } else {
                if fields.len() < 4 {
                    return Err(err(format!("expected 4 fields, got {}", fields.len())));
                }
                let flag = |s: &str| -> Result<bool, DictError> {
                    s.parse::<u8>()
                        .map(|v| v != 0)
                        .map_err(|e| err(format!("invalid flag '{s}': {e}")))
                };
                let id = u8::try_from(classes.len())
                    .map_err(|_| err("more than 256 classes".to_string()))?;
                classes.push(CharClass {
                    id,
                    name: fields[0].to_string(),
                    is_always_invoke: flag(fields[1])?,
                    is_grouping: flag(fields[2])?,
                    max_length: fields[3]
                        .parse()
                        .map_err(|e| err(format!("invalid length '{}': {e}", fields[3])))?,
                });
            }
        }

        Self::build(classes, &mappings)
    }

    fn build(classes: Vec<CharClass>, mappings: &[RangeMapping]) -> Result<Self, DictError> {
        let ids: HashMap<&str, u8> = classes.iter().map(|c| (c.name.as_str(), c.id)).collect();
        let default_id = *ids.get(DEFAULT_CLASS).ok_or_else(|| {
            DictError::InvalidCharDef(format!("{DEFAULT_CLASS} class is not defined"))
        })?;
        let lookup = |name: &str| {
            ids.get(name)
                .copied()
                .ok_or_else(|| DictError::InvalidCharDef(format!("unknown class '{name}'")))
        };

        let mut category_map = vec![default_id; UCS2_SIZE];
        let mut compat_map = vec![0u32; UCS2_SIZE];
        let mut mapped = vec![false; UCS2_SIZE];

        for m in mappings {
            let class_id = lookup(&m.class)?;
            let mut bits = 0u32;
            for name in &m.compat {
                let id = lookup(name)? as usize;
                if id >= MAX_COMPAT_CLASS_ID {
                    return Err(DictError::InvalidCharDef(format!(
                        "compatible class '{name}' has id {id}, must be below {MAX_COMPAT_CLASS_ID}"
                    )));
                }
                bits |= 1 << id;
            }
            for cp in m.start as usize..=m.end as usize {
                category_map[cp] = class_id;
                compat_map[cp] |= bits;
                mapped[cp] = true;
            }
        }

        if (default_id as usize) < MAX_COMPAT_CLASS_ID {
            for (bits, _) in compat_map.iter_mut().zip(&mapped).filter(|(_, m)| !**m) {
                *bits = 1 << default_id;
            }
        }

        Ok(Self {
            category_map,
            compat_map,
            classes,
            default_id,
        })
    }

    /// Decode the three character-definition buffers.
    pub fn from_buffers(category: &[u8], compat: &[u8], invoke: &[u8]) -> Result<Self, DictError> {
        if category.len() != UCS2_SIZE {
            return Err(DictError::Truncated {
                what: "character category map",
                expected: UCS2_SIZE,
                actual: category.len(),
            });
        }
        if compat.len() != UCS2_SIZE * 4 {
            return Err(DictError::Truncated {
                what: "compatible category map",
                expected: UCS2_SIZE * 4,
                actual: compat.len(),
            });
        }

        let r = ByteReader::new(invoke);
        let mut classes = Vec::new();
        let mut pos = 0;
        while pos < r.len() {
            let truncated = || DictError::Truncated {
                what: "invoke definition map",
                expected: pos + 7,
                actual: r.len(),
            };
            let is_always_invoke = r.u8(pos).ok_or_else(truncated)? != 0;
            let is_grouping = r.u8(pos + 1).ok_or_else(truncated)? != 0;
            let max_length = r.i32(pos + 2).ok_or_else(truncated)?;
            let (name, next) = r.cstr(pos + 6).ok_or_else(truncated)?;
            let id = u8::try_from(classes.len())
                .map_err(|_| DictError::InvalidCharDef("more than 256 classes".to_string()))?;
            classes.push(CharClass {
                id,
                name: name.to_string(),
                is_always_invoke,
                is_grouping,
                max_length,
            });
            pos = next;
        }

        let default_id = classes
            .iter()
            .find(|c| c.name == DEFAULT_CLASS)
            .map(|c| c.id)
            .ok_or_else(|| {
                DictError::InvalidCharDef(format!("{DEFAULT_CLASS} class is not defined"))
            })?;
        if let Some(&bad) = category.iter().find(|&&id| id as usize >= classes.len()) {
            return Err(DictError::InvalidCharDef(format!(
                "category map refers to undefined class id {bad}"
            )));
        }

        let compat_map = compat
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(Self {
            category_map: category.to_vec(),
            compat_map,
            classes,
            default_id,
        })
    }

    pub fn category_buffer(&self) -> &[u8] {
        &self.category_map
    }

    pub fn compat_buffer(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        for &bits in &self.compat_map {
            w.put_u32(bits);
        }
        w.into_inner()
    }

    pub fn invoke_buffer(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        for c in &self.classes {
            w.put_u8(u8::from(c.is_always_invoke));
            w.put_u8(u8::from(c.is_grouping));
            w.put_i32(c.max_length);
            w.put_cstr(&c.name);
        }
        w.into_inner()
    }

    pub fn classes(&self) -> &[CharClass] {
        &self.classes
    }

    pub fn class(&self, id: u8) -> Option<&CharClass> {
        self.classes.get(id as usize)
    }

    pub fn default_class(&self) -> &CharClass {
        &self.classes[self.default_id as usize]
    }

    /// Primary class of `c`. Characters outside the BMP are always DEFAULT.
    pub fn lookup(&self, c: char) -> &CharClass {
        ucs2_code(c)
            .and_then(|code| self.category_map.get(code as usize))
            .and_then(|&id| self.class(id))
            .unwrap_or_else(|| self.default_class())
    }

    /// Every class whose bit is set in the compatible bitset of `c`.
    pub fn lookup_compatible(&self, c: char) -> Vec<&CharClass> {
        let Some(code) = ucs2_code(c) else {
            return vec![self.default_class()];
        };
        let bits = self.compat_map.get(code as usize).copied().unwrap_or(0);
        (0..MAX_COMPAT_CLASS_ID)
            .filter(|bit| bits & (1 << bit) != 0)
            .filter_map(|bit| self.classes.get(bit))
            .collect()
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&CharClass> {
        self.classes.iter().find(|c| c.name == name)
    }
}

fn parse_range(s: &str) -> Result<(u32, u32), String> {
    let code = |h: &str| -> Result<u32, String> {
        let digits = h
            .strip_prefix("0x")
            .ok_or_else(|| format!("code point '{h}' must start with 0x"))?;
        let v = u32::from_str_radix(digits, 16).map_err(|e| format!("code point '{h}': {e}"))?;
        if v as usize >= UCS2_SIZE {
            return Err(format!("code point '{h}' is outside the BMP"));
        }
        Ok(v)
    };
    let (start, end) = match s.split_once("..") {
        Some((a, b)) => (code(a)?, code(b)?),
        None => {
            let v = code(s)?;
            (v, v)
        }
    };
    if start > end {
        return Err(format!("range '{s}' is reversed"));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAR_DEF: &str = "\
# classes
DEFAULT 0 1 0
SPACE 0 1 0
KANJI 0 0 2
NUMERIC 1 1 0
HIRAGANA 0 1 2
KANJINUMERIC 1 1 0

0x0020 SPACE
0x0030..0x0039 NUMERIC
0x3041..0x309F HIRAGANA
0x4E00..0x9FA5 KANJI
0x4E00 KANJINUMERIC KANJI  # 一
";

    #[test]
    fn test_parse_and_lookup() {
        let def = CharacterDefinition::from_text(CHAR_DEF).unwrap();
        assert_eq!(def.classes().len(), 6);
        assert_eq!(def.lookup('あ').name, "HIRAGANA");
        assert_eq!(def.lookup('5').name, "NUMERIC");
        assert_eq!(def.lookup('野').name, "KANJI");
        assert_eq!(def.lookup('一').name, "KANJINUMERIC");
        assert_eq!(def.lookup('A').name, "DEFAULT");
        assert_eq!(def.lookup('𠮷').name, "DEFAULT");

        let hira = def.lookup_by_name("HIRAGANA").unwrap();
        assert!(hira.is_grouping);
        assert!(!hira.is_always_invoke);
        assert_eq!(hira.max_length, 2);
        assert!(def.lookup_by_name("KATAKANA").is_none());
    }

    #[test]
    fn test_compatible_classes() {
        let def = CharacterDefinition::from_text(CHAR_DEF).unwrap();
        let names: Vec<&str> = def
            .lookup_compatible('一')
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["KANJI"]);
        // mapped without compatible classes
        assert!(def.lookup_compatible('あ').is_empty());
        // unmapped: DEFAULT bit
        let names: Vec<&str> = def
            .lookup_compatible('A')
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["DEFAULT"]);
    }

    #[test]
    fn test_buffer_roundtrip() {
        let def = CharacterDefinition::from_text(CHAR_DEF).unwrap();
        let restored = CharacterDefinition::from_buffers(
            def.category_buffer(),
            &def.compat_buffer(),
            &def.invoke_buffer(),
        )
        .unwrap();
        assert_eq!(restored.classes(), def.classes());
        assert_eq!(restored.lookup('一').name, "KANJINUMERIC");
        assert_eq!(restored.lookup_compatible('一').len(), 1);
    }

    #[test]
    fn test_missing_default() {
        let err = CharacterDefinition::from_text("SPACE 0 1 0\n0x0020 SPACE\n").unwrap_err();
        assert!(matches!(err, DictError::InvalidCharDef(_)));
        assert!(err.to_string().contains("DEFAULT"));

        let mut invoke = ByteWriter::new();
        invoke.put_u8(0);
        invoke.put_u8(1);
        invoke.put_i32(0);
        invoke.put_cstr("SPACE");
        let err = CharacterDefinition::from_buffers(
            &vec![0; UCS2_SIZE],
            &vec![0; UCS2_SIZE * 4],
            &invoke.into_inner(),
        )
        .unwrap_err();
        assert!(matches!(err, DictError::InvalidCharDef(_)));
    }

    #[test]
    fn test_unknown_class_in_mapping() {
        let err = CharacterDefinition::from_text("DEFAULT 0 1 0\n0x0020 SPACE\n").unwrap_err();
        assert!(err.to_string().contains("SPACE"));
    }

    #[test]
    fn test_bad_ranges() {
        for line in ["0x0030..0x0020 DEFAULT", "0x10000 DEFAULT", "0xZZ DEFAULT"] {
            let text = format!("DEFAULT 0 1 0\n{line}\n");
            assert!(
                CharacterDefinition::from_text(&text).is_err(),
                "accepted {line}"
            );
        }
    }

    #[test]
    fn test_compat_class_id_limit() {
        let mut text = String::from("DEFAULT 0 1 0\n");
        for i in 0..40 {
            text.push_str(&format!("C{i} 0 1 0\n"));
        }
        text.push_str("0x0041 C0 C35\n");
        let err = CharacterDefinition::from_text(&text).unwrap_err();
        assert!(err.to_string().contains("C35"));
    }

    #[test]
    fn test_truncated_buffers() {
        let def = CharacterDefinition::from_text(CHAR_DEF).unwrap();
        let err = CharacterDefinition::from_buffers(
            &def.category_buffer()[..100],
            &def.compat_buffer(),
            &def.invoke_buffer(),
        )
        .unwrap_err();
        assert!(matches!(err, DictError::Truncated { .. }));
    }
}
