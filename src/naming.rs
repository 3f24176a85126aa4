//! Naming engine: turns a target name template into a file name.
//!
//! Recognized tokens:
//!
//! | token                           | value                                          |
//! |---------------------------------|------------------------------------------------|
//! | `HASHID`                        | content hash, verbatim                         |
//! | `SOURCENAME_WITHOUT_EXTENSION`  | base name without extension                    |
//! | `SOURCENAME_WITHOUT_EXTENSION2` | same, sanitized                                |
//! | `SOURCE_PATH`                   | containing directory                           |
//! | `SOURCE_PATH2`                  | same, sanitized                                |
//! | `SOURCE_EXTENSION`              | extension without the dot                      |
//! | `SOURCE_EXTENSION2`             | same, sanitized                                |
//! | `SIZE`                          | size in bytes                                  |
//! | `DATE2`                         | mtime as `YYYY_MM_DD__HH_MM_SS`, sanitized     |
//! | `DATABASE_INDEX`                | catalog size + position in this run, sanitized |
//!
//! The template is scanned once from left to right. At each position the
//! longest token spelled there wins, so `SOURCE_PATH2` is never read as
//! `SOURCE_PATH` followed by `2`, and substituted values are never rescanned.

use std::path::Path;

use crate::candidate::SourceCandidate;
use crate::hash::ContentHash;
use crate::select::Selection;

/// Characters replaced by `_` in sanitized token values.
pub const ILLEGAL_CHARACTERS: &[char] = &[
    '*', '/', '\\', '.', '"', '[', ']', ':', ';', '|', '=', ',', '?', '<', '>',
];

const DATE_FORMAT: &str = "%Y_%m_%d__%H_%M_%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    HashId,
    SourceName,
    SourceNameSanitized,
    SourcePath,
    SourcePathSanitized,
    SourceExtension,
    SourceExtensionSanitized,
    Size,
    Date,
    DatabaseIndex,
}

/// Token spellings, longest first so a scan picks the most qualified match.
const TOKENS: &[(&str, Token)] = &[
    ("SOURCENAME_WITHOUT_EXTENSION2", Token::SourceNameSanitized),
    ("SOURCENAME_WITHOUT_EXTENSION", Token::SourceName),
    ("SOURCE_EXTENSION2", Token::SourceExtensionSanitized),
    ("SOURCE_EXTENSION", Token::SourceExtension),
    ("DATABASE_INDEX", Token::DatabaseIndex),
    ("SOURCE_PATH2", Token::SourcePathSanitized),
    ("SOURCE_PATH", Token::SourcePath),
    ("HASHID", Token::HashId),
    ("DATE2", Token::Date),
    ("SIZE", Token::Size),
];

/// Replace every illegal character with `_`.
pub fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if ILLEGAL_CHARACTERS.contains(&c) { '_' } else { c })
        .collect()
}

/// Template shared by every file of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetNameTemplate(String);

impl TargetNameTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the target name for one selected file.
    pub fn synthesize(
        &self,
        candidate: &SourceCandidate,
        hash: &ContentHash,
        database_index: usize,
    ) -> String {
        synthesize_name(&self.0, candidate, hash, database_index)
    }
}

/// Substitute the tokens of `template` for one file.
pub fn synthesize_name(
    template: &str,
    candidate: &SourceCandidate,
    hash: &ContentHash,
    database_index: usize,
) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;
    'scan: while !rest.is_empty() {
        for (spelling, token) in TOKENS {
            if let Some(after) = rest.strip_prefix(spelling) {
                out.push_str(&token_value(*token, candidate, hash, database_index));
                rest = after;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

fn token_value(
    token: Token,
    candidate: &SourceCandidate,
    hash: &ContentHash,
    database_index: usize,
) -> String {
    match token {
        Token::HashId => hash.as_str().to_string(),
        Token::SourceName => candidate.base_name_without_extension.clone(),
        Token::SourceNameSanitized => sanitize(&candidate.base_name_without_extension),
        Token::SourcePath => path_text(&candidate.containing_dir),
        Token::SourcePathSanitized => sanitize(&path_text(&candidate.containing_dir)),
        Token::SourceExtension => candidate.extension.clone(),
        Token::SourceExtensionSanitized => sanitize(&candidate.extension),
        Token::Size => candidate.size_bytes.to_string(),
        Token::Date => sanitize(&candidate.modified.format(DATE_FORMAT).to_string()),
        Token::DatabaseIndex => sanitize(&database_index.to_string()),
    }
}

fn path_text(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

/// Target names for the first `limit` selected files, in selection order.
pub fn preview_names(
    template: &TargetNameTemplate,
    selection: &Selection,
    catalog_len: usize,
    limit: usize,
) -> Vec<(String, String)> {
    selection
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, (hash, cand))| {
            (
                cand.absolute_path.display().to_string(),
                template.synthesize(cand, hash, catalog_len + i),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn cand() -> SourceCandidate {
        let ts = NaiveDate::from_ymd_opt(2015, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        SourceCandidate::new(Path::new("/home/someone/Pictures/my.cat.jpg"), 1234, ts)
    }

    fn h() -> ContentHash {
        ContentHash::from_encoded("HASH")
    }

    #[test]
    fn sanitize_replaces_every_illegal_char() {
        assert_eq!(sanitize(r#"a*b/c\d.e"f[g]h:i;j|k=l,m?n<o>p"#), "a_b_c_d_e_f_g_h_i_j_k_l_m_n_o_p");
        assert_eq!(sanitize("plain-name_1"), "plain-name_1");
    }

    #[test]
    fn all_tokens() {
        let c = cand();
        assert_eq!(synthesize_name("HASHID", &c, &h(), 0), "HASH");
        assert_eq!(synthesize_name("SOURCENAME_WITHOUT_EXTENSION", &c, &h(), 0), "my.cat");
        assert_eq!(synthesize_name("SOURCENAME_WITHOUT_EXTENSION2", &c, &h(), 0), "my_cat");
        assert_eq!(synthesize_name("SOURCE_PATH", &c, &h(), 0), "/home/someone/Pictures");
        assert_eq!(synthesize_name("SOURCE_PATH2", &c, &h(), 0), "_home_someone_Pictures");
        assert_eq!(synthesize_name("SOURCE_EXTENSION", &c, &h(), 0), "jpg");
        assert_eq!(synthesize_name("SOURCE_EXTENSION2", &c, &h(), 0), "jpg");
        assert_eq!(synthesize_name("SIZE", &c, &h(), 0), "1234");
        assert_eq!(synthesize_name("DATE2", &c, &h(), 0), "2015_01_02__03_04_05");
        assert_eq!(synthesize_name("DATABASE_INDEX", &c, &h(), 42), "42");
    }

    #[test]
    fn sanitized_and_plain_variants_resolve_independently() {
        let c = cand();
        let out = synthesize_name(
            "SOURCENAME_WITHOUT_EXTENSION2-SOURCENAME_WITHOUT_EXTENSION",
            &c,
            &h(),
            0,
        );
        assert_eq!(out, "my_cat-my.cat");
        let out = synthesize_name("SOURCE_PATH-SOURCE_PATH2", &c, &h(), 0);
        assert_eq!(out, "/home/someone/Pictures-_home_someone_Pictures");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let c = SourceCandidate::new(Path::new("/d/SIZE.txt"), 7, cand().modified);
        assert_eq!(synthesize_name("SOURCENAME_WITHOUT_EXTENSION", &c, &h(), 0), "SIZE");
        let weird = ContentHash::from_encoded("xHASHIDx");
        assert_eq!(synthesize_name("HASHID.SIZE", &c, &weird, 0), "xHASHIDx.7");
    }

    #[test]
    fn literal_text_and_unicode_kept() {
        let c = cand();
        assert_eq!(
            synthesize_name("é-DATABASE_INDEX-HASHID.SOURCE_EXTENSION2", &c, &h(), 3),
            "é-3-HASH.jpg"
        );
        assert_eq!(synthesize_name("", &c, &h(), 3), "");
        assert_eq!(synthesize_name("HASH", &c, &h(), 3), "HASH");
    }

    #[test]
    fn deterministic() {
        let c = cand();
        let t = TargetNameTemplate::new("DATE2__HASHID__SIZE");
        let a = t.synthesize(&c, &h(), 9);
        let b = t.synthesize(&c, &h(), 9);
        assert_eq!(a, b);
    }

    #[test]
    fn preview_uses_running_index() {
        let mut sel = Selection::new();
        sel.insert(ContentHash::from_encoded("h1"), cand());
        sel.insert(
            ContentHash::from_encoded("h2"),
            SourceCandidate::new(Path::new("/x/y.png"), 1, cand().modified),
        );
        let names = preview_names(&TargetNameTemplate::new("DATABASE_INDEX.HASHID"), &sel, 10, 6);
        assert_eq!(names.len(), 2);
        assert_eq!(names[0].1, "10.h1");
        assert_eq!(names[1].1, "11.h2");
        let one = preview_names(&TargetNameTemplate::new("HASHID"), &sel, 0, 1);
        assert_eq!(one.len(), 1);
    }
}
