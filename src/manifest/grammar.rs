//! Line grammars accepted in checksum files.
//!
//! Each grammar is a pure function from a trimmed, non-comment line to an
//! optional `(filename, digest)` pair. They are tried in order and the first
//! match wins.

use regex::Regex;
use std::sync::LazyLock;

/// Delimiter between digest and filename in the canonical form.
pub const DELIMITER: &str = "  ";

/// Number of hex digits in a SHA-256 digest.
pub const DIGEST_LEN: usize = 64;

pub type Grammar = fn(&str) -> Option<(String, String)>;

/// Grammars in the order they are attempted.
pub const GRAMMARS: &[Grammar] = &[simple_form, gnu_form, bsd_form];

static GNU_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9a-fA-F]{64})(?:  | \*)(.+)$").expect("GNU line pattern compiles")
});

static BSD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^SHA256 \((.+)\) = ([0-9a-fA-F]{64})$").expect("BSD line pattern compiles")
});

pub fn is_digest(candidate: &str) -> bool {
    candidate.len() == DIGEST_LEN && candidate.bytes().all(|b| b.is_ascii_hexdigit())
}

/// `<digest>  <filename>`, split on the first two-space delimiter.
pub fn simple_form(line: &str) -> Option<(String, String)> {
    let (digest, filename) = line.split_once(DELIMITER)?;
    if !is_digest(digest) || filename.is_empty() {
        return None;
    }
    Some((filename.to_string(), digest.to_string()))
}

/// GNU coreutils output: `<digest>  <filename>` or `<digest> *<filename>`.
pub fn gnu_form(line: &str) -> Option<(String, String)> {
    let captures = GNU_LINE.captures(line)?;
    Some((captures[2].to_string(), captures[1].to_string()))
}

/// BSD tagged output: `SHA256 (<filename>) = <digest>`.
pub fn bsd_form(line: &str) -> Option<(String, String)> {
    let captures = BSD_LINE.captures(line)?;
    Some((captures[1].to_string(), captures[2].to_string()))
}

/// Runs `line` through [`GRAMMARS`], returning the first match.
pub fn parse_line(line: &str) -> Option<(String, String)> {
    GRAMMARS.iter().find_map(|grammar| grammar(line))
}
