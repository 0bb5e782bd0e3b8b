use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

const REF_MAX_CHARS: usize = 20;
const NAME_MAX_CHARS: usize = 18;
const SEQ_WIDTH: usize = 4;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(PO|INV|ITEM|MODEL|YYYY|SEQ)\}").expect("placeholder regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Raw values for the serial template placeholders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialContext {
    #[serde(rename = "PO", default)]
    pub po: Option<String>,
    #[serde(rename = "INV", default)]
    pub inv: Option<String>,
    #[serde(rename = "ITEM", default)]
    pub item: Option<String>,
    #[serde(rename = "MODEL", default)]
    pub model: Option<String>,
    #[serde(rename = "YYYY", default)]
    pub year: Option<i32>,
    #[serde(rename = "SEQ", default)]
    pub seq: Option<u64>,
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

fn hyphenate(value: &str) -> String {
    truncate(&WHITESPACE.replace_all(value, "-"), NAME_MAX_CHARS)
}

/// Expands `{PO}`, `{INV}`, `{ITEM}`, `{MODEL}`, `{YYYY}` and `{SEQ}` in one pass.
///
/// Substituted text is never re-scanned, and anything else in braces is kept verbatim.
/// The generator does not check uniqueness; callers advance `seq` per serial.
pub fn generate(pattern: &str, ctx: &SerialContext) -> String {
    PLACEHOLDER
        .replace_all(pattern, |caps: &Captures| match &caps[1] {
            "PO" => truncate(ctx.po.as_deref().unwrap_or(""), REF_MAX_CHARS),
            "INV" => truncate(ctx.inv.as_deref().unwrap_or(""), REF_MAX_CHARS),
            "ITEM" => hyphenate(ctx.item.as_deref().unwrap_or("")),
            "MODEL" => hyphenate(ctx.model.as_deref().unwrap_or("")),
            "YYYY" => ctx.year.map(|y| y.to_string()).unwrap_or_default(),
            "SEQ" => format!("{:0width$}", ctx.seq.unwrap_or(0), width = SEQ_WIDTH),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

/// Whether successive sequence numbers yield distinct serials for this pattern
pub fn has_sequence(pattern: &str) -> bool {
    pattern.contains("{SEQ}")
}
