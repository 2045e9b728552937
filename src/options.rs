use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ExtractError;

static SINGLE_PAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("hardcoded page regex is valid"));
static PAGE_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<start>\d+)\s*[-\u{2013}]\s*(?P<end>\d+)$")
        .expect("hardcoded page range regex is valid")
});

/// Highest page a permissive selection may name when the page count is unknown.
pub const MAX_PERMISSIVE_PAGE: u32 = 100_000;

/// How the page selector reacts to a bad token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Log and skip bad tokens; no upper bound is known.
    Permissive,
    /// Reject the whole selection on the first bad token.
    Strict { total_pages: u32 },
}

impl SelectionPolicy {
    #[must_use]
    pub fn from_total_pages(total_pages: Option<u32>) -> Self {
        total_pages.map_or(Self::Permissive, |total_pages| Self::Strict { total_pages })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageToken {
    Single(u32),
    Range { start: u32, end: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenProblem {
    MalformedNumber,
    MalformedRange,
    NonPositive,
    Reversed { start: u32, end: u32 },
    ExceedsTotal { page: u32, total: u32 },
    TooLarge { page: u32 },
}

impl TokenProblem {
    fn describe(self, token: &str) -> String {
        match self {
            Self::MalformedNumber => format!("Invalid page number: '{token}'. Use numbers only"),
            Self::MalformedRange => {
                format!("Invalid range format: '{token}'. Use format like '1-3'")
            }
            Self::NonPositive => {
                format!("Invalid page '{token}': page numbers must be 1 or greater")
            }
            Self::Reversed { start, end } => format!(
                "Invalid page range '{token}': start page ({start}) is greater than end page ({end})"
            ),
            Self::ExceedsTotal { page, total } => format!(
                "Invalid page '{token}': page {page} exceeds total pages ({total})"
            ),
            Self::TooLarge { page } => format!(
                "Invalid page '{token}': page {page} is above the supported maximum ({MAX_PERMISSIVE_PAGE})"
            ),
        }
    }
}

fn parse_number(text: &str) -> Option<u32> {
    text.parse().ok()
}

fn classify_token(token: &str) -> Result<PageToken, TokenProblem> {
    if SINGLE_PAGE_RE.is_match(token) {
        let page = parse_number(token).ok_or(TokenProblem::MalformedNumber)?;
        if page == 0 {
            return Err(TokenProblem::NonPositive);
        }
        return Ok(PageToken::Single(page));
    }

    if !token.contains(['-', '\u{2013}']) {
        return Err(TokenProblem::MalformedNumber);
    }

    let captures = PAGE_RANGE_RE
        .captures(token)
        .ok_or(TokenProblem::MalformedRange)?;
    let start = parse_number(&captures["start"]).ok_or(TokenProblem::MalformedRange)?;
    let end = parse_number(&captures["end"]).ok_or(TokenProblem::MalformedRange)?;
    if start == 0 || end == 0 {
        return Err(TokenProblem::NonPositive);
    }
    if start > end {
        return Err(TokenProblem::Reversed { start, end });
    }
    Ok(PageToken::Range { start, end })
}

fn last_page(token: PageToken) -> u32 {
    match token {
        PageToken::Single(page) | PageToken::Range { end: page, .. } => page,
    }
}

fn check_upper_bound(token: PageToken, total: u32) -> Result<PageToken, TokenProblem> {
    let last = last_page(token);
    if last > total {
        return Err(TokenProblem::ExceedsTotal { page: last, total });
    }
    Ok(token)
}

fn check_permissive_bound(token: PageToken) -> Result<PageToken, TokenProblem> {
    let last = last_page(token);
    if last > MAX_PERMISSIVE_PAGE {
        return Err(TokenProblem::TooLarge { page: last });
    }
    Ok(token)
}

fn is_all_pages(spec: &str) -> bool {
    let spec = spec.trim();
    spec.is_empty() || spec.eq_ignore_ascii_case("all")
}

/// A comma-separated token the permissive selector had to drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedToken {
    pub token: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSelection {
    All,
    Pages(BTreeSet<u32>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSelection {
    pub selection: PageSelection,
    pub skipped: Vec<SkippedToken>,
}

impl PageSelection {
    /// Parses expressions like `1,3-5,7`, `all` or an empty string.
    ///
    /// # Errors
    ///
    /// Only under [`SelectionPolicy::Strict`]: any malformed, non-positive,
    /// reversed or out-of-bounds token yields
    /// [`ExtractError::InvalidPageSelection`] and no partial result.
    pub fn parse(spec: &str, policy: SelectionPolicy) -> Result<ParsedSelection, ExtractError> {
        if is_all_pages(spec) {
            return Ok(ParsedSelection {
                selection: Self::All,
                skipped: Vec::new(),
            });
        }

        let mut pages = BTreeSet::new();
        let mut skipped = Vec::new();
        for token in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let checked = match policy {
                SelectionPolicy::Permissive => {
                    classify_token(token).and_then(check_permissive_bound)
                }
                SelectionPolicy::Strict { total_pages } => {
                    classify_token(token).and_then(|parsed| check_upper_bound(parsed, total_pages))
                }
            };

            match (checked, policy) {
                (Ok(PageToken::Single(page)), _) => {
                    pages.insert(page);
                }
                (Ok(PageToken::Range { start, end }), _) => pages.extend(start..=end),
                (Err(problem), SelectionPolicy::Strict { .. }) => {
                    return Err(ExtractError::InvalidPageSelection(problem.describe(token)));
                }
                (Err(problem), SelectionPolicy::Permissive) => {
                    let reason = problem.describe(token);
                    warn!(token, %reason, "skipping page selection token");
                    skipped.push(SkippedToken {
                        token: token.to_string(),
                        reason,
                    });
                }
            }
        }

        let selection = if pages.is_empty() {
            Self::All
        } else {
            Self::Pages(pages)
        };
        Ok(ParsedSelection { selection, skipped })
    }

    /// Explicit pages in ascending order, or `None` for every page.
    #[must_use]
    pub fn pages(&self) -> Option<Vec<u32>> {
        match self {
            Self::All => None,
            Self::Pages(pages) => Some(pages.iter().copied().collect()),
        }
    }
}

impl Display for PageSelection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Pages(pages) => {
                let listed = pages.iter().map(u32::to_string).collect::<Vec<_>>();
                f.write_str(&listed.join(","))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Xlsx,
    Csv,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertOptions {
    /// Page-range expression; `None` selects every page.
    pub pages: Option<String>,
    /// Validate `pages` against the document before extracting anything.
    pub strict_pages: bool,
    pub format: OutputFormat,
    /// Field delimiter for CSV output.
    pub delimiter: char,
    /// Also emit the text of table-less pages when tables were found.
    pub keep_text_pages: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            pages: None,
            strict_pages: false,
            format: OutputFormat::Xlsx,
            delimiter: ',',
            keep_text_pages: false,
        }
    }
}

impl ConvertOptions {
    /// Reads options from a JSON object such as `{"pages":"1-3","format":"csv"}`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidOption`] for malformed JSON or unknown keys.
    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        let options: Self = serde_json::from_str(json)
            .map_err(|error| ExtractError::InvalidOption(format!("options JSON: {error}")))?;
        options.validate()?;
        Ok(options)
    }

    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidOption`] when the delimiter is not ASCII.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if !self.delimiter.is_ascii() {
            return Err(ExtractError::InvalidOption(
                "delimiter must be a single ASCII character".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).unwrap_or(b',')
    }

    #[must_use]
    pub fn page_spec(&self) -> &str {
        self.pages.as_deref().unwrap_or("all")
    }
}
