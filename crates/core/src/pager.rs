use thiserror::Error;

pub const DEFAULT_LIMIT: u64 = 30;
pub const FIRST_PAGE: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("limit `{0}` is not a non-negative integer")]
    InvalidLimit(String),
    #[error("page `{0}` is not a positive integer")]
    InvalidPage(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStep {
    Next,
    Previous,
}

impl PageStep {
    #[must_use]
    pub fn apply(self, page: u64) -> u64 {
        match self {
            Self::Next => page.saturating_add(1),
            Self::Previous if page > FIRST_PAGE => page - 1,
            Self::Previous => page,
        }
    }
}

/// A bounded window into a table: `limit` rows starting at the first row of
/// the one-based `page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u64,
    pub page: u64,
}

impl PageRequest {
    #[must_use]
    pub fn new(limit: u64, page: u64) -> Self {
        Self {
            limit,
            page: page.max(FIRST_PAGE),
        }
    }

    /// `limit * page - limit`, without underflow on the first page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.limit.saturating_mul(self.page - 1)
    }

    #[must_use]
    pub fn step(self, step: PageStep) -> Self {
        Self::new(self.limit, step.apply(self.page))
    }
}

pub fn parse_limit(text: &str) -> Result<u64, ParseError> {
    text.trim()
        .parse::<u64>()
        .map_err(|_| ParseError::InvalidLimit(text.to_string()))
}

pub fn parse_page(text: &str) -> Result<u64, ParseError> {
    match text.trim().parse::<u64>() {
        Ok(page) if page >= FIRST_PAGE => Ok(page),
        _ => Err(ParseError::InvalidPage(text.to_string())),
    }
}

/// Reads the limit and page fields and moves one page in `step` direction.
pub fn turn_page(
    limit_text: &str,
    page_text: &str,
    step: PageStep,
) -> Result<PageRequest, ParseError> {
    let limit = parse_limit(limit_text)?;
    let page = parse_page(page_text)?;
    Ok(PageRequest::new(limit, page).step(step))
}

#[cfg(test)]
mod tests {
    use super::{parse_limit, parse_page, turn_page, PageRequest, PageStep, ParseError};

    #[test]
    fn next_page_advances_offset_by_limit() {
        let second = turn_page("30", "1", PageStep::Next).expect("valid fields");
        assert_eq!(second.page, 2);
        assert_eq!(second.offset(), 30);

        let third = turn_page("30", &second.page.to_string(), PageStep::Next)
            .expect("valid fields");
        assert_eq!(third.page, 3);
        assert_eq!(third.offset(), 60);
    }

    #[test]
    fn previous_page_is_floored_at_first_page() {
        let request = turn_page("30", "1", PageStep::Previous).expect("valid fields");
        assert_eq!(request.page, 1);
        assert_eq!(request.offset(), 0);

        let request = turn_page("30", "4", PageStep::Previous).expect("valid fields");
        assert_eq!(request.page, 3);
        assert_eq!(request.offset(), 60);
    }

    #[test]
    fn fields_are_trimmed_before_parsing() {
        assert_eq!(parse_limit(" 25 "), Ok(25));
        assert_eq!(parse_page("2\n"), Ok(2));
    }

    #[test]
    fn non_numeric_fields_are_rejected() {
        assert_eq!(
            turn_page("thirty", "1", PageStep::Next),
            Err(ParseError::InvalidLimit("thirty".to_string()))
        );
        assert_eq!(
            turn_page("30", "", PageStep::Next),
            Err(ParseError::InvalidPage(String::new()))
        );
        assert_eq!(parse_limit("-5"), Err(ParseError::InvalidLimit("-5".to_string())));
    }

    #[test]
    fn page_zero_is_not_a_page() {
        assert_eq!(parse_page("0"), Err(ParseError::InvalidPage("0".to_string())));
    }

    #[test]
    fn offset_saturates_instead_of_overflowing() {
        let request = PageRequest::new(u64::MAX, 3);
        assert_eq!(request.offset(), u64::MAX);
        assert_eq!(PageStep::Next.apply(u64::MAX), u64::MAX);
    }
}
