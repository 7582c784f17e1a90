use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Offset/limit pagination as supplied by callers on message history
/// and candidate listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl PageParams {
    pub fn offset(&self) -> i64 {
        self.offset.max(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self { offset: 0, limit: DEFAULT_PAGE_SIZE }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = PageParams::default();
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 50);
    }

    #[test]
    fn limit_is_clamped() {
        let p = PageParams { offset: 0, limit: 10_000 };
        assert_eq!(p.limit(), MAX_PAGE_SIZE);

        let p = PageParams { offset: 0, limit: 0 };
        assert_eq!(p.limit(), 1);
    }

    #[test]
    fn negative_offset_is_floored() {
        let p = PageParams { offset: -5, limit: 20 };
        assert_eq!(p.offset(), 0);
    }
}
