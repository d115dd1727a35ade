//! Setting names read by the crawl monitors

pub const SPIDERMON_MIN_ITEMS: &str = "SPIDERMON_MIN_ITEMS";
pub const SPIDERMON_MAX_CRITICALS: &str = "SPIDERMON_MAX_CRITICALS";
pub const SPIDERMON_MAX_ERRORS: &str = "SPIDERMON_MAX_ERRORS";
pub const SPIDERMON_MAX_WARNINGS: &str = "SPIDERMON_MAX_WARNINGS";
pub const SPIDERMON_MAX_DOWNLOADER_EXCEPTIONS: &str = "SPIDERMON_MAX_DOWNLOADER_EXCEPTIONS";
pub const SPIDERMON_MAX_ITEM_VALIDATION_ERRORS: &str = "SPIDERMON_MAX_ITEM_VALIDATION_ERRORS";

pub const SPIDERMON_EXPECTED_FINISH_REASONS: &str = "SPIDERMON_EXPECTED_FINISH_REASONS";
pub const SPIDERMON_UNWANTED_HTTP_CODES: &str = "SPIDERMON_UNWANTED_HTTP_CODES";
pub const SPIDERMON_UNWANTED_HTTP_CODES_MAX_COUNT: &str = "SPIDERMON_UNWANTED_HTTP_CODES_MAX_COUNT";
pub const SPIDERMON_MAX_RETRIES: &str = "SPIDERMON_MAX_RETRIES";
pub const SPIDERMON_MIN_SUCCESSFUL_REQUESTS: &str = "SPIDERMON_MIN_SUCCESSFUL_REQUESTS";
pub const SPIDERMON_MAX_REQUESTS_ALLOWED: &str = "SPIDERMON_MAX_REQUESTS_ALLOWED";
pub const SPIDERMON_ADD_FIELD_COVERAGE: &str = "SPIDERMON_ADD_FIELD_COVERAGE";
pub const SPIDERMON_FIELD_COVERAGE_RULES: &str = "SPIDERMON_FIELD_COVERAGE_RULES";
pub const SPIDERMON_MAX_EXECUTION_TIME: &str = "SPIDERMON_MAX_EXECUTION_TIME";

pub const SPIDERMON_JOBS_COMPARISON: &str = "SPIDERMON_JOBS_COMPARISON";
pub const SPIDERMON_JOBS_COMPARISON_STATES: &str = "SPIDERMON_JOBS_COMPARISON_STATES";
pub const SPIDERMON_JOBS_COMPARISON_TAGS: &str = "SPIDERMON_JOBS_COMPARISON_TAGS";
pub const SPIDERMON_JOBS_COMPARISON_THRESHOLD: &str = "SPIDERMON_JOBS_COMPARISON_THRESHOLD";
