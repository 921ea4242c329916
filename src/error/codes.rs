/// Error code registry for realign-demos
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 3000-3999: Storage errors
/// - 4000-4999: Engine errors
/// - 5000-5999: Subject grouping errors
/// - 6000-6999: Report errors
/// - 7000-7999: Subject validation errors
#[allow(dead_code)]
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_PARSE_ERROR: u16 = 1002;
    pub const CONFIG_INVALID_VALUE: u16 = 1003;

    // Storage errors (3000-3999)
    pub const STORAGE_GENERIC: u16 = 3000;
    pub const STORAGE_IO_ERROR: u16 = 3001;
    pub const STORAGE_PERMISSION_DENIED: u16 = 3002;
    pub const STORAGE_NOT_FOUND: u16 = 3004;
    pub const STORAGE_FETCH_FAILED: u16 = 3005;

    // Engine errors (4000-4999)
    pub const ENGINE_GENERIC: u16 = 4000;
    pub const ENGINE_COMMAND_NOT_FOUND: u16 = 4001;
    pub const ENGINE_TIMEOUT: u16 = 4002;
    pub const ENGINE_SUBPROCESS_FAILED: u16 = 4003;
    pub const ENGINE_INVALID_INPUT: u16 = 4004;
    pub const ENGINE_NOT_FITTED: u16 = 4005;
    pub const ENGINE_OUTPUT_ERROR: u16 = 4006;

    // Subject grouping errors (5000-5999)
    pub const SUBJECT_AMBIGUOUS: u16 = 5001;

    // Report errors (6000-6999)
    pub const REPORT_GENERIC: u16 = 6000;
    pub const REPORT_UNREADABLE: u16 = 6001;
    pub const REPORT_MALFORMED: u16 = 6002;
    pub const REPORT_DISPLAY_FAILED: u16 = 6003;

    // Subject validation errors (7000-7999)
    pub const SUBJECT_INVALID: u16 = 7000;
    pub const SUBJECT_EMPTY_ID: u16 = 7001;
    pub const SUBJECT_EMPTY_FUNC: u16 = 7002;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1000 => "Generic configuration error",
        1001 => "Configuration file not found",
        1002 => "Failed to parse configuration",
        1003 => "Invalid value in configuration",

        3000 => "Generic storage error",
        3001 => "I/O error in dataset storage",
        3002 => "Permission denied for dataset directory",
        3004 => "Dataset not found in local cache",
        3005 => "Dataset fetch failed",

        4000 => "Generic engine error",
        4001 => "Engine command not found",
        4002 => "Engine command timed out",
        4003 => "Engine command failed",
        4004 => "Invalid functional input",
        4005 => "Transform requested before fit",
        4006 => "Engine produced unexpected output",

        5001 => "Subject does not map to exactly one functional file",

        6000 => "Generic report error",
        6001 => "Realignment parameter file unreadable",
        6002 => "Realignment parameter file malformed",
        6003 => "Diagnostic display failed",

        7000 => "Invalid subject record",
        7001 => "Subject identifier is empty",
        7002 => "Subject has no functional sessions",

        _ => "Unknown error code",
    }
}
