//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Description                                         |
//! |------|-----------------------------------------------------|
//! | 0    | Success                                             |
//! | 1    | General error (layout conflicts under `--strict`)   |
//! | 2    | CLI usage error (bad args, reported by clap)        |
//! | 3    | IO error (missing input, unwritable output)         |
//! | 4    | Parse error (item JSON, workbook contents)          |
//! | 5    | Configuration error (settings file)                 |
//! | 6    | `verify`: workbook merges differ from the layout    |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Input could not be read or output could not be written.
pub const EXIT_IO: u8 = 3;

/// Input was read but is not valid item JSON or a readable workbook.
pub const EXIT_PARSE: u8 = 4;

/// Settings file is malformed or describes an invalid column layout.
pub const EXIT_CONFIG: u8 = 5;

/// `verify` found merged regions missing from, or unexpected in, the workbook.
pub const EXIT_VERIFY_MISMATCH: u8 = 6;
