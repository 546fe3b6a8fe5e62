//! CLI Exit Code Registry
//!
//! Single source of truth for `linkdiff` exit codes. Scripts that chain a
//! weekly run into the fix-up step rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 2    | Usage error (bad args, unreadable config file)            |
//! | 3    | Invalid config (parse, validation, report catalog)        |
//! | 4    | Load error (input file, missing column, malformed row)    |
//! | 5    | Key collision while normalizing a snapshot                |
//! | 6    | Export error (csv, workbook, database, manifest)          |

use linkdiff_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, missing config file.
pub const EXIT_USAGE: u8 = 2;

/// Config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// An input relation could not be read or loaded.
pub const EXIT_LOAD: u8 = 4;

/// Two distinct (gene, accession) pairs share a composite key.
pub const EXIT_KEY_COLLISION: u8 = 5;

/// Writing an output file failed.
pub const EXIT_EXPORT: u8 = 6;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_)
        | ReconError::ConfigValidation(_)
        | ReconError::DuplicateReport(_)
        | ReconError::InvalidReportName(_) => EXIT_INVALID_CONFIG,
        ReconError::MissingRelation(_)
        | ReconError::MissingColumn { .. }
        | ReconError::MalformedRow { .. }
        | ReconError::EmptyId { .. } => EXIT_LOAD,
        ReconError::KeyCollision { .. } => EXIT_KEY_COLLISION,
    }
}
