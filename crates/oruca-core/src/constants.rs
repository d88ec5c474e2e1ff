//! FeliCa card layout and identity format constants.
//!
//! Student and staff cards carry their identity as ASCII text in the first
//! block of a read-only service. The block is laid out as:
//!
//! ```text
//! offset  0  1  2  3  4  5  6  7  8  9 .. 15
//!        [ROLE ][      IDENTIFIER      ][ padding ]
//! ```
//!
//! | Role code | Meaning |
//! |-----------|---------|
//! | `01`, `02` | Student |
//! | `11` | Staff |
//!
//! # Usage
//!
//! ```
//! use oruca_core::constants::*;
//!
//! assert_eq!(FELICA_SERVICE_CODE, 0x1A8B);
//! assert_eq!(ROLE_CODE_LENGTH + IDENTIFIER_LENGTH, MIN_PAYLOAD_CHARS);
//! ```

// ============================================================================
// FeliCa Memory Layout
// ============================================================================

/// System code the identity service lives under (common area).
pub const FELICA_SYSTEM_CODE: u16 = 0xFE00;

/// Service number of the identity service.
pub const FELICA_SERVICE_NUMBER: u16 = 106;

/// Service attribute: random access, read-only, no authentication.
pub const FELICA_SERVICE_ATTRIBUTE: u16 = 0b00_1011;

/// Full 16-bit service code (`number << 6 | attribute`).
///
/// # Examples
///
/// ```
/// use oruca_core::constants::{FELICA_SERVICE_ATTRIBUTE, FELICA_SERVICE_CODE, FELICA_SERVICE_NUMBER};
///
/// assert_eq!(FELICA_SERVICE_CODE, (FELICA_SERVICE_NUMBER << 6) | FELICA_SERVICE_ATTRIBUTE);
/// ```
pub const FELICA_SERVICE_CODE: u16 = (FELICA_SERVICE_NUMBER << 6) | FELICA_SERVICE_ATTRIBUTE;

/// Block number holding the identity payload.
pub const FELICA_IDENTITY_BLOCK: u8 = 0;

/// Size of a single FeliCa block in bytes.
pub const FELICA_BLOCK_SIZE: usize = 16;

/// Length of the FeliCa manufacture ID (IDm) in bytes.
pub const FELICA_IDM_LENGTH: usize = 8;

// ============================================================================
// Identity Payload Format
// ============================================================================

/// Number of characters in the role classification prefix.
pub const ROLE_CODE_LENGTH: usize = 2;

/// Number of characters in the identifier that follows the role code.
pub const IDENTIFIER_LENGTH: usize = 7;

/// Minimum number of characters a payload needs to carry a full identity.
pub const MIN_PAYLOAD_CHARS: usize = ROLE_CODE_LENGTH + IDENTIFIER_LENGTH;

/// Role codes that classify the card holder as a student.
pub const STUDENT_ROLE_CODES: [&str; 2] = ["01", "02"];

/// Role code that classifies the card holder as staff.
pub const STAFF_ROLE_CODE: &str = "11";
