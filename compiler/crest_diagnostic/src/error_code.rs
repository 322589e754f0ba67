use std::fmt;

/// Error codes for resolver diagnostics.
///
/// Format: E#### where the first digit indicates the phase:
/// - E2xxx: Name and call resolution, typing
/// - E3xxx: Instantiation
/// - E9xxx: Internal errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Lookup (E20xx)
    /// Undeclared identifier
    E2001,
    /// Ambiguous declaration
    E2002,
    /// Use before declaration
    E2003,
    /// Unknown module
    E2004,
    /// Outer function variable referenced from a nested function
    E2005,

    // Calls (E21xx)
    /// No matching candidate
    E2101,
    /// Ambiguous call
    E2102,
    /// Wrong argument count
    E2103,
    /// Expression is not callable
    E2104,
    /// Type cannot be default-initialized
    E2105,

    // Typing (E22xx)
    /// Type mismatch
    E2201,
    /// Expected a type
    E2202,
    /// Expected a compile-time value
    E2203,
    /// No such member
    E2204,
    /// Invalid operands
    E2205,
    /// Inconsistent return types
    E2206,
    /// Generic type used without instantiation
    E2207,

    // Instantiation (E3xxx)
    /// Where clause is not a param bool
    E3001,
    /// Unbounded generic recursion
    E3002,
    /// Recursive return type inference
    E3003,
    /// Recursive definition
    E3004,

    // Internal (E9xxx)
    /// Query dependency cycle
    E9001,
    /// Missing resolution result
    E9002,
    /// Unknown file or node
    E9003,
}

impl ErrorCode {
    /// Get the numeric code as a string (e.g., "E2001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2101 => "E2101",
            ErrorCode::E2102 => "E2102",
            ErrorCode::E2103 => "E2103",
            ErrorCode::E2104 => "E2104",
            ErrorCode::E2105 => "E2105",
            ErrorCode::E2201 => "E2201",
            ErrorCode::E2202 => "E2202",
            ErrorCode::E2203 => "E2203",
            ErrorCode::E2204 => "E2204",
            ErrorCode::E2205 => "E2205",
            ErrorCode::E2206 => "E2206",
            ErrorCode::E2207 => "E2207",
            ErrorCode::E3001 => "E3001",
            ErrorCode::E3002 => "E3002",
            ErrorCode::E3003 => "E3003",
            ErrorCode::E3004 => "E3004",
            ErrorCode::E9001 => "E9001",
            ErrorCode::E9002 => "E9002",
            ErrorCode::E9003 => "E9003",
        }
    }

    pub fn is_instantiation_error(&self) -> bool {
        self.as_str().starts_with("E3")
    }

    pub fn is_internal(&self) -> bool {
        self.as_str().starts_with("E9")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
