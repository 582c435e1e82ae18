use std::{borrow::Cow, fmt};

/// Errors produced while reading a CFF font program or interpreting one of
/// its charstrings
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    UnexpectedEof,

    /// The 4-byte CFF header is not one we understand
    MalformedHeader,

    /// An INDEX has an invalid offset size, a decreasing offset, or points
    /// outside of the font buffer
    MalformedIndex,

    /// A DICT has operands without a trailing operator, uses a reserved
    /// operator, or carries the wrong number of operands for an operator
    MalformedDict,

    /// An operand byte which is not legal in the current context, e.g. `255`
    /// in a DICT or `29`/`30` in a charstring
    InvalidOperandEncoding {
        byte: u8,
    },

    UnsupportedCharstringType(u32),

    /// CID-keyed fonts (those with a `ROS` top dict operator)
    UnsupportedFontKind,

    /// The top dict has no `CharStrings` offset
    MissingCharStrings,

    InvalidCharset {
        format: u8,
    },

    InvalidEncoding {
        format: u8,
    },

    /// A SID that resolves neither to a standard string nor to an entry in
    /// the font's string INDEX
    InvalidStringId(u16),

    /// A glyph name, character code or glyph index with no glyph behind it
    UnknownGlyph,

    /// A charstring operator we don't know how to execute. Operators in the
    /// `12 x` escape range are reported as `1200 + x`
    UnsupportedCharstringOperator {
        operator: u16,
    },

    /// Subroutine calls (or seac components) nested deeper than allowed
    RecursionLimitExceeded {
        depth: usize,
    },

    /// The glyph executed more operators than its budget allows
    OperationLimitExceeded,

    TransientArrayIndexOutOfRange {
        index: i32,
    },

    StackUnderflow,

    StackOverflow,

    InvalidSubroutineIndex {
        index: i32,
    },

    /// `return` executed outside of a subroutine
    UnexpectedReturn,

    DivisionByZero,

    /// An operand outside the domain of its operator, such as a negative
    /// argument to `sqrt` or a non-integral subroutine number
    InvalidOperand,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#?}", self)
    }
}

impl std::error::Error for DecodeError {}

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors produced while constructing or evaluating a PDF function
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The function's parameters are inconsistent with each other or with the
    /// requirements of its function type
    MalformedFunction(Cow<'static, str>),

    MissingRequiredKey {
        key: &'static str,
    },

    UnsupportedFunctionType(i32),

    /// `evaluate` was called with the wrong number of input values
    InputArity {
        expected: usize,
        found: usize,
    },
}

impl EvalError {
    pub(crate) fn malformed(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedFunction(reason.into())
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#?}", self)
    }
}

impl std::error::Error for EvalError {}

pub type EvalResult<T> = Result<T, EvalError>;
