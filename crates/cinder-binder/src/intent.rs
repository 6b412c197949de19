use cinder_common::{InternalResult, Span, int_fatal};
use std::fmt;

/// Calling-convention annotation on a formal parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    /// No intent written; behaves as `Const`.
    Blank,
    Const,
    In,
    Inout,
    Out,
    Ref,
    Param,
    Type,
}

impl Intent {
    pub const ALL: [Intent; 8] = [
        Intent::Blank,
        Intent::Const,
        Intent::In,
        Intent::Inout,
        Intent::Out,
        Intent::Ref,
        Intent::Param,
        Intent::Type,
    ];

    /// Parse an intent tag as written by the front end. An unknown tag is a
    /// compiler bug: the front end only produces the tags listed here.
    pub fn parse(tag: &str, span: Span) -> InternalResult<Intent> {
        Ok(match tag {
            "" | "default" | "blank" => Intent::Blank,
            "const" => Intent::Const,
            "in" => Intent::In,
            "inout" => Intent::Inout,
            "out" => Intent::Out,
            "ref" => Intent::Ref,
            "param" => Intent::Param,
            "type" => Intent::Type,
            other => return Err(int_fatal!(span, "unknown intent tag '{}'", other)),
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Blank => "",
            Intent::Const => "const",
            Intent::In => "in",
            Intent::Inout => "inout",
            Intent::Out => "out",
            Intent::Ref => "ref",
            Intent::Param => "param",
            Intent::Type => "type",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
