// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::{error, result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    DoesNotExist, // the named entity doesn't exist
    EmptyFact,
    UnknownNode,
    UnknownMeasure,
    UnknownAnalysis,
    FinalEventImmutable,
    CircularDependency,
    SelfReference,
    MissingEffect,
    InvalidStatusTransition,
    ReadOnly,
    RasterizationFailed,
    JsonDecode,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            DoesNotExist => "does_not_exist",
            EmptyFact => "empty_fact",
            UnknownNode => "unknown_node",
            UnknownMeasure => "unknown_measure",
            UnknownAnalysis => "unknown_analysis",
            FinalEventImmutable => "final_event_immutable",
            CircularDependency => "circular_dependency",
            SelfReference => "self_reference",
            MissingEffect => "missing_effect",
            InvalidStatusTransition => "invalid_status_transition",
            ReadOnly => "read_only",
            RasterizationFailed => "rasterization_failed",
            JsonDecode => "json_decode",
        };

        write!(f, "{name}")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Authoring,
    Command,
    Capture,
    Import,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Authoring => "AuthoringError",
            ErrorKind::Command => "CommandError",
            ErrorKind::Capture => "CaptureError",
            ErrorKind::Import => "ImportError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Import,
            code: ErrorCode::JsonDecode,
            details: Some(err.to_string()),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

#[macro_export]
macro_rules! tree_err {
    ($kind:tt, $code:tt, $str:expr) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::$kind, ErrorCode::$code, Some($str)))
    }};
    ($kind:tt, $code:tt) => {{
        use $crate::common::{Error, ErrorCode, ErrorKind};
        Err(Error::new(ErrorKind::$kind, ErrorCode::$code, None))
    }};
}
