// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error type shared by every layer of the crate.

use thiserror::Error;

/// Errors that can occur while acquiring, reducing or exporting measurements.
#[derive(Debug, Error)]
pub enum Error {
    #[error("receiver error: {0}")]
    Device(String),

    #[error("short read: expected {expected} samples, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("invalid value for '{field}': {value}")]
    InvalidParameter { field: &'static str, value: String },

    #[error("nothing to export: {0}")]
    Empty(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("plot rendering failed: {0}")]
    Plot(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
