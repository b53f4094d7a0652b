// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

/// Fatal renderer errors. Any of these terminates the frame loop.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("GPU device lost: {0}")]
    DeviceLost(String),

    #[error("Failed to allocate {resource}: {message}")]
    Allocation { resource: String, message: String },

    #[error("Failed to create pipeline: {0}")]
    Pipeline(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Unsupported surface: {0}")]
    UnsupportedSurface(String),

    #[error("Bind groups still stale after rebind (bound {bound:?}, current {current:?})")]
    StaleBindings {
        bound: super::slots::ResourceVersions,
        current: super::slots::ResourceVersions,
    },
}
