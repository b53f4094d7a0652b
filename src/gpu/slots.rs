// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::ops::Deref;

/// A GPU resource slot with an explicit version counter. Every replacement
/// bumps the version so consumers can detect bindings to stale handles.
#[derive(Debug)]
pub struct Versioned<T> {
    value: T,
    version: u64,
}

impl<T> Versioned<T> {
    pub fn new(value: T) -> Self {
        Self { value, version: 1 }
    }

    /// Drops the old value and installs the new one.
    pub fn replace(&mut self, value: T) {
        self.value = value;
        self.version += 1;
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

impl<T> Deref for Versioned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Versions of every recreatable slot, captured when bind groups are built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceVersions {
    pub scene: u64,
    pub output: u64,
    pub accumulation: u64,
}
