// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod light;
pub mod loader;
pub mod material;
pub mod model;
pub mod primitives;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod store;

pub use store::SceneStore;
