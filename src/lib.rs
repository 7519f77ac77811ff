// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

pub mod api;
pub mod catalog;
pub mod config;
pub mod conversion;
mod error;
pub mod models;
pub mod state;
pub mod theme;
pub mod tui;
pub mod view;

pub use error::{ExchangeError, Result};
