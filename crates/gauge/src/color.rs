//! CLI color helpers.
//!
//! Every function respects `NO_COLOR`, `FORCE_COLOR`, and TTY detection through
//! owo-colors' `if_supports_color()`. `--no-color` sets an in-process flag that
//! bypasses owo-colors entirely.

use std::sync::atomic::{AtomicBool, Ordering};

use gauge_core::{MonitoringMode, UsageLevel};
use owo_colors::OwoColorize;
use owo_colors::Stream::{Stderr, Stdout};

/// Set by `--no-color`.
static NO_COLOR_FLAG: AtomicBool = AtomicBool::new(false);

pub fn set_no_color() {
    NO_COLOR_FLAG.store(true, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy)]
struct Rgb {
    r: u8,
    g: u8,
    b: u8,
}

impl Rgb {
    const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }
}

const ACCENT: Rgb = Rgb::from_hex(0x7CB4C8); // Headings, metric names
const CALM: Rgb = Rgb::from_hex(0x6B8F5E); // Normal usage, active polling
const AMBER: Rgb = Rgb::from_hex(0xC49A5C); // Warning level
const ALARM: Rgb = Rgb::from_hex(0xB87060); // Critical level, errors
const MUTED: Rgb = Rgb::from_hex(0x5C6370); // Secondary info

fn no_color() -> bool {
    NO_COLOR_FLAG.load(Ordering::Relaxed)
}

fn paint(text: &str, color: Rgb) -> String {
    if no_color() {
        return text.to_string();
    }
    text.if_supports_color(Stdout, |t| t.truecolor(color.r, color.g, color.b))
        .to_string()
}

fn paint_stderr(text: &str, color: Rgb) -> String {
    if no_color() {
        return text.to_string();
    }
    text.if_supports_color(Stderr, |t| t.truecolor(color.r, color.g, color.b))
        .to_string()
}

pub fn accent(text: &str) -> String {
    paint(text, ACCENT)
}

pub fn muted(text: &str) -> String {
    paint(text, MUTED)
}

pub fn bold(text: &str) -> String {
    if no_color() {
        return text.to_string();
    }
    text.if_supports_color(Stdout, |t| t.bold()).to_string()
}

/// Color a percentage (or anything else) by usage level.
pub fn level(text: &str, level: UsageLevel) -> String {
    match level {
        UsageLevel::Normal => paint(text, CALM),
        UsageLevel::Warning => paint(text, AMBER),
        UsageLevel::Critical => paint(text, ALARM),
    }
}

/// Active polling stands out; idle tiers fade.
pub fn mode(mode: MonitoringMode) -> String {
    match mode {
        MonitoringMode::Active => paint(mode.as_str(), CALM),
        MonitoringMode::IdleShort => paint(mode.as_str(), ACCENT),
        MonitoringMode::IdleMedium | MonitoringMode::IdleLong => paint(mode.as_str(), MUTED),
    }
}

/// Error styling for stderr messages.
pub fn error(text: &str) -> String {
    paint_stderr(text, ALARM)
}

/// Warning styling for stderr messages.
pub fn warning(text: &str) -> String {
    paint_stderr(text, AMBER)
}

/// Hint styling for secondary info on stderr.
pub fn hint(text: &str) -> String {
    paint_stderr(text, MUTED)
}
