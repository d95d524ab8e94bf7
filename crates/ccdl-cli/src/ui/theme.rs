//! UI Theme - Design system constants
//!
//! Colors, icons and layout widths used by the console output.

use crossterm::style::Color;

/// Default theme for ccdl output
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub colors: ColorScheme,
    pub icons: Icons,
    pub layout: Layout,
}

/// Color scheme for UI elements
#[derive(Debug, Clone)]
pub struct ColorScheme {
    /// File and product names
    pub name: Color,
    /// Sizes and secondary info
    pub secondary: Color,
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    /// In-progress transfers
    pub active: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            name: Color::Cyan,
            secondary: Color::DarkGrey,
            header: Color::White,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            active: Color::Blue,
        }
    }
}

/// Status icons for different states
#[derive(Debug, Clone)]
pub struct Icons {
    /// Active/in-progress state (●)
    pub active: &'static str,
    /// Success/completed state (✓)
    pub success: &'static str,
    /// Error/failed state (✗)
    pub error: &'static str,
    /// Warning state (⚠)
    pub warning: &'static str,
    /// Info state (ℹ)
    pub info: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            active: "●",
            success: "✓",
            error: "✗",
            warning: "⚠",
            info: "ℹ",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    /// Width of the file name column
    pub name_width: usize,
    /// Width of the size column
    pub size_width: usize,
    /// Padding used when listing choices (`[CODE]    Name`)
    pub choice_width: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            name_width: 44,
            size_width: 10,
            choice_width: 10,
        }
    }
}

/// Format bytes for human-readable display
pub fn format_size(bytes: u64) -> String {
    let kb = bytes as f64 / 1024.0;
    let mb = kb / 1024.0;
    if mb >= 1024.0 {
        format!("{:.1} GB", mb / 1024.0)
    } else if kb >= 1024.0 {
        format!("{mb:.1} MB")
    } else if kb >= 1.0 {
        format!("{kb:.1} KB")
    } else {
        format!("{bytes} B")
    }
}
