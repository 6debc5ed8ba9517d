// ============================================================================
// TOOL SELECTION — closed variants the presentation layer dispatches on
// ============================================================================

/// The editing tool the user currently has active.
///
/// The engine only stores and exposes this; panel dispatch is the caller's
/// concern and switches exhaustively over the variants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tool {
    #[default]
    Select,
    Transform,
    Crop,
    Draw,
    Text,
    Sticker,
    Enhance,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Transform => "Transform",
            Tool::Crop => "Crop",
            Tool::Draw => "Draw",
            Tool::Text => "Text",
            Tool::Sticker => "Sticker",
            Tool::Enhance => "Enhance",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::Select,
            Tool::Transform,
            Tool::Crop,
            Tool::Draw,
            Tool::Text,
            Tool::Sticker,
            Tool::Enhance,
        ]
    }
}

/// Free-hand stroke tools. Each carries its own width multiplier and
/// compositing behavior; the eraser removes pixels from the in-progress
/// drawing layer instead of adding them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawTool {
    #[default]
    Pen,
    Brush,
    Highlighter,
    Eraser,
}

impl DrawTool {
    /// Stroke width is the user-chosen base width times this factor.
    pub fn width_multiplier(&self) -> f32 {
        match self {
            DrawTool::Pen => 1.0,
            DrawTool::Brush => 2.0,
            DrawTool::Highlighter => 3.0,
            DrawTool::Eraser => 2.5,
        }
    }

    /// Opacity ceiling applied on top of the per-path opacity.
    pub fn base_opacity(&self) -> f32 {
        match self {
            DrawTool::Pen => 1.0,
            DrawTool::Brush => 0.85,
            DrawTool::Highlighter => 0.35,
            DrawTool::Eraser => 1.0,
        }
    }

    /// Brush strokes get a wide soft falloff; everything else a 1px edge.
    pub fn edge_softness(&self) -> f32 {
        match self {
            DrawTool::Brush => 0.5,
            _ => 0.0,
        }
    }

    pub fn is_eraser(&self) -> bool {
        matches!(self, DrawTool::Eraser)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DrawTool::Pen => "Pen",
            DrawTool::Brush => "Brush",
            DrawTool::Highlighter => "Highlighter",
            DrawTool::Eraser => "Eraser",
        }
    }

    pub fn all() -> &'static [DrawTool] {
        &[
            DrawTool::Pen,
            DrawTool::Brush,
            DrawTool::Highlighter,
            DrawTool::Eraser,
        ]
    }

    /// Stable wire value for the draft file format.
    pub fn to_u8(self) -> u8 {
        match self {
            DrawTool::Pen => 0,
            DrawTool::Brush => 1,
            DrawTool::Highlighter => 2,
            DrawTool::Eraser => 3,
        }
    }

    pub fn from_u8(v: u8) -> DrawTool {
        match v {
            1 => DrawTool::Brush,
            2 => DrawTool::Highlighter,
            3 => DrawTool::Eraser,
            _ => DrawTool::Pen,
        }
    }
}
